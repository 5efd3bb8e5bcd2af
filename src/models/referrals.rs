use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferralStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReferralStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralStatus::Pending => "pending",
            ReferralStatus::Approved => "approved",
            ReferralStatus::Rejected => "rejected",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Referral {
    pub id: u64,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub service: String,
    pub status: ReferralStatus,
    pub referred_on: NaiveDate,
    pub approved_on: Option<NaiveDate>,
    pub commission_in_cents: i64,
    #[serde(default)]
    pub notes: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReferral {
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub service: String,
    #[serde(default)]
    pub notes: String,
}

impl NewReferral {
    pub fn validate(&self) -> Result<(), String> {
        utils::require("client name", &self.client_name)?;
        utils::require("client email", &self.client_email)?;
        if !utils::is_valid_email(&self.client_email) {
            return Err("client email is invalid".to_string());
        }
        utils::require("client phone", &self.client_phone)?;
        utils::require("service", &self.service)
    }
}

/// Click-through numbers of a partner's referral link.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct LinkStats {
    pub clicks: u64,
    pub conversions: u64,
}
