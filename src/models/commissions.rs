use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionStatus {
    Pending,
    Approved,
    Paid,
    Cancelled,
}

impl CommissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionStatus::Pending => "pending",
            CommissionStatus::Approved => "approved",
            CommissionStatus::Paid => "paid",
            CommissionStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Commission {
    pub id: u64,
    pub referral_id: u64,
    pub client_name: String,
    pub contract_number: String,
    pub contract_in_cents: i64,
    pub rate_percent: f64,
    pub commission_in_cents: i64,
    pub status: CommissionStatus,
    pub due_on: NaiveDate,
    pub paid_on: Option<NaiveDate>,
}
