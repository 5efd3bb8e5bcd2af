use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::reports::MonthlyPoint;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Contract,
    Referral,
    Commission,
    Partner,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: u64,
    pub kind: ActivityKind,
    pub description: String,
    pub date: NaiveDate,
    pub amount_in_cents: Option<i64>,
}

/// Company-wide figures served by the admin dashboard endpoint.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSummary {
    pub total_contracts: u64,
    pub active_contracts: u64,
    pub total_partners: u64,
    pub commissions_paid_in_cents: i64,
    pub revenue_in_cents: i64,
    #[serde(default)]
    pub recent_activities: Vec<Activity>,
    #[serde(default)]
    pub monthly: Vec<MonthlyPoint>,
}
