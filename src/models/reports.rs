use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One month of a named series, keyed "YYYY-MM".
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct MonthlyPoint {
    pub month: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, i64>,
}

impl MonthlyPoint {
    pub fn new(month: impl Into<String>) -> Self {
        MonthlyPoint {
            month: month.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, series: &str, amount: i64) {
        *self.values.entry(series.to_string()).or_insert(0) += amount;
    }

    pub fn get(&self, series: &str) -> i64 {
        self.values.get(series).copied().unwrap_or(0)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Distribution {
    pub label: String,
    pub value: i64,
}
