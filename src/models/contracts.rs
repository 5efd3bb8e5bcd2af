use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    InProgress,
    AwaitingApproval,
    Completed,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::InProgress => "in_progress",
            ContractStatus::AwaitingApproval => "awaiting_approval",
            ContractStatus::Completed => "completed",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    InProgress,
    Done,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub name: String,
    pub status: StageStatus,
    pub completed_on: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: u64,
    pub name: String,
    pub kind: String,
    pub size: String,
    pub uploaded_on: NaiveDate,
    pub contract_id: u64,
}

impl Document {
    pub fn content_type(&self) -> &'static str {
        match self.kind.to_ascii_uppercase().as_str() {
            "PDF" => "application/pdf",
            "ZIP" => "application/zip",
            "DWG" => "image/vnd.dwg",
            _ => "application/octet-stream",
        }
    }
}

/// File contents of a contract document.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: u64,
    pub number: String,
    pub title: String,
    pub status: ContractStatus,
    pub progress: u8,
    pub started_on: NaiveDate,
    pub expected_on: NaiveDate,
    pub engineer: String,
    pub amount_in_cents: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub documents: Vec<Document>,
}

impl Contract {
    pub fn is_active(&self) -> bool {
        self.status != ContractStatus::Completed
    }
}
