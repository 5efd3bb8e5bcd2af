use chrono::NaiveDate;

pub mod admin;
pub mod api;
pub mod clients;
pub mod identity;
pub mod partners;
pub mod storage;

/// Persisted bearer token.
pub const TOKEN_KEY: &str = "token";
/// Persisted identity, as JSON.
pub const USER_KEY: &str = "user";

pub(crate) fn seed_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}
