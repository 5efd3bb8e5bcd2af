pub mod admin;
pub mod commissions;
pub mod contracts;
pub mod referrals;
pub mod reports;
pub mod session;
pub mod users;
