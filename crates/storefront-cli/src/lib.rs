//! Storefront CLI Library
//!
//! Back-office commands over the store database: demo seeding, signed
//! download links and dashboard reports.

pub mod output;
pub mod report_cmd;
pub mod seed_cmd;
pub mod token_cmd;
