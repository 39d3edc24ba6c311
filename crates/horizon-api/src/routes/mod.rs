//! Route handlers for the JSON API
//!
//! - accounts: account overview and single-account detail
//! - transactions: paged transaction feed and category counts
//! - share: shareable identifier resolution

pub mod accounts;
pub mod share;
pub mod transactions;
