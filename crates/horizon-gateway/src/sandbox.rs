//! Fixed transactions served instead of a live sync when
//! `upstream.use_sandbox_transactions` is enabled

use crate::types::SyncedTransaction;

const SANDBOX_ACCOUNT_ID: &str = "sandbox-account";

// (id, name, amount, date, categories, channel)
const SANDBOX_ROWS: [(&str, &str, f64, &str, &[&str], &str); 7] = [
    ("txn_001", "Starbucks", 4.5, "2025-05-15", &["Food", "Coffee"], "in store"),
    ("txn_002", "Amazon", 89.99, "2025-05-14", &["Shopping", "Online"], "online"),
    ("txn_003", "Uber", 15.75, "2025-05-13", &["Transport"], "online"),
    ("txn_004", "Zara", 749.99, "2025-05-13", &["Shopping", "Clothing"], "in store"),
    ("txn_005", "Netflix", 15.99, "2025-05-12", &["Entertainment"], "online"),
    ("txn_006", "Spotify", 9.99, "2025-05-11", &["Entertainment"], "online"),
    ("txn_007", "Whole Foods", 45.67, "2025-05-10", &["Groceries"], "in store"),
];

/// The canned dataset, newest first
pub fn sandbox_transactions() -> Vec<SyncedTransaction> {
    SANDBOX_ROWS
        .iter()
        .map(|(id, name, amount, date, categories, channel)| SyncedTransaction {
            id: id.to_string(),
            account_id: SANDBOX_ACCOUNT_ID.to_string(),
            name: name.to_string(),
            amount: *amount,
            date: date.to_string(),
            payment_channel: channel.to_string(),
            pending: false,
            category: categories.first().map(|c| c.to_string()).unwrap_or_default(),
            merchant_name: Some(name.to_string()),
            logo_url: None,
        })
        .collect()
}
