//! Records exchanged with the upstream API and the document store

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Credential for one linked institution connection.
///
/// Never serialized; `Debug` prints a placeholder.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building upstream requests only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Stored association between a user and one institution connection
#[derive(Debug, Clone, PartialEq)]
pub struct BankLink {
    /// Internal record id
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Upstream item id
    pub bank_id: String,
    /// Upstream account id
    pub account_id: String,
    pub access_token: AccessToken,
    /// Public identifier used in shareable URLs
    pub shareable_id: String,
}

/// Balances and identifiers of the primary account behind an access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub account_id: String,
    pub available_balance: Option<f64>,
    pub current_balance: Option<f64>,
    pub iso_currency_code: Option<String>,
    pub name: String,
    pub official_name: Option<String>,
    pub mask: Option<String>,
    pub account_type: String,
    pub subtype: Option<String>,
    /// Institution of the item the account belongs to
    pub institution_id: Option<String>,
}

/// Institution reference data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Institution {
    pub institution_id: String,
    pub name: String,
}

/// A transaction as reported by the upstream sync endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncedTransaction {
    pub id: String,
    pub account_id: String,
    pub name: String,
    pub amount: f64,
    /// `YYYY-MM-DD`
    pub date: String,
    pub payment_channel: String,
    pub pending: bool,
    /// Primary category, empty when the upstream sent none
    pub category: String,
    pub merchant_name: Option<String>,
    pub logo_url: Option<String>,
}

/// One page of the incremental sync protocol
#[derive(Debug, Clone, PartialEq)]
pub struct SyncPage {
    pub added: Vec<SyncedTransaction>,
    pub next_cursor: String,
    pub has_more: bool,
}

/// Result of a best-effort sync: whatever was gathered, plus the error that
/// cut it short, if any
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    pub transactions: Vec<SyncedTransaction>,
    pub warning: Option<GatewayError>,
}

impl SyncOutcome {
    pub fn complete(transactions: Vec<SyncedTransaction>) -> Self {
        Self {
            transactions,
            warning: None,
        }
    }

    pub fn partial(transactions: Vec<SyncedTransaction>, warning: GatewayError) -> Self {
        Self {
            transactions,
            warning: Some(warning),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.warning.is_none()
    }
}

/// A transfer recorded in the document store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub id: String,
    pub name: String,
    pub amount: f64,
    pub channel: String,
    pub category: String,
    pub sender_bank_id: String,
    pub receiver_bank_id: String,
    /// RFC 3339 creation timestamp
    pub created_at: String,
}
