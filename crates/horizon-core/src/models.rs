//! View models returned by the dashboard

use chrono::{DateTime, Utc};
use horizon_utils::{transaction_status, TransactionStatus};
use serde::Serialize;

use crate::error::{CoreError, CoreResult, ErrorDetails};
use crate::merge::parse_timestamp;

/// A linked account as shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// Upstream account id
    pub id: String,
    pub available_balance: Option<f64>,
    /// Zero when the upstream reports no current balance
    pub current_balance: f64,
    pub iso_currency_code: Option<String>,
    pub institution_id: String,
    pub institution_name: String,
    pub name: String,
    pub official_name: Option<String>,
    pub mask: Option<String>,
    #[serde(rename = "type")]
    pub account_type: String,
    pub subtype: Option<String>,
    /// Internal id of the bank link the account was resolved from
    pub bank_link_id: String,
    pub shareable_id: String,
}

/// Whether money left or entered the viewed account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Debit,
    Credit,
}

/// Where a transaction came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionSource {
    /// Reported by the upstream sync
    Synced,
    /// Recorded in the document store
    Transfer,
}

/// One row of the merged transaction feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: String,
    pub name: String,
    pub amount: f64,
    /// `YYYY-MM-DD` for synced rows, RFC 3339 for transfers
    pub date: String,
    pub payment_channel: String,
    pub category: String,
    pub direction: Direction,
    pub image: Option<String>,
    pub pending: bool,
    pub source: TransactionSource,
}

impl Transaction {
    /// Parsed date, if it is in a recognised format
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.date)
    }

    /// Settlement status as seen at `now`; undated rows count as settled
    pub fn status(&self, now: DateTime<Utc>) -> TransactionStatus {
        match self.timestamp() {
            Some(date) => transaction_status(date, now),
            None => TransactionStatus::Success,
        }
    }
}

/// A bank link whose account could not be resolved
#[derive(Debug, Clone, Serialize)]
pub struct BankFailure {
    pub bank_link_id: String,
    pub error: ErrorDetails,
    #[serde(skip)]
    pub cause: CoreError,
}

impl BankFailure {
    pub fn new(bank_link_id: impl Into<String>, cause: CoreError) -> Self {
        Self {
            bank_link_id: bank_link_id.into(),
            error: cause.to_details(),
            cause,
        }
    }
}

/// Every account a user has linked, with their combined balance
#[derive(Debug, Clone, Serialize)]
pub struct AccountsOverview {
    pub accounts: Vec<Account>,
    /// Number of accounts that resolved
    pub total_banks: usize,
    pub total_current_balance: f64,
    /// Links that failed to resolve; empty on full success
    pub failures: Vec<BankFailure>,
}

impl AccountsOverview {
    pub fn new(accounts: Vec<Account>, failures: Vec<BankFailure>) -> Self {
        let total_current_balance = accounts.iter().map(|a| a.current_balance).sum();
        Self {
            total_banks: accounts.len(),
            total_current_balance,
            accounts,
            failures,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// All-or-nothing view: the first failure, if any, becomes the error
    pub fn into_complete(self) -> CoreResult<Self> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(failure.cause),
            None => Ok(Self {
                failures: Vec::new(),
                ..self
            }),
        }
    }
}

/// A single account with its merged transaction feed
#[derive(Debug, Clone, Serialize)]
pub struct AccountDetail {
    pub account: Account,
    /// Newest first
    pub transactions: Vec<Transaction>,
    /// Set when the upstream sync stopped early; `transactions` is then partial
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_warning: Option<ErrorDetails>,
    /// Ids dropped because an earlier row already used them
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub duplicate_ids: Vec<String>,
}
