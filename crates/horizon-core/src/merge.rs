//! Transaction merge pipeline
//!
//! Synced and transfer rows are normalised into [`Transaction`], concatenated
//! (synced first), deduplicated by id and stable-sorted newest first.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use horizon_gateway::{SyncedTransaction, TransferRecord};

use crate::models::{Direction, Transaction, TransactionSource};

/// Output of [`merge_transactions`]
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTransactions {
    pub transactions: Vec<Transaction>,
    /// Ids of rows dropped because an earlier row had the same id
    pub duplicate_ids: Vec<String>,
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (UTC midnight)
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Upstream rows always leave the account
pub fn normalize_synced(transaction: SyncedTransaction) -> Transaction {
    Transaction {
        id: transaction.id,
        name: transaction.name,
        amount: transaction.amount,
        date: transaction.date,
        payment_channel: transaction.payment_channel,
        category: transaction.category,
        direction: Direction::Debit,
        image: transaction.logo_url,
        pending: transaction.pending,
        source: TransactionSource::Synced,
    }
}

/// A transfer is a debit for the sending bank and a credit for anyone else
pub fn normalize_transfer(record: TransferRecord, bank_link_id: &str) -> Transaction {
    let direction = if record.sender_bank_id == bank_link_id {
        Direction::Debit
    } else {
        Direction::Credit
    };

    Transaction {
        id: record.id,
        name: record.name,
        amount: record.amount,
        date: record.created_at,
        payment_channel: record.channel,
        category: record.category,
        direction,
        image: None,
        pending: false,
        source: TransactionSource::Transfer,
    }
}

/// Newest first; undated rows go last
fn newest_first(a: &Option<DateTime<Utc>>, b: &Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Merge both sources into one feed sorted by date descending.
///
/// The sort is stable, so rows with equal dates keep concatenation order.
pub fn merge_transactions(
    synced: Vec<Transaction>,
    transfers: Vec<Transaction>,
) -> MergedTransactions {
    let mut seen = HashSet::new();
    let mut duplicate_ids = Vec::new();
    let mut keyed: Vec<(Option<DateTime<Utc>>, Transaction)> = Vec::new();

    for transaction in synced.into_iter().chain(transfers) {
        if !seen.insert(transaction.id.clone()) {
            log::warn!("dropping duplicate transaction id {}", transaction.id);
            duplicate_ids.push(transaction.id);
            continue;
        }
        keyed.push((transaction.timestamp(), transaction));
    }

    keyed.sort_by(|(a, _), (b, _)| newest_first(a, b));

    MergedTransactions {
        transactions: keyed.into_iter().map(|(_, t)| t).collect(),
        duplicate_ids,
    }
}
