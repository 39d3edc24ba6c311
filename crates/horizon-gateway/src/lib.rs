//! Clients for the financial data API and the document store
//!
//! The rest of the workspace talks to both services through the
//! [`BankDataSource`] and [`DocumentStore`] traits. The reqwest-backed
//! implementations live in [`plaid`] and [`appwrite`].

use async_trait::async_trait;
use std::sync::Arc;

pub mod appwrite;
pub mod error;
mod http;
pub mod plaid;
pub mod sandbox;
pub mod types;

pub use appwrite::AppwriteStore;
pub use error::{GatewayError, GatewayResult};
pub use plaid::PlaidClient;
pub use types::{
    AccessToken, AccountSnapshot, BankLink, Institution, SyncOutcome, SyncPage,
    SyncedTransaction, TransferRecord,
};

/// Shared handle to the upstream client
pub type BankDataRef = Arc<dyn BankDataSource>;

/// Shared handle to the document store client
pub type DocumentStoreRef = Arc<dyn DocumentStore>;

// ==================== Upstream ====================

/// Read access to the financial data aggregation API
#[async_trait]
pub trait BankDataSource: Send + Sync {
    /// Primary account behind `access_token`
    async fn fetch_account(&self, access_token: &AccessToken) -> GatewayResult<AccountSnapshot>;

    /// Display metadata for an institution
    async fn fetch_institution(&self, institution_id: &str) -> GatewayResult<Institution>;

    /// One page of the incremental transaction sync, starting after `cursor`
    async fn sync_page(
        &self,
        access_token: &AccessToken,
        cursor: Option<&str>,
    ) -> GatewayResult<SyncPage>;

    /// Every transaction available for `access_token`, best effort.
    ///
    /// Never fails: a page error ends the sync and is returned alongside
    /// the transactions gathered so far.
    async fn fetch_synced_transactions(&self, access_token: &AccessToken) -> SyncOutcome {
        sync_all(self, access_token).await
    }
}

/// Drive [`BankDataSource::sync_page`] until the upstream reports no more pages.
///
/// Pages are requested one at a time since each cursor comes from the
/// previous response.
pub async fn sync_all<S>(source: &S, access_token: &AccessToken) -> SyncOutcome
where
    S: BankDataSource + ?Sized,
{
    let mut transactions = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = match source.sync_page(access_token, cursor.as_deref()).await {
            Ok(page) => page,
            Err(error) => {
                // Reported by whoever consumes the warning
                log::debug!(
                    "transaction sync stopped after {} page(s) with {} transaction(s)",
                    pages,
                    transactions.len()
                );
                return SyncOutcome::partial(transactions, error);
            }
        };

        pages += 1;
        transactions.extend(page.added);

        if !page.has_more {
            break;
        }
        if page.next_cursor.is_empty() {
            let error = GatewayError::upstream(
                "transactions sync",
                "more pages were reported without a cursor to fetch them",
            );
            log::debug!("transaction sync stopped after {} page(s) without a cursor", pages);
            return SyncOutcome::partial(transactions, error);
        }
        cursor = Some(page.next_cursor);
    }

    log::debug!(
        "transaction sync finished: {} page(s), {} transaction(s)",
        pages,
        transactions.len()
    );
    SyncOutcome::complete(transactions)
}

// ==================== Document store ====================

/// Read access to bank links and transfer records
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All bank links owned by `user_id`
    async fn list_bank_links(&self, user_id: &str) -> GatewayResult<Vec<BankLink>>;

    /// One bank link by internal id
    async fn get_bank_link(&self, bank_link_id: &str) -> GatewayResult<BankLink>;

    /// Transfers where the bank link is the sender or the receiver
    async fn list_transfers_for_bank(&self, bank_link_id: &str)
        -> GatewayResult<Vec<TransferRecord>>;
}
