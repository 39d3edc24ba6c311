//! Account aggregation and transaction merging for the dashboard

pub mod error;
pub mod merge;
pub mod models;
pub mod reports;

use futures_util::future::join_all;
use horizon_gateway::{BankDataRef, BankLink, DocumentStoreRef};

pub use error::{CoreError, CoreResult, ErrorCode, ErrorDetails, ErrorSeverity};
pub use merge::{merge_transactions, MergedTransactions};
pub use models::{
    Account, AccountDetail, AccountsOverview, BankFailure, Direction, Transaction,
    TransactionSource,
};
pub use reports::{count_transaction_categories, paginate, Page};

/// Composes the upstream and the store into dashboard view models.
///
/// Holds no mutable state; every call reads fresh data.
#[derive(Clone)]
pub struct Dashboard {
    bank_data: BankDataRef,
    store: DocumentStoreRef,
}

impl Dashboard {
    pub fn new(bank_data: BankDataRef, store: DocumentStoreRef) -> Self {
        Self { bank_data, store }
    }

    /// Every account linked by `user_id`.
    ///
    /// Links are resolved concurrently. A link that fails is reported in
    /// [`AccountsOverview::failures`] and left out of the totals; only a
    /// failure to list the links fails the call.
    pub async fn list_accounts(&self, user_id: &str) -> CoreResult<AccountsOverview> {
        let links = self.store.list_bank_links(user_id).await?;

        let resolved = join_all(links.iter().map(|link| async move {
            (link, self.resolve_account(link).await)
        }))
        .await;

        let mut accounts = Vec::with_capacity(resolved.len());
        let mut failures = Vec::new();
        for (link, result) in resolved {
            match result {
                Ok(account) => accounts.push(account),
                Err(error) => {
                    error.log(&format!("resolving bank link {}", link.id));
                    failures.push(BankFailure::new(link.id.as_str(), error));
                }
            }
        }

        log::debug!(
            "user {}: {} account(s) resolved, {} failed",
            user_id,
            accounts.len(),
            failures.len()
        );
        Ok(AccountsOverview::new(accounts, failures))
    }

    /// One account with its merged transaction feed.
    ///
    /// Account resolution, the store's transfer lookup and the upstream sync
    /// run concurrently. A sync that stops early still yields the rows it
    /// gathered, with the cause in [`AccountDetail::sync_warning`].
    pub async fn get_account_detail(&self, bank_link_id: &str) -> CoreResult<AccountDetail> {
        let link = self.store.get_bank_link(bank_link_id).await?;

        let (account, transfers, synced) = tokio::join!(
            self.resolve_account(&link),
            self.store.list_transfers_for_bank(&link.id),
            self.bank_data.fetch_synced_transactions(&link.access_token),
        );
        let account = account?;
        let transfers = transfers?;

        let transfers = transfers
            .into_iter()
            .map(|record| merge::normalize_transfer(record, &link.id))
            .collect();
        let synced_rows = synced
            .transactions
            .into_iter()
            .map(merge::normalize_synced)
            .collect();
        let merged = merge_transactions(synced_rows, transfers);

        let sync_warning = synced.warning.map(|warning| {
            let error = CoreError::from(warning);
            error.log(&format!("syncing transactions for bank link {}", link.id));
            error.to_details()
        });

        Ok(AccountDetail {
            account,
            transactions: merged.transactions,
            sync_warning,
            duplicate_ids: merged.duplicate_ids,
        })
    }

    /// Snapshot, then institution. A snapshot without an institution id
    /// resolves with an empty institution.
    async fn resolve_account(&self, link: &BankLink) -> CoreResult<Account> {
        let snapshot = self.bank_data.fetch_account(&link.access_token).await?;

        let (institution_id, institution_name) = match snapshot.institution_id.as_deref() {
            Some(institution_id) => {
                let institution = self.bank_data.fetch_institution(institution_id).await?;
                (institution.institution_id, institution.name)
            }
            None => {
                log::debug!("account {} has no institution id", snapshot.account_id);
                (String::new(), String::new())
            }
        };

        Ok(Account {
            id: snapshot.account_id,
            available_balance: snapshot.available_balance,
            current_balance: snapshot.current_balance.unwrap_or_default(),
            iso_currency_code: snapshot.iso_currency_code,
            institution_id,
            institution_name,
            name: snapshot.name,
            official_name: snapshot.official_name,
            mask: snapshot.mask,
            account_type: snapshot.account_type,
            subtype: snapshot.subtype,
            bank_link_id: link.id.clone(),
            shareable_id: link.shareable_id.clone(),
        })
    }
}

// ==================== Tests ====================

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory gateway fakes shared by the tests in this crate

    use async_trait::async_trait;
    use horizon_gateway::sandbox::sandbox_transactions;
    use horizon_gateway::{
        AccessToken, AccountSnapshot, BankDataSource, BankLink, DocumentStore, GatewayError,
        GatewayResult, Institution, SyncOutcome, SyncPage, TransferRecord,
    };
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct FakeBankData {
        /// Keyed by access token
        pub accounts: HashMap<String, GatewayResult<AccountSnapshot>>,
        pub institutions: HashMap<String, Institution>,
        pub synced: Option<SyncOutcome>,
    }

    impl FakeBankData {
        pub fn with_account(mut self, token: &str, current_balance: f64) -> Self {
            self.accounts.insert(
                token.to_string(),
                Ok(AccountSnapshot {
                    account_id: format!("acc-{}", token),
                    available_balance: Some(current_balance),
                    current_balance: Some(current_balance),
                    iso_currency_code: Some("USD".to_string()),
                    name: format!("Checking {}", token),
                    official_name: None,
                    mask: Some("0000".to_string()),
                    account_type: "depository".to_string(),
                    subtype: Some("checking".to_string()),
                    institution_id: Some("ins_1".to_string()),
                }),
            );
            self.institutions.insert(
                "ins_1".to_string(),
                Institution {
                    institution_id: "ins_1".to_string(),
                    name: "First Platypus Bank".to_string(),
                },
            );
            self
        }

        pub fn with_failing_account(mut self, token: &str, error: GatewayError) -> Self {
            self.accounts.insert(token.to_string(), Err(error));
            self
        }
    }

    #[async_trait]
    impl BankDataSource for FakeBankData {
        async fn fetch_account(&self, token: &AccessToken) -> GatewayResult<AccountSnapshot> {
            self.accounts
                .get(token.expose())
                .cloned()
                .unwrap_or_else(|| Err(GatewayError::not_found("account")))
        }

        async fn fetch_institution(&self, institution_id: &str) -> GatewayResult<Institution> {
            self.institutions
                .get(institution_id)
                .cloned()
                .ok_or_else(|| GatewayError::not_found(institution_id))
        }

        async fn sync_page(&self, _: &AccessToken, _: Option<&str>) -> GatewayResult<SyncPage> {
            Err(GatewayError::upstream("fake", "paging is not scripted"))
        }

        async fn fetch_synced_transactions(&self, _: &AccessToken) -> SyncOutcome {
            self.synced
                .clone()
                .unwrap_or_else(|| SyncOutcome::complete(sandbox_transactions()))
        }
    }

    #[derive(Default)]
    pub struct FakeStore {
        pub links: Vec<BankLink>,
        pub transfers: Vec<TransferRecord>,
        pub unavailable: bool,
    }

    impl FakeStore {
        pub fn with_link(mut self, id: &str, user_id: &str, token: &str) -> Self {
            self.links.push(BankLink {
                id: id.to_string(),
                user_id: user_id.to_string(),
                bank_id: format!("item-{}", id),
                account_id: format!("acc-{}", token),
                access_token: AccessToken::new(token),
                shareable_id: horizon_utils::encode_id(&format!("acc-{}", token)),
            });
            self
        }

        fn check(&self) -> GatewayResult<()> {
            if self.unavailable {
                Err(GatewayError::Timeout { service: "appwrite" })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl DocumentStore for FakeStore {
        async fn list_bank_links(&self, user_id: &str) -> GatewayResult<Vec<BankLink>> {
            self.check()?;
            Ok(self
                .links
                .iter()
                .filter(|link| link.user_id == user_id)
                .cloned()
                .collect())
        }

        async fn get_bank_link(&self, bank_link_id: &str) -> GatewayResult<BankLink> {
            self.check()?;
            self.links
                .iter()
                .find(|link| link.id == bank_link_id)
                .cloned()
                .ok_or_else(|| GatewayError::not_found(format!("bank link {}", bank_link_id)))
        }

        async fn list_transfers_for_bank(
            &self,
            bank_link_id: &str,
        ) -> GatewayResult<Vec<TransferRecord>> {
            self.check()?;
            Ok(self
                .transfers
                .iter()
                .filter(|t| t.sender_bank_id == bank_link_id || t.receiver_bank_id == bank_link_id)
                .cloned()
                .collect())
        }
    }

    pub fn transfer(id: &str, sender: &str, receiver: &str, created_at: &str) -> TransferRecord {
        TransferRecord {
            id: id.to_string(),
            name: format!("Transfer {}", id),
            amount: 25.0,
            channel: "online".to_string(),
            category: "Transfer".to_string(),
            sender_bank_id: sender.to_string(),
            receiver_bank_id: receiver.to_string(),
            created_at: created_at.to_string(),
        }
    }
}
