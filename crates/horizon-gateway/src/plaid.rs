//! Reqwest-backed client for the financial data API.
//!
//! Requests are JSON POSTs authenticated with the client id and secret
//! headers. Responses are decoded into transport DTOs and then mapped into
//! the gateway records in one pass.

use async_trait::async_trait;
use horizon_config::UpstreamConfig;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult};
use crate::http::{build_client, map_status_error, map_transport_error};
use crate::sandbox::sandbox_transactions;
use crate::types::{
    AccessToken, AccountSnapshot, Institution, SyncOutcome, SyncPage, SyncedTransaction,
};
use crate::{sync_all, BankDataSource};

const SERVICE: &str = "plaid";

/// Upstream error codes that mean the requested record does not exist
const NOT_FOUND_CODES: [&str; 2] = ["INVALID_INSTITUTION", "INSTITUTION_NOT_FOUND"];

pub struct PlaidClient {
    client: Client,
    base_url: String,
    client_id: String,
    secret: String,
    country_codes: Vec<String>,
    sandbox_transactions: bool,
}

impl PlaidClient {
    /// Build a client from the `upstream` config section
    pub fn new(config: &UpstreamConfig) -> GatewayResult<Self> {
        Ok(Self {
            client: build_client(SERVICE, config.timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            secret: config.secret.clone(),
            country_codes: config.country_codes.clone(),
            sandbox_transactions: config.use_sandbox_transactions,
        })
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> GatewayResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("PLAID-CLIENT-ID", self.client_id.as_str())
            .header("PLAID-SECRET", self.secret.as_str())
            .json(body)
            .send()
            .await
            .map_err(|e| map_transport_error(SERVICE, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_transport_error(SERVICE, e))?;
        if !status.is_success() {
            return Err(map_plaid_error(status, body.as_ref()));
        }

        serde_json::from_slice(body.as_ref())
            .map_err(|e| GatewayError::decode(SERVICE, format!("{}: {}", path, e)))
    }
}

#[async_trait]
impl BankDataSource for PlaidClient {
    async fn fetch_account(&self, access_token: &AccessToken) -> GatewayResult<AccountSnapshot> {
        let request = AccessTokenRequest {
            access_token: access_token.expose(),
        };
        let response: AccountsGetResponseDto = self.post("/accounts/get", &request).await?;
        response.into_primary_account()
    }

    async fn fetch_institution(&self, institution_id: &str) -> GatewayResult<Institution> {
        let request = InstitutionRequest {
            institution_id,
            country_codes: &self.country_codes,
        };
        let response: InstitutionResponseDto =
            self.post("/institutions/get_by_id", &request).await?;
        Ok(Institution {
            institution_id: response.institution.institution_id,
            name: response.institution.name,
        })
    }

    async fn sync_page(
        &self,
        access_token: &AccessToken,
        cursor: Option<&str>,
    ) -> GatewayResult<SyncPage> {
        let request = SyncRequest {
            access_token: access_token.expose(),
            cursor,
        };
        let response: SyncResponseDto = self.post("/transactions/sync", &request).await?;
        Ok(response.into_page())
    }

    async fn fetch_synced_transactions(&self, access_token: &AccessToken) -> SyncOutcome {
        if self.sandbox_transactions {
            log::debug!("serving sandbox transactions instead of syncing");
            return SyncOutcome::complete(sandbox_transactions());
        }
        sync_all(self, access_token).await
    }
}

fn map_plaid_error(status: StatusCode, body: &[u8]) -> GatewayError {
    match serde_json::from_slice::<PlaidErrorDto>(body) {
        Ok(error) if NOT_FOUND_CODES.contains(&error.error_code.as_str()) => {
            GatewayError::not_found(error.error_message)
        }
        Ok(error) => GatewayError::upstream(
            SERVICE,
            format!(
                "status {}: {} ({})",
                status.as_u16(),
                error.error_code,
                error.error_message
            ),
        ),
        Err(_) => map_status_error(SERVICE, status, body),
    }
}

// ==================== Transport DTOs ====================

#[derive(Serialize)]
struct AccessTokenRequest<'a> {
    access_token: &'a str,
}

#[derive(Serialize)]
struct InstitutionRequest<'a> {
    institution_id: &'a str,
    country_codes: &'a [String],
}

#[derive(Serialize)]
struct SyncRequest<'a> {
    access_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PlaidErrorDto {
    #[serde(default)]
    error_code: String,
    #[serde(default)]
    error_message: String,
}

#[derive(Debug, Deserialize)]
struct AccountsGetResponseDto {
    #[serde(default)]
    accounts: Vec<AccountDto>,
    item: Option<ItemDto>,
}

#[derive(Debug, Deserialize)]
struct AccountDto {
    account_id: String,
    balances: BalancesDto,
    mask: Option<String>,
    #[serde(default)]
    name: String,
    official_name: Option<String>,
    #[serde(rename = "type", default)]
    account_type: String,
    subtype: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BalancesDto {
    available: Option<f64>,
    current: Option<f64>,
    iso_currency_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemDto {
    institution_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InstitutionResponseDto {
    institution: InstitutionDto,
}

#[derive(Debug, Deserialize)]
struct InstitutionDto {
    institution_id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct SyncResponseDto {
    #[serde(default)]
    added: Vec<TransactionDto>,
    #[serde(default)]
    next_cursor: String,
    #[serde(default)]
    has_more: bool,
}

#[derive(Debug, Deserialize)]
struct TransactionDto {
    transaction_id: String,
    #[serde(default)]
    account_id: String,
    amount: f64,
    date: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    payment_channel: String,
    #[serde(default)]
    pending: bool,
    category: Option<Vec<String>>,
    merchant_name: Option<String>,
    logo_url: Option<String>,
}

impl AccountsGetResponseDto {
    fn into_primary_account(self) -> GatewayResult<AccountSnapshot> {
        let institution_id = self.item.and_then(|item| item.institution_id);
        let account = self
            .accounts
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::not_found("account for access token"))?;

        Ok(AccountSnapshot {
            account_id: account.account_id,
            available_balance: account.balances.available,
            current_balance: account.balances.current,
            iso_currency_code: account.balances.iso_currency_code,
            name: account.name,
            official_name: account.official_name,
            mask: account.mask,
            account_type: account.account_type,
            subtype: account.subtype,
            institution_id,
        })
    }
}

impl SyncResponseDto {
    fn into_page(self) -> SyncPage {
        SyncPage {
            added: self.added.into_iter().map(TransactionDto::into_synced).collect(),
            next_cursor: self.next_cursor,
            has_more: self.has_more,
        }
    }
}

impl TransactionDto {
    fn into_synced(self) -> SyncedTransaction {
        SyncedTransaction {
            id: self.transaction_id,
            account_id: self.account_id,
            name: self.name,
            amount: self.amount,
            date: self.date,
            payment_channel: self.payment_channel,
            pending: self.pending,
            category: self
                .category
                .and_then(|categories| categories.into_iter().next())
                .unwrap_or_default(),
            merchant_name: self.merchant_name,
            logo_url: self.logo_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(base_url: String, sandbox: bool) -> PlaidClient {
        let config = UpstreamConfig {
            base_url,
            client_id: "client-123".to_string(),
            secret: "secret-456".to_string(),
            use_sandbox_transactions: sandbox,
            ..UpstreamConfig::default()
        };
        PlaidClient::new(&config).unwrap()
    }

    fn token() -> AccessToken {
        AccessToken::new("access-sandbox-123")
    }

    #[tokio::test]
    async fn test_fetch_account_takes_first_account_and_item_institution() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/accounts/get");
                then.status(200).json_body(json!({
                    "accounts": [
                        {
                            "account_id": "acc-primary",
                            "balances": { "available": 100.0, "current": 110.5, "iso_currency_code": "USD" },
                            "mask": "0000",
                            "name": "Plaid Checking",
                            "official_name": "Plaid Gold Standard 0% Interest Checking",
                            "type": "depository",
                            "subtype": "checking"
                        },
                        {
                            "account_id": "acc-secondary",
                            "balances": { "available": null, "current": 5.0 },
                            "name": "Plaid Saving",
                            "type": "depository"
                        }
                    ],
                    "item": { "institution_id": "ins_109508" }
                }));
            })
            .await;

        let account = client_for(server.base_url(), false)
            .fetch_account(&token())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(account.account_id, "acc-primary");
        assert_eq!(account.current_balance, Some(110.5));
        assert_eq!(account.subtype.as_deref(), Some("checking"));
        assert_eq!(account.institution_id.as_deref(), Some("ins_109508"));
    }

    #[tokio::test]
    async fn test_fetch_account_without_accounts_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/accounts/get");
                then.status(200).json_body(json!({ "accounts": [], "item": null }));
            })
            .await;

        let error = client_for(server.base_url(), false)
            .fetch_account(&token())
            .await
            .unwrap_err();

        assert!(matches!(error, GatewayError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_invalid_token_maps_to_upstream_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/accounts/get");
                then.status(400).json_body(json!({
                    "error_type": "INVALID_INPUT",
                    "error_code": "INVALID_ACCESS_TOKEN",
                    "error_message": "provided access token is in an invalid format"
                }));
            })
            .await;

        let error = client_for(server.base_url(), false)
            .fetch_account(&token())
            .await
            .unwrap_err();

        match error {
            GatewayError::Upstream { service, message } => {
                assert_eq!(service, "plaid");
                assert!(message.contains("INVALID_ACCESS_TOKEN"));
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_institution_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/institutions/get_by_id");
                then.status(400).json_body(json!({
                    "error_type": "INVALID_INPUT",
                    "error_code": "INVALID_INSTITUTION",
                    "error_message": "invalid institution_id provided"
                }));
            })
            .await;

        let error = client_for(server.base_url(), false)
            .fetch_institution("ins_nope")
            .await
            .unwrap_err();

        assert!(matches!(error, GatewayError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_fetch_institution() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/institutions/get_by_id");
                then.status(200).json_body(json!({
                    "institution": { "institution_id": "ins_109508", "name": "First Platypus Bank" }
                }));
            })
            .await;

        let institution = client_for(server.base_url(), false)
            .fetch_institution("ins_109508")
            .await
            .unwrap();

        assert_eq!(institution.name, "First Platypus Bank");
    }

    #[tokio::test]
    async fn test_sync_single_page() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/transactions/sync");
                then.status(200).json_body(json!({
                    "added": [
                        {
                            "transaction_id": "tx-1",
                            "account_id": "acc-primary",
                            "amount": 12.5,
                            "date": "2025-05-01",
                            "name": "Uber 063015 SF**POOL**",
                            "payment_channel": "online",
                            "pending": false,
                            "category": ["Travel", "Taxi"],
                            "logo_url": "https://logos.example/uber.png"
                        },
                        {
                            "transaction_id": "tx-2",
                            "amount": -500.0,
                            "date": "2025-05-02",
                            "name": "United Airlines",
                            "category": null
                        }
                    ],
                    "next_cursor": "cursor-1",
                    "has_more": false
                }));
            })
            .await;

        let outcome = client_for(server.base_url(), false)
            .fetch_synced_transactions(&token())
            .await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.transactions.len(), 2);
        assert_eq!(outcome.transactions[0].category, "Travel");
        assert_eq!(
            outcome.transactions[0].logo_url.as_deref(),
            Some("https://logos.example/uber.png")
        );
        assert_eq!(outcome.transactions[1].category, "");
    }

    #[tokio::test]
    async fn test_sync_upstream_outage_yields_empty_outcome() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/transactions/sync");
                then.status(503).body("service unavailable");
            })
            .await;

        let outcome = client_for(server.base_url(), false)
            .fetch_synced_transactions(&token())
            .await;

        assert!(outcome.transactions.is_empty());
        assert_eq!(
            outcome.warning,
            Some(GatewayError::upstream("plaid", "status 503: service unavailable"))
        );
    }

    #[tokio::test]
    async fn test_sandbox_mode_skips_the_network() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/transactions/sync");
                then.status(500);
            })
            .await;

        let outcome = client_for(server.base_url(), true)
            .fetch_synced_transactions(&token())
            .await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.transactions.len(), 7);
        mock.assert_hits_async(0).await;
    }
}
