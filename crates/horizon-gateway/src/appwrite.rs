//! Document store client
//!
//! Bank links and transfers are read through the REST documents endpoint of
//! the configured database. Filters are passed as `queries[]` parameters in
//! the store's JSON query syntax. List calls page with `limit`/`offset`
//! until the reported `total` has been collected.

use std::collections::HashSet;

use async_trait::async_trait;
use horizon_config::StoreConfig;
use reqwest::{Client, StatusCode};
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::json;

use crate::error::{GatewayError, GatewayResult};
use crate::http::{build_client, map_status_error, map_transport_error};
use crate::types::{AccessToken, BankLink, TransferRecord};
use crate::DocumentStore;

const SERVICE: &str = "appwrite";

pub struct AppwriteStore {
    client: Client,
    endpoint: String,
    project_id: String,
    api_key: String,
    database_id: String,
    bank_collection_id: String,
    transaction_collection_id: String,
    page_size: u32,
}

impl AppwriteStore {
    /// Build a client from the `store` config section
    pub fn new(config: &StoreConfig) -> GatewayResult<Self> {
        Ok(Self {
            client: build_client(SERVICE, config.timeout_secs)?,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
            database_id: config.database_id.clone(),
            bank_collection_id: config.bank_collection_id.clone(),
            transaction_collection_id: config.transaction_collection_id.clone(),
            page_size: config.page_size.max(1),
        })
    }

    fn documents_url(&self, collection_id: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint, self.database_id, collection_id
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        queries: &[String],
        resource: &str,
    ) -> GatewayResult<T> {
        let params: Vec<(&str, &str)> = queries.iter().map(|q| ("queries[]", q.as_str())).collect();

        let response = self
            .client
            .get(url)
            .header("X-Appwrite-Project", self.project_id.as_str())
            .header("X-Appwrite-Key", self.api_key.as_str())
            .query(&params)
            .send()
            .await
            .map_err(|e| map_transport_error(SERVICE, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_transport_error(SERVICE, e))?;
        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::not_found(resource));
        }
        if !status.is_success() {
            return Err(map_status_error(SERVICE, status, body.as_ref()));
        }

        serde_json::from_slice(body.as_ref())
            .map_err(|e| GatewayError::decode(SERVICE, format!("{}: {}", resource, e)))
    }

    async fn list_documents<T: DeserializeOwned>(
        &self,
        collection_id: &str,
        queries: Vec<String>,
        resource: &str,
    ) -> GatewayResult<Vec<T>> {
        let url = self.documents_url(collection_id);
        let mut documents = Vec::new();

        loop {
            let mut page_queries = queries.clone();
            page_queries.push(limit_query(self.page_size));
            page_queries.push(offset_query(documents.len()));

            let page: DocumentList<T> = self.get_json(url.clone(), &page_queries, resource).await?;
            let fetched = page.documents.len();
            documents.extend(page.documents);

            if documents.len() as u64 >= page.total {
                break;
            }
            if fetched == 0 {
                log::warn!(
                    "{} reported {} {} but stopped returning them after {}",
                    SERVICE,
                    page.total,
                    resource,
                    documents.len()
                );
                break;
            }
        }

        Ok(documents)
    }

    async fn transfers_where(
        &self,
        attribute: &str,
        bank_link_id: &str,
    ) -> GatewayResult<Vec<TransferDocument>> {
        self.list_documents(
            &self.transaction_collection_id,
            vec![equal_query(attribute, bank_link_id)],
            "transfers",
        )
        .await
    }
}

#[async_trait]
impl DocumentStore for AppwriteStore {
    async fn list_bank_links(&self, user_id: &str) -> GatewayResult<Vec<BankLink>> {
        let documents: Vec<BankDocument> = self
            .list_documents(
                &self.bank_collection_id,
                vec![equal_query("userId", user_id)],
                "bank links",
            )
            .await?;
        log::debug!("user {} has {} bank link(s)", user_id, documents.len());
        Ok(documents.into_iter().map(BankDocument::into_link).collect())
    }

    async fn get_bank_link(&self, bank_link_id: &str) -> GatewayResult<BankLink> {
        let url = format!(
            "{}/{}",
            self.documents_url(&self.bank_collection_id),
            urlencoding::encode(bank_link_id)
        );
        let document: BankDocument = self
            .get_json(url, &[], &format!("bank link {}", bank_link_id))
            .await?;
        Ok(document.into_link())
    }

    async fn list_transfers_for_bank(
        &self,
        bank_link_id: &str,
    ) -> GatewayResult<Vec<TransferRecord>> {
        let (sent, received) = tokio::try_join!(
            self.transfers_where("senderBankId", bank_link_id),
            self.transfers_where("receiverBankId", bank_link_id),
        )?;
        Ok(dedup_transfers(sent.into_iter().chain(received)))
    }
}

/// Store filter matching documents whose `attribute` equals `value`
fn equal_query(attribute: &str, value: &str) -> String {
    json!({ "method": "equal", "attribute": attribute, "values": [value] }).to_string()
}

fn limit_query(limit: u32) -> String {
    json!({ "method": "limit", "values": [limit] }).to_string()
}

fn offset_query(offset: usize) -> String {
    json!({ "method": "offset", "values": [offset] }).to_string()
}

/// A self-transfer matches both queries; keep the first copy of each id
fn dedup_transfers<I>(documents: I) -> Vec<TransferRecord>
where
    I: IntoIterator<Item = TransferDocument>,
{
    let mut seen = HashSet::new();
    documents
        .into_iter()
        .filter(|doc| seen.insert(doc.id.clone()))
        .map(TransferDocument::into_record)
        .collect()
}

// ==================== Documents ====================

#[derive(Debug, Deserialize)]
struct DocumentList<T> {
    /// Matching documents across all pages
    #[serde(default)]
    total: u64,
    #[serde(default = "Vec::new")]
    documents: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BankDocument {
    #[serde(rename = "$id")]
    id: String,
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    bank_id: String,
    #[serde(default)]
    account_id: String,
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    shareable_id: String,
}

impl BankDocument {
    fn into_link(self) -> BankLink {
        BankLink {
            id: self.id,
            user_id: self.user_id,
            bank_id: self.bank_id,
            account_id: self.account_id,
            access_token: AccessToken::new(self.access_token),
            shareable_id: self.shareable_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferDocument {
    #[serde(rename = "$id")]
    id: String,
    #[serde(rename = "$createdAt", default)]
    created_at: String,
    #[serde(default)]
    name: String,
    #[serde(deserialize_with = "number_or_string")]
    amount: f64,
    #[serde(default)]
    channel: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    sender_bank_id: String,
    #[serde(default)]
    receiver_bank_id: String,
}

impl TransferDocument {
    fn into_record(self) -> TransferRecord {
        TransferRecord {
            id: self.id,
            name: self.name,
            amount: self.amount,
            channel: self.channel,
            category: self.category,
            sender_bank_id: self.sender_bank_id,
            receiver_bank_id: self.receiver_bank_id,
            created_at: self.created_at,
        }
    }
}

/// Amounts are stored either as numbers or as decimal strings
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
    }

    match Amount::deserialize(deserializer)? {
        Amount::Number(value) => Ok(value),
        Amount::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid amount '{}'", text))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn store_for(endpoint: String) -> AppwriteStore {
        store_with_page_size(endpoint, 100)
    }

    fn store_with_page_size(endpoint: String, page_size: u32) -> AppwriteStore {
        let config = StoreConfig {
            endpoint,
            project_id: "proj".to_string(),
            api_key: "key".to_string(),
            database_id: "db".to_string(),
            page_size,
            ..StoreConfig::default()
        };
        AppwriteStore::new(&config).unwrap()
    }

    fn bank_json(id: &str) -> serde_json::Value {
        json!({
            "$id": id,
            "userId": "user-1",
            "bankId": format!("item-{}", id),
            "accountId": format!("acc-{}", id),
            "accessToken": format!("access-{}", id),
            "shareableId": ""
        })
    }

    fn transfer_json(id: &str, sender: &str, receiver: &str) -> serde_json::Value {
        json!({
            "$id": id,
            "$createdAt": "2025-05-16T09:30:00.000+00:00",
            "name": "Rent share",
            "amount": "120.50",
            "channel": "online",
            "category": "Transfer",
            "senderBankId": sender,
            "receiverBankId": receiver
        })
    }

    #[test]
    fn test_equal_query_format() {
        let query: serde_json::Value = serde_json::from_str(&equal_query("userId", "u-1")).unwrap();
        assert_eq!(
            query,
            json!({ "method": "equal", "attribute": "userId", "values": ["u-1"] })
        );
    }

    #[test]
    fn test_amount_accepts_numbers_and_strings() {
        let numeric: TransferDocument =
            serde_json::from_value(json!({ "$id": "t1", "amount": 42.5 })).unwrap();
        let textual: TransferDocument =
            serde_json::from_value(json!({ "$id": "t2", "amount": " 17.25 " })).unwrap();
        let invalid = serde_json::from_value::<TransferDocument>(json!({ "$id": "t3", "amount": "lots" }));

        assert_eq!(numeric.amount, 42.5);
        assert_eq!(textual.amount, 17.25);
        assert!(invalid.is_err());
    }

    #[tokio::test]
    async fn test_list_bank_links() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/databases/db/collections/banks/documents")
                    .header("X-Appwrite-Project", "proj");
                then.status(200).json_body(json!({
                    "total": 2,
                    "documents": [
                        {
                            "$id": "bank-1",
                            "userId": "user-1",
                            "bankId": "item-1",
                            "accountId": "acc-1",
                            "accessToken": "access-1",
                            "shareableId": "YWNjLTE="
                        },
                        {
                            "$id": "bank-2",
                            "userId": "user-1",
                            "bankId": "item-2",
                            "accountId": "acc-2",
                            "accessToken": "access-2",
                            "shareableId": "YWNjLTI="
                        }
                    ]
                }));
            })
            .await;

        let links = store_for(server.base_url())
            .list_bank_links("user-1")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].id, "bank-2");
        assert_eq!(links[1].access_token.expose(), "access-2");
    }

    #[tokio::test]
    async fn test_list_pages_until_total_is_collected() {
        let server = MockServer::start_async().await;
        let first = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/databases/db/collections/banks/documents")
                    .query_param("queries[]", offset_query(0));
                then.status(200).json_body(json!({
                    "total": 3,
                    "documents": [bank_json("bank-1"), bank_json("bank-2")]
                }));
            })
            .await;
        let second = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/databases/db/collections/banks/documents")
                    .query_param("queries[]", limit_query(2))
                    .query_param("queries[]", offset_query(2));
                then.status(200).json_body(json!({
                    "total": 3,
                    "documents": [bank_json("bank-3")]
                }));
            })
            .await;

        let links = store_with_page_size(server.base_url(), 2)
            .list_bank_links("user-1")
            .await
            .unwrap();

        first.assert_hits_async(1).await;
        second.assert_hits_async(1).await;
        let ids: Vec<&str> = links.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["bank-1", "bank-2", "bank-3"]);
    }

    #[tokio::test]
    async fn test_list_stops_when_store_runs_dry() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/databases/db/collections/banks/documents")
                    .query_param("queries[]", offset_query(0));
                then.status(200).json_body(json!({
                    "total": 5,
                    "documents": [bank_json("bank-1")]
                }));
            })
            .await;
        let empty = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/databases/db/collections/banks/documents")
                    .query_param("queries[]", offset_query(1));
                then.status(200).json_body(json!({ "total": 5, "documents": [] }));
            })
            .await;

        let links = store_with_page_size(server.base_url(), 2)
            .list_bank_links("user-1")
            .await
            .unwrap();

        empty.assert_hits_async(1).await;
        assert_eq!(links.len(), 1);
    }

    #[tokio::test]
    async fn test_get_bank_link_missing_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/databases/db/collections/banks/documents/missing");
                then.status(404).json_body(json!({
                    "message": "Document with the requested ID could not be found.",
                    "code": 404,
                    "type": "document_not_found"
                }));
            })
            .await;

        let error = store_for(server.base_url())
            .get_bank_link("missing")
            .await
            .unwrap_err();

        assert!(matches!(error, GatewayError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_self_transfer_is_returned_once() {
        let server = MockServer::start_async().await;
        // Both the sender and the receiver query see the same documents
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/databases/db/collections/transactions/documents");
                then.status(200).json_body(json!({
                    "total": 2,
                    "documents": [
                        transfer_json("tr-1", "bank-1", "bank-1"),
                        transfer_json("tr-2", "bank-1", "bank-9")
                    ]
                }));
            })
            .await;

        let transfers = store_for(server.base_url())
            .list_transfers_for_bank("bank-1")
            .await
            .unwrap();

        mock.assert_hits_async(2).await;
        let ids: Vec<&str> = transfers.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["tr-1", "tr-2"]);
        assert_eq!(transfers[0].amount, 120.5);
        assert_eq!(transfers[0].created_at, "2025-05-16T09:30:00.000+00:00");
    }

    #[tokio::test]
    async fn test_server_error_maps_to_upstream() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(500).body("");
            })
            .await;

        let error = store_for(server.base_url())
            .list_transfers_for_bank("bank-1")
            .await
            .unwrap_err();

        assert_eq!(error, GatewayError::upstream("appwrite", "status 500"));
    }
}
