//! Transaction feed endpoints - paging, display formatting, categories

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::Uri;
use axum::Json;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use horizon_core::{count_transaction_categories, paginate, ErrorDetails, Page, Transaction};
use horizon_utils::{
    form_url_query, format_amount, format_date_time, CategoryCount, FormattedDateTime,
    TransactionStatus,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    pub page: Option<usize>,
}

/// A feed row with its display fields
#[derive(Debug, Clone, Serialize)]
pub struct TransactionView {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub status: TransactionStatus,
    pub formatted_amount: String,
    /// Absent when the date could not be parsed
    pub formatted_date: Option<FormattedDateTime>,
}

impl TransactionView {
    pub fn new(transaction: Transaction, now: DateTime<Utc>, offset: FixedOffset) -> Self {
        let formatted_date = transaction
            .timestamp()
            .map(|date| format_date_time(&date.with_timezone(&offset)));
        Self {
            status: transaction.status(now),
            formatted_amount: format_amount(transaction.amount),
            formatted_date,
            transaction,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    #[serde(flatten)]
    pub page: Page<TransactionView>,
    /// Same request with `page` moved forward, absent on the last page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_warning: Option<ErrorDetails>,
}

/// Links to the neighbouring pages, keeping the other query parameters
pub fn page_links(uri: &Uri, page: usize, total_pages: usize) -> (Option<String>, Option<String>) {
    let query = uri.query().unwrap_or("");
    let link = |target: usize| form_url_query(uri.path(), query, "page", &target.to_string());

    let next = (page < total_pages).then(|| link(page + 1));
    let prev = (page > 1).then(|| link((page - 1).min(total_pages.max(1))));
    (next, prev)
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<CategoryCount>,
}

/// Display offset; values outside chrono's range fall back to UTC
pub fn display_offset(utc_offset_minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix())
}

/// `GET /api/accounts/:bank_link_id/transactions?page=N`
pub async fn api_account_transactions(
    State(state): State<AppState>,
    Path(bank_link_id): Path<String>,
    uri: Uri,
    query: Result<Query<TransactionsQuery>, QueryRejection>,
) -> ApiResult<Json<TransactionsResponse>> {
    let Query(query) = query?;
    let detail = state
        .dashboard
        .get_account_detail(&bank_link_id)
        .await
        .map_err(|e| {
            e.log("loading transactions");
            e
        })?;

    let now = Utc::now();
    let offset = display_offset(state.config.display.utc_offset_minutes);
    let page = paginate(
        &detail.transactions,
        query.page.unwrap_or(1),
        state.config.pagination.records_per_page,
    )
    .map(|transaction| TransactionView::new(transaction, now, offset));
    let (next_page, prev_page) = page_links(&uri, page.page, page.total_pages);

    Ok(Json(TransactionsResponse {
        page,
        next_page,
        prev_page,
        sync_warning: detail.sync_warning,
    }))
}

/// `GET /api/accounts/:bank_link_id/categories`
pub async fn api_account_categories(
    State(state): State<AppState>,
    Path(bank_link_id): Path<String>,
) -> ApiResult<Json<CategoriesResponse>> {
    let detail = state
        .dashboard
        .get_account_detail(&bank_link_id)
        .await
        .map_err(|e| {
            e.log("counting categories");
            e
        })?;

    Ok(Json(CategoriesResponse {
        categories: count_transaction_categories(&detail.transactions),
    }))
}
