//! Account endpoints

use axum::extract::{Path, State};
use axum::Json;
use horizon_core::{AccountDetail, AccountsOverview};

use crate::error::ApiResult;
use crate::AppState;

/// `GET /api/users/:user_id/accounts`
pub async fn api_user_accounts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<AccountsOverview>> {
    let overview = state.dashboard.list_accounts(&user_id).await.map_err(|e| {
        e.log("listing accounts");
        e
    })?;
    Ok(Json(overview))
}

/// `GET /api/accounts/:bank_link_id`
pub async fn api_account_detail(
    State(state): State<AppState>,
    Path(bank_link_id): Path<String>,
) -> ApiResult<Json<AccountDetail>> {
    let detail = state
        .dashboard
        .get_account_detail(&bank_link_id)
        .await
        .map_err(|e| {
            e.log("loading account detail");
            e
        })?;
    Ok(Json(detail))
}
