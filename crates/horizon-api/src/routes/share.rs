//! Shareable identifier resolution

use axum::extract::Path;
use axum::Json;
use horizon_core::CoreError;
use horizon_utils::decode_id;
use serde::Serialize;

use crate::error::ApiResult;

#[derive(Debug, Serialize)]
pub struct SharedAccount {
    pub account_id: String,
}

/// `GET /api/share/:encoded_id`
pub async fn api_resolve_share(Path(encoded_id): Path<String>) -> ApiResult<Json<SharedAccount>> {
    let account_id = decode_id(&encoded_id).map_err(CoreError::from)?;
    Ok(Json(SharedAccount { account_id }))
}
