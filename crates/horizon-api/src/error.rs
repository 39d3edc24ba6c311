//! Error types for horizon-api

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use horizon_core::{CoreError, ErrorCode, ErrorDetails};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Bad request: {message}")]
    BadRequest { message: String },
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Core(error) => match error.code() {
                ErrorCode::NotFound => StatusCode::NOT_FOUND,
                ErrorCode::InvalidIdentifier => StatusCode::BAD_REQUEST,
                ErrorCode::UpstreamError => StatusCode::BAD_GATEWAY,
                ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
                ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            },
        }
    }

    pub fn details(&self) -> ErrorDetails {
        match self {
            ApiError::Core(error) => error.to_details(),
            ApiError::BadRequest { message } => {
                ErrorDetails::new(ErrorCode::InvalidRequest, message.clone())
            }
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest {
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.details() });
        (self.status_code(), Json(body)).into_response()
    }
}

/// Result type for route handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CoreError::NotFound { resource: "bank".to_string() }, StatusCode::NOT_FOUND),
            (
                CoreError::InvalidIdentifier { message: "bad".to_string() },
                StatusCode::BAD_REQUEST,
            ),
            (
                CoreError::Upstream { service: "plaid".to_string(), message: "x".to_string() },
                StatusCode::BAD_GATEWAY,
            ),
            (CoreError::Timeout { service: "plaid".to_string() }, StatusCode::GATEWAY_TIMEOUT),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status_code(), status);
        }
    }

    #[test]
    fn test_bad_request_details() {
        let error = ApiError::BadRequest { message: "page must be a number".to_string() };
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.details().code, ErrorCode::InvalidRequest);
    }
}
