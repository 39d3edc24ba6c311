//! Transport helpers shared by the reqwest-backed clients

use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::error::GatewayError;

const PREVIEW_CHAR_LIMIT: usize = 160;

pub(crate) fn build_client(service: &'static str, timeout_secs: u64) -> Result<Client, GatewayError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| GatewayError::upstream(service, format!("could not build HTTP client: {}", e)))
}

pub(crate) fn map_transport_error(service: &'static str, error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout { service }
    } else {
        GatewayError::upstream(service, error.to_string())
    }
}

/// Fallback mapping for a non-2xx response with no recognised error body
pub(crate) fn map_status_error(service: &'static str, status: StatusCode, body: &[u8]) -> GatewayError {
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => GatewayError::Timeout { service },
        _ => {
            let preview = body_preview(body);
            if preview.is_empty() {
                GatewayError::upstream(service, format!("status {}", status.as_u16()))
            } else {
                GatewayError::upstream(service, format!("status {}: {}", status.as_u16(), preview))
            }
        }
    }
}

pub(crate) fn body_preview(body: &[u8]) -> String {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{}...", preview)
    } else {
        preview
    }
}
