//! Error types for horizon-gateway

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("{service} request failed: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("{service} request timed out")]
    Timeout { service: &'static str },

    #[error("Could not decode {service} response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}

impl GatewayError {
    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        GatewayError::Upstream {
            service,
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        GatewayError::NotFound {
            resource: resource.into(),
        }
    }

    pub fn decode(service: &'static str, message: impl Into<String>) -> Self {
        GatewayError::Decode {
            service,
            message: message.into(),
        }
    }

    /// Stable code for logs and API payloads
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Upstream { .. } => "UPSTREAM_ERROR",
            GatewayError::NotFound { .. } => "NOT_FOUND",
            GatewayError::Timeout { .. } => "TIMEOUT",
            GatewayError::Decode { .. } => "DECODE_ERROR",
        }
    }
}

/// Result type with GatewayError
pub type GatewayResult<T> = Result<T, GatewayError>;
