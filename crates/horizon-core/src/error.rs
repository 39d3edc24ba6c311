//! Error types for horizon-core
//!
//! Every failure surfaced by the dashboard carries a stable code, a
//! severity and, through [`ErrorDetails`], suggestions the UI can show.

use horizon_gateway::GatewayError;
use horizon_utils::UtilsError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Upstream API or document store failed
    UpstreamError,
    /// Requested record does not exist
    NotFound,
    /// External call exceeded its timeout
    Timeout,
    /// Malformed identifier in a request
    InvalidIdentifier,
    /// Malformed query parameters in a request
    InvalidRequest,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::UpstreamError => write!(f, "UPSTREAM_ERROR"),
            ErrorCode::NotFound => write!(f, "NOT_FOUND"),
            ErrorCode::Timeout => write!(f, "TIMEOUT"),
            ErrorCode::InvalidIdentifier => write!(f, "INVALID_IDENTIFIER"),
            ErrorCode::InvalidRequest => write!(f, "INVALID_REQUEST"),
        }
    }
}

/// Detailed error information for API responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    /// Add detail information
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Informational
    Info,
    /// Warning - operation may be affected
    Warning,
    /// Error - operation failed
    Error,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
        }
    }
}

/// Main error type for horizon-core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("{service} request failed: {message}")]
    Upstream { service: String, message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("{service} request timed out")]
    Timeout { service: String },

    #[error("Invalid identifier: {message}")]
    InvalidIdentifier { message: String },
}

impl CoreError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::Upstream { .. } => ErrorCode::UpstreamError,
            CoreError::NotFound { .. } => ErrorCode::NotFound,
            CoreError::Timeout { .. } => ErrorCode::Timeout,
            CoreError::InvalidIdentifier { .. } => ErrorCode::InvalidIdentifier,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::Upstream { .. } => ErrorSeverity::Error,
            CoreError::NotFound { .. } => ErrorSeverity::Info,
            CoreError::Timeout { .. } => ErrorSeverity::Warning,
            CoreError::InvalidIdentifier { .. } => ErrorSeverity::Info,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::Upstream { service, .. } => {
                details = details.with_detail(serde_json::json!({ "service": service }));
                details = details.with_suggestion(
                    "Check the service credentials in the configuration.".to_string(),
                );
                details = details.with_suggestion(
                    "Relinking the bank may be required if its access token expired.".to_string(),
                );
            }
            CoreError::NotFound { .. } => {
                details = details.with_suggestion(
                    "Use /api/users/:user_id/accounts to list the linked banks.".to_string(),
                );
            }
            CoreError::Timeout { service } => {
                details = details.with_detail(serde_json::json!({ "service": service }));
                details = details.with_suggestion(
                    "Retry the request, or raise timeout_secs in the configuration.".to_string(),
                );
            }
            CoreError::InvalidIdentifier { .. } => {
                details = details.with_suggestion(
                    "Shareable ids are base64 and must come from a generated link.".to_string(),
                );
            }
        }

        details
    }

    /// Log this error once, at a level matching its severity
    pub fn log(&self, operation: &str) {
        match self.severity() {
            ErrorSeverity::Info => log::info!("{} failed: [{}] {}", operation, self.code(), self),
            ErrorSeverity::Warning => {
                log::warn!("{} failed: [{}] {}", operation, self.code(), self)
            }
            ErrorSeverity::Error => {
                log::error!("{} failed: [{}] {}", operation, self.code(), self)
            }
        }
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<GatewayError> for CoreError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::Upstream { service, message } => CoreError::Upstream {
                service: service.to_string(),
                message,
            },
            GatewayError::NotFound { resource } => CoreError::NotFound { resource },
            GatewayError::Timeout { service } => CoreError::Timeout {
                service: service.to_string(),
            },
            GatewayError::Decode { service, message } => CoreError::Upstream {
                service: service.to_string(),
                message: format!("unexpected response: {}", message),
            },
        }
    }
}

impl From<UtilsError> for CoreError {
    fn from(error: UtilsError) -> Self {
        CoreError::InvalidIdentifier {
            message: error.to_string(),
        }
    }
}

// ==================== Tests ====================
