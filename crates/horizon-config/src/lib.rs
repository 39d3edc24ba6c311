//! Configuration management for horizon
//!
//! This module handles loading, validation, and management of
//! horizon configuration from YAML files. Credentials for the
//! upstream API and the document store can also be supplied through
//! environment variables so they stay out of the config file.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use error::{ConfigError, ConfigErrorCode, ConfigResult};

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8081
}

/// Financial data API (upstream) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the upstream API
    #[serde(default = "default_upstream_url")]
    pub base_url: String,
    /// Client id sent with every request
    #[serde(default)]
    pub client_id: String,
    /// Client secret sent with every request
    #[serde(default)]
    pub secret: String,
    /// Country codes used to scope institution lookups
    #[serde(default = "default_country_codes")]
    pub country_codes: Vec<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Serve the canned sandbox transactions instead of calling the sync endpoint
    #[serde(default = "default_false")]
    pub use_sandbox_transactions: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_url(),
            client_id: String::new(),
            secret: String::new(),
            country_codes: default_country_codes(),
            timeout_secs: default_timeout_secs(),
            use_sandbox_transactions: false,
        }
    }
}

fn default_upstream_url() -> String {
    "https://sandbox.plaid.com".to_string()
}

fn default_country_codes() -> Vec<String> {
    vec!["US".to_string()]
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_false() -> bool {
    false
}

/// Document store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// REST endpoint of the store, including the API version prefix
    #[serde(default = "default_store_endpoint")]
    pub endpoint: String,
    /// Project id
    #[serde(default)]
    pub project_id: String,
    /// Server API key
    #[serde(default)]
    pub api_key: String,
    /// Database holding the bank and transaction collections
    #[serde(default)]
    pub database_id: String,
    /// Collection of bank links
    #[serde(default = "default_bank_collection")]
    pub bank_collection_id: String,
    /// Collection of transfer transactions
    #[serde(default = "default_transaction_collection")]
    pub transaction_collection_id: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Documents requested per list call; larger results are paged with offsets
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: default_store_endpoint(),
            project_id: String::new(),
            api_key: String::new(),
            database_id: String::new(),
            bank_collection_id: default_bank_collection(),
            transaction_collection_id: default_transaction_collection(),
            timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> u32 {
    100
}

fn default_store_endpoint() -> String {
    "https://cloud.appwrite.io/v1".to_string()
}

fn default_bank_collection() -> String {
    "banks".to_string()
}

fn default_transaction_collection() -> String {
    "transactions".to_string()
}

/// Pagination settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Transactions per page
    #[serde(default = "default_records_per_page")]
    pub records_per_page: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            records_per_page: default_records_per_page(),
        }
    }
}

fn default_records_per_page() -> usize {
    10
}

/// Display settings for formatted dates
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    /// Offset from UTC, in minutes, used when rendering dates
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream API settings
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Document store settings
    #[serde(default)]
    pub store: StoreConfig,
    /// Pagination settings
    #[serde(default)]
    pub pagination: PaginationConfig,
    /// Display settings
    #[serde(default)]
    pub display: DisplayConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Largest offset accepted for `display.utc_offset_minutes` (UTC+/-14:00)
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: PathBuf) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            });
        }

        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            message: e.to_string(),
        })?;

        let mut config = Self::from_yaml(&content)?;
        config.apply_env_overrides();
        config.validate()?;

        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from YAML text without validating it
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidYaml {
            message: e.to_string(),
        })
    }

    /// Override credentials and endpoints from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Override credentials and endpoints using `lookup` to resolve variables
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let targets: [(&str, &mut String); 6] = [
            ("PLAID_BASE_URL", &mut self.upstream.base_url),
            ("PLAID_CLIENT_ID", &mut self.upstream.client_id),
            ("PLAID_SECRET", &mut self.upstream.secret),
            ("APPWRITE_ENDPOINT", &mut self.store.endpoint),
            ("APPWRITE_PROJECT", &mut self.store.project_id),
            ("APPWRITE_KEY", &mut self.store.api_key),
        ];

        for (key, target) in targets {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                log::debug!("using {} from the environment", key);
                *target = value;
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.port == 0 {
            return Err(ConfigError::invalid_value(
                "server.port",
                "Port must be greater than 0",
            ));
        }

        if self.upstream.country_codes.is_empty() {
            return Err(ConfigError::invalid_value(
                "upstream.country_codes",
                "At least one country code is required",
            ));
        }

        if self.upstream.timeout_secs == 0 || self.store.timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "timeout_secs",
                "Timeouts must be at least 1 second",
            ));
        }

        if self.store.page_size == 0 {
            return Err(ConfigError::invalid_value(
                "store.page_size",
                "Page size must be greater than 0",
            ));
        }

        if self.pagination.records_per_page == 0 {
            return Err(ConfigError::invalid_value(
                "pagination.records_per_page",
                "Records per page must be greater than 0",
            ));
        }

        if self.display.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::invalid_value(
                "display.utc_offset_minutes",
                "Offset must be between -840 and 840 minutes",
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                "Level must be one of off, error, warn, info, debug, trace",
            ));
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
