//! # Document Sync Configuration
//!
//! Configuration is passed explicitly at construction; the only defaults are
//! the constants in [`crate::domain::invariants`].

use serde::{Deserialize, Serialize};

use crate::domain::{
    ConfigError, QueryOptions, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_CACHE_CAPACITY,
    DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_BACKOFF_MS, DEFAULT_PAGE_SIZE,
};

/// Ledger gateway connection parameters, handed to the ledger client.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Gateway host.
    pub host: String,
    /// Gateway port.
    pub port: u16,
    /// `http` or `https`.
    pub protocol: String,
    /// Transport timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 1984,
            protocol: "http".to_string(),
            timeout_ms: 20_000,
        }
    }
}

impl NetworkConfig {
    /// `protocol://host:port`
    pub fn endpoint(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

/// Backoff between confirmation status checks.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollConfig {
    /// Delay after the first unconfirmed check.
    pub initial_backoff_ms: u64,
    /// Cap on any single delay.
    pub max_backoff_ms: u64,
    /// Growth factor per attempt.
    pub multiplier: f64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

/// Document client configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DocumentSyncConfig {
    /// Ledger gateway connection.
    pub network: NetworkConfig,

    /// Admin identity whose transactions `verified_only` trusts.
    pub admin_address: String,

    /// Documents kept in the cache (0 disables caching).
    pub cache_capacity: usize,

    /// Edges requested per index page.
    pub page_size: usize,

    /// Defaults applied when a call does not pass its own options.
    pub query: QueryOptions,

    /// Confirmation backoff.
    pub poll: PollConfig,
}

impl Default for DocumentSyncConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            admin_address: String::new(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            page_size: DEFAULT_PAGE_SIZE,
            query: QueryOptions::default(),
            poll: PollConfig::default(),
        }
    }
}

impl DocumentSyncConfig {
    /// Default config trusting `admin_address`.
    pub fn new(admin_address: impl Into<String>) -> Self {
        Self {
            admin_address: admin_address.into(),
            ..Self::default()
        }
    }

    /// Create a config for testing (tiny backoff, small cache).
    pub fn for_testing(admin_address: impl Into<String>) -> Self {
        Self {
            admin_address: admin_address.into(),
            cache_capacity: 16,
            page_size: 10,
            query: QueryOptions {
                max_retries: 3,
                verified_only: true,
                max_results: 50,
            },
            poll: PollConfig {
                initial_backoff_ms: 1,
                max_backoff_ms: 5,
                multiplier: 2.0,
            },
            ..Self::default()
        }
    }

    /// Set the cache capacity.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.network.protocol.as_str(), "http" | "https") {
            return Err(ConfigError::UnsupportedProtocol(self.network.protocol.clone()));
        }
        if self.network.port == 0 {
            return Err(ConfigError::Zero("network.port"));
        }
        if self.network.timeout_ms == 0 {
            return Err(ConfigError::Zero("network.timeout_ms"));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Zero("page_size"));
        }
        if self.query.max_results == 0 {
            return Err(ConfigError::Zero("query.max_results"));
        }
        if self.poll.multiplier < 1.0 {
            return Err(ConfigError::InvalidMultiplier(self.poll.multiplier));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DocumentSyncConfig::default();
        assert_eq!(config.cache_capacity, DEFAULT_CACHE_CAPACITY);
        assert_eq!(config.network.endpoint(), "http://127.0.0.1:1984");
        assert!(config.query.verified_only);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_testing_config() {
        let config = DocumentSyncConfig::for_testing("admin");
        assert_eq!(config.admin_address, "admin");
        assert_eq!(config.query.max_retries, 3);
        assert_eq!(config.poll.initial_backoff_ms, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = DocumentSyncConfig::default();
        config.network.protocol = "ftp".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnsupportedProtocol(_))
        ));

        let mut config = DocumentSyncConfig::default();
        config.page_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::Zero("page_size")));

        let mut config = DocumentSyncConfig::default();
        config.poll.multiplier = 0.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMultiplier(_))
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DocumentSyncConfig = serde_json::from_str(
            r#"{ "admin_address": "admin", "cache_capacity": 0, "network": { "protocol": "https", "port": 443 } }"#,
        )
        .unwrap();
        assert_eq!(config.cache_capacity, 0);
        assert_eq!(config.network.endpoint(), "https://127.0.0.1:443");
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert!(config.validate().is_ok());
    }
}
