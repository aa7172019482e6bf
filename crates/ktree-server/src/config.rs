//! Configuration file parsing for the server.
//!
//! Loads settings from TOML files including bind address, storage backend,
//! retry policy, validation rules and resolver options.

use ktree_gatekeeper::ValidationConfig;
use ktree_resolver::ResolverConfig;
use ktree_store::RetryPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8080)
    pub bind_port: u16,

    /// Per-request time limit in milliseconds (default: 5000)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Graph backing
    #[serde(default)]
    pub storage: StorageConfig,

    /// Retry policy for store reads
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Mutation validation rules
    #[serde(default)]
    pub validation: ValidationConfig,

    /// MVG query options
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Which store backs the graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Copy-on-write in-memory graph
    #[default]
    Memory,
    /// SQLite database file
    Sqlite,
}

/// Storage section
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Backend kind (default: memory)
    #[serde(default)]
    pub backend: Backend,

    /// Database file for `sqlite`; optional JSON graph document to load for `memory`
    pub path: Option<PathBuf>,

    /// SQLite busy timeout in milliseconds (default: 5000)
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            path: None,
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    5_000
}

fn default_busy_timeout() -> u64 {
    5_000
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&contents)?;

        if config.storage.backend == Backend::Sqlite && config.storage.path.is_none() {
            return Err(ConfigError::MissingField("storage.path".to_string()));
        }

        Ok(config)
    }

    /// Create a default configuration for testing
    pub fn default_test_config() -> Self {
        ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8080,
            request_timeout_ms: default_request_timeout(),
            storage: StorageConfig::default(),
            retry: RetryPolicy::default(),
            validation: ValidationConfig::default(),
            resolver: ResolverConfig::default(),
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }

    /// Per-request time limit
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
