//! Configuration management for the CLI.
//!
//! Settings live in `~/.ktree/config.toml`; command-line flags override them.

use crate::error::{CliError, Result};
use ktree_gatekeeper::ValidationConfig;
use ktree_resolver::ResolverConfig;
use ktree_store::{RetryPolicy, DEFAULT_BUSY_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database file; `~/.ktree/graph.db` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,

    /// How long a statement waits on a locked database
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Retry policy for reads
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Mutation validation rules
    #[serde(default)]
    pub validation: ValidationConfig,

    /// MVG query options
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Directory holding the config file and the default database.
    pub fn dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".ktree"))
    }

    /// Get the configuration file path.
    pub fn path() -> Result<PathBuf> {
        Ok(Self::dir()?.join("config.toml"))
    }

    /// Load configuration from the default location, or defaults if absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load configuration from `path`, or defaults if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Database file to open: `override_path`, then the config, then the default.
    pub fn database_path(&self, override_path: Option<&Path>) -> Result<PathBuf> {
        match override_path.or(self.database.as_deref()) {
            Some(path) => Ok(path.to_path_buf()),
            None => Ok(Self::dir()?.join("graph.db")),
        }
    }

    /// Busy timeout as a duration
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            busy_timeout_ms: default_busy_timeout(),
            settings: Settings::default(),
            retry: RetryPolicy::default(),
            validation: ValidationConfig::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_busy_timeout() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
