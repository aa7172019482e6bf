//! Error types for the CLI application.

use ktree_resolver::ResolveError;
use ktree_store::StoreError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The graph rejected or failed an operation
    #[error("{0}")]
    Store(#[from] StoreError),

    /// MVG or tree query failed
    #[error("{0}")]
    Resolve(#[from] ResolveError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Concept lookup failed
    #[error("Concept not found: {0}")]
    NotFound(String),
}
