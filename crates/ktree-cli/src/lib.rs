//! ktree CLI library.
//!
//! Configuration, command execution and output formatting for the `ktree`
//! command-line tool. Commands run against a SQLite-backed graph opened with
//! [`open_store`], or against any other store implementing
//! [`commands::GraphStore`].

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;

use ktree_gatekeeper::Gatekeeper;
use ktree_store::{RetryingStore, SqliteStore};
use std::path::Path;

/// Open the configured graph database, creating it if needed
///
/// `db` overrides the database path from the configuration.
pub fn open_store(config: &Config, db: Option<&Path>) -> Result<RetryingStore<SqliteStore>> {
    let path = config.database_path(db)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    tracing::debug!("Opening graph database at {}", path.display());
    let sqlite = SqliteStore::with_options(
        &path,
        config.busy_timeout(),
        Gatekeeper::new(config.validation.clone()),
    )?;
    Ok(RetryingStore::new(sqlite, config.retry.clone()))
}
