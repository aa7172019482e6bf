//! Gatekeeper error types

use thiserror::Error;

/// Errors that can occur while validating (as opposed to a rejection)
#[derive(Error, Debug)]
pub enum GatekeeperError {
    /// Store error during validation
    #[error("Store error: {0}")]
    Store(String),
}
