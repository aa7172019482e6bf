//! Knowledge Tree Gatekeeper
//!
//! Validates every mutation of the concept graph before it is committed.
//!
//! The Gatekeeper provides:
//! - Edge validation (dangling references, self-loops, cycles)
//! - Concept record validation (blank ids, duplicates, axiom consistency)
//! - Cycle witnesses: a rejected edge reports the path it would close
//!
//! # Examples
//!
//! ```no_run
//! use ktree_gatekeeper::{Gatekeeper, ValidationConfig};
//!
//! let config = ValidationConfig::default();
//! let gatekeeper = Gatekeeper::new(config);
//!
//! // Validate an edge before storing it
//! // let result = gatekeeper.validate_edge(&store, &edge)?;
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod validator;

pub use config::ValidationConfig;
pub use error::GatekeeperError;
pub use validator::{Gatekeeper, RejectionReason, ValidationResult, ValidationStatus};
