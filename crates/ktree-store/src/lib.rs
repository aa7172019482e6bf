//! Knowledge Tree Storage Layer
//!
//! Implements the `ConceptStore` traits over two interchangeable backings.
//!
//! # Architecture
//!
//! - [`ConceptGraph`]: in-memory adjacency structure with separate requires,
//!   dependents and related tables
//! - [`MemoryStore`]: copy-on-write snapshots of a `ConceptGraph`, one writer
//!   at a time, readers never blocked by a commit in progress
//! - [`SqliteStore`]: persisted property-graph schema, one transaction per
//!   mutation
//! - [`RetryingStore`]: bounded backoff around idempotent reads
//!
//! Every mutation goes through the Gatekeeper before it is committed; a
//! rejected mutation leaves the store unchanged.
//!
//! # Examples
//!
//! ```
//! use ktree_domain::{Concept, Domain, PrerequisiteEdge};
//! use ktree_domain::traits::{ConceptStore, MutableConceptStore};
//! use ktree_store::MemoryStore;
//!
//! let store = MemoryStore::new();
//! store.add_concept(Concept::axiom("ext", "Extensionality", Domain::Math, "set-theory")).unwrap();
//! store.add_concept(Concept::new("empty", "Empty Set", Domain::Math, "set-theory", 1)).unwrap();
//! store.add_prerequisite(PrerequisiteEdge::new("empty", "ext")).unwrap();
//!
//! assert_eq!(store.prerequisites_of(&"empty".into()).unwrap().len(), 1);
//! ```

#![warn(missing_docs)]

mod graph;
mod memory;
mod retry;
mod sqlite;

pub use graph::{ConceptGraph, GraphDocument};
pub use memory::MemoryStore;
pub use retry::{RetryPolicy, RetryingStore};
pub use sqlite::{SqliteSnapshot, SqliteStore, DEFAULT_BUSY_TIMEOUT_MS};

use ktree_domain::traits::ConceptStore;
use ktree_gatekeeper::{GatekeeperError, RejectionReason};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The mutation violates a graph invariant and was not applied
    #[error("Integrity violation: {0}")]
    Integrity(#[from] RejectionReason),

    /// Validation could not run
    #[error("Validation error: {0}")]
    Gatekeeper(#[from] GatekeeperError),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// JSON encoding of a stored field failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A lock was poisoned by a panicking writer
    #[error("Lock poisoned: {0}")]
    Poisoned(String),
}

impl StoreError {
    /// True for failures that may succeed when retried (busy/locked database)
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Database(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

/// Stores that can hand out a consistent read view for one query
///
/// A query that walks many concepts should run against a single view so it
/// never mixes two versions of the graph. A view may hold a lock on the
/// store, so drop it before calling the store itself again.
pub trait ReadView {
    /// The view type
    type View<'a>: ConceptStore<Error = StoreError>
    where
        Self: 'a;

    /// Take a read view of the current graph
    fn read_view(&self) -> Result<Self::View<'_>, StoreError>;
}
