//! Error types for resolution queries

use ktree_domain::ConceptId;
use thiserror::Error;

/// Errors that can occur while answering a query
///
/// A query either returns a complete result or one of these; it never
/// returns a partially built path.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// The referenced concept does not exist
    #[error("Concept not found: {0}")]
    NotFound(String),

    /// The ordering step found a cycle the store should have prevented
    #[error("Internal consistency fault: {} concepts could not be ordered", .remaining.len())]
    Unreachable {
        /// Concepts left with unprocessed prerequisites
        remaining: Vec<ConceptId>,
    },

    /// Verified-only was requested and the path holds unverified concepts
    #[error("Path contains unverified concepts: {0:?}")]
    Unverified(Vec<ConceptId>),

    /// The closure grew past the configured guard
    #[error("Prerequisite closure exceeds {limit} concepts")]
    ClosureTooLarge {
        /// Configured limit
        limit: usize,
    },

    /// The caller cancelled the query
    #[error("Query cancelled")]
    Cancelled,

    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(String),
}

impl ResolveError {
    pub(crate) fn store(context: impl std::fmt::Display, e: impl std::fmt::Display) -> Self {
        ResolveError::Store(format!("{}: {}", context, e))
    }
}
