//! Prerequisite edge module
//!
//! Requires edges and "see also" links are two disjoint relations. Only the
//! requires relation is modelled as an edge; related links stay on the
//! concept record.

use crate::ConceptId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Directed relation "`concept` requires `prerequisite`"
///
/// To understand `concept`, `prerequisite` must be understood first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PrerequisiteEdge {
    /// The dependent concept
    pub concept: ConceptId,

    /// The concept that must be learned first
    pub prerequisite: ConceptId,
}

impl PrerequisiteEdge {
    /// Create a new edge
    pub fn new(concept: impl Into<ConceptId>, prerequisite: impl Into<ConceptId>) -> Self {
        Self {
            concept: concept.into(),
            prerequisite: prerequisite.into(),
        }
    }

    /// True if both endpoints are the same concept
    pub fn is_self_loop(&self) -> bool {
        self.concept == self.prerequisite
    }
}

impl fmt::Display for PrerequisiteEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} requires {}", self.concept, self.prerequisite)
    }
}
