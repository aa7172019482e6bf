//! Trait definitions for graph storage
//!
//! These traits are the boundary between the resolution algorithms and the
//! backing store. Implementations live in `ktree-store`; the resolver only
//! needs lookup by id and one-hop prerequisite fan-out.

use crate::{Concept, ConceptId, Domain, PrerequisiteEdge};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Read access to the concept graph
///
/// All methods are pure reads. Sets are returned as `BTreeSet` so callers
/// iterate in a deterministic order.
pub trait ConceptStore {
    /// Error type for store operations
    type Error;

    /// Get a concept by id
    fn get_concept(&self, id: &ConceptId) -> Result<Option<Concept>, Self::Error>;

    /// Direct (one hop) prerequisites of a concept
    ///
    /// Unknown ids have no prerequisites.
    fn prerequisites_of(&self, id: &ConceptId) -> Result<BTreeSet<ConceptId>, Self::Error>;

    /// Direct (one hop) dependents of a concept: every concept that requires it
    fn dependents_of(&self, id: &ConceptId) -> Result<BTreeSet<ConceptId>, Self::Error>;

    /// Check whether a concept exists
    fn exists(&self, id: &ConceptId) -> Result<bool, Self::Error> {
        Ok(self.get_concept(id)?.is_some())
    }

    /// Find a concept by name, ignoring case
    ///
    /// When several concepts share the name, the one with the lowest id wins.
    fn find_by_name(&self, name: &str, domain: Option<Domain>)
        -> Result<Option<Concept>, Self::Error>;

    /// List concepts matching a filter, ordered by `(complexity_level, id)`
    fn list(&self, filter: &ConceptFilter) -> Result<Vec<Concept>, Self::Error>;

    /// Number of concepts and requires edges
    fn counts(&self) -> Result<GraphCounts, Self::Error>;
}

macro_rules! forward_concept_store {
    ($($ptr:ty),*) => {$(
        impl<T: ConceptStore + ?Sized> ConceptStore for $ptr {
            type Error = T::Error;

            fn get_concept(&self, id: &ConceptId) -> Result<Option<Concept>, Self::Error> {
                (**self).get_concept(id)
            }

            fn prerequisites_of(&self, id: &ConceptId) -> Result<BTreeSet<ConceptId>, Self::Error> {
                (**self).prerequisites_of(id)
            }

            fn dependents_of(&self, id: &ConceptId) -> Result<BTreeSet<ConceptId>, Self::Error> {
                (**self).dependents_of(id)
            }

            fn exists(&self, id: &ConceptId) -> Result<bool, Self::Error> {
                (**self).exists(id)
            }

            fn find_by_name(
                &self,
                name: &str,
                domain: Option<Domain>,
            ) -> Result<Option<Concept>, Self::Error> {
                (**self).find_by_name(name, domain)
            }

            fn list(&self, filter: &ConceptFilter) -> Result<Vec<Concept>, Self::Error> {
                (**self).list(filter)
            }

            fn counts(&self) -> Result<GraphCounts, Self::Error> {
                (**self).counts()
            }
        }
    )*};
}

forward_concept_store!(&T, std::sync::Arc<T>);

/// Append-only mutation of the concept graph
///
/// Implementations must validate every mutation before committing it and
/// leave the graph unchanged when validation fails.
pub trait MutableConceptStore: ConceptStore {
    /// Add a new concept record
    fn add_concept(&self, concept: Concept) -> Result<ConceptId, Self::Error>;

    /// Add a requires edge
    fn add_prerequisite(&self, edge: PrerequisiteEdge) -> Result<(), Self::Error>;
}

/// Criteria for listing concepts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptFilter {
    /// Filter by domain
    pub domain: Option<Domain>,

    /// Filter by exact subfield
    pub subfield: Option<String>,

    /// Only return axioms
    #[serde(default)]
    pub axioms_only: bool,

    /// Filter by maximum complexity level (inclusive)
    pub max_complexity: Option<u32>,

    /// Maximum results to return
    pub limit: Option<usize>,
}

impl ConceptFilter {
    /// Filter for every concept in a domain
    pub fn domain(domain: Domain) -> Self {
        Self {
            domain: Some(domain),
            ..Default::default()
        }
    }

    /// Filter for axioms, optionally restricted to a domain
    pub fn axioms(domain: Option<Domain>) -> Self {
        Self {
            domain,
            axioms_only: true,
            ..Default::default()
        }
    }

    /// Check a concept against every criterion except `limit`
    pub fn matches(&self, concept: &Concept) -> bool {
        if let Some(domain) = self.domain {
            if concept.domain != domain {
                return false;
            }
        }
        if let Some(subfield) = &self.subfield {
            if &concept.subfield != subfield {
                return false;
            }
        }
        if self.axioms_only && !concept.is_axiom {
            return false;
        }
        if let Some(max) = self.max_complexity {
            if concept.complexity_level > max {
                return false;
            }
        }
        true
    }
}

/// Size of the graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphCounts {
    /// Number of concepts
    pub concepts: usize,

    /// Number of requires edges
    pub edges: usize,
}
