//! Knowledge Tree Domain Layer
//!
//! This crate contains the domain model for the Knowledge Tree prerequisite
//! graph. It defines the fundamental concepts, value objects, and the store
//! interface that every other layer depends upon.
//!
//! ## Key Concepts
//!
//! - **Concept**: The atomic unit of knowledge, with a definition and metadata
//! - **Requires edge**: Directed "must learn first" relation between two concepts
//! - **Axiom**: A concept with no prerequisites (a root of the graph)
//! - **Domain**: The closed set of knowledge areas a concept belongs to
//!
//! ## Architecture
//!
//! - Pure data and invariants only, no I/O
//! - Storage backends live in `ktree-store`
//! - Resolution algorithms live in `ktree-resolver` and only see the
//!   [`traits::ConceptStore`] interface

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod concept;
pub mod domain;
pub mod edge;
pub mod traits;

// Re-exports for convenience
pub use concept::{Concept, ConceptId};
pub use domain::Domain;
pub use edge::PrerequisiteEdge;
pub use traits::{ConceptFilter, ConceptStore, GraphCounts, MutableConceptStore};
