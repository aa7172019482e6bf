//! Knowledge Tree Resolver
//!
//! Answers "what do I need to learn, and in what order, to reach concept X"
//! against any [`ConceptStore`](ktree_domain::traits::ConceptStore).
//!
//! # Pipeline
//!
//! 1. [`resolve_closure`]: every concept the target transitively requires
//! 2. [`reduce`]: drop known concepts, then keep only what is still
//!    reachable from the target through unknown concepts
//! 3. [`order`]: topological sort with a `(complexity_level, id)` tie-break,
//!    target last
//! 4. [`MvgEngine`]: composes the three and hydrates the result
//!
//! Every step is a pure read. Each one checks a caller-supplied
//! [`CancellationToken`](tokio_util::sync::CancellationToken) once per
//! visited concept and stops with [`ResolveError::Cancelled`].

#![warn(missing_docs)]

mod closure;
mod config;
mod error;
mod mvg;
mod orderer;
mod reducer;
mod tree;

pub use closure::resolve_closure;
pub use config::ResolverConfig;
pub use error::ResolveError;
pub use mvg::{generate_mvg, MvgEngine, MvgRequest, MvgResult, TargetRef};
pub use orderer::{order, order_concepts};
pub use reducer::reduce;
pub use tree::{DomainTree, TreeNode};

use tokio_util::sync::CancellationToken;

fn checkpoint(cancel: &CancellationToken) -> Result<(), ResolveError> {
    if cancel.is_cancelled() {
        Err(ResolveError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod test_support {
    use ktree_domain::traits::MutableConceptStore;
    use ktree_domain::{Concept, Domain, PrerequisiteEdge};
    use ktree_store::MemoryStore;

    /// top requires left and right, both require base; island stands alone
    pub fn diamond() -> MemoryStore {
        let store = MemoryStore::new();
        for concept in [
            Concept::axiom("base", "Base", Domain::Math, "logic"),
            Concept::new("left", "Left", Domain::Math, "logic", 1).with_related("island"),
            Concept::new("right", "Right", Domain::Math, "logic", 1),
            Concept::new("island", "Island", Domain::Math, "logic", 1),
            Concept::new("top", "Top", Domain::Math, "logic", 2),
        ] {
            store.add_concept(concept).unwrap();
        }
        for (concept, prerequisite) in [
            ("left", "base"),
            ("right", "base"),
            ("top", "left"),
            ("top", "right"),
        ] {
            store
                .add_prerequisite(PrerequisiteEdge::new(concept, prerequisite))
                .unwrap();
        }
        store
    }

    /// Extensionality <- Empty Set <- Ordered Pair <- Vector Space
    pub fn set_theory() -> MemoryStore {
        let store = MemoryStore::new();
        for concept in [
            Concept::axiom("extensionality", "Extensionality", Domain::Math, "set-theory").verified(),
            Concept::new("empty-set", "Empty Set", Domain::Math, "set-theory", 1).verified(),
            Concept::new("ordered-pair", "Ordered Pair", Domain::Math, "set-theory", 2),
            Concept::new("vector-space", "Vector Space", Domain::Math, "linear-algebra", 3),
        ] {
            store.add_concept(concept).unwrap();
        }
        for (concept, prerequisite) in [
            ("empty-set", "extensionality"),
            ("ordered-pair", "empty-set"),
            ("vector-space", "ordered-pair"),
        ] {
            store
                .add_prerequisite(PrerequisiteEdge::new(concept, prerequisite))
                .unwrap();
        }
        store
    }
}
