//! Copy-on-write in-memory store

use crate::{ConceptGraph, GraphDocument, ReadView, StoreError};
use ktree_domain::traits::{ConceptFilter, ConceptStore, GraphCounts, MutableConceptStore};
use ktree_domain::{Concept, ConceptId, Domain, PrerequisiteEdge};
use ktree_gatekeeper::Gatekeeper;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, RwLock};

/// In-memory store publishing immutable graph snapshots
///
/// Readers clone the current `Arc<ConceptGraph>` and keep using it for as
/// long as they like. A writer serialises on `writer`, copies the graph,
/// validates and applies the mutation on the copy, then swaps the `Arc`.
/// A rejected mutation never reaches the published snapshot.
pub struct MemoryStore {
    current: RwLock<Arc<ConceptGraph>>,
    writer: Mutex<()>,
    gatekeeper: Gatekeeper,
}

impl MemoryStore {
    /// Create an empty store with the default Gatekeeper
    pub fn new() -> Self {
        Self::with_gatekeeper(Gatekeeper::default_config())
    }

    /// Create an empty store validating with the given Gatekeeper
    pub fn with_gatekeeper(gatekeeper: Gatekeeper) -> Self {
        Self {
            current: RwLock::new(Arc::new(ConceptGraph::new())),
            writer: Mutex::new(()),
            gatekeeper,
        }
    }

    /// Build a store from a document, validating every concept and edge
    ///
    /// Concepts are added first so edges may appear in any order.
    pub fn from_document(doc: GraphDocument, gatekeeper: Gatekeeper) -> Result<Self, StoreError> {
        let store = Self::with_gatekeeper(gatekeeper);
        store.commit(|graph, gatekeeper| {
            for concept in doc.concepts {
                gatekeeper.validate_concept(&*graph, &concept)?.into_result()?;
                graph.insert_concept(concept);
            }
            for edge in doc.edges {
                if !graph.has_edge(&edge) {
                    gatekeeper.validate_edge(&*graph, &edge)?.into_result()?;
                    graph.insert_edge(edge);
                }
            }
            Ok(())
        })?;
        Ok(store)
    }

    /// Current published snapshot
    pub fn snapshot(&self) -> Result<Arc<ConceptGraph>, StoreError> {
        self.current
            .read()
            .map(|graph| Arc::clone(&*graph))
            .map_err(|_| StoreError::Poisoned("graph snapshot".to_string()))
    }

    /// Run a mutation against a private copy and publish it on success
    fn commit<T, F>(&self, mutate: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut ConceptGraph, &Gatekeeper) -> Result<T, StoreError>,
    {
        let _writer = self
            .writer
            .lock()
            .map_err(|_| StoreError::Poisoned("graph writer".to_string()))?;

        let mut draft = (*self.snapshot()?).clone();
        let value = mutate(&mut draft, &self.gatekeeper)?;

        let mut current = self
            .current
            .write()
            .map_err(|_| StoreError::Poisoned("graph snapshot".to_string()))?;
        *current = Arc::new(draft);
        Ok(value)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadView for MemoryStore {
    type View<'a> = Arc<ConceptGraph>;

    fn read_view(&self) -> Result<Self::View<'_>, StoreError> {
        self.snapshot()
    }
}

impl ConceptStore for MemoryStore {
    type Error = StoreError;

    fn get_concept(&self, id: &ConceptId) -> Result<Option<Concept>, Self::Error> {
        self.snapshot()?.get_concept(id)
    }

    fn prerequisites_of(&self, id: &ConceptId) -> Result<BTreeSet<ConceptId>, Self::Error> {
        self.snapshot()?.prerequisites_of(id)
    }

    fn dependents_of(&self, id: &ConceptId) -> Result<BTreeSet<ConceptId>, Self::Error> {
        self.snapshot()?.dependents_of(id)
    }

    fn exists(&self, id: &ConceptId) -> Result<bool, Self::Error> {
        self.snapshot()?.exists(id)
    }

    fn find_by_name(
        &self,
        name: &str,
        domain: Option<Domain>,
    ) -> Result<Option<Concept>, Self::Error> {
        self.snapshot()?.find_by_name(name, domain)
    }

    fn list(&self, filter: &ConceptFilter) -> Result<Vec<Concept>, Self::Error> {
        self.snapshot()?.list(filter)
    }

    fn counts(&self) -> Result<GraphCounts, Self::Error> {
        self.snapshot()?.counts()
    }
}

impl MutableConceptStore for MemoryStore {
    fn add_concept(&self, concept: Concept) -> Result<ConceptId, Self::Error> {
        let id = concept.id.clone();
        let result = self.commit(|graph, gatekeeper| {
            gatekeeper.validate_concept(&*graph, &concept)?.into_result()?;
            graph.insert_concept(concept);
            Ok(())
        });

        match &result {
            Ok(()) => tracing::debug!("Added concept {}", id),
            Err(e) => tracing::warn!("Rejected concept {}: {}", id, e),
        }
        result.map(|_| id)
    }

    fn add_prerequisite(&self, edge: PrerequisiteEdge) -> Result<(), Self::Error> {
        // Re-adding an existing edge is a no-op
        if self.snapshot()?.has_edge(&edge) {
            return Ok(());
        }

        let label = edge.to_string();
        let result = self.commit(|graph, gatekeeper| {
            gatekeeper.validate_edge(&*graph, &edge)?.into_result()?;
            graph.insert_edge(edge);
            Ok(())
        });

        match &result {
            Ok(()) => tracing::debug!("Added edge: {}", label),
            Err(e) => tracing::warn!("Rejected edge {}: {}", label, e),
        }
        result
    }
}
