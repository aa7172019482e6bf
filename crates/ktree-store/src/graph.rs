//! In-memory concept graph
//!
//! Requires edges are kept in two indexes (forward and reverse) so both
//! prerequisite and dependent lookups are one map access. Related links
//! stay on the concept records and never enter either index.

use crate::StoreError;
use ktree_domain::traits::{ConceptFilter, ConceptStore, GraphCounts};
use ktree_domain::{Concept, ConceptId, Domain, PrerequisiteEdge};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Adjacency-list representation of the prerequisite graph
///
/// `ConceptGraph` does no validation of its own; [`crate::MemoryStore`] runs
/// the Gatekeeper before every insertion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConceptGraph {
    concepts: BTreeMap<ConceptId, Concept>,
    requires: BTreeMap<ConceptId, BTreeSet<ConceptId>>,
    dependents: BTreeMap<ConceptId, BTreeSet<ConceptId>>,
    edge_count: usize,
}

/// Serialized form of a graph: every concept plus every requires edge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Concept records, ordered by id
    pub concepts: Vec<Concept>,

    /// Requires edges, ordered by (concept, prerequisite)
    #[serde(default)]
    pub edges: Vec<PrerequisiteEdge>,
}

impl GraphDocument {
    /// Export any store: concepts in id order, edges in (concept, prerequisite) order
    pub fn from_store<S>(store: &S) -> Result<Self, S::Error>
    where
        S: ConceptStore + ?Sized,
    {
        let mut concepts = store.list(&ConceptFilter::default())?;
        concepts.sort_by(|a, b| a.id.cmp(&b.id));

        let mut edges = Vec::new();
        for concept in &concepts {
            for prerequisite in store.prerequisites_of(&concept.id)? {
                edges.push(PrerequisiteEdge::new(concept.id.clone(), prerequisite));
            }
        }
        Ok(Self { concepts, edges })
    }
}

impl ConceptGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of concepts
    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    /// True if the graph holds no concepts
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Check for an existing requires edge
    pub fn has_edge(&self, edge: &PrerequisiteEdge) -> bool {
        self.requires
            .get(&edge.concept)
            .map(|set| set.contains(&edge.prerequisite))
            .unwrap_or(false)
    }

    /// Iterate over every requires edge in (concept, prerequisite) order
    pub fn edges(&self) -> impl Iterator<Item = PrerequisiteEdge> + '_ {
        self.requires.iter().flat_map(|(concept, prerequisites)| {
            prerequisites
                .iter()
                .map(move |p| PrerequisiteEdge::new(concept.clone(), p.clone()))
        })
    }

    /// Iterate over every concept in id order
    pub fn concepts(&self) -> impl Iterator<Item = &Concept> {
        self.concepts.values()
    }

    /// Export the graph as a document
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            concepts: self.concepts.values().cloned().collect(),
            edges: self.edges().collect(),
        }
    }

    pub(crate) fn insert_concept(&mut self, concept: Concept) {
        self.concepts.insert(concept.id.clone(), concept);
    }

    /// Insert an edge, returning false if it was already present
    pub(crate) fn insert_edge(&mut self, edge: PrerequisiteEdge) -> bool {
        let added = self
            .requires
            .entry(edge.concept.clone())
            .or_default()
            .insert(edge.prerequisite.clone());
        if added {
            self.dependents
                .entry(edge.prerequisite)
                .or_default()
                .insert(edge.concept);
            self.edge_count += 1;
        }
        added
    }
}

impl ConceptStore for ConceptGraph {
    type Error = StoreError;

    fn get_concept(&self, id: &ConceptId) -> Result<Option<Concept>, Self::Error> {
        Ok(self.concepts.get(id).cloned())
    }

    fn prerequisites_of(&self, id: &ConceptId) -> Result<BTreeSet<ConceptId>, Self::Error> {
        Ok(self.requires.get(id).cloned().unwrap_or_default())
    }

    fn dependents_of(&self, id: &ConceptId) -> Result<BTreeSet<ConceptId>, Self::Error> {
        Ok(self.dependents.get(id).cloned().unwrap_or_default())
    }

    fn exists(&self, id: &ConceptId) -> Result<bool, Self::Error> {
        Ok(self.concepts.contains_key(id))
    }

    fn find_by_name(
        &self,
        name: &str,
        domain: Option<Domain>,
    ) -> Result<Option<Concept>, Self::Error> {
        // ASCII folding only, matching SQLite's NOCASE collation; BTreeMap
        // iteration is in id order, so the lowest id wins
        Ok(self
            .concepts
            .values()
            .find(|c| {
                c.name.eq_ignore_ascii_case(name) && domain.map(|d| c.domain == d).unwrap_or(true)
            })
            .cloned())
    }

    fn list(&self, filter: &ConceptFilter) -> Result<Vec<Concept>, Self::Error> {
        let mut matching: Vec<Concept> = self
            .concepts
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            a.complexity_level
                .cmp(&b.complexity_level)
                .then_with(|| a.id.cmp(&b.id))
        });
        if let Some(limit) = filter.limit {
            matching.truncate(limit);
        }
        Ok(matching)
    }

    fn counts(&self) -> Result<GraphCounts, Self::Error> {
        Ok(GraphCounts {
            concepts: self.concepts.len(),
            edges: self.edge_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConceptGraph {
        let mut graph = ConceptGraph::new();
        graph.insert_concept(Concept::axiom("ext", "Extensionality", Domain::Math, "set-theory"));
        graph.insert_concept(Concept::new("empty", "Empty Set", Domain::Math, "set-theory", 1));
        graph.insert_concept(
            Concept::new("pair", "Ordered Pair", Domain::Math, "set-theory", 2).with_related("empty"),
        );
        graph.insert_edge(PrerequisiteEdge::new("empty", "ext"));
        graph.insert_edge(PrerequisiteEdge::new("pair", "empty"));
        graph
    }

    #[test]
    fn test_forward_and_reverse_indexes() {
        let graph = sample();

        let prereqs = graph.prerequisites_of(&"pair".into()).unwrap();
        assert_eq!(prereqs.into_iter().collect::<Vec<_>>(), vec![ConceptId::from("empty")]);

        let dependents = graph.dependents_of(&"empty".into()).unwrap();
        assert_eq!(dependents.into_iter().collect::<Vec<_>>(), vec![ConceptId::from("pair")]);

        assert!(graph.prerequisites_of(&"unknown".into()).unwrap().is_empty());
    }

    #[test]
    fn test_related_links_are_not_edges() {
        let graph = sample();
        // pair lists empty as related, but only the requires edge is indexed
        assert_eq!(graph.counts().unwrap().edges, 2);
        assert!(graph.dependents_of(&"pair".into()).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_edge_is_not_counted() {
        let mut graph = sample();
        assert!(!graph.insert_edge(PrerequisiteEdge::new("pair", "empty")));
        assert_eq!(graph.counts().unwrap(), GraphCounts { concepts: 3, edges: 2 });
    }

    #[test]
    fn test_find_by_name() {
        let graph = sample();
        let found = graph.find_by_name("empty set", None).unwrap().unwrap();
        assert_eq!(found.id, ConceptId::from("empty"));

        assert!(graph.find_by_name("Empty Set", Some(Domain::Physics)).unwrap().is_none());
        assert!(graph.find_by_name("Vector Space", None).unwrap().is_none());
    }

    #[test]
    fn test_list_orders_by_level_then_id() {
        let mut graph = sample();
        graph.insert_concept(Concept::axiom("choice", "Choice", Domain::Math, "set-theory"));

        let ids: Vec<String> = graph
            .list(&ConceptFilter::default())
            .unwrap()
            .into_iter()
            .map(|c| c.id.to_string())
            .collect();
        assert_eq!(ids, vec!["choice", "ext", "empty", "pair"]);

        let axioms = graph.list(&ConceptFilter::axioms(Some(Domain::Math))).unwrap();
        assert_eq!(axioms.len(), 2);
    }

    #[test]
    fn test_document_from_store_matches_direct_export() {
        let graph = sample();
        assert_eq!(GraphDocument::from_store(&graph).unwrap(), graph.to_document());
    }

    #[test]
    fn test_document_export() {
        let doc = sample().to_document();
        assert_eq!(doc.concepts.len(), 3);
        assert_eq!(
            doc.edges,
            vec![
                PrerequisiteEdge::new("empty", "ext"),
                PrerequisiteEdge::new("pair", "empty"),
            ]
        );
    }
}
