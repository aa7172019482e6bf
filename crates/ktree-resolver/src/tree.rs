//! Domain tree view
//!
//! Lays one domain out for browsing: roots are the concepts with no
//! prerequisite inside the domain, and each node lists the in-domain
//! concepts that require it as children. Nodes live in a flat table keyed
//! by id, so a concept with two parents appears once and is referenced
//! twice.

use crate::{checkpoint, ResolveError};
use ktree_domain::traits::{ConceptFilter, ConceptStore};
use ktree_domain::{Concept, ConceptId, Domain};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tokio_util::sync::CancellationToken;

/// One concept in the tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Concept id
    pub id: ConceptId,
    /// Concept name
    pub name: String,
    /// Subfield within the domain
    pub subfield: String,
    /// Complexity level
    pub complexity_level: u32,
    /// Axiom flag
    pub is_axiom: bool,
    /// In-domain dependents, ordered by `(complexity_level, id)`
    pub children: Vec<ConceptId>,
}

/// Tree of one domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainTree {
    /// The domain shown
    pub domain: Domain,
    /// Concepts with no in-domain prerequisite, ordered by `(complexity_level, id)`
    pub roots: Vec<ConceptId>,
    /// Every concept of the domain
    pub nodes: BTreeMap<ConceptId, TreeNode>,
    /// Number of nodes
    pub total_nodes: usize,
}

impl DomainTree {
    /// Build the tree for `domain`
    pub fn build<S>(
        store: &S,
        domain: Domain,
        cancel: &CancellationToken,
    ) -> Result<Self, ResolveError>
    where
        S: ConceptStore + ?Sized,
        S::Error: std::fmt::Display,
    {
        let concepts = store
            .list(&ConceptFilter::domain(domain))
            .map_err(|e| ResolveError::store(format!("Failed to list {}", domain), e))?;

        // list() is already ordered by (complexity_level, id)
        let rank: BTreeMap<ConceptId, usize> = concepts
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();

        let mut nodes: BTreeMap<ConceptId, TreeNode> = concepts
            .iter()
            .map(|c| (c.id.clone(), node(c)))
            .collect();
        let mut roots = Vec::new();

        for concept in &concepts {
            checkpoint(cancel)?;
            let prerequisites: BTreeSet<ConceptId> = store
                .prerequisites_of(&concept.id)
                .map_err(|e| {
                    ResolveError::store(format!("Failed to read prerequisites of {}", concept.id), e)
                })?
                .into_iter()
                .filter(|p| rank.contains_key(p))
                .collect();

            if prerequisites.is_empty() {
                roots.push(concept.id.clone());
            }
            for prerequisite in prerequisites {
                if let Some(parent) = nodes.get_mut(&prerequisite) {
                    parent.children.push(concept.id.clone());
                }
            }
        }

        // children were pushed in rank order already; keep it explicit
        for node in nodes.values_mut() {
            node.children.sort_by_key(|id| rank.get(id).copied());
        }

        tracing::debug!("Domain tree {}: {} nodes, {} roots", domain, nodes.len(), roots.len());
        Ok(Self {
            domain,
            roots,
            total_nodes: nodes.len(),
            nodes,
        })
    }
}

fn node(concept: &Concept) -> TreeNode {
    TreeNode {
        id: concept.id.clone(),
        name: concept.name.clone(),
        subfield: concept.subfield.clone(),
        complexity_level: concept.complexity_level,
        is_axiom: concept.is_axiom,
        children: Vec::new(),
    }
}
