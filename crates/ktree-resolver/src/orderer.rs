//! Path Orderer: deterministic topological sort of the selected concepts

use crate::{checkpoint, ResolveError};
use ktree_domain::traits::ConceptStore;
use ktree_domain::{Concept, ConceptId};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};
use tokio_util::sync::CancellationToken;

/// Order `selected` plus `target` into a learning path ending at `target`
///
/// See [`order_concepts`]; this variant returns ids only.
pub fn order<S>(
    store: &S,
    target: &ConceptId,
    selected: &BTreeSet<ConceptId>,
    cancel: &CancellationToken,
) -> Result<Vec<ConceptId>, ResolveError>
where
    S: ConceptStore + ?Sized,
    S::Error: std::fmt::Display,
{
    Ok(order_concepts(store, target, selected, cancel)?
        .into_iter()
        .map(|c| c.id)
        .collect())
}

/// Order `selected` plus `target` and hydrate every concept on the way
///
/// Kahn's algorithm over the subgraph induced by `selected ∪ {target}`.
/// Among concepts whose prerequisites are all placed, the next one is
/// picked by ascending `complexity_level`, then by id; the target is held
/// back until nothing else is ready.
///
/// # Errors
///
/// `Unreachable` if the induced subgraph has a cycle. That cannot happen
/// on a validated store and is logged as a consistency fault.
pub fn order_concepts<S>(
    store: &S,
    target: &ConceptId,
    selected: &BTreeSet<ConceptId>,
    cancel: &CancellationToken,
) -> Result<Vec<Concept>, ResolveError>
where
    S: ConceptStore + ?Sized,
    S::Error: std::fmt::Display,
{
    let mut concepts: BTreeMap<ConceptId, Concept> = BTreeMap::new();
    for id in selected.iter().chain(std::iter::once(target)) {
        checkpoint(cancel)?;
        let concept = store
            .get_concept(id)
            .map_err(|e| ResolveError::store(format!("Failed to get concept {}", id), e))?
            .ok_or_else(|| ResolveError::NotFound(id.to_string()))?;
        concepts.insert(id.clone(), concept);
    }

    // in-set prerequisite counts and reverse adjacency
    let mut pending: BTreeMap<ConceptId, usize> = BTreeMap::new();
    let mut dependents: BTreeMap<ConceptId, Vec<ConceptId>> = BTreeMap::new();
    for id in concepts.keys() {
        checkpoint(cancel)?;
        let prerequisites = store.prerequisites_of(id).map_err(|e| {
            ResolveError::store(format!("Failed to read prerequisites of {}", id), e)
        })?;
        let mut count = 0;
        for prerequisite in prerequisites.into_iter().filter(|p| concepts.contains_key(p)) {
            dependents.entry(prerequisite).or_default().push(id.clone());
            count += 1;
        }
        pending.insert(id.clone(), count);
    }

    let key = |id: &ConceptId| {
        let level = concepts.get(id).map(|c| c.complexity_level).unwrap_or(0);
        Reverse((id == target, level, id.clone()))
    };

    let mut ready: BinaryHeap<_> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(id, _)| key(id))
        .collect();

    let mut path = Vec::with_capacity(concepts.len());
    while let Some(Reverse((_, _, id))) = ready.pop() {
        checkpoint(cancel)?;
        for dependent in dependents.get(&id).into_iter().flatten() {
            if let Some(count) = pending.get_mut(dependent) {
                *count -= 1;
                if *count == 0 {
                    ready.push(key(dependent));
                }
            }
        }
        path.push(id);
    }

    if path.len() < concepts.len() {
        let placed: BTreeSet<&ConceptId> = path.iter().collect();
        let remaining: Vec<ConceptId> = concepts
            .keys()
            .filter(|id| !placed.contains(id))
            .cloned()
            .collect();
        tracing::error!(
            "Cycle among {:?} while ordering path to {}; store invariants violated",
            remaining,
            target
        );
        return Err(ResolveError::Unreachable { remaining });
    }

    Ok(path
        .into_iter()
        .filter_map(|id| concepts.remove(&id))
        .collect())
}
