//! Minimality Reducer
//!
//! Known concepts are removed first, then reachability from the target is
//! recomputed through the remaining nodes only. A concept that was needed
//! solely to reach something the learner already knows drops out; a concept
//! still reachable through another unknown branch stays.

use crate::{checkpoint, ResolveError};
use ktree_domain::traits::ConceptStore;
use ktree_domain::ConceptId;
use std::collections::{BTreeSet, VecDeque};
use tokio_util::sync::CancellationToken;

/// Reduce a closure to the minimum viable prerequisite set
///
/// The result is a subset of `closure`, never contains `target`, and holds
/// exactly the concepts reachable from `target` without passing through a
/// known concept.
pub fn reduce<S>(
    store: &S,
    target: &ConceptId,
    closure: &BTreeSet<ConceptId>,
    known: &BTreeSet<ConceptId>,
    cancel: &CancellationToken,
) -> Result<BTreeSet<ConceptId>, ResolveError>
where
    S: ConceptStore + ?Sized,
    S::Error: std::fmt::Display,
{
    let residual: BTreeSet<&ConceptId> = closure.difference(known).collect();

    let mut selected = BTreeSet::new();
    let mut queue = VecDeque::from([target.clone()]);

    while let Some(current) = queue.pop_front() {
        checkpoint(cancel)?;

        let prerequisites = store.prerequisites_of(&current).map_err(|e| {
            ResolveError::store(format!("Failed to read prerequisites of {}", current), e)
        })?;

        for prerequisite in prerequisites {
            if residual.contains(&prerequisite) && selected.insert(prerequisite.clone()) {
                queue.push_back(prerequisite);
            }
        }
    }

    tracing::debug!(
        "Reduced closure of {} from {} to {} concepts ({} known)",
        target,
        closure.len(),
        selected.len(),
        known.len()
    );
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closure::resolve_closure;
    use crate::test_support::diamond;

    fn reduced(target: &str, known: &[&str]) -> Vec<String> {
        let store = diamond();
        let cancel = CancellationToken::new();
        let target = ConceptId::from(target);
        let closure = resolve_closure(&store, &target, None, &cancel).unwrap();
        let known: BTreeSet<ConceptId> = known.iter().map(|k| ConceptId::from(*k)).collect();

        reduce(&store, &target, &closure, &known, &cancel)
            .unwrap()
            .into_iter()
            .map(|id| id.to_string())
            .collect()
    }

    #[test]
    fn test_nothing_known_keeps_closure() {
        assert_eq!(reduced("top", &[]), vec!["base", "left", "right"]);
    }

    #[test]
    fn test_shared_prerequisite_survives_one_known_branch() {
        // base is still needed through right
        assert_eq!(reduced("top", &["left"]), vec!["base", "right"]);
    }

    #[test]
    fn test_shared_prerequisite_dropped_when_both_branches_known() {
        assert!(reduced("top", &["left", "right"]).is_empty());
    }

    #[test]
    fn test_known_outside_closure_is_ignored() {
        assert_eq!(reduced("left", &["right", "island"]), vec!["base"]);
    }
}
