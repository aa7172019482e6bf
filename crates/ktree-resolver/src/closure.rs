//! Prerequisite Resolver: transitive closure of a target's requires edges

use crate::{checkpoint, ResolveError};
use ktree_domain::traits::ConceptStore;
use ktree_domain::ConceptId;
use std::collections::{BTreeSet, VecDeque};
use tokio_util::sync::CancellationToken;

/// Every concept the target transitively requires, excluding the target
///
/// Breadth-first walk over requires edges with a visited set, so a concept
/// reached through several branches is collected once. Related links are
/// never followed.
///
/// # Errors
///
/// - `NotFound` if `target` is not in the store
/// - `ClosureTooLarge` if `limit` is set and the closure grows past it
/// - `Cancelled` if `cancel` fires during the walk
pub fn resolve_closure<S>(
    store: &S,
    target: &ConceptId,
    limit: Option<usize>,
    cancel: &CancellationToken,
) -> Result<BTreeSet<ConceptId>, ResolveError>
where
    S: ConceptStore + ?Sized,
    S::Error: std::fmt::Display,
{
    let found = store
        .exists(target)
        .map_err(|e| ResolveError::store(format!("Failed to look up {}", target), e))?;
    if !found {
        return Err(ResolveError::NotFound(target.to_string()));
    }

    let mut closure = BTreeSet::new();
    let mut queue = VecDeque::from([target.clone()]);

    while let Some(current) = queue.pop_front() {
        checkpoint(cancel)?;

        let prerequisites = store.prerequisites_of(&current).map_err(|e| {
            ResolveError::store(format!("Failed to read prerequisites of {}", current), e)
        })?;

        for prerequisite in prerequisites {
            // The target cannot appear in an acyclic graph; skip it regardless
            if &prerequisite == target || !closure.insert(prerequisite.clone()) {
                continue;
            }
            if let Some(limit) = limit {
                if closure.len() > limit {
                    tracing::warn!("Closure of {} exceeds {} concepts", target, limit);
                    return Err(ResolveError::ClosureTooLarge { limit });
                }
            }
            queue.push_back(prerequisite);
        }
    }

    tracing::debug!("Closure of {}: {} concepts", target, closure.len());
    Ok(closure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::diamond;

    #[test]
    fn test_closure_collects_shared_prerequisite_once() {
        let store = diamond();
        let closure = resolve_closure(&store, &"top".into(), None, &CancellationToken::new()).unwrap();

        let ids: Vec<&str> = closure.iter().map(ConceptId::as_str).collect();
        assert_eq!(ids, vec!["base", "left", "right"]);
    }

    #[test]
    fn test_closure_of_axiom_is_empty() {
        let store = diamond();
        let closure =
            resolve_closure(&store, &"base".into(), None, &CancellationToken::new()).unwrap();
        assert!(closure.is_empty());
    }

    #[test]
    fn test_unknown_target() {
        let store = diamond();
        let err = resolve_closure(&store, &"ghost".into(), None, &CancellationToken::new())
            .unwrap_err();
        assert_eq!(err, ResolveError::NotFound("ghost".to_string()));
    }

    #[test]
    fn test_related_links_not_followed() {
        let store = diamond();
        // "left" lists "island" as related; it must not enter the closure
        let closure =
            resolve_closure(&store, &"left".into(), None, &CancellationToken::new()).unwrap();
        assert!(!closure.contains(&ConceptId::from("island")));
    }

    #[test]
    fn test_limit_guard() {
        let store = diamond();
        let err = resolve_closure(&store, &"top".into(), Some(2), &CancellationToken::new())
            .unwrap_err();
        assert_eq!(err, ResolveError::ClosureTooLarge { limit: 2 });
    }

    #[test]
    fn test_cancelled_before_start() {
        let store = diamond();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = resolve_closure(&store, &"top".into(), None, &cancel).unwrap_err();
        assert_eq!(err, ResolveError::Cancelled);
    }
}
