//! Property tests for the resolution pipeline over random DAGs

use ktree_domain::traits::{ConceptStore, MutableConceptStore};
use ktree_domain::{Concept, ConceptId, Domain, PrerequisiteEdge};
use ktree_resolver::{generate_mvg, order, resolve_closure, MvgEngine, MvgRequest};
use ktree_store::{ConceptGraph, MemoryStore, ReadView, SqliteStore};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const NODES: usize = 12;

fn id(i: usize) -> ConceptId {
    ConceptId::new(format!("c{:02}", i))
}

/// Edges only point from a higher index to a lower one, so the graph is a DAG
fn build(edges: &[(usize, usize)], levels: &[u32]) -> Arc<ConceptGraph> {
    let store = MemoryStore::new();
    for i in 0..NODES {
        store
            .add_concept(Concept::new(id(i), format!("C{}", i), Domain::Math, "algebra", levels[i]))
            .unwrap();
    }
    for &(a, b) in edges {
        let (hi, lo) = if a > b { (a, b) } else { (b, a) };
        if hi != lo {
            store.add_prerequisite(PrerequisiteEdge::new(id(hi), id(lo))).unwrap();
        }
    }
    store.snapshot().unwrap()
}

/// Reference answer: everything reachable from the target avoiding known nodes
fn reachable_avoiding(
    graph: &ConceptGraph,
    target: &ConceptId,
    known: &BTreeSet<ConceptId>,
) -> BTreeSet<ConceptId> {
    let mut seen = BTreeSet::new();
    let mut stack = vec![target.clone()];
    while let Some(current) = stack.pop() {
        for p in graph.prerequisites_of(&current).unwrap() {
            if !known.contains(&p) && &p != target && seen.insert(p.clone()) {
                stack.push(p);
            }
        }
    }
    seen
}

fn graph_strategy() -> impl Strategy<Value = (Vec<(usize, usize)>, Vec<u32>)> {
    (
        prop::collection::vec((0..NODES, 0..NODES), 0..30),
        prop::collection::vec(0u32..4, NODES),
    )
}

proptest! {
    /// Property: the closure excludes the target and is closed under requires
    #[test]
    fn test_closure_is_closed((edges, levels) in graph_strategy(), t in 0..NODES) {
        let graph = build(&edges, &levels);
        let target = id(t);
        let closure = resolve_closure(&graph, &target, None, &CancellationToken::new()).unwrap();

        prop_assert!(!closure.contains(&target));
        for c in &closure {
            for p in graph.prerequisites_of(c).unwrap() {
                prop_assert!(closure.contains(&p) || p == target);
            }
        }
        prop_assert_eq!(closure, reachable_avoiding(&graph, &target, &BTreeSet::new()));
    }

    /// Property: the path respects every edge and ends at the target
    #[test]
    fn test_path_respects_edges(
        (edges, levels) in graph_strategy(),
        t in 0..NODES,
        known in prop::collection::btree_set(0..NODES, 0..4),
    ) {
        let graph = build(&edges, &levels);
        let target = id(t);
        let known: BTreeSet<ConceptId> = known.into_iter().map(id).collect();
        let mvg = generate_mvg(&graph, &target, &known).unwrap();

        prop_assert_eq!(mvg.path.last(), Some(&target));
        prop_assert_eq!(mvg.path.len(), mvg.prerequisites.len() + 1);

        let position: HashMap<&ConceptId, usize> =
            mvg.path.iter().enumerate().map(|(i, c)| (c, i)).collect();
        for edge in graph.edges() {
            if let (Some(a), Some(b)) = (position.get(&edge.concept), position.get(&edge.prerequisite)) {
                prop_assert!(b < a, "{} placed after {}", edge.prerequisite, edge.concept);
            }
        }
    }

    /// Property: prerequisites are exactly what is needed given the known set
    #[test]
    fn test_minimal_and_complete(
        (edges, levels) in graph_strategy(),
        t in 0..NODES,
        known in prop::collection::btree_set(0..NODES, 0..6),
    ) {
        let graph = build(&edges, &levels);
        let target = id(t);
        let known: BTreeSet<ConceptId> = known.into_iter().map(id).collect();
        let mvg = generate_mvg(&graph, &target, &known).unwrap();

        let returned: BTreeSet<ConceptId> = mvg.prerequisites.iter().map(|c| c.id.clone()).collect();
        prop_assert_eq!(returned.len(), mvg.prerequisites.len());
        prop_assert!(returned.is_disjoint(&known));
        prop_assert_eq!(returned, reachable_avoiding(&graph, &target, &known));
    }

    /// Property: identical inputs give identical output, including order
    #[test]
    fn test_idempotent((edges, levels) in graph_strategy(), t in 0..NODES) {
        let graph = build(&edges, &levels);
        let engine = MvgEngine::default();
        let request = MvgRequest::new(id(t));

        let first = engine.generate(&graph, &request).unwrap();
        let second = engine.generate(&graph, &request).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Property: knowing the full closure leaves only the target
    #[test]
    fn test_full_known_set((edges, levels) in graph_strategy(), t in 0..NODES) {
        let graph = build(&edges, &levels);
        let target = id(t);
        let closure = resolve_closure(&graph, &target, None, &CancellationToken::new()).unwrap();
        let mvg = generate_mvg(&graph, &target, &closure).unwrap();

        prop_assert!(mvg.prerequisites.is_empty());
        prop_assert_eq!(mvg.path, vec![target]);
    }
}

#[test]
fn test_queries_run_in_parallel_against_one_snapshot() {
    let graph = build(&[(1, 0), (2, 1), (3, 2), (4, 3)], &[0, 1, 2, 3, 4, 0, 0, 0, 0, 0, 0, 0]);
    let expected = generate_mvg(&graph, &id(4), &BTreeSet::new()).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let graph = Arc::clone(&graph);
            std::thread::spawn(move || generate_mvg(&graph, &id(4), &BTreeSet::new()).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
    assert_eq!(expected.path, vec![id(0), id(1), id(2), id(3), id(4)]);
}

#[test]
fn test_writer_does_not_disturb_a_running_query() {
    let store = MemoryStore::new();
    store
        .add_concept(Concept::axiom("ext", "Extensionality", Domain::Math, "set-theory"))
        .unwrap();
    store
        .add_concept(Concept::new("empty", "Empty Set", Domain::Math, "set-theory", 1))
        .unwrap();
    store.add_prerequisite(PrerequisiteEdge::new("empty", "ext")).unwrap();

    let view = store.snapshot().unwrap();
    store
        .add_concept(Concept::new("pair", "Ordered Pair", Domain::Math, "set-theory", 2))
        .unwrap();

    // the view taken before the write still answers for the old graph
    assert!(!view.exists(&"pair".into()).unwrap());
    let mvg = generate_mvg(&view, &"empty".into(), &BTreeSet::new()).unwrap();
    assert_eq!(mvg.path, vec![ConceptId::from("ext"), ConceptId::from("empty")]);
}

#[test]
fn test_sqlite_query_sees_one_committed_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ktree.db");
    let reader = SqliteStore::new(&path).unwrap();
    let writer = SqliteStore::new(&path).unwrap();
    for (cid, level) in [("t", 2), ("a", 1), ("b", 1)] {
        writer
            .add_concept(Concept::new(cid, cid.to_uppercase(), Domain::Math, "algebra", level))
            .unwrap();
    }
    writer.add_prerequisite(PrerequisiteEdge::new("t", "a")).unwrap();
    writer.add_prerequisite(PrerequisiteEdge::new("t", "b")).unwrap();

    let target = ConceptId::from("t");
    let token = CancellationToken::new();
    let view = reader.read_view().unwrap();
    let closure = resolve_closure(&view, &target, None, &token).unwrap();
    assert_eq!(closure.len(), 2);

    // a concurrent commit between the closure and the ordering must not leak in
    let handle =
        std::thread::spawn(move || writer.add_prerequisite(PrerequisiteEdge::new("a", "b")));
    std::thread::sleep(Duration::from_millis(200));
    assert!(!handle.is_finished());

    let path_ids = order(&view, &target, &closure, &token).unwrap();
    assert_eq!(path_ids, vec![ConceptId::from("a"), ConceptId::from("b"), target.clone()]);

    drop(view);
    handle.join().unwrap().unwrap();

    let mvg = generate_mvg(&reader.read_view().unwrap(), &target, &BTreeSet::new()).unwrap();
    assert_eq!(mvg.path, vec![ConceptId::from("b"), ConceptId::from("a"), target]);
}
