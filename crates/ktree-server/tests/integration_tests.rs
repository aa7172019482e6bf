//! Integration tests for the HTTP surface

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use ktree_domain::traits::MutableConceptStore;
use ktree_domain::{Concept, ConceptId, Domain, PrerequisiteEdge};
use ktree_resolver::{DomainTree, MvgEngine, MvgResult};
use ktree_server::handlers::{
    create_router, AppState, CreatedResponse, DefinitionResponse, ErrorResponse, GraphBackend,
    HealthCheckResponse,
};
use ktree_store::{GraphDocument, MemoryStore, RetryPolicy, RetryingStore, SqliteStore};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt; // for oneshot

fn seed<S: GraphBackend>(store: &S) {
    for concept in [
        Concept::axiom("extensionality", "Extensionality", Domain::Math, "set-theory")
            .with_definition("Sets with the same elements are equal.")
            .verified(),
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
}

/// Helper to create a router over a seeded in-memory graph
fn create_test_app() -> Router {
    let store = MemoryStore::new();
    seed(&store);
    create_router(AppState::new(store))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn get_json<T: DeserializeOwned>(app: Router, uri: &str) -> (StatusCode, T) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json<T: DeserializeOwned>(app: Router, uri: &str, body: &str) -> (StatusCode, T) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn ids(path: &[ConceptId]) -> Vec<&str> {
    path.iter().map(ConceptId::as_str).collect()
}

#[tokio::test]
async fn test_health_check_endpoint() {
    let (status, health): (_, HealthCheckResponse) = get_json(create_test_app(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health.status, "healthy");
    assert_eq!(health.concepts, 4);
    assert_eq!(health.edges, 3);
}

#[tokio::test]
async fn test_generate_full_path() {
    let (status, mvg): (_, MvgResult) = post_json(
        create_test_app(),
        "/mvg/generate",
        r#"{"target": "vector-space"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        ids(&mvg.path),
        vec!["extensionality", "empty-set", "ordered-pair", "vector-space"]
    );
    assert_eq!(mvg.target.id, ConceptId::from("vector-space"));
    assert_eq!(mvg.prerequisites.len(), 3);
}

#[tokio::test]
async fn test_generate_with_known() {
    let (status, mvg): (_, MvgResult) = post_json(
        create_test_app(),
        "/mvg/generate",
        r#"{"target": "vector-space", "known": ["empty-set"]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&mvg.path), vec!["ordered-pair", "vector-space"]);
}

#[tokio::test]
async fn test_generate_by_name() {
    let (status, mvg): (_, MvgResult) = post_json(
        create_test_app(),
        "/mvg/generate",
        r#"{"target_name": "empty set", "domain": "MATH"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&mvg.path), vec!["extensionality", "empty-set"]);
}

#[tokio::test]
async fn test_generate_unknown_target() {
    let (status, error): (_, ErrorResponse) = post_json(
        create_test_app(),
        "/mvg/generate",
        r#"{"target": "nonexistent-id"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(error.error.contains("nonexistent-id"));
}

#[tokio::test]
async fn test_generate_verified_only() {
    let (status, _): (_, ErrorResponse) = post_json(
        create_test_app(),
        "/mvg/generate",
        r#"{"target": "ordered-pair", "verified_only": true}"#,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_concept_views() {
    let app = create_test_app();

    let (status, concept): (_, Concept) = get_json(app.clone(), "/concepts/empty-set").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(concept.name, "Empty Set");

    let (status, definition): (_, DefinitionResponse) =
        get_json(app.clone(), "/concepts/extensionality/definition").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(definition.definition, "Sets with the same elements are equal.");

    let (status, prerequisites): (_, Vec<Concept>) =
        get_json(app.clone(), "/concepts/ordered-pair/prerequisites").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prerequisites.len(), 1);
    assert_eq!(prerequisites[0].id, ConceptId::from("empty-set"));

    let (status, dependents): (_, Vec<Concept>) =
        get_json(app.clone(), "/concepts/ordered-pair/dependents").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dependents[0].id, ConceptId::from("vector-space"));

    let (status, _): (_, ErrorResponse) = get_json(app, "/concepts/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_concepts_with_filters() {
    let app = create_test_app();

    let (status, axioms): (_, Vec<Concept>) =
        get_json(app.clone(), "/concepts?domain=MATH&axioms_only=true").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(axioms.len(), 1);
    assert_eq!(axioms[0].id, ConceptId::from("extensionality"));

    let (_, all): (_, Vec<Concept>) = get_json(app, "/concepts").await;
    let levels: Vec<u32> = all.iter().map(|c| c.complexity_level).collect();
    assert_eq!(levels, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn test_create_concept_and_edge() {
    let app = create_test_app();

    let (status, created): (_, CreatedResponse) = post_json(
        app.clone(),
        "/concepts",
        r#"{"id": "", "name": "Basis", "domain": "MATH", "subfield": "linear-algebra",
            "complexity_level": 4, "books": ["Linear Algebra Done Right"]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created.id.as_str().starts_with("math-linear-algebra-basis-"));

    let uri = format!("/concepts/{}/prerequisites", created.id);
    let (status, edge): (_, PrerequisiteEdge) =
        post_json(app.clone(), &uri, r#"{"prerequisite": "vector-space"}"#).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(edge.prerequisite, ConceptId::from("vector-space"));

    let body = format!(r#"{{"target": "{}"}}"#, created.id);
    let (_, mvg): (_, MvgResult) = post_json(app, "/mvg/generate", &body).await;
    assert_eq!(mvg.path.len(), 5);
    assert_eq!(mvg.target.books, vec!["Linear Algebra Done Right"]);
}

#[tokio::test]
async fn test_cycle_rejected_and_graph_unchanged() {
    let app = create_test_app();
    let (_, before): (_, GraphDocument) = get_json(app.clone(), "/graph/export").await;

    let (status, error): (_, ErrorResponse) = post_json(
        app.clone(),
        "/concepts/empty-set/prerequisites",
        r#"{"prerequisite": "vector-space"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(error.error.contains("Cycle detected"));

    let (status, _): (_, ErrorResponse) = post_json(
        app.clone(),
        "/concepts/empty-set/prerequisites",
        r#"{"prerequisite": "empty-set"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, after): (_, GraphDocument) = get_json(app, "/graph/export").await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_domain_tree() {
    let (status, tree): (_, DomainTree) = get_json(create_test_app(), "/graph/tree/math").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(tree.domain, Domain::Math);
    assert_eq!(tree.total_nodes, 4);
    assert_eq!(tree.roots, vec![ConceptId::from("extensionality")]);
}

#[tokio::test]
async fn test_sqlite_backend_serves_same_answers() {
    let dir = tempfile::tempdir().unwrap();
    let sqlite = SqliteStore::new(dir.path().join("ktree.db")).unwrap();
    let store = RetryingStore::new(sqlite, RetryPolicy::default());
    seed(&store);
    let app = create_router(AppState::new(store));

    let (status, mvg): (_, MvgResult) = post_json(
        app,
        "/mvg/generate",
        r#"{"target": "vector-space", "known": ["empty-set"]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&mvg.path), vec!["ordered-pair", "vector-space"]);
}

#[tokio::test]
async fn test_slow_write_reports_its_commit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ktree.db");
    let store = SqliteStore::new(&path).unwrap();
    seed(&store);
    let app = create_router(AppState {
        store: Arc::new(store),
        engine: MvgEngine::default(),
        request_timeout: Duration::from_millis(100),
    });

    // another process holds the write lock well past the request timeout
    let other = rusqlite::Connection::open(&path).unwrap();
    other.execute_batch("BEGIN IMMEDIATE").unwrap();
    let holder = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(600));
        other.execute_batch("COMMIT").unwrap();
    });

    let (status, created): (_, CreatedResponse) = post_json(
        app.clone(),
        "/concepts",
        r#"{"id": "basis", "name": "Basis", "domain": "MATH", "subfield": "linear-algebra",
            "complexity_level": 4}"#,
    )
    .await;
    holder.join().unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created.id, ConceptId::from("basis"));
    let (status, concept): (_, Concept) = get_json(app, "/concepts/basis").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(concept.name, "Basis");
}
