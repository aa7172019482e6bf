//! HTTP request handlers for the server.
//!
//! Implements MVG queries, concept lookup and mutation, the domain tree and
//! health check using axum. Store access is blocking, so every handler
//! hands its work to `spawn_blocking` under the configured request timeout.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use ktree_domain::traits::{ConceptFilter, ConceptStore, MutableConceptStore};
use ktree_domain::{Concept, ConceptId, Domain, PrerequisiteEdge};
use ktree_resolver::{DomainTree, MvgEngine, MvgRequest, MvgResult, ResolveError, TargetRef};
use ktree_store::{GraphDocument, ReadView, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Stores the server can run on
pub trait GraphBackend:
    MutableConceptStore<Error = StoreError> + ReadView + Send + Sync + 'static
{
}

impl<T> GraphBackend for T where
    T: MutableConceptStore<Error = StoreError> + ReadView + Send + Sync + 'static
{
}

/// Shared application state
pub struct AppState<S> {
    /// The concept graph
    pub store: Arc<S>,
    /// MVG query engine
    pub engine: MvgEngine,
    /// Per-request time limit
    pub request_timeout: Duration,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            engine: self.engine.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

impl<S: GraphBackend> AppState<S> {
    /// Create state with the default engine and a 5 second timeout
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
            engine: MvgEngine::default(),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// MVG request body
///
/// Exactly one of `target` (id) and `target_name` is expected; `target`
/// wins when both are given.
#[derive(Debug, Deserialize)]
pub struct GenerateMvgRequest {
    /// Target concept id
    pub target: Option<ConceptId>,
    /// Target concept name, matched case-insensitively
    pub target_name: Option<String>,
    /// Restrict a name lookup to one domain
    pub domain: Option<Domain>,
    /// Concepts the learner already knows
    #[serde(default)]
    pub known: Vec<ConceptId>,
    /// Fail instead of returning unverified concepts
    #[serde(default)]
    pub verified_only: bool,
}

impl GenerateMvgRequest {
    fn into_request(self) -> Result<MvgRequest, AppError> {
        let target = match (self.target, self.target_name) {
            (Some(id), _) => TargetRef::Id(id),
            (None, Some(name)) => TargetRef::Name {
                name,
                domain: self.domain,
            },
            (None, None) => {
                return Err(AppError::BadRequest(
                    "Either target or target_name is required".to_string(),
                ))
            }
        };
        Ok(MvgRequest {
            target,
            known: self.known.into_iter().collect(),
            verified_only: self.verified_only,
        })
    }
}

/// Definition view of a concept
#[derive(Debug, Serialize, Deserialize)]
pub struct DefinitionResponse {
    /// Concept id
    pub id: ConceptId,
    /// Concept name
    pub name: String,
    /// Markdown definition
    pub definition: String,
}

/// Body of `POST /concepts/{id}/prerequisites`
#[derive(Debug, Deserialize)]
pub struct AddPrerequisiteRequest {
    /// The concept that must be learned first
    pub prerequisite: ConceptId,
}

/// Response to `POST /concepts`
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    /// Id of the new concept
    pub id: ConceptId,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Number of concepts
    pub concepts: usize,
    /// Number of requires edges
    pub edges: usize,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Query failed
    Resolve(ResolveError),
    /// Store access or mutation failed
    Store(StoreError),
    /// Concept lookup miss
    NotFound(String),
    /// Malformed request
    BadRequest(String),
    /// Internal server error
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Resolve(ResolveError::NotFound(_)) | AppError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::Resolve(ResolveError::Unverified(_))
            | AppError::Resolve(ResolveError::ClosureTooLarge { .. })
            | AppError::Store(StoreError::Integrity(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Resolve(ResolveError::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Resolve(_) | AppError::Store(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match self {
            AppError::Resolve(e) => e.to_string(),
            AppError::Store(e) => e.to_string(),
            AppError::NotFound(id) => format!("Concept not found: {}", id),
            AppError::BadRequest(msg) | AppError::Internal(msg) => msg,
        };

        if status.is_server_error() {
            tracing::error!("Request failed ({}): {}", status, message);
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

impl From<ResolveError> for AppError {
    fn from(e: ResolveError) -> Self {
        AppError::Resolve(e)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Store(e)
    }
}

/// Run blocking store work off the async runtime, bounded by the request timeout
///
/// On timeout the token is cancelled so a running traversal stops at its
/// next checkpoint.
async fn run_blocking<S, T, F>(state: &AppState<S>, work: F) -> Result<T, AppError>
where
    S: GraphBackend,
    T: Send + 'static,
    F: FnOnce(&S, &CancellationToken) -> Result<T, AppError> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let task = tokio::task::spawn_blocking(move || work(&store, &token));

    match tokio::time::timeout(state.request_timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(AppError::Internal(format!("Worker failed: {}", e))),
        Err(_) => {
            cancel.cancel();
            tracing::warn!("Request timed out after {:?}", state.request_timeout);
            Err(AppError::Resolve(ResolveError::Cancelled))
        }
    }
}

/// Run a mutation off the async runtime and wait for its outcome
///
/// Not bounded by the request timeout: a commit that lands after the
/// deadline must still be reported as the success it is.
async fn run_write<S, T, F>(state: &AppState<S>, work: F) -> Result<T, AppError>
where
    S: GraphBackend,
    T: Send + 'static,
    F: FnOnce(&S) -> Result<T, AppError> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || work(&store))
        .await
        .map_err(|e| AppError::Internal(format!("Worker failed: {}", e)))?
}

fn require_concept<V: ConceptStore<Error = StoreError>>(
    view: &V,
    id: &ConceptId,
) -> Result<Concept, AppError> {
    view.get_concept(id)?
        .ok_or_else(|| AppError::NotFound(id.to_string()))
}

/// POST /mvg/generate - Minimum viable graph for a target concept
async fn generate_mvg<S: GraphBackend>(
    State(state): State<AppState<S>>,
    Json(body): Json<GenerateMvgRequest>,
) -> Result<Json<MvgResult>, AppError> {
    let request = body.into_request()?;
    let engine = state.engine.clone();

    let result = run_blocking(&state, move |store, cancel| {
        let view = store.read_view()?;
        Ok(engine.generate_with_cancel(&view, &request, cancel)?)
    })
    .await?;

    Ok(Json(result))
}

/// GET /concepts - List concepts matching query filters
async fn list_concepts<S: GraphBackend>(
    State(state): State<AppState<S>>,
    Query(filter): Query<ConceptFilter>,
) -> Result<Json<Vec<Concept>>, AppError> {
    let concepts = run_blocking(&state, move |store, _| Ok(store.list(&filter)?)).await?;
    Ok(Json(concepts))
}

/// GET /concepts/{id} - Full concept record
async fn get_concept<S: GraphBackend>(
    State(state): State<AppState<S>>,
    Path(id): Path<ConceptId>,
) -> Result<Json<Concept>, AppError> {
    let concept = run_blocking(&state, move |store, _| require_concept(store, &id)).await?;
    Ok(Json(concept))
}

/// GET /concepts/{id}/definition - Definition view
async fn get_definition<S: GraphBackend>(
    State(state): State<AppState<S>>,
    Path(id): Path<ConceptId>,
) -> Result<Json<DefinitionResponse>, AppError> {
    let concept = run_blocking(&state, move |store, _| require_concept(store, &id)).await?;
    Ok(Json(DefinitionResponse {
        id: concept.id,
        name: concept.name,
        definition: concept.definition,
    }))
}

/// GET /concepts/{id}/prerequisites - Direct prerequisites, hydrated
async fn get_prerequisites<S: GraphBackend>(
    State(state): State<AppState<S>>,
    Path(id): Path<ConceptId>,
) -> Result<Json<Vec<Concept>>, AppError> {
    let concepts = run_blocking(&state, move |store, _| {
        let view = store.read_view()?;
        require_concept(&view, &id)?;
        neighbours(&view, view.prerequisites_of(&id)?)
    })
    .await?;
    Ok(Json(concepts))
}

/// GET /concepts/{id}/dependents - Concepts that directly require this one
async fn get_dependents<S: GraphBackend>(
    State(state): State<AppState<S>>,
    Path(id): Path<ConceptId>,
) -> Result<Json<Vec<Concept>>, AppError> {
    let concepts = run_blocking(&state, move |store, _| {
        let view = store.read_view()?;
        require_concept(&view, &id)?;
        neighbours(&view, view.dependents_of(&id)?)
    })
    .await?;
    Ok(Json(concepts))
}

fn neighbours<V: ConceptStore<Error = StoreError>>(
    view: &V,
    ids: impl IntoIterator<Item = ConceptId>,
) -> Result<Vec<Concept>, AppError> {
    let mut concepts = Vec::new();
    for id in ids {
        concepts.push(require_concept(view, &id)?);
    }
    Ok(concepts)
}

/// POST /concepts - Add a concept record
///
/// A blank id is replaced by a generated one.
async fn create_concept<S: GraphBackend>(
    State(state): State<AppState<S>>,
    Json(mut concept): Json<Concept>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    if concept.id.is_blank() {
        concept.id = ConceptId::generate(concept.domain, &concept.subfield, &concept.name);
    }

    let id = run_write(&state, move |store| Ok(store.add_concept(concept)?)).await?;
    tracing::info!("Created concept {}", id);
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// POST /concepts/{id}/prerequisites - Add a requires edge
async fn add_prerequisite<S: GraphBackend>(
    State(state): State<AppState<S>>,
    Path(id): Path<ConceptId>,
    Json(body): Json<AddPrerequisiteRequest>,
) -> Result<(StatusCode, Json<PrerequisiteEdge>), AppError> {
    let edge = PrerequisiteEdge::new(id, body.prerequisite);
    let stored = edge.clone();

    run_write(&state, move |store| Ok(store.add_prerequisite(stored)?)).await?;
    tracing::info!("Added edge: {}", edge);
    Ok((StatusCode::CREATED, Json(edge)))
}

/// GET /graph/tree/{domain} - Domain tree view
async fn get_domain_tree<S: GraphBackend>(
    State(state): State<AppState<S>>,
    Path(domain): Path<String>,
) -> Result<Json<DomainTree>, AppError> {
    let domain = Domain::parse(&domain)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown domain: {}", domain)))?;

    let tree = run_blocking(&state, move |store, cancel| {
        let view = store.read_view()?;
        Ok(DomainTree::build(&view, domain, cancel)?)
    })
    .await?;
    Ok(Json(tree))
}

/// GET /graph/export - Every concept and edge
async fn export_graph<S: GraphBackend>(
    State(state): State<AppState<S>>,
) -> Result<Json<GraphDocument>, AppError> {
    let document = run_blocking(&state, move |store, _| {
        let view = store.read_view()?;
        Ok(GraphDocument::from_store(&view)?)
    })
    .await?;
    Ok(Json(document))
}

/// GET /health - Health check with graph size
async fn health_check<S: GraphBackend>(
    State(state): State<AppState<S>>,
) -> Result<Json<HealthCheckResponse>, AppError> {
    let counts = run_blocking(&state, move |store, _| Ok(store.counts()?)).await?;
    Ok(Json(HealthCheckResponse {
        status: "healthy".to_string(),
        concepts: counts.concepts,
        edges: counts.edges,
    }))
}

/// Create the axum router with all routes
pub fn create_router<S: GraphBackend>(state: AppState<S>) -> AxumRouter {
    AxumRouter::new()
        .route("/mvg/generate", post(generate_mvg::<S>))
        .route("/concepts", get(list_concepts::<S>).post(create_concept::<S>))
        .route("/concepts/:id", get(get_concept::<S>))
        .route("/concepts/:id/definition", get(get_definition::<S>))
        .route(
            "/concepts/:id/prerequisites",
            get(get_prerequisites::<S>).post(add_prerequisite::<S>),
        )
        .route("/concepts/:id/dependents", get(get_dependents::<S>))
        .route("/graph/tree/:domain", get(get_domain_tree::<S>))
        .route("/graph/export", get(export_graph::<S>))
        .route("/health", get(health_check::<S>))
        .with_state(state)
}
