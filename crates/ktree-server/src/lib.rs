//! Knowledge Tree Server
//!
//! HTTP surface of the prerequisite graph: MVG queries for the chat front
//! end, concept lookup for the tree view, and the mutation interface used
//! by content authoring.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use config::{Backend, ServerConfig};
use handlers::{create_router, AppState, GraphBackend};
use ktree_domain::traits::ConceptStore;
use ktree_gatekeeper::Gatekeeper;
use ktree_resolver::MvgEngine;
use ktree_store::{GraphDocument, MemoryStore, RetryingStore, SqliteStore, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Server binding or file error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The graph could not be opened or loaded
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A graph document could not be parsed
    #[error("Invalid graph document: {0}")]
    Document(#[from] serde_json::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Start the HTTP server
///
/// Opens the configured store and serves until the process is stopped.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    info!("Starting Knowledge Tree server");
    info!("Bind address: {}", config.bind_addr());
    info!("Storage backend: {:?}", config.storage.backend);
    info!("Request timeout: {} ms", config.request_timeout_ms);

    let gatekeeper = Gatekeeper::new(config.validation.clone());

    match config.storage.backend {
        Backend::Memory => {
            let store = match &config.storage.path {
                Some(path) => {
                    let document: GraphDocument =
                        serde_json::from_str(&std::fs::read_to_string(path)?)?;
                    info!(
                        "Loading {} concepts and {} edges from {}",
                        document.concepts.len(),
                        document.edges.len(),
                        path.display()
                    );
                    MemoryStore::from_document(document, gatekeeper)?
                }
                None => MemoryStore::with_gatekeeper(gatekeeper),
            };
            serve(store, &config).await
        }
        Backend::Sqlite => {
            let path = config
                .storage
                .path
                .as_ref()
                .ok_or_else(|| config::ConfigError::MissingField("storage.path".to_string()))?;
            info!("Opening SQLite database at {}", path.display());
            let sqlite = SqliteStore::with_options(
                path,
                Duration::from_millis(config.storage.busy_timeout_ms),
                gatekeeper,
            )?;
            serve(RetryingStore::new(sqlite, config.retry.clone()), &config).await
        }
    }
}

async fn serve<S: GraphBackend>(store: S, config: &ServerConfig) -> Result<(), ServerError> {
    let counts = store.counts()?;
    info!("Graph holds {} concepts and {} edges", counts.concepts, counts.edges);

    let state = AppState {
        store: Arc::new(store),
        engine: MvgEngine::new(config.resolver.clone()),
        request_timeout: config.request_timeout(),
    };
    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Server listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}
