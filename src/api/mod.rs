//! HTTP API surface.

pub mod routes;
pub mod types;

pub use routes::{router, AppState};

use std::sync::Arc;

use crate::config::Config;
use crate::rag::RagSystem;
use crate::store::{InMemoryVectorStore, VectorStore};

/// Start the HTTP server with an empty in-memory store.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    serve_with_store(config, Arc::new(InMemoryVectorStore::new())).await
}

/// Start the HTTP server against a caller-provided retrieval store.
pub async fn serve_with_store(config: Config, store: Arc<dyn VectorStore>) -> anyhow::Result<()> {
    let rag = RagSystem::new(&config, store)?;
    let state = Arc::new(AppState { rag });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, router(state)).await?;

    Ok(())
}
