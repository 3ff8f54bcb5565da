//! HTTP routing and server startup.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use rxquery_audit::store::FileAuditStore;
use rxquery_core::AppConfig;
use rxquery_graph::{GraphConfig, LazyGraphStore};
use rxquery_synth::{LlmClient, SynthError, Synthesizer};

use crate::error::Result;
use crate::pipeline::ChatService;

#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Build shared state from configuration.
///
/// Fails when the model-provider credential is missing. The graph store
/// is not contacted until the first query.
pub fn build_state(config: &AppConfig) -> Result<AppState> {
    config.validate()?;

    let llm = LlmClient::new(&config.llm).map_err(SynthError::Generation)?;
    let synthesizer = Synthesizer::new(Arc::new(llm));
    let store = LazyGraphStore::new(GraphConfig::from(&config.neo4j));

    let mut chat = ChatService::new(synthesizer, Arc::new(store));
    if let Some(dir) = &config.audit.dir {
        let audit = FileAuditStore::new(dir)?;
        tracing::info!(dir = %dir, "Audit trail enabled");
        chat = chat.with_audit_store(Arc::new(audit));
    }

    Ok(AppState {
        chat: Arc::new(chat),
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The body is taken as raw bytes so malformed JSON maps to the same 400
/// response as a missing question.
async fn chat(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    state.chat.handle_body(&body).await
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Serve on all interfaces until Ctrl+C or SIGTERM.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, version = env!("CARGO_PKG_VERSION"), "Server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
