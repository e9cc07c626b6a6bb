//! Web UI server.

pub mod handlers;
pub mod page;
pub mod session;

use crate::agent::{AgentConfig, CandidateAgent};
use crate::analysis::FragmentSource;
use crate::config::Config;
use anyhow::{Context, Result};
use axum::{
    routing::{get, post, put},
    Router,
};
use session::SessionStore;

const SESSION_SWEEP_PERIOD: Duration = Duration::from_secs(60);
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application state injected into all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<dyn FragmentSource>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(agent: Arc<dyn FragmentSource>, session_ttl: Duration) -> Self {
        Self {
            agent,
            sessions: SessionStore::new(session_ttl),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/session", post(handlers::create_session))
        .route(
            "/api/session/:id",
            get(handlers::session_status).delete(handlers::end_session),
        )
        .route(
            "/api/session/:id/credentials",
            put(handlers::update_credentials),
        )
        .route("/api/analyze/multi", post(handlers::analyze_multi))
        .route("/api/analyze/single", post(handlers::analyze_single))
        .with_state(state)
}

/// Bind and serve the web UI until Ctrl-C.
pub async fn serve(config: &Config) -> Result<()> {
    let agent = CandidateAgent::new(AgentConfig::from_config(config))
        .context("Failed to initialize agent")?;
    let session_ttl = Duration::from_secs(config.server.session_ttl_minutes * 60);
    let state = AppState::new(Arc::new(agent), session_ttl);
    let sweeper = state.sessions.spawn_sweeper(SESSION_SWEEP_PERIOD);
    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Candilyzer UI listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sweeper.abort();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
