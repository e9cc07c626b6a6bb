//! HTTP handlers for the web UI.

use crate::analysis;
use crate::credentials::{CredentialSet, CredentialStatus};
use crate::errors::AppError;
use crate::request::{AnalysisForm, MultiCandidateForm, SingleCandidateForm};
use crate::server::page::INDEX_HTML;
use crate::server::session::CredentialUpdate;
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html,
    },
    Json,
};
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, error};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
    pub credentials: CredentialStatus,
}

#[derive(Debug, Deserialize)]
pub struct MultiAnalyzeBody {
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(flatten)]
    pub form: MultiCandidateForm,
}

#[derive(Debug, Deserialize)]
pub struct SingleAnalyzeBody {
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(flatten)]
    pub form: SingleCandidateForm,
}

/// GET /
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "candilyzer"
    }))
}

/// POST /api/session
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionCreated>) {
    let session_id = state.sessions.create().await;
    debug!("Created session {}", session_id);
    (
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id,
            credentials: CredentialSet::default().status(),
        }),
    )
}

/// PUT /api/session/:id/credentials
pub async fn update_credentials(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<CredentialUpdate>,
) -> Result<Json<CredentialStatus>, AppError> {
    state
        .sessions
        .update(id, update)
        .await
        .map(Json)
        .ok_or(AppError::SessionNotFound(id))
}

/// GET /api/session/:id
pub async fn session_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CredentialStatus>, AppError> {
    state
        .sessions
        .status(id)
        .await
        .map(Json)
        .ok_or(AppError::SessionNotFound(id))
}

/// DELETE /api/session/:id
pub async fn end_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        debug!("Ended session {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::SessionNotFound(id))
    }
}

/// POST /api/analyze/multi
pub async fn analyze_multi(
    State(state): State<AppState>,
    Json(body): Json<MultiAnalyzeBody>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    analyze(state, body.session_id, AnalysisForm::Multi(body.form)).await
}

/// POST /api/analyze/single
pub async fn analyze_single(
    State(state): State<AppState>,
    Json(body): Json<SingleAnalyzeBody>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    analyze(state, body.session_id, AnalysisForm::Single(body.form)).await
}

/// Validate, then answer with the update stream as SSE. Validation errors
/// are returned as a plain JSON error before any stream is opened.
async fn analyze(
    state: AppState,
    session_id: Option<Uuid>,
    form: AnalysisForm,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let credentials = match session_id {
        Some(id) => state.sessions.credentials(id).await,
        None => CredentialSet::default(),
    };
    let mut updates = analysis::start(state.agent.as_ref(), &credentials, &form)?;

    let stream = async_stream::stream! {
        while let Some(update) = updates.next().await {
            match Event::default().event(update.event_name()).json_data(&update) {
                Ok(event) => yield Ok::<_, Infallible>(event),
                Err(e) => {
                    error!(event = update.event_name(), error = %e, "Failed to serialize SSE event; dropping");
                }
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    ))
}
