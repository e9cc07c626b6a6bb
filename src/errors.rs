//! Error taxonomy shared by the terminal and web front-ends.
//!
//! Validation failures are raised before any external call is issued.
//! Client-level failures live next to the clients that produce them
//! (`agent::llm::LlmError`, `agent::tools::ToolError`) and surface here as
//! [`AnalysisError`] once they cross the invocation boundary.

use crate::agent::llm::LlmError;
use crate::credentials::CredentialKind;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// A submission was rejected before anything left the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Multi-candidate form is missing usernames or the job role.
    #[error("Please enter both usernames and job role.")]
    MissingUsernamesOrRole,

    /// Single-candidate form is missing the username or the job role.
    #[error("GitHub username and job role are required.")]
    MissingUsernameOrRole,

    /// One or more of the three credentials is empty.
    #[error("Please enter all API keys in the sidebar.")]
    MissingCredentials(Vec<CredentialKind>),
}

/// An invocation failed after it started. The message is shown verbatim in
/// place of the result; no score is derived.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Model request failed: {0}")]
    Llm(#[from] LlmError),

    #[error("HTTP client setup failed: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Agent did not produce a final answer within {0} tool rounds")]
    ToolRoundsExceeded(usize),
}

/// HTTP-facing error for the web UI.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Session not found: {0}")]
    SessionNotFound(uuid::Uuid),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),
            AppError::SessionNotFound(_) => (
                StatusCode::NOT_FOUND,
                "SESSION_NOT_FOUND",
                "Session expired, reload the page".to_string(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::MissingUsernamesOrRole.to_string(),
            "Please enter both usernames and job role."
        );
        assert_eq!(
            ValidationError::MissingCredentials(vec![CredentialKind::SearchApiKey]).to_string(),
            "Please enter all API keys in the sidebar."
        );
    }

    #[test]
    fn test_validation_maps_to_bad_request() {
        let response = AppError::from(ValidationError::MissingUsernameOrRole).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::SessionNotFound(uuid::Uuid::nil()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_analysis_error_message() {
        let err = AnalysisError::from(LlmError::Api {
            status: 401,
            message: "Authentication Fails (no such user)".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Model request failed: API error (status 401): Authentication Fails (no such user)"
        );
    }
}
