use axum::response::{IntoResponse, Response};
use axum::{Json, http::StatusCode};
use serde_json::{Value, json};
use wai_core::{GraphError, ValidationError};

/// Failures surfaced at the HTTP boundary. Each request maps its own error to
/// a status code; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("invalid request")]
    Validation(#[from] ValidationError),
    #[error("failed to process webhook payload: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("verification request is missing parameters")]
    VerificationRequest,
    #[error("invalid verify token")]
    Auth,
    #[error("missing WHATSAPP_VERIFY_TOKEN env value")]
    Configuration,
    #[error("upstream error: {0}")]
    Upstream(#[from] GraphError),
    #[error("internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntakeError {
    pub fn status(&self) -> StatusCode {
        match self {
            IntakeError::Validation(_)
            | IntakeError::Parse(_)
            | IntakeError::VerificationRequest => StatusCode::BAD_REQUEST,
            IntakeError::Auth => StatusCode::FORBIDDEN,
            IntakeError::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            IntakeError::Upstream(GraphError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            IntakeError::Upstream(_) => StatusCode::BAD_GATEWAY,
            IntakeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        match self {
            IntakeError::Validation(details) => {
                json!({ "error": "Invalid request", "details": details })
            }
            IntakeError::Parse(err) => json!({
                "error": "Failed to process webhook payload",
                "details": err.to_string(),
            }),
            IntakeError::VerificationRequest => json!({ "success": false }),
            IntakeError::Auth => json!({ "error": "Invalid token" }),
            IntakeError::Configuration => {
                json!({ "error": "Missing WHATSAPP_VERIFY_TOKEN env value" })
            }
            IntakeError::Upstream(GraphError::Config(_)) | IntakeError::Internal(_) => {
                json!({ "error": "Unknown error" })
            }
            IntakeError::Upstream(err) => json!({ "error": err.upstream_message() }),
        }
    }
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}
