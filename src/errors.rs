use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Why an estimation payload was rejected at the trust boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseDefect {
    MalformedPayload,
    SchemaMismatch,
}

impl std::fmt::Display for ResponseDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseDefect::MalformedPayload => f.write_str("malformed payload"),
            ResponseDefect::SchemaMismatch => f.write_str("schema mismatch"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Estimation service not configured, unreachable or answering with an error status.
    #[error("estimation service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("could not understand the calorie estimation: {0}")]
    InvalidResponse(ResponseDefect),

    #[error("{0}")]
    Validation(String),

    /// Workflow operation called in the wrong phase.
    #[error("{0}")]
    InvalidState(&'static str),

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

pub type TrackerResult<T> = Result<T, TrackerError>;

impl TrackerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        TrackerError::Validation(msg.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TrackerError::ServiceUnavailable(_) => "service_unavailable",
            TrackerError::InvalidResponse(_) => "invalid_response",
            TrackerError::Validation(_) => "validation_error",
            TrackerError::InvalidState(_) => "invalid_state",
            TrackerError::Storage(_) => "storage_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            TrackerError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            TrackerError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
            TrackerError::Validation(_) => StatusCode::BAD_REQUEST,
            TrackerError::InvalidState(_) => StatusCode::CONFLICT,
            TrackerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, kind = self.kind(), "request failed");
        }
        let body = json!({ "error": self.kind(), "message": self.to_string() });
        (status, Json(body)).into_response()
    }
}
