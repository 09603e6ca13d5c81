//! Error types for the proxy pipeline.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Errors surfaced to clients by the request pipeline.
///
/// Every variant maps to an HTTP status and the standard
/// `{"error":{"message":...,"type":"kallm_error"}}` envelope.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The request body could not be read.
    #[error("Failed to read request body")]
    BodyRead,

    /// The request body was not a valid chat completion request.
    #[error("Invalid request body")]
    InvalidRequest,

    /// The upstream could not be reached or failed at transport level.
    #[error("Upstream request failed")]
    Upstream(#[from] reqwest::Error),

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    fn status(&self) -> StatusCode {
        match self {
            ProxyError::BodyRead | ProxyError::InvalidRequest => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        error_response(self.status(), &self.to_string())
    }
}

/// Build the standard error envelope response.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    let body = Json(json!({
        "error": {
            "message": message,
            "type": "kallm_error",
        }
    }));
    (status, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ProxyError::BodyRead.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ProxyError::InvalidRequest.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ProxyError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_envelope_shape() {
        let response = error_response(StatusCode::BAD_GATEWAY, "Upstream request failed");
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
