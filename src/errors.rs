//! Errors raised while relaying an extraction request.
//!
//! Every variant is reported to the caller the same way: a 500 with a JSON body of the form
//! `{"error": "<message>"}`. Upstream non-success statuses are not errors of the relay and never
//! pass through here; the handler relays those with their original status code.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The caller's body was not JSON, or had no `prompt` key.
    #[error("{0}")]
    InvalidBody(String),

    /// The outbound request could not be assembled.
    #[error("failed to build upstream request: {0}")]
    RequestBuild(String),

    /// The upstream could not be reached (DNS, TLS, connection reset, ...).
    #[error("{0}")]
    Transport(BoxError),

    /// The upstream answered, but its body could not be read or was not JSON.
    #[error("invalid upstream response: {0}")]
    UpstreamBody(String),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        error!("Error: {}", message);
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": message }))).into_response()
    }
}
