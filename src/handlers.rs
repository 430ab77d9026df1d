/// Axum handlers for the relay
use crate::AppState;
use crate::client::HttpClient;
use crate::errors::RelayError;
use crate::models::{ExtractionRequest, HealthReport};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::{debug, info, instrument};

pub const STATUS_MESSAGE: &str = "Ordinance Parser API is running";

#[instrument]
pub async fn home() -> &'static str {
    STATUS_MESSAGE
}

#[instrument(skip(state))]
pub async fn health<T: HttpClient>(State(state): State<AppState<T>>) -> Json<HealthReport> {
    Json(HealthReport::healthy(state.upstream.api_key_set()))
}

/// Forwards the caller's prompt upstream and relays the answer.
///
/// A 200 from upstream is returned as-is. Any other upstream status is returned with the same
/// code and the upstream body wrapped as `{"error": <body>}`. Failures inside the relay itself
/// (unparseable body, missing `prompt`, transport errors, non-JSON upstream bodies) become a 500
/// via [`RelayError`].
#[instrument(skip(state, body))]
pub async fn extract<T: HttpClient>(
    State(state): State<AppState<T>>,
    body: Bytes,
) -> Result<Response, RelayError> {
    debug!("Received request body of size: {}", body.len());
    let request: ExtractionRequest =
        serde_json::from_slice(&body).map_err(|e| RelayError::InvalidBody(e.to_string()))?;

    let upstream_req = state.upstream.build_request(request.prompt)?;

    let response = state
        .http_client
        .request(upstream_req)
        .await
        .map_err(RelayError::Transport)?;

    let status = response.status();
    info!("API Status Code: {}", status.as_u16());

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .map_err(|e| RelayError::UpstreamBody(e.to_string()))?;
    let upstream_body: Value =
        serde_json::from_slice(&bytes).map_err(|e| RelayError::UpstreamBody(e.to_string()))?;
    info!("API Response: {}", upstream_body);

    if status != StatusCode::OK {
        return Ok((status, Json(json!({ "error": upstream_body }))).into_response());
    }

    Ok(Json(upstream_body).into_response())
}
