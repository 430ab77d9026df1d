//! Ordinance relay - forwards extraction prompts to the Anthropic Messages API
//!
//! The relay accepts `{"prompt": ...}` from the ordinance parser frontend, wraps it in a
//! fixed-shape Messages API request, and hands back whatever the upstream answers.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum_prometheus::{
    GenericMetricLayer, Handle, PrometheusMetricLayerBuilder,
    metrics_exporter_prometheus::PrometheusHandle,
};
use std::borrow::Cow;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument};

pub mod client;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod upstream;

use client::{HttpClient, HyperClient, PoolSettings};
use handlers::{extract, health, home};
use upstream::Upstream;

/// The application state: the HTTP client used to reach the upstream, and the upstream itself
#[derive(Clone, Debug)]
pub struct AppState<T: HttpClient> {
    pub http_client: T,
    pub upstream: Arc<Upstream>,
}

impl AppState<HyperClient> {
    /// Create a new AppState with the default Hyper client
    pub fn new(upstream: Upstream, pool: PoolSettings) -> Self {
        let http_client = client::create_hyper_client(pool);
        Self {
            http_client,
            upstream: Arc::new(upstream),
        }
    }
}

impl<T: HttpClient> AppState<T> {
    /// Create a new AppState with a custom HTTP client (useful for testing)
    pub fn with_client(upstream: Upstream, http_client: T) -> Self {
        Self {
            http_client,
            upstream: Arc::new(upstream),
        }
    }
}

/// Build the main router for the relay
/// This creates routes for:
/// - `/` - A plain status message
/// - `/health` - Liveness and whether an API key is configured
/// - `/extract` (and `/api/extract`) - Forwards a prompt upstream
///
/// Cross-origin requests are only answered with CORS headers for `origins`. Request bodies are
/// not size-limited; prompts of any length are forwarded.
#[instrument(skip(state))]
pub fn build_router<T: HttpClient + Clone + Send + Sync + 'static>(
    state: AppState<T>,
    origins: &[String],
) -> Router {
    info!("Building router");
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/extract", post(extract))
        .route("/api/extract", post(extract))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(origins))
}

/// Builds a CORS layer that only admits the given origins.
///
/// Origins that can't be used as a header value are logged and dropped, as is `*`: a wildcard
/// can't be mixed with an explicit list.
pub fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| {
            if origin == "*" {
                error!("Wildcard CORS origin is not supported, ignoring it");
                return None;
            }
            match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(e) => {
                    error!("Invalid CORS origin '{}': {}", origin, e);
                    None
                }
            }
        })
        .collect::<Vec<_>>();

    info!("Allowing CORS origins: {:?}", allowed);

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Builds a router for the metrics endpoint.
#[instrument(skip(handle))]
pub fn build_metrics_router(handle: PrometheusHandle) -> Router {
    info!("Building metrics router");
    Router::new().route(
        "/metrics",
        axum::routing::get(move || async move { handle.render() }),
    )
}

type MetricsLayerAndHandle = (
    GenericMetricLayer<'static, PrometheusHandle, Handle>,
    PrometheusHandle,
);

/// Builds a layer and handle for prometheus metrics collection.
///
/// The prefix is prepended to every metric name, e.g. `<prefix>_http_requests_total`.
pub fn build_metrics_layer_and_handle(
    prefix: impl Into<Cow<'static, str>>,
) -> MetricsLayerAndHandle {
    info!("Building metrics layer");
    PrometheusMetricLayerBuilder::new()
        .with_prefix(prefix)
        .enable_response_body_size(true)
        .with_endpoint_label_type(axum_prometheus::EndpointLabel::Exact)
        .with_default_metrics()
        .build_pair()
}
