//! Integration tests for the ordinance relay
//!
//! These run the router with the real hyper client against a stub upstream bound to a local
//! port, so the whole path from caller to upstream and back goes over actual sockets.

use axum::Router;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use ordinance_relay::client::PoolSettings;
use ordinance_relay::upstream::Upstream;
use ordinance_relay::{AppState, build_router};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower::util::ServiceExt; // for oneshot()

#[derive(Debug, Clone)]
struct Captured {
    headers: HeaderMap,
    body: Value,
}

/// Starts a stub Messages API that answers every call with `status` and `body`, returning its
/// URL and the calls it received.
async fn spawn_stub_upstream(
    status: StatusCode,
    body: Value,
) -> (String, Arc<Mutex<Vec<Captured>>>) {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();

    let app = Router::new().route(
        "/v1/messages",
        post(move |headers: HeaderMap, axum::Json(request): axum::Json<Value>| {
            let sink = sink.clone();
            let body = body.clone();
            async move {
                sink.lock().unwrap().push(Captured {
                    headers,
                    body: request,
                });
                (status, axum::Json(body))
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/v1/messages"), captured)
}

fn relay(upstream_url: &str, api_key: Option<&str>) -> Router {
    let upstream = Upstream::builder()
        .url(upstream_url.parse().unwrap())
        .maybe_api_key(api_key.map(str::to_string))
        .build();
    let app_state = AppState::new(upstream, PoolSettings::default());
    build_router(app_state, &["http://localhost:3000".to_string()])
}

fn extract_request(body: Value) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .method("POST")
        .uri("/extract")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_prompt_round_trips_through_real_upstream() {
    let upstream_reply = json!({"id": "msg_1", "content": [{"text": "hi"}]});
    let (url, captured) = spawn_stub_upstream(StatusCode::OK, upstream_reply.clone()).await;

    let response = relay(&url, Some("sk-ant-integration"))
        .oneshot(extract_request(json!({"prompt": "hello"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await, upstream_reply);

    let calls = captured.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.headers["x-api-key"], "sk-ant-integration");
    assert_eq!(call.headers["anthropic-version"], "2023-06-01");
    assert_eq!(call.headers["content-type"], "application/json");
    assert_eq!(
        call.body,
        json!({
            "model": "claude-sonnet-4-20250514",
            "max_tokens": 1000,
            "messages": [{"role": "user", "content": "hello"}]
        })
    );
}

#[tokio::test]
async fn test_rate_limited_upstream_keeps_status() {
    let upstream_reply = json!({"type": "error", "message": "rate limited"});
    let (url, _captured) =
        spawn_stub_upstream(StatusCode::TOO_MANY_REQUESTS, upstream_reply.clone()).await;

    let response = relay(&url, Some("sk-ant-integration"))
        .oneshot(extract_request(json!({"prompt": "hello"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        response_json(response).await,
        json!({"error": {"type": "error", "message": "rate limited"}})
    );
}

#[tokio::test]
async fn test_unreachable_upstream_is_500() {
    // Bind and immediately release a port so nothing is listening on it.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let response = relay(&format!("http://{addr}/v1/messages"), Some("sk-ant-integration"))
        .oneshot(extract_request(json!({"prompt": "hello"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert!(body["error"].is_string(), "unexpected body: {body}");
    assert_eq!(body.as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn test_health_without_key() {
    let response = relay("http://127.0.0.1:1/v1/messages", None)
        .oneshot(
            axum::http::Request::builder()
                .uri("/health")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_json(response).await,
        json!({"status": "healthy", "api_key_set": false})
    );
}
