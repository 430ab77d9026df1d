/// The upstream is the Anthropic Messages endpoint that extraction prompts are forwarded to.
///
/// ## Building requests
/// Every outbound request has the same shape: a fixed model, a fixed token ceiling, and a single
/// user message carrying the caller's prompt. The API key travels in the `x-api-key` header and
/// the API version in `anthropic-version`. Callers cannot influence any of these.
use crate::errors::RelayError;
use crate::models::{ChatMessage, UpstreamChatRequest};
use axum::body::Body;
use axum::http::{Method, Request, header};
use bon::Builder;
use serde_json::Value;
use tracing::debug;
use url::Url;

pub const DEFAULT_UPSTREAM_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

pub const API_KEY_HEADER: &str = "x-api-key";
pub const API_VERSION_HEADER: &str = "anthropic-version";

#[derive(Clone, Builder)]
pub struct Upstream {
    pub url: Url,
    pub api_key: Option<String>,
    #[builder(into, default = DEFAULT_API_VERSION.to_string())]
    pub api_version: String,
    #[builder(into, default = DEFAULT_MODEL.to_string())]
    pub model: String,
    #[builder(default = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,
}

impl std::fmt::Debug for Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upstream")
            .field("url", &self.url.as_str())
            .field("api_key_set", &self.api_key_set())
            .field("api_version", &self.api_version)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Upstream {
    /// The production upstream, optionally without a key.
    pub fn anthropic(api_key: Option<String>) -> Self {
        Upstream::builder()
            .url(Url::parse(DEFAULT_UPSTREAM_URL).expect("default upstream url is valid"))
            .maybe_api_key(api_key)
            .build()
    }

    /// The configured key, treating an empty string as absent.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }

    pub fn api_key_set(&self) -> bool {
        self.api_key().is_some()
    }

    pub fn chat_request(&self, prompt: Value) -> UpstreamChatRequest {
        UpstreamChatRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![ChatMessage {
                role: "user".into(),
                content: prompt,
            }],
        }
    }

    /// Assemble the outbound `POST` for a prompt.
    ///
    /// Without a key the `x-api-key` header is left off entirely, and the upstream rejects the
    /// call with its own authentication error, which is relayed to the caller.
    pub fn build_request(&self, prompt: Value) -> Result<Request<Body>, RelayError> {
        let body = serde_json::to_vec(&self.chat_request(prompt))
            .map_err(|e| RelayError::RequestBuild(e.to_string()))?;

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(self.url.as_str())
            .header(header::CONTENT_TYPE, "application/json")
            .header(API_VERSION_HEADER, self.api_version.as_str());

        if let Some(host) = self.url.host_str() {
            let host_value = match self.url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            };
            builder = builder.header(header::HOST, host_value);
        }

        match self.api_key() {
            Some(key) => builder = builder.header(API_KEY_HEADER, key),
            None => debug!("No API key configured for upstream {}", self.url),
        }

        builder
            .body(Body::from(body))
            .map_err(|e| RelayError::RequestBuild(e.to_string()))
    }
}
