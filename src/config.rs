//! Configuration parsing and validation for the relay
//!
//! Every option can be given on the command line or through the environment. The parsed
//! [`Config`] is turned into an [`Upstream`] and a CORS origin list once at startup and handed to
//! the router; nothing reads the environment after that.
use crate::client::PoolSettings;
use crate::upstream::{DEFAULT_UPSTREAM_URL, Upstream};
use anyhow::anyhow;
use clap::Parser;
use std::time::Duration;
use url::Url;

/// Local development origins that are always allowed alongside the frontend URL.
pub const DEV_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://localhost:5001"];

#[derive(Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Key for the upstream Messages API. The relay starts without one, but extraction calls
    /// will be rejected upstream.
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    /// The frontend origin allowed to call the relay from a browser.
    #[arg(long, env = "FRONTEND_URL", default_value = "http://localhost:3000")]
    pub frontend_url: String,

    /// The port on which the relay will listen.
    #[arg(short = 'p', long, env = "PORT", default_value_t = 5001)]
    pub port: u16,

    /// The endpoint prompts are forwarded to.
    #[arg(long, env = "UPSTREAM_URL", default_value = DEFAULT_UPSTREAM_URL)]
    pub upstream_url: Url,

    /// Whether to serve Prometheus metrics on a separate port.
    #[arg(short = 'm', long, env = "RELAY_METRICS", default_value_t = false)]
    pub metrics: bool,

    /// The port on which the metrics server will listen.
    #[arg(long, env = "RELAY_METRICS_PORT", default_value_t = 9090)]
    pub metrics_port: u16,

    /// The prefix to use for metrics.
    #[arg(long, env = "RELAY_METRICS_PREFIX", default_value = "ordinance_relay")]
    pub metrics_prefix: String,

    /// Maximum number of idle HTTP connections to keep alive to the upstream.
    #[arg(long, env = "RELAY_POOL_MAX_IDLE_PER_HOST", default_value_t = 100)]
    pub pool_max_idle_per_host: usize,

    /// How long (in seconds) to keep idle HTTP connections alive.
    #[arg(long, env = "RELAY_POOL_IDLE_TIMEOUT_SECS", default_value_t = 90)]
    pub pool_idle_timeout_secs: u64,
}

// Hand-written so the API key never ends up in logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key_set", &self.api_key_set())
            .field("frontend_url", &self.frontend_url)
            .field("port", &self.port)
            .field("upstream_url", &self.upstream_url.as_str())
            .field("metrics", &self.metrics)
            .field("metrics_port", &self.metrics_port)
            .field("metrics_prefix", &self.metrics_prefix)
            .field("pool_max_idle_per_host", &self.pool_max_idle_per_host)
            .field("pool_idle_timeout_secs", &self.pool_idle_timeout_secs)
            .finish()
    }
}

impl Config {
    pub fn validate(self) -> Result<Self, anyhow::Error> {
        match self.upstream_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(anyhow!(
                    "Upstream URL '{}' must use http or https, not '{}'",
                    self.upstream_url,
                    other
                ));
            }
        }
        Ok(self)
    }

    pub fn api_key_set(&self) -> bool {
        self.anthropic_api_key
            .as_deref()
            .is_some_and(|key| !key.is_empty())
    }

    pub fn upstream(&self) -> Upstream {
        Upstream::builder()
            .url(self.upstream_url.clone())
            .maybe_api_key(self.anthropic_api_key.clone())
            .build()
    }

    /// The frontend URL followed by the development origins, without duplicates.
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = vec![self.frontend_url.clone()];
        for origin in DEV_ORIGINS {
            if !origins.iter().any(|o| o == origin) {
                origins.push(origin.to_string());
            }
        }
        origins
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_idle_per_host: self.pool_max_idle_per_host,
            idle_timeout: Duration::from_secs(self.pool_idle_timeout_secs),
        }
    }
}
