//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.
//! Secrets are never part of this schema; see [`crate::gateway::credential`].

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream base URLs and per-upstream defaults.
    pub upstreams: UpstreamsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Response hardening and request limits.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3001"). The `PORT` environment variable
    /// replaces the port part.
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3001".to_string(),
        }
    }
}

/// Upstream endpoints.
///
/// The defaults point at the public third-party APIs. Overriding them is
/// mostly useful for staging mirrors and tests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamsConfig {
    /// Movie metadata API (TMDb v3).
    pub tmdb_base_url: String,

    /// Title lookup API (OMDb).
    pub omdb_base_url: String,

    /// News aggregator API (NewsData.io).
    pub newsdata_base_url: String,

    /// Chat completion API (OpenAI).
    pub openai_base_url: String,

    /// Image recognition endpoint override. When unset the SDK resolves the
    /// regional AWS endpoint.
    pub rekognition_endpoint: Option<String>,

    /// Largest image, in bytes, accepted for recognition (inline or downloaded).
    pub max_image_bytes: usize,

    /// Model used when a chat request does not name one.
    pub default_chat_model: String,
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        Self {
            tmdb_base_url: "https://api.themoviedb.org/3".to_string(),
            omdb_base_url: "https://www.omdbapi.com/".to_string(),
            newsdata_base_url: "https://newsdata.io/api/1".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            rekognition_endpoint: None,
            max_image_bytes: 5 * 1024 * 1024,
            default_chat_model: "gpt-4o-mini".to_string(),
        }
    }
}

/// Timeout configuration.
///
/// Upstream calls deliberately have no timeout of their own; this bounds the
/// inbound request as a whole.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Add security response headers.
    pub enable_headers: bool,
    /// Allow cross-origin requests from any origin.
    pub cors_enabled: bool,
    /// Maximum body size in bytes. Base64 images make this larger than usual.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            cors_enabled: true,
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}
