//! Upstream gateway subsystem.
//!
//! # Data Flow
//! ```text
//! provider handler (validated parameters)
//!     → credential.rs (pick the resolved credential)
//!     → request.rs (build UpstreamRequest)
//!     → Gateway::execute (exactly one HTTP call)
//!       or aws.rs (SDK-signed Rekognition call)
//!     → response.rs (relay verbatim or project the JSON)
//!     → error.rs (OperationError → caller-facing response)
//! ```
//!
//! # Design Decisions
//! - The gateway holds only immutable state; concurrent calls never contend
//! - No retries and no upstream timeout override
//! - A non-2xx status is a normal result, only transport failures are errors

pub mod aws;
pub mod credential;
pub mod error;
pub mod request;
pub mod response;

use std::sync::OnceLock;
use std::time::Instant;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::config::UpstreamsConfig;
use crate::observability::metrics;

pub use aws::{DetectOptions, RekognitionClient};
pub use credential::{resolve_credential, AwsCredentials, Credential, CredentialSource, Credentials, Placement};
pub use error::{GatewayError, GatewayResult, OperationError, OperationResult, OperationResultExt};
pub use request::{build_request, QueryParams, UpstreamRequest};
pub use response::{normalize_list_field, relay, UpstreamResponse};

/// The third-party APIs the gateway talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Upstream {
    Tmdb,
    Omdb,
    NewsData,
    OpenAi,
    Rekognition,
    /// Caller-supplied image URLs fetched before recognition.
    ImageSource,
}

impl Upstream {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Upstream::Tmdb => "tmdb",
            Upstream::Omdb => "omdb",
            Upstream::NewsData => "newsdata",
            Upstream::OpenAi => "openai",
            Upstream::Rekognition => "rekognition",
            Upstream::ImageSource => "image-source",
        }
    }

    /// Ordered credential candidates for key-based upstreams.
    pub fn credential_sources(&self) -> &'static [CredentialSource] {
        const TMDB: &[CredentialSource] = &[
            CredentialSource::bearer("TMDB_V4_TOKEN"),
            CredentialSource::query("TMDB_V3_KEY", "api_key"),
        ];
        const OMDB: &[CredentialSource] = &[CredentialSource::query("OMDB_API_KEY", "apikey")];
        const NEWSDATA: &[CredentialSource] = &[CredentialSource::query("NEWSDATA_API_KEY", "apikey")];
        const OPENAI: &[CredentialSource] = &[CredentialSource::bearer("OPENAI_API_KEY")];

        match self {
            Upstream::Tmdb => TMDB,
            Upstream::Omdb => OMDB,
            Upstream::NewsData => NEWSDATA,
            Upstream::OpenAi => OPENAI,
            Upstream::Rekognition | Upstream::ImageSource => &[],
        }
    }
}

/// Builds, issues and classifies upstream calls.
pub struct Gateway {
    client: Client,
    upstreams: UpstreamsConfig,
    credentials: Credentials,
    rekognition: OnceLock<RekognitionClient>,
}

impl Gateway {
    /// Create a gateway. Credentials are resolved by the caller, once.
    pub fn new(upstreams: UpstreamsConfig, credentials: Credentials) -> GatewayResult<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(GatewayError::Client)?;

        Ok(Self {
            client,
            upstreams,
            credentials,
            rekognition: OnceLock::new(),
        })
    }

    pub fn upstreams(&self) -> &UpstreamsConfig {
        &self.upstreams
    }

    /// Credential for a key-based upstream; fails before any network I/O.
    pub fn credential(&self, upstream: Upstream) -> GatewayResult<&Credential> {
        self.credentials.get(upstream)
    }

    /// Rekognition client, built on first use from the AWS credentials.
    pub fn rekognition(&self) -> GatewayResult<&RekognitionClient> {
        let aws = self.credentials.aws()?;
        Ok(self
            .rekognition
            .get_or_init(|| RekognitionClient::new(aws, self.upstreams.rekognition_endpoint.as_deref())))
    }

    /// Issue exactly one HTTP call and read the whole body as text.
    ///
    /// Any status code is a successful result here; only transport failures
    /// (DNS, refused connection, aborted body) are errors.
    pub async fn execute(&self, upstream: Upstream, request: UpstreamRequest) -> GatewayResult<UpstreamResponse> {
        let start = Instant::now();
        let label = upstream.as_str();

        tracing::debug!(
            upstream = label,
            method = %request.method(),
            url = %request.redacted_url(),
            "Calling upstream"
        );

        let mut builder = self
            .client
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            builder = builder.body(body.to_vec());
        }

        let network = |source: reqwest::Error| {
            metrics::record_upstream_error(label);
            tracing::error!(upstream = label, url = %request.redacted_url(), error = %source, "Upstream unreachable");
            GatewayError::Network { upstream: label, source }
        };

        let response = builder.send().await.map_err(network)?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await.map_err(network)?;

        metrics::record_upstream(label, status.as_u16(), start);
        tracing::debug!(upstream = label, status = status.as_u16(), "Upstream responded");

        Ok(UpstreamResponse::new(status, content_type, body))
    }

    /// Download an image of at most `limit` bytes.
    ///
    /// A non-2xx answer is [`GatewayError::ImageDownload`]; its body is
    /// discarded. The size is checked against `Content-Length` first and
    /// again while the body streams in.
    pub async fn fetch_image(&self, request: UpstreamRequest, limit: usize) -> GatewayResult<Vec<u8>> {
        let start = Instant::now();
        let label = Upstream::ImageSource.as_str();

        let network = |source: reqwest::Error| {
            metrics::record_upstream_error(label);
            GatewayError::Network { upstream: label, source }
        };

        let mut response = self
            .client
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone())
            .send()
            .await
            .map_err(network)?;
        let status = response.status();
        metrics::record_upstream(label, status.as_u16(), start);

        if !status.is_success() {
            tracing::warn!(upstream = label, status = status.as_u16(), url = %request.url(), "Image download failed");
            return Err(GatewayError::ImageDownload { status });
        }
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(GatewayError::ImageTooLarge { limit });
        }

        let mut image = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(network)? {
            if image.len() + chunk.len() > limit {
                return Err(GatewayError::ImageTooLarge { limit });
            }
            image.extend_from_slice(&chunk);
        }
        Ok(image)
    }
}
