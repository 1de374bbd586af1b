//! Upstream credentials.
//!
//! Credentials are resolved exactly once, at startup, from an environment
//! lookup function and then shared read-only. Request handlers never read the
//! environment.

use std::fmt;

use crate::gateway::error::{GatewayError, GatewayResult};
use crate::gateway::Upstream;

/// Where a credential is attached on the upstream request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// `Authorization: Bearer <secret>` header.
    Bearer,
    /// Query parameter with the given name.
    Query(&'static str),
}

/// One candidate environment variable for a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialSource {
    pub env: &'static str,
    pub placement: Placement,
}

impl CredentialSource {
    pub const fn bearer(env: &'static str) -> Self {
        Self {
            env,
            placement: Placement::Bearer,
        }
    }

    pub const fn query(env: &'static str, param: &'static str) -> Self {
        Self {
            env,
            placement: Placement::Query(param),
        }
    }
}

/// A resolved secret together with how it is presented upstream.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    source: &'static str,
    placement: Placement,
    secret: String,
}

impl Credential {
    pub fn new(source: &'static str, placement: Placement, secret: impl Into<String>) -> Self {
        Self {
            source,
            placement,
            secret: secret.into(),
        }
    }

    /// Name of the environment variable the secret came from.
    pub fn source(&self) -> &'static str {
        self.source
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("source", &self.source)
            .field("placement", &self.placement)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Return the first non-empty, trimmed value among `sources`, in order.
pub fn resolve_credential<F>(sources: &[CredentialSource], lookup: F) -> GatewayResult<Credential>
where
    F: Fn(&str) -> Option<String>,
{
    sources
        .iter()
        .find_map(|source| {
            non_empty(&lookup, source.env)
                .map(|secret| Credential::new(source.env, source.placement, secret))
        })
        .ok_or_else(|| GatewayError::MissingCredential {
            candidates: sources.iter().map(|s| s.env).collect(),
        })
}

fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

const AWS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
const AWS_SECRET: &str = "AWS_SECRET_ACCESS_KEY";
const AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
const AWS_REGION: &str = "AWS_REGION";
const AWS_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";

/// Signing credentials for AWS-hosted upstreams.
#[derive(Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    pub region: String,
}

impl AwsCredentials {
    fn resolve<F>(lookup: &F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Some(Self {
            access_key_id: non_empty(lookup, AWS_KEY_ID)?,
            secret_access_key: non_empty(lookup, AWS_SECRET)?,
            session_token: non_empty(lookup, AWS_SESSION_TOKEN),
            region: non_empty(lookup, AWS_REGION).or_else(|| non_empty(lookup, AWS_DEFAULT_REGION))?,
        })
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .finish()
    }
}

/// Every upstream credential the gateway knows about.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    tmdb: Option<Credential>,
    omdb: Option<Credential>,
    newsdata: Option<Credential>,
    openai: Option<Credential>,
    aws: Option<AwsCredentials>,
}

impl Credentials {
    /// Resolve all credentials from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve all credentials through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let resolve = |upstream: Upstream| resolve_credential(upstream.credential_sources(), &lookup).ok();
        Self {
            tmdb: resolve(Upstream::Tmdb),
            omdb: resolve(Upstream::Omdb),
            newsdata: resolve(Upstream::NewsData),
            openai: resolve(Upstream::OpenAi),
            aws: AwsCredentials::resolve(&lookup),
        }
    }

    /// The credential for a key-based upstream, or `MissingCredential`.
    pub fn get(&self, upstream: Upstream) -> GatewayResult<&Credential> {
        let slot = match upstream {
            Upstream::Tmdb => self.tmdb.as_ref(),
            Upstream::Omdb => self.omdb.as_ref(),
            Upstream::NewsData => self.newsdata.as_ref(),
            Upstream::OpenAi => self.openai.as_ref(),
            Upstream::Rekognition | Upstream::ImageSource => None,
        };
        slot.ok_or_else(|| GatewayError::MissingCredential {
            candidates: upstream.credential_sources().iter().map(|s| s.env).collect(),
        })
    }

    /// AWS signing credentials, or `MissingCredential`.
    pub fn aws(&self) -> GatewayResult<&AwsCredentials> {
        self.aws.as_ref().ok_or_else(|| GatewayError::MissingCredential {
            candidates: vec![AWS_KEY_ID, AWS_SECRET, AWS_REGION],
        })
    }

    /// Log which upstreams are usable. Never logs secret values.
    pub fn log_summary(&self) {
        for upstream in [Upstream::Tmdb, Upstream::Omdb, Upstream::NewsData, Upstream::OpenAi] {
            match self.get(upstream) {
                Ok(credential) => tracing::info!(
                    upstream = upstream.as_str(),
                    source = credential.source(),
                    "Credential loaded"
                ),
                Err(e) => tracing::warn!(upstream = upstream.as_str(), error = %e, "Upstream disabled"),
            }
        }
        match self.aws() {
            Ok(aws) => tracing::info!(region = %aws.region, "AWS credentials loaded"),
            Err(e) => tracing::warn!(upstream = Upstream::Rekognition.as_str(), error = %e, "Upstream disabled"),
        }
    }
}
