//! Upstream request construction.
//!
//! # Responsibilities
//! - Substitute path parameters into a path template
//! - Append query parameters in order, skipping absent values
//! - Attach the credential as a bearer header or a query parameter
//!
//! # Design Decisions
//! - Requests are values: every builder step consumes and returns a new one
//! - Path parameters are encoded as single segments, so caller input can
//!   never add or remove upstream path segments
//! - The query credential parameter is remembered for log redaction

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use url::Url;

use crate::gateway::credential::{Credential, Placement};
use crate::gateway::error::{GatewayError, GatewayResult};

/// Ordered query parameters; `None` values are omitted.
pub type QueryParams<'a> = [(&'a str, Option<String>)];

/// A fully-qualified request to an upstream API.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    secret_param: Option<&'static str>,
}

impl UpstreamRequest {
    /// A bare request with no headers or body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            secret_param: None,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Set a raw body with its content type.
    fn with_body(mut self, content_type: &'static str, body: Vec<u8>) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.body = Some(body);
        self
    }

    /// Set a JSON body.
    pub fn with_json<T: serde::Serialize>(self, payload: &T) -> GatewayResult<Self> {
        let body = serde_json::to_vec(payload).map_err(GatewayError::InvalidBody)?;
        Ok(self.with_body("application/json", body))
    }

    /// URL safe to log: the query credential, if any, is masked.
    pub fn redacted_url(&self) -> String {
        let Some(secret) = self.secret_param else {
            return self.url.to_string();
        };
        let mut url = self.url.clone();
        let pairs: Vec<(String, String)> = self
            .url
            .query_pairs()
            .map(|(k, v)| {
                let v = if k == secret { "REDACTED".into() } else { v.into_owned() };
                (k.into_owned(), v)
            })
            .collect();
        url.query_pairs_mut().clear().extend_pairs(pairs);
        url.to_string()
    }
}

/// Build an upstream request.
///
/// `path_template` segments may contain `{name}` placeholders which are
/// replaced by the matching entry in `path_params`. An empty template keeps
/// the base URL's path untouched.
pub fn build_request(
    method: Method,
    base_url: &str,
    path_template: &str,
    path_params: &[(&str, &str)],
    query: &QueryParams<'_>,
    credential: Option<&Credential>,
) -> GatewayResult<UpstreamRequest> {
    let mut url = Url::parse(base_url)?;

    let segments = path_template
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| substitute(segment, path_params))
        .collect::<GatewayResult<Vec<_>>>()?;

    if !segments.is_empty() {
        url.path_segments_mut()
            .map_err(|_| GatewayError::InvalidTemplate(format!("'{}' cannot carry a path", base_url)))?
            .pop_if_empty()
            .extend(segments);
    }

    let mut present = query
        .iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (*key, v)))
        .peekable();
    let query_credential = match credential.map(Credential::placement) {
        Some(Placement::Query(param)) => Some(param),
        _ => None,
    };
    if present.peek().is_some() || query_credential.is_some() {
        let mut pairs = url.query_pairs_mut();
        pairs.extend_pairs(present);
        if let (Some(param), Some(credential)) = (query_credential, credential) {
            pairs.append_pair(param, credential.secret());
        }
    }

    let mut request = UpstreamRequest::new(method, url);
    request.secret_param = query_credential;

    if let Some(credential) = credential {
        if credential.placement() == Placement::Bearer {
            let value = HeaderValue::from_str(&format!("Bearer {}", credential.secret()))
                .map_err(|_| GatewayError::InvalidHeader("authorization"))?;
            request.headers.insert(AUTHORIZATION, value);
        }
    }

    Ok(request)
}

fn substitute(segment: &str, params: &[(&str, &str)]) -> GatewayResult<String> {
    let mut out = String::with_capacity(segment.len());
    let mut rest = segment;
    let mut bound = None;

    while let Some(start) = rest.find('{') {
        let end = rest[start..]
            .find('}')
            .map(|offset| start + offset)
            .ok_or_else(|| GatewayError::InvalidTemplate(format!("unclosed placeholder in '{}'", segment)))?;
        let name = &rest[start + 1..end];
        let value = params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
            .ok_or_else(|| GatewayError::InvalidTemplate(format!("unbound path parameter `{}`", name)))?;

        out.push_str(&rest[..start]);
        out.push_str(value);
        rest = &rest[end + 1..];
        bound = Some(name);
    }
    out.push_str(rest);

    // The url crate resolves dot segments, which would drop upstream path segments.
    if let Some(name) = bound {
        if matches!(out.as_str(), "" | "." | "..") {
            return Err(GatewayError::validation(format!("invalid {}", name)));
        }
    }

    Ok(out)
}
