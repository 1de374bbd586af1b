//! Upstream responses and how they reach the caller.
//!
//! # Design Decisions
//! - The body is always kept as raw text; JSON parsing is best effort
//! - Non-2xx responses are relayed verbatim, never collapsed into a 500
//! - Listing payloads are normalized to a bare array

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::Response,
};
use serde_json::Value;

use crate::gateway::error::{GatewayError, GatewayResult};

/// The result of one upstream call.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    status: StatusCode,
    content_type: Option<String>,
    body: String,
    json: Option<Value>,
}

impl UpstreamResponse {
    /// Wrap a raw body, attempting a JSON parse. Parse failures leave `json` empty.
    pub fn new(status: StatusCode, content_type: Option<String>, body: String) -> Self {
        let json = serde_json::from_str(&body).ok();
        Self {
            status,
            content_type,
            body,
            json,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// The parsed body of a successful response.
    ///
    /// Non-2xx responses become [`GatewayError::Upstream`] so they are relayed
    /// unchanged; a 2xx body that is not JSON is [`GatewayError::InvalidBody`].
    pub fn into_json(self) -> GatewayResult<Value> {
        if !self.is_success() {
            return Err(GatewayError::Upstream(self));
        }
        match self.json {
            Some(json) => Ok(json),
            // Re-parse to surface the parser's error.
            None => serde_json::from_str(&self.body).map_err(GatewayError::InvalidBody),
        }
    }
}

/// Forward an upstream response to the caller: same status, same body.
pub fn relay(response: UpstreamResponse) -> Response {
    let content_type = response
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));

    let mut relayed = Response::new(Body::from(response.body));
    *relayed.status_mut() = response.status;
    relayed.headers_mut().insert(CONTENT_TYPE, content_type);
    relayed
}

/// Extract the list from a listing payload.
///
/// Returns `payload[field_name]` when it is an array, `payload` itself when it
/// already is one, and `fallback` otherwise.
pub fn normalize_list_field(payload: &Value, field_name: &str, fallback: &[Value]) -> Vec<Value> {
    match payload {
        Value::Array(items) => items.clone(),
        Value::Object(map) => match map.get(field_name) {
            Some(Value::Array(items)) => items.clone(),
            _ => fallback.to_vec(),
        },
        _ => fallback.to_vec(),
    }
}
