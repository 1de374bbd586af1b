//! Chat completions backed by the OpenAI API.
//!
//! Only an allow-listed subset of the caller's body reaches the upstream;
//! anything else the caller sends is dropped.

use axum::{body::Bytes, extract::State, routing::post, Router};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::gateway::{build_request, relay, GatewayError, OperationResult, OperationResultExt, Upstream};
use crate::http::AppState;
use crate::providers::{non_blank, parse_json_body};

const OP: &str = "openai-proxy-failed";

pub fn routes() -> Router<AppState> {
    Router::new().route("/completions", post(completions))
}

/// What callers may send.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    pub model: Option<String>,
    pub messages: Option<Value>,
    pub temperature: Option<Value>,
    pub max_tokens: Option<Value>,
    pub top_p: Option<Value>,
}

/// What the upstream receives.
#[derive(Debug, Serialize, PartialEq)]
pub struct CompletionPayload {
    pub model: String,
    pub messages: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<Value>,
}

impl ChatRequest {
    /// Apply the allow-list and the default model.
    pub fn into_payload(self, default_model: &str) -> Result<CompletionPayload, GatewayError> {
        let messages = match self.messages {
            Some(Value::Array(messages)) if !messages.is_empty() => messages,
            _ => return Err(GatewayError::validation("messages required")),
        };

        Ok(CompletionPayload {
            model: non_blank(self.model).unwrap_or_else(|| default_model.to_string()),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: self.top_p,
        })
    }
}

async fn completions(State(state): State<AppState>, body: Bytes) -> OperationResult {
    let chat: ChatRequest = parse_json_body(&body).during(OP)?;
    let gateway = &state.gateway;
    let payload = chat.into_payload(&gateway.upstreams().default_chat_model).during(OP)?;

    let credential = gateway.credential(Upstream::OpenAi).during(OP)?;
    let request = build_request(
        Method::POST,
        &gateway.upstreams().openai_base_url,
        "/chat/completions",
        &[],
        &[],
        Some(credential),
    )
    .and_then(|request| request.with_json(&payload))
    .during(OP)?;

    let response = gateway.execute(Upstream::OpenAi, request).await.during(OP)?;
    Ok(relay(response))
}
