//! Title lookup routes backed by OMDb. Both relay the upstream answer.

use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use reqwest::Method;
use serde::Deserialize;

use crate::gateway::{
    build_request, relay, GatewayError, OperationError, OperationResult, OperationResultExt, QueryParams, Upstream,
};
use crate::http::AppState;
use crate::providers::non_blank;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search))
        .route("/title", get(title))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub y: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TitleParams {
    pub i: Option<String>,
    pub t: Option<String>,
    pub y: Option<String>,
    pub plot: Option<String>,
}

async fn lookup(state: &AppState, operation: &'static str, query: &QueryParams<'_>) -> OperationResult {
    let gateway = &state.gateway;
    let credential = gateway.credential(Upstream::Omdb).during(operation)?;
    let request = build_request(
        Method::GET,
        &gateway.upstreams().omdb_base_url,
        "",
        &[],
        query,
        Some(credential),
    )
    .during(operation)?;

    let response = gateway.execute(Upstream::Omdb, request).await.during(operation)?;
    Ok(relay(response))
}

async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> OperationResult {
    const OP: &str = "omdb-search";
    let q = non_blank(params.q)
        .ok_or_else(|| GatewayError::validation("q required"))
        .during(OP)?;

    let query = [
        ("s", Some(q)),
        ("type", non_blank(params.kind)),
        ("y", non_blank(params.y)),
        ("page", Some(non_blank(params.page).unwrap_or_else(|| "1".to_string()))),
    ];
    lookup(&state, OP, &query).await
}

async fn title(State(state): State<AppState>, Query(params): Query<TitleParams>) -> OperationResult {
    const OP: &str = "omdb-title";
    let key = match (non_blank(params.i), non_blank(params.t)) {
        (Some(i), _) => ("i", i),
        (None, Some(t)) => ("t", t),
        (None, None) => return Err(OperationError::new(OP, GatewayError::validation("i or t required"))),
    };

    let query = [
        (key.0, Some(key.1)),
        ("y", non_blank(params.y)),
        ("plot", Some(non_blank(params.plot).unwrap_or_else(|| "short".to_string()))),
    ];
    lookup(&state, OP, &query).await
}
