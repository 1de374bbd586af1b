//! Movie metadata routes backed by the TMDb v3 API.
//!
//! Listing routes answer with the bare `results` array; person and credits
//! lookups relay the upstream document unchanged.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;

use crate::gateway::{
    build_request, normalize_list_field, relay, GatewayError, OperationError, OperationResult,
    OperationResultExt, QueryParams, Upstream, UpstreamResponse,
};
use crate::http::AppState;
use crate::providers::non_blank;

const SEARCH_TYPES: &[&str] = &["multi", "movie", "tv", "person", "collection", "company", "keyword"];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trending/people", get(trending_people))
        .route("/trending/tv", get(trending_tv))
        .route("/movies/now_playing", get(now_playing))
        .route("/person/{id}", get(person))
        .route("/person/imdb/{imdb_id}", get(person_by_imdb))
        .route("/search", get(search))
        .route("/credits", get(credits))
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreditsParams {
    pub media_type: Option<String>,
    pub id: Option<String>,
}

/// One TMDb call. The credential is checked before anything is built.
async fn call(
    state: &AppState,
    operation: &'static str,
    path: &str,
    path_params: &[(&str, &str)],
    query: &QueryParams<'_>,
) -> Result<UpstreamResponse, OperationError> {
    let gateway = &state.gateway;
    let credential = gateway.credential(Upstream::Tmdb).during(operation)?;
    let request = build_request(
        Method::GET,
        &gateway.upstreams().tmdb_base_url,
        path,
        path_params,
        query,
        Some(credential),
    )
    .during(operation)?;
    gateway.execute(Upstream::Tmdb, request).await.during(operation)
}

fn results(response: UpstreamResponse, operation: &'static str) -> OperationResult {
    let payload = response.into_json().during(operation)?;
    Ok(Json(normalize_list_field(&payload, "results", &[])).into_response())
}

async fn trending_people(State(state): State<AppState>) -> OperationResult {
    const OP: &str = "tmdb-trending-people";
    let response = call(&state, OP, "/trending/person/week", &[], &[]).await?;
    results(response, OP)
}

async fn trending_tv(State(state): State<AppState>) -> OperationResult {
    const OP: &str = "tmdb-trending-tv";
    let response = call(&state, OP, "/trending/tv/week", &[], &[]).await?;
    results(response, OP)
}

async fn now_playing(State(state): State<AppState>, Query(params): Query<PageParams>) -> OperationResult {
    const OP: &str = "tmdb-now-playing";
    let page = non_blank(params.page).unwrap_or_else(|| "1".to_string());
    let query = [("page", Some(page)), ("region", Some("GB".to_string()))];
    let response = call(&state, OP, "/movie/now_playing", &[], &query).await?;
    results(response, OP)
}

async fn person(State(state): State<AppState>, Path(id): Path<String>) -> OperationResult {
    const OP: &str = "tmdb-person";
    let response = call(&state, OP, "/person/{id}", &[("id", id.as_str())], &[]).await?;
    Ok(relay(response))
}

async fn person_by_imdb(State(state): State<AppState>, Path(imdb_id): Path<String>) -> OperationResult {
    const OP: &str = "tmdb-find-person";
    let query = [("external_source", Some("imdb_id".to_string()))];
    let response = call(&state, OP, "/find/{imdb_id}", &[("imdb_id", imdb_id.as_str())], &query).await?;
    let payload = response.into_json().during(OP)?;
    Ok(Json(first_person(&payload)).into_response())
}

async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> OperationResult {
    const OP: &str = "tmdb-search";
    let query = non_blank(params.query)
        .ok_or_else(|| GatewayError::validation("query required"))
        .during(OP)?;
    let kind = non_blank(params.kind).unwrap_or_else(|| "multi".to_string());
    if !SEARCH_TYPES.contains(&kind.as_str()) {
        return Err(OperationError::new(OP, GatewayError::validation("invalid search type")));
    }
    let page = non_blank(params.page).unwrap_or_else(|| "1".to_string());

    let upstream_query = [("query", Some(query)), ("page", Some(page))];
    let response = call(&state, OP, "/search/{type}", &[("type", kind.as_str())], &upstream_query).await?;
    results(response, OP)
}

async fn credits(State(state): State<AppState>, Query(params): Query<CreditsParams>) -> OperationResult {
    const OP: &str = "tmdb-credits";
    let (Some(media_type), Some(id)) = (non_blank(params.media_type), non_blank(params.id)) else {
        return Err(OperationError::new(OP, GatewayError::validation("media_type and id required")));
    };

    let response = call(&state, OP, credits_path(&media_type), &[("id", id.as_str())], &[]).await?;
    Ok(relay(response))
}

fn credits_path(media_type: &str) -> &'static str {
    if media_type == "movie" {
        "/movie/{id}/credits"
    } else {
        "/tv/{id}/aggregate_credits"
    }
}

fn first_person(payload: &Value) -> Value {
    payload
        .get("person_results")
        .and_then(|people| people.get(0))
        .cloned()
        .unwrap_or(Value::Null)
}
