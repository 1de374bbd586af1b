//! Entertainment news backed by the NewsData.io `latest` endpoint.

use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use reqwest::Method;
use serde::Deserialize;

use crate::gateway::{build_request, relay, OperationResult, OperationResultExt, Upstream};
use crate::http::AppState;
use crate::providers::non_blank;

/// Used when the caller does not narrow the search.
pub const DEFAULT_QUERY: &str = "movie OR tv OR netflix OR trailer OR film OR streaming";

pub fn routes() -> Router<AppState> {
    Router::new().route("/entertainment", get(entertainment))
}

#[derive(Debug, Default, Deserialize)]
pub struct EntertainmentParams {
    pub language: Option<String>,
    /// Opaque next-page token handed out by NewsData.
    pub page: Option<String>,
    pub q: Option<String>,
}

async fn entertainment(State(state): State<AppState>, Query(params): Query<EntertainmentParams>) -> OperationResult {
    const OP: &str = "newsdata-error";
    let gateway = &state.gateway;
    let credential = gateway.credential(Upstream::NewsData).during(OP)?;

    let query = [
        ("language", Some(non_blank(params.language).unwrap_or_else(|| "en".to_string()))),
        ("page", non_blank(params.page)),
        ("q", Some(non_blank(params.q).unwrap_or_else(|| DEFAULT_QUERY.to_string()))),
    ];
    let request = build_request(
        Method::GET,
        &gateway.upstreams().newsdata_base_url,
        "/latest",
        &[],
        &query,
        Some(credential),
    )
    .during(OP)?;
    let url = request.redacted_url();

    let response = gateway.execute(Upstream::NewsData, request).await.during(OP)?;
    if !response.is_success() {
        tracing::warn!(
            status = response.status().as_u16(),
            url = %url,
            body = response.body(),
            "NewsData upstream error"
        );
    }
    Ok(relay(response))
}
