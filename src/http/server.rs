//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the health check and every provider route
//! - Wire up middleware (request ID, tracing, timeout, body limit, hardening)
//! - Record per-route request metrics
//! - Serve on a bound listener until shutdown

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{DefaultBodyLimit, MatchedPath, Request},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::gateway::{Credentials, Gateway, GatewayResult};
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::http::response::harden;
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::providers;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server. `credentials` are resolved once by the caller.
    pub fn new(config: GatewayConfig, credentials: Credentials) -> GatewayResult<Self> {
        let gateway = Arc::new(Gateway::new(config.upstreams.clone(), credentials)?);
        let state = AppState { gateway };

        let router = Self::build_router(&config, state);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let router = Router::new()
            .route("/health", get(health))
            .merge(providers::router())
            .route_layer(middleware::from_fn(track_requests))
            .fallback(not_found)
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.security.max_body_size));

        // Outermost first: the ID must exist before the span reads it.
        harden(router, &config.security).layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<axum::body::Body>))
                .layer(propagate_request_id_layer())
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown_rx: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not-found" }))).into_response()
}

async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), &route, start);
    response
}
