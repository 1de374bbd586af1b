//! Response hardening.
//!
//! Security headers are added only when the handler did not set them, so a
//! relayed upstream response keeps its own values.

use axum::{
    http::{header, HeaderName, HeaderValue},
    Router,
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer};

use crate::config::SecurityConfig;

const CROSS_ORIGIN_RESOURCE_POLICY: HeaderName = HeaderName::from_static("cross-origin-resource-policy");

/// Apply CORS and security headers according to `config`.
pub fn harden(router: Router, config: &SecurityConfig) -> Router {
    let mut router = router;

    if config.enable_headers {
        router = router
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("SAMEORIGIN"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::REFERRER_POLICY,
                HeaderValue::from_static("no-referrer"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                CROSS_ORIGIN_RESOURCE_POLICY,
                HeaderValue::from_static("same-origin"),
            ));
    }

    if config.cors_enabled {
        router = router.layer(CorsLayer::permissive());
    }

    router
}
