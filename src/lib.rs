//! Upstream gateway library.
//!
//! A small HTTP service that fronts third-party APIs (movie metadata, title
//! lookup, news, chat completions and image recognition), keeping their
//! credentials server-side.

pub mod config;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod providers;

pub use config::GatewayConfig;
pub use gateway::{Credentials, Gateway};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
