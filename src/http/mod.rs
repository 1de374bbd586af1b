//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → request.rs (assign request ID, request span)
//!     → server.rs (Axum setup, timeout, body limit)
//!     → providers (validate parameters, call the gateway)
//!     → response.rs (CORS, security headers)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
