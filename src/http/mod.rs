//! HTTP server module
//!
//! - Axum router with the JSON API and file download endpoints
//! - Request handlers
//! - Upstream response cache
//! - Request logging and CORS

pub mod cache;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use routes::create_router;
