//! HTTP API layer for formkit.
//!
//! This crate exposes the form, question, response and analytics services
//! as a JSON REST API:
//!
//! - **Endpoints**: CRUD routes plus the form-scoped read views
//! - **Extractors**: Authentication and client metadata
//! - **Middleware**: Bearer token authentication and shared state
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
