//! HTTP API layer for the blog backend.
//!
//! - **Endpoints**: auth, articles, comments and replies, user series
//! - **Extractors**: authenticated user, JSON-or-form bodies
//! - **Middleware**: bearer token authentication
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
