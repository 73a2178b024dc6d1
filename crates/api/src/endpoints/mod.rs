//! API endpoints.

mod articles;
mod auth;
mod comments;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .route("/logout", axum::routing::post(auth::logout))
        .nest("/articles", articles::router())
        .merge(comments::router())
        .nest("/users", users::router())
}
