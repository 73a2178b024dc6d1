//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use blog_core::{ArticleService, CommentService, LikeService, RecoveryService, UserService};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub article_service: ArticleService,
    pub comment_service: CommentService,
    pub like_service: LikeService,
    pub user_service: UserService,
    pub recovery_service: RecoveryService,
}

/// Authentication middleware.
///
/// A valid access token puts its `user::Model` into the request extensions.
/// Requests without one pass through; `AuthUser` rejects them where needed.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_service.authenticate(token.trim()).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => tracing::debug!(error = %e, "Ignoring bearer token"),
        }
    }

    next.run(req).await
}
