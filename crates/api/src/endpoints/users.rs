//! User endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use blog_common::AppResult;
use blog_core::SeriesEntry;
use serde::Serialize;

use crate::{middleware::AppState, response::ApiResponse};

#[derive(Serialize)]
pub struct SeriesResponse {
    pub categories: Vec<SeriesEntry>,
}

/// A user's categories with their posts.
async fn series(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<SeriesResponse>> {
    let categories = state.article_service.series(&user_id).await?;
    Ok(ApiResponse::ok(SeriesResponse { categories }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/series", get(series))
}
