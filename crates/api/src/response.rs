//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Standard API response wrapper: `{"data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self {
            data,
            status: StatusCode::OK,
        }
    }

    /// Create a 201 response.
    pub const fn created(data: T) -> Self {
        Self {
            data,
            status: StatusCode::CREATED,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Plain `{"msg": ...}` body.
#[derive(Debug, Serialize)]
pub struct Message {
    pub msg: &'static str,
}

/// `{"data": {"msg": ...}}`.
#[must_use]
pub const fn message(msg: &'static str) -> ApiResponse<Message> {
    ApiResponse::ok(Message { msg })
}

/// 201 `{"msg": ..., "id": ...}` returned by publish and save.
#[derive(Debug, Serialize)]
pub struct Created {
    pub msg: &'static str,
    pub id: i64,
}

impl IntoResponse for Created {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self)).into_response()
    }
}
