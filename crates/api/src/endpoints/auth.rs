//! Authentication and password recovery endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::Html,
    routing::{get, post},
};
use blog_common::{AppError, AppResult};
use blog_core::{
    LoginInput, LoginResponse, Profile, RefreshResponse, RegisterInput, SendCodeInput,
    VerifyCodeInput,
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, JsonOrForm},
    middleware::AppState,
    response::{ApiResponse, Message, message},
};

#[derive(Serialize)]
pub struct RegisterResponse {
    pub id: String,
    pub username: String,
}

/// Create a new account.
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterInput>,
) -> AppResult<ApiResponse<RegisterResponse>> {
    let user = state.user_service.register(req).await?;

    Ok(ApiResponse::created(RegisterResponse {
        id: user.id,
        username: user.username,
    }))
}

/// Sign in with username and password.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginInput>,
) -> AppResult<ApiResponse<LoginResponse>> {
    Ok(ApiResponse::ok(state.user_service.login(req).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Trade a refresh token for a new access token.
async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> AppResult<ApiResponse<RefreshResponse>> {
    Ok(ApiResponse::ok(
        state.user_service.refresh(&req.refresh_token).await?,
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResponse {
    pub last_activity: DateTime<FixedOffset>,
}

/// Record the logout time. Tokens stay valid until they expire.
pub(super) async fn logout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<LogoutResponse>> {
    let last_activity = state.user_service.logout(&user.id).await?;
    Ok(ApiResponse::ok(LogoutResponse { last_activity }))
}

/// Account overview. Only readable by the account owner.
async fn profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Profile>> {
    if user.id != id {
        return Err(AppError::Forbidden(
            "You can only view your own profile".to_string(),
        ));
    }
    Ok(ApiResponse::ok(state.user_service.profile(&id).await?))
}

/// Email a verification code.
async fn get_code(
    State(state): State<AppState>,
    Json(req): Json<SendCodeInput>,
) -> AppResult<ApiResponse<Message>> {
    state.recovery_service.send_code(req).await?;
    Ok(message("Verification code sent"))
}

/// Check a verification code and email a reset link.
async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyCodeInput>,
) -> AppResult<ApiResponse<Message>> {
    state.recovery_service.verify_code(req).await?;
    Ok(message("Reset link sent"))
}

const RESET_FORM: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Reset password</title></head>
<body>
<h1>Choose a new password</h1>
<form method="post">
<input type="password" name="password" minlength="8" required>
<button type="submit">Reset password</button>
</form>
</body>
</html>
"#;

/// Password reset form for the emailed link.
async fn reset_form(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Html<&'static str>> {
    state.recovery_service.check_reset_token(&token)?;
    Ok(Html(RESET_FORM))
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub password: String,
}

/// Set the new password.
async fn reset(
    State(state): State<AppState>,
    Path(token): Path<String>,
    JsonOrForm(req): JsonOrForm<ResetRequest>,
) -> AppResult<ApiResponse<Message>> {
    state.recovery_service.reset(&token, &req.password).await?;
    Ok(message("Password reset"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/getcode", post(get_code))
        .route("/verify", post(verify))
        .route("/reset/{token}", get(reset_form).post(reset))
        .route("/{id}/profile", get(profile))
}
