//! Password recovery by emailed code and reset link.

use blog_common::{AppError, AppResult};
use blog_db::{entities::user, repositories::UserRepository};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::email::EmailService;
use super::token::{TokenKind, TokenService};
use super::user::UserService;
use super::verification::VerificationCodeCache;

#[derive(Debug, Deserialize, Validate)]
pub struct SendCodeInput {
    #[validate(length(min = 3, max = 20))]
    pub username: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyCodeInput {
    #[validate(length(min = 3, max = 20))]
    pub username: String,

    #[serde(rename = "verificationCode")]
    #[validate(length(min = 1, max = 32))]
    pub code: String,
}

/// Drives the forgot-password flow.
#[derive(Clone)]
pub struct RecoveryService {
    user_repo: UserRepository,
    users: UserService,
    codes: VerificationCodeCache,
    tokens: TokenService,
    email: EmailService,
    server_url: String,
}

impl RecoveryService {
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        users: UserService,
        codes: VerificationCodeCache,
        tokens: TokenService,
        email: EmailService,
        server_url: &str,
    ) -> Self {
        Self {
            user_repo,
            users,
            codes,
            tokens,
            email,
            server_url: server_url.trim_end_matches('/').to_string(),
        }
    }

    /// Email a verification code to the account's address.
    pub async fn send_code(&self, input: SendCodeInput) -> AppResult<()> {
        input.validate()?;
        let user = self.find_user(&input.username).await?;

        let code = self.codes.issue(&user.id).await?;
        self.email.send_verification_code(&user.email, &code).await?;
        self.user_repo.increment_captcha_count(&user.id).await?;

        info!(user_id = %user.id, "Verification code sent");
        Ok(())
    }

    /// Check the code and email a password-reset link.
    pub async fn verify_code(&self, input: VerifyCodeInput) -> AppResult<()> {
        input.validate()?;
        let user = self.find_user(&input.username).await?;

        self.codes.verify(&user.id, &input.code).await?;

        let token = self.tokens.issue(&user.id, TokenKind::Reset)?;
        let link = self.reset_link(&token);
        self.email.send_reset_link(&user.email, &link).await?;

        info!(user_id = %user.id, "Reset link sent");
        Ok(())
    }

    /// Whether `token` is a live reset token.
    pub fn check_reset_token(&self, token: &str) -> AppResult<()> {
        self.tokens.verify(token, TokenKind::Reset).map(|_| ())
    }

    /// Set a new password for the holder of a reset token.
    pub async fn reset(&self, token: &str, password: &str) -> AppResult<()> {
        let claims = self.tokens.verify(token, TokenKind::Reset)?;
        self.users.reset_password(&claims.sub, password).await
    }

    fn reset_link(&self, token: &str) -> String {
        format!("{}/auth/reset/{token}", self.server_url)
    }

    async fn find_user(&self, username: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::BadRequest("User does not exist".to_string()))
    }
}
