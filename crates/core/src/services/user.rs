//! User service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use blog_common::{AppError, AppResult, IdGenerator, config::AuthConfig};
use blog_db::{
    entities::user,
    repositories::{DraftRepository, PostRepository, UserRepository},
};
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use super::token::{TokenKind, TokenService};

/// Shortest password accepted anywhere.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Input for creating a new user.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 3, max = 20))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(min = 1, max = 500))]
    pub bio: String,

    #[serde(default)]
    #[validate(length(max = 512))]
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(length(min = 3, max = 20))]
    pub username: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Public view of the logged-in user.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Number of published posts.
    pub posts: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub refresh_token: String,
    pub user_info: UserInfo,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub token: String,
    pub user_info: UserInfo,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub article_count: u64,
    pub draft_count: u64,
    pub avatar: String,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    post_repo: PostRepository,
    draft_repo: DraftRepository,
    tokens: TokenService,
    id_gen: IdGenerator,
    max_failed_logins: i32,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        post_repo: PostRepository,
        draft_repo: DraftRepository,
        tokens: TokenService,
        auth: &AuthConfig,
    ) -> Self {
        Self {
            user_repo,
            post_repo,
            draft_repo,
            tokens,
            id_gen: IdGenerator::new(),
            max_failed_logins: auth.max_failed_logins,
        }
    }

    /// Register a new account.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        input.validate()?;

        if self.user_repo.exists_by_email(&input.email).await? {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }
        if self.user_repo.exists_by_username(&input.username).await? {
            return Err(AppError::Conflict("Username is already taken".to_string()));
        }

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate_user_id()),
            username: Set(input.username),
            email: Set(input.email),
            password_hash: Set(hash_password(&input.password)?),
            bio: Set(input.bio),
            avatar: Set(input.avatar.filter(|a| !a.is_empty())),
            failed_login: Set(0),
            captcha_req_cnt: Set(0),
            last_activity: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };
        let user = self.user_repo.create(model).await?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Check credentials and issue an access/refresh token pair.
    pub async fn login(&self, input: LoginInput) -> AppResult<LoginResponse> {
        input.validate()?;

        let user = self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .ok_or_else(|| AppError::BadRequest("User does not exist".to_string()))?;

        if user.failed_login >= self.max_failed_logins {
            warn!(user_id = %user.id, "Login attempt on locked account");
            return Err(AppError::AccountLocked);
        }

        if !verify_password(&input.password, &user.password_hash)? {
            if let Err(e) = self.user_repo.increment_failed_login(&user.id).await {
                warn!(user_id = %user.id, error = %e, "Failed to record failed login");
            }
            return Err(AppError::BadRequest("Wrong password".to_string()));
        }

        self.user_repo.record_login(&user.id).await?;

        let token = self.tokens.issue(&user.id, TokenKind::Access)?;
        let refresh_token = self.tokens.issue(&user.id, TokenKind::Refresh)?;
        let user_info = self.user_info(user).await?;

        info!(user_id = %user_info.id, "User logged in");
        Ok(LoginResponse {
            token,
            refresh_token,
            user_info,
        })
    }

    /// Resolve an access token to its user.
    pub async fn authenticate(&self, access_token: &str) -> AppResult<user::Model> {
        let claims = self.tokens.verify(access_token, TokenKind::Access)?;
        self.user_repo
            .find_by_id(&claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Exchange a refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<RefreshResponse> {
        let claims = self.tokens.verify(refresh_token, TokenKind::Refresh)?;
        let user = self
            .user_repo
            .find_by_id(&claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let token = self.tokens.issue(&user.id, TokenKind::Access)?;
        Ok(RefreshResponse {
            token,
            user_info: self.user_info(user).await?,
        })
    }

    /// Stamp the user's last activity and return it.
    pub async fn logout(&self, user_id: &str) -> AppResult<DateTime<FixedOffset>> {
        let now = Utc::now().fixed_offset();
        self.user_repo.set_last_activity(user_id, now).await?;
        info!(user_id = %user_id, "User logged out");
        Ok(now)
    }

    /// Account overview with post and draft counts.
    pub async fn profile(&self, user_id: &str) -> AppResult<Profile> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let article_count = self.post_repo.count_by_user(user_id).await?;
        let draft_count = self.draft_repo.count_by_user(user_id).await?;

        Ok(Profile {
            id: user.id,
            username: user.username,
            email: user.email,
            article_count,
            draft_count,
            avatar: user.avatar.unwrap_or_default(),
        })
    }

    /// Replace the password and clear the lockout counter.
    pub async fn reset_password(&self, user_id: &str, new_password: &str) -> AppResult<()> {
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "password: must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let user = self.user_repo.get_by_id(user_id).await?;
        if verify_password(new_password, &user.password_hash)? {
            return Err(AppError::BadRequest(
                "New password must differ from the current one".to_string(),
            ));
        }

        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(hash_password(new_password)?);
        active.failed_login = Set(0);
        active.updated_at = Set(Some(Utc::now().into()));
        self.user_repo.update(active).await?;

        info!(user_id = %user_id, "Password reset");
        Ok(())
    }

    async fn user_info(&self, user: user::Model) -> AppResult<UserInfo> {
        let posts = self.post_repo.count_by_user(&user.id).await?;
        Ok(UserInfo {
            id: user.id,
            username: user.username,
            email: user.email,
            avatar: user.avatar,
            posts,
        })
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
