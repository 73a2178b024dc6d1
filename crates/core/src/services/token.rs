//! Signed bearer tokens.

use blog_common::{AppError, AppResult, IdGenerator, config::AuthConfig};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
    Reset,
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub jti: String,
    pub kind: TokenKind,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub iss: String,
}

/// Issues and checks HS256 tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    access_ttl: i64,
    refresh_ttl: i64,
    reset_ttl: i64,
    id_gen: IdGenerator,
}

impl TokenService {
    /// Create a token service from the auth section of the config.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.issuer.clone(),
            access_ttl: config.access_ttl_secs,
            refresh_ttl: config.refresh_ttl_secs,
            reset_ttl: config.reset_ttl_secs,
            id_gen: IdGenerator::new(),
        }
    }

    const fn ttl(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
            TokenKind::Reset => self.reset_ttl,
        }
    }

    /// Sign a new token for `user_id`.
    pub fn issue(&self, user_id: &str, kind: TokenKind) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            jti: self.id_gen.generate_token_id(),
            kind,
            iat: now,
            nbf: now,
            exp: now + self.ttl(kind),
            iss: self.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Check signature, issuer, lifetime and kind. Returns the claims.
    pub fn verify(&self, token: &str, expected: TokenKind) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_nbf = true;

        let claims = decode::<Claims>(token, &self.decoding, &validation)?.claims;
        if claims.kind != expected {
            tracing::debug!(expected = ?expected, got = ?claims.kind, "Token kind mismatch");
            return Err(AppError::Unauthorized);
        }
        Ok(claims)
    }
}
