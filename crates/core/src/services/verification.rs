//! In-memory store of pending password-recovery codes.

use std::collections::HashMap;
use std::sync::Arc;

use blog_common::{AppError, AppResult, IdGenerator, config::VerificationConfig};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct PendingCode {
    code: String,
    issued_at: i64,
}

/// Shared map of user id to the last code issued for that user.
///
/// Cloning shares the underlying map.
#[derive(Clone)]
pub struct VerificationCodeCache {
    codes: Arc<RwLock<HashMap<String, PendingCode>>>,
    ttl_secs: i64,
    cooldown_secs: i64,
    max_entries: usize,
    id_gen: IdGenerator,
}

impl VerificationCodeCache {
    #[must_use]
    pub fn new(config: &VerificationConfig) -> Self {
        Self {
            codes: Arc::new(RwLock::new(HashMap::new())),
            ttl_secs: config.code_ttl_secs,
            cooldown_secs: config.cooldown_secs,
            max_entries: config.max_entries,
            id_gen: IdGenerator::new(),
        }
    }

    /// Generate and remember a fresh code for `user_id`.
    pub async fn issue(&self, user_id: &str) -> AppResult<String> {
        self.issue_at(user_id, chrono::Utc::now().timestamp()).await
    }

    async fn issue_at(&self, user_id: &str, now: i64) -> AppResult<String> {
        let mut codes = self.codes.write().await;

        if codes
            .get(user_id)
            .is_some_and(|p| now - p.issued_at < self.cooldown_secs)
        {
            return Err(AppError::RateLimited);
        }

        let ttl = self.ttl_secs;
        codes.retain(|_, p| now - p.issued_at < ttl);
        if codes.len() >= self.max_entries && !codes.contains_key(user_id) {
            tracing::warn!(pending = codes.len(), "Verification code store is full");
            return Err(AppError::RateLimited);
        }

        let code = self.id_gen.generate_verification_code();
        codes.insert(
            user_id.to_string(),
            PendingCode {
                code: code.clone(),
                issued_at: now,
            },
        );
        Ok(code)
    }

    /// Check `code` against the pending one. A matching code is consumed.
    pub async fn verify(&self, user_id: &str, code: &str) -> AppResult<()> {
        self.verify_at(user_id, code, chrono::Utc::now().timestamp())
            .await
    }

    async fn verify_at(&self, user_id: &str, code: &str, now: i64) -> AppResult<()> {
        let mut codes = self.codes.write().await;

        let Some(pending) = codes.get(user_id) else {
            return Err(AppError::BadRequest("No pending code".to_string()));
        };

        if now - pending.issued_at >= self.ttl_secs {
            codes.remove(user_id);
            return Err(AppError::BadRequest("Code expired".to_string()));
        }

        if pending.code != code {
            return Err(AppError::BadRequest("Wrong code".to_string()));
        }

        codes.remove(user_id);
        Ok(())
    }

    /// Drop expired codes. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        self.purge_expired_at(chrono::Utc::now().timestamp()).await
    }

    async fn purge_expired_at(&self, now: i64) -> usize {
        let mut codes = self.codes.write().await;
        let before = codes.len();
        let ttl = self.ttl_secs;
        codes.retain(|_, p| now - p.issued_at < ttl);
        before - codes.len()
    }

    /// Number of codes currently held.
    pub async fn len(&self) -> usize {
        self.codes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.codes.read().await.is_empty()
    }
}
