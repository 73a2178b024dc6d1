//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Token and login policy.
    pub auth: AuthConfig,
    /// Password-recovery code policy.
    #[serde(default)]
    pub verification: VerificationConfig,
    /// Outgoing mail. Mail is only logged when absent.
    #[serde(default)]
    pub email: Option<EmailConfig>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance, used in password reset links.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// JWT and login lockout configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing tokens.
    pub jwt_secret: String,
    /// `iss` claim.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Access token lifetime.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_secs: i64,
    /// Refresh token lifetime.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_secs: i64,
    /// Password reset link lifetime.
    #[serde(default = "default_reset_ttl")]
    pub reset_ttl_secs: i64,
    /// Failed logins before an account is locked.
    #[serde(default = "default_max_failed_logins")]
    pub max_failed_logins: i32,
}

/// Verification code configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationConfig {
    /// How long an issued code stays valid.
    #[serde(default = "default_code_ttl")]
    pub code_ttl_secs: i64,
    /// Minimum delay between two codes for the same user.
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: i64,
    /// Upper bound on pending codes held in memory.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Period of the background purge task.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            code_ttl_secs: default_code_ttl(),
            cooldown_secs: default_cooldown(),
            max_entries: default_max_entries(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// SMTP configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SMTP host.
    pub host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// SMTP username.
    #[serde(default)]
    pub username: Option<String>,
    /// SMTP password.
    #[serde(default)]
    pub password: Option<String>,
    /// Sender address.
    pub from_address: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_issuer() -> String {
    "blog".to_string()
}

const fn default_access_ttl() -> i64 {
    3600
}

const fn default_refresh_ttl() -> i64 {
    24 * 3600
}

const fn default_reset_ttl() -> i64 {
    20 * 60
}

const fn default_max_failed_logins() -> i32 {
    5
}

const fn default_code_ttl() -> i64 {
    10 * 60
}

const fn default_cooldown() -> i64 {
    60
}

const fn default_max_entries() -> usize {
    10_000
}

const fn default_sweep_interval() -> u64 {
    300
}

const fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "Blog".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present, exported into the process environment)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `BLOG_ENV`)
    /// 4. Environment variables with `BLOG_` prefix, e.g. `BLOG_AUTH__JWT_SECRET`
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("BLOG_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("BLOG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("BLOG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let raw = r#"
            [server]
            url = "http://localhost:3000"

            [database]
            url = "postgres://localhost/blog"

            [auth]
            jwt_secret = "secret"
        "#;

        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.access_ttl_secs, 3600);
        assert_eq!(config.auth.refresh_ttl_secs, 86_400);
        assert_eq!(config.auth.max_failed_logins, 5);
        assert_eq!(config.verification.code_ttl_secs, 600);
        assert!(config.email.is_none());
    }
}
