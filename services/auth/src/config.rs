use serde::Deserialize;

use comply_core::config::Config;

use crate::domain::lockout::LockoutPolicy;

/// Auth service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// PostgreSQL connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// Redis connection URL. Env var: `REDIS_URL`.
    pub redis_url: String,
    /// HMAC secret for signing every JWT the service issues. Env var: `JWT_SECRET`.
    pub jwt_secret: String,
    /// TCP port to listen on (default 8081). Env var: `AUTH_PORT`.
    #[serde(default = "default_port")]
    pub auth_port: u16,
    /// Consecutive failures before an account locks (default 5).
    #[serde(default = "default_max_failed_attempts")]
    pub max_failed_attempts: u32,
    /// Lock window in minutes (default 30).
    #[serde(default = "default_lock_minutes")]
    pub lock_duration_minutes: i64,
}

fn default_port() -> u16 {
    8081
}

fn default_max_failed_attempts() -> u32 {
    5
}

fn default_lock_minutes() -> i64 {
    30
}

impl Config for AuthConfig {}

impl AuthConfig {
    pub fn lockout_policy(&self) -> LockoutPolicy {
        LockoutPolicy {
            max_attempts: self.max_failed_attempts,
            lock_duration: chrono::Duration::minutes(self.lock_duration_minutes),
        }
    }
}
