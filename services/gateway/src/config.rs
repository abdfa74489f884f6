use std::time::Duration;

use serde::Deserialize;

use comply_core::config::Config;

use crate::domain::route::Upstreams;
use crate::usecase::rate_limit::RateLimitPolicy;

/// Gateway configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct GatewayConfig {
    /// PostgreSQL connection URL (tenant registry). Env var: `DATABASE_URL`.
    pub database_url: String,
    /// Redis connection URL (rate-limit counters). Env var: `REDIS_URL`.
    pub redis_url: String,
    /// HMAC secret shared with the auth service. Env var: `JWT_SECRET`.
    pub jwt_secret: String,
    /// TCP port to listen on (default 8080). Env var: `API_GATEWAY_PORT`.
    #[serde(default = "default_port")]
    pub api_gateway_port: u16,
    /// Requests allowed per tenant per window (default 1000).
    #[serde(default = "default_rate_limit_requests")]
    pub rate_limit_requests: u64,
    /// Window length in seconds (default 60).
    #[serde(default = "default_rate_limit_window")]
    pub rate_limit_window_secs: u64,
    /// Upper bound on one upstream call (default 5).
    #[serde(default = "default_proxy_timeout")]
    pub proxy_timeout_secs: u64,
    #[serde(default = "default_auth_url")]
    pub auth_service_url: String,
    #[serde(default = "default_tenant_url")]
    pub tenant_service_url: String,
    #[serde(default = "default_registration_url")]
    pub registration_service_url: String,
    #[serde(default = "default_document_url")]
    pub document_service_url: String,
    #[serde(default = "default_commission_url")]
    pub commission_service_url: String,
}

fn default_port() -> u16 {
    8080
}

fn default_rate_limit_requests() -> u64 {
    1000
}

fn default_rate_limit_window() -> u64 {
    60
}

fn default_proxy_timeout() -> u64 {
    5
}

fn default_auth_url() -> String {
    "http://localhost:8081".to_owned()
}

fn default_tenant_url() -> String {
    "http://localhost:8082".to_owned()
}

fn default_registration_url() -> String {
    "http://localhost:8083".to_owned()
}

fn default_document_url() -> String {
    "http://localhost:8084".to_owned()
}

fn default_commission_url() -> String {
    "http://localhost:8085".to_owned()
}

impl Config for GatewayConfig {}

impl GatewayConfig {
    pub fn rate_limit_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            limit: self.rate_limit_requests,
            window_secs: self.rate_limit_window_secs,
        }
    }

    pub fn proxy_timeout(&self) -> Duration {
        Duration::from_secs(self.proxy_timeout_secs)
    }

    pub fn upstreams(&self) -> Upstreams {
        Upstreams {
            auth: self.auth_service_url.clone(),
            tenant: self.tenant_service_url.clone(),
            registration: self.registration_service_url.clone(),
            document: self.document_service_url.clone(),
            commission: self.commission_service_url.clone(),
        }
    }
}
