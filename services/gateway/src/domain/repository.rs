#![allow(async_fn_in_trait)]

use comply_core::error::AppError;
use comply_domain::id::TenantId;
use comply_domain::tenant::Tenant;

use crate::domain::proxy::{OutboundRequest, UpstreamResponse};

/// Tenant registry. Soft-deleted tenants are never returned.
pub trait TenantLookup: Send + Sync {
    async fn by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, AppError>;

    async fn by_id(&self, id: TenantId) -> Result<Option<Tenant>, AppError>;
}

/// Expiring integer counters (Redis).
pub trait CounterStore: Send + Sync {
    /// Current value, 0 when the key is absent.
    async fn count(&self, key: &str) -> Result<u64, AppError>;

    /// Remaining lifetime in seconds, `None` when the key is absent or never expires.
    async fn ttl_secs(&self, key: &str) -> Result<Option<u64>, AppError>;

    /// Increment by one and, when `expire_secs` is set, arm the expiry in the same
    /// atomic step. Returns the new value.
    async fn increment(&self, key: &str, expire_secs: Option<u64>) -> Result<u64, AppError>;

    /// Set the remaining lifetime of an existing key. No-op when the key is absent.
    async fn expire(&self, key: &str, secs: u64) -> Result<(), AppError>;
}

/// Sends a request to a downstream service.
///
/// Connection failures and timeouts are [`AppError::BadGateway`]; failures building the
/// request or reading the body are [`AppError::Proxy`].
pub trait Forwarder: Send + Sync {
    async fn forward(&self, request: OutboundRequest) -> Result<UpstreamResponse, AppError>;
}
