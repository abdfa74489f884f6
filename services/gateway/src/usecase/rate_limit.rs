use axum::http::{HeaderMap, HeaderValue};
use chrono::Utc;

use comply_core::error::{
    AppError, RateLimitDetails, X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET,
};
use comply_domain::id::TenantId;

use crate::domain::repository::CounterStore;

/// Fixed-window quota applied to each tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub limit: u64,
    pub window_secs: u64,
}

/// Quota left after an admitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub limit: u64,
    pub remaining: u64,
    /// Unix seconds.
    pub reset_at: i64,
}

impl RateLimitStatus {
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(self.limit));
        headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(self.remaining));
        headers.insert(X_RATELIMIT_RESET, HeaderValue::from(self.reset_at));
    }
}

pub fn counter_key(tenant_id: TenantId) -> String {
    format!("rate_limit:tenant:{}", tenant_id)
}

pub struct RateLimiter<C: CounterStore> {
    pub store: C,
    pub policy: RateLimitPolicy,
}

impl<C: CounterStore> RateLimiter<C> {
    pub async fn check(&self, tenant_id: TenantId) -> Result<Option<RateLimitStatus>, AppError> {
        self.check_at(tenant_id, Utc::now().timestamp()).await
    }

    /// Count one request against the tenant's window.
    ///
    /// `Ok(None)` means the counter store failed and the request is let through unmetered.
    pub async fn check_at(
        &self,
        tenant_id: TenantId,
        now: i64,
    ) -> Result<Option<RateLimitStatus>, AppError> {
        match self.count(tenant_id, now).await {
            Ok(Ok(status)) => Ok(Some(status)),
            Ok(Err(details)) => {
                tracing::info!(
                    tenant_id = %tenant_id,
                    limit = details.limit,
                    retry_after_secs = details.retry_after_secs,
                    "rate limit exceeded"
                );
                Err(AppError::RateLimitExceeded(details))
            }
            Err(e) => {
                tracing::warn!(tenant_id = %tenant_id, error = ?e, "rate limiter unavailable, allowing request");
                Ok(None)
            }
        }
    }

    /// Outer error: store failure. Inner error: quota exhausted.
    async fn count(
        &self,
        tenant_id: TenantId,
        now: i64,
    ) -> Result<Result<RateLimitStatus, RateLimitDetails>, AppError> {
        let key = counter_key(tenant_id);
        let limit = self.policy.limit;
        let window = self.policy.window_secs;

        let current = self.store.count(&key).await?;
        if current >= limit {
            let retry_after_secs = match self.store.ttl_secs(&key).await? {
                Some(ttl) => ttl,
                None => {
                    // A counter that lost its expiry would throttle forever; restart the window.
                    tracing::warn!(tenant_id = %tenant_id, "rate counter without expiry, re-arming");
                    self.store.expire(&key, window).await?;
                    window
                }
            };
            return Ok(Err(RateLimitDetails {
                limit,
                remaining: 0,
                reset_at: now + retry_after_secs as i64,
                retry_after_secs,
            }));
        }

        let expire = (current == 0).then_some(window);
        let new = self.store.increment(&key, expire).await?;
        Ok(Ok(RateLimitStatus {
            limit,
            remaining: limit.saturating_sub(new),
            reset_at: now + window as i64,
        }))
    }
}
