#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};

use comply_domain::id::UserId;
use comply_domain::scope::TenantScope;
use comply_domain::user::MfaMethod;

use crate::domain::lockout::LockoutState;
use crate::domain::types::{AuthUser, NewUser};
use crate::error::AuthServiceError;

/// User and role rows. Every call is confined to `scope`.
pub trait UserRepository: Send + Sync {
    async fn find_by_email(
        &self,
        scope: &TenantScope,
        email: &str,
    ) -> Result<Option<AuthUser>, AuthServiceError>;

    async fn find_by_id(
        &self,
        scope: &TenantScope,
        id: UserId,
    ) -> Result<Option<AuthUser>, AuthServiceError>;

    /// Insert the user and its role grants. `EmailTaken` if the email exists in the tenant.
    async fn create(&self, user: &NewUser) -> Result<AuthUser, AuthServiceError>;

    /// Persist lockout fields. Returns `false` if the user is not visible in `scope`.
    async fn save_lockout(
        &self,
        scope: &TenantScope,
        id: UserId,
        state: &LockoutState,
    ) -> Result<bool, AuthServiceError>;

    /// Reset lockout fields and stamp `last_login_at`.
    async fn record_login(
        &self,
        scope: &TenantScope,
        id: UserId,
        at: DateTime<Utc>,
    ) -> Result<(), AuthServiceError>;

    /// Store a (not yet enabled) second-factor secret.
    async fn set_mfa_secret(
        &self,
        scope: &TenantScope,
        id: UserId,
        method: MfaMethod,
        secret: &str,
    ) -> Result<(), AuthServiceError>;

    async fn enable_mfa(&self, scope: &TenantScope, id: UserId) -> Result<(), AuthServiceError>;

    /// Returns `false` if the user is not visible in `scope`.
    async fn mark_email_verified(
        &self,
        scope: &TenantScope,
        id: UserId,
        at: DateTime<Utc>,
    ) -> Result<bool, AuthServiceError>;
}

/// Server-side token state (Redis), keyed by token value.
pub trait TokenStore: Send + Sync {
    async fn store_refresh_token(
        &self,
        token: &str,
        user_id: UserId,
        ttl_secs: u64,
    ) -> Result<(), AuthServiceError>;

    async fn refresh_token_owner(&self, token: &str) -> Result<Option<UserId>, AuthServiceError>;

    /// Idempotent.
    async fn revoke_refresh_token(&self, token: &str) -> Result<(), AuthServiceError>;

    async fn store_email_verification(
        &self,
        token: &str,
        user_id: UserId,
        ttl_secs: u64,
    ) -> Result<(), AuthServiceError>;

    /// Read and delete in one step.
    async fn take_email_verification(
        &self,
        token: &str,
    ) -> Result<Option<UserId>, AuthServiceError>;
}
