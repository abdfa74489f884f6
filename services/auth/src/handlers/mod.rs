use chrono::{DateTime, Utc};
use serde::Serialize;

use comply_core::serde::{to_rfc3339_ms, to_rfc3339_ms_opt};
use comply_domain::id::{TenantId, UserId};
use comply_domain::role::Role;
use comply_domain::user::{MfaMethod, UserStatus};

use crate::domain::types::AuthUser;

pub mod account;
pub mod auth;
pub mod mfa;

/// Public view of a user. Secrets and lockout counters never leave the service.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub tenant_id: Option<TenantId>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub status: UserStatus,
    pub email_verified: bool,
    pub mfa_enabled: bool,
    pub mfa_method: Option<MfaMethod>,
    pub roles: Vec<Role>,
    #[serde(serialize_with = "to_rfc3339_ms_opt")]
    pub last_login_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<AuthUser> for UserResponse {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            tenant_id: user.tenant_id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            status: user.status,
            email_verified: user.email_verified,
            mfa_enabled: user.mfa_enabled,
            mfa_method: user.mfa_method,
            roles: user.roles,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
