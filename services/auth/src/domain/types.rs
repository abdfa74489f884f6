use chrono::{DateTime, Utc};

use comply_domain::id::{TenantId, UserId};
use comply_domain::role::Role;
use comply_domain::user::{MfaMethod, UserStatus};

use crate::domain::lockout::LockoutState;

/// User row plus its live role grants.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    pub tenant_id: Option<TenantId>,
    pub email: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub status: UserStatus,
    pub email_verified: bool,
    pub mfa_enabled: bool,
    pub mfa_method: Option<MfaMethod>,
    /// Base32 TOTP secret.
    pub mfa_secret: Option<String>,
    pub lockout: LockoutState,
    pub last_login_at: Option<DateTime<Utc>>,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

impl AuthUser {
    pub fn is_system_level(&self) -> bool {
        self.roles.iter().any(|r| r.is_system_level())
    }
}

/// Data needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<Role>,
}

/// Issuer shown by authenticator apps.
pub const TOTP_ISSUER: &str = "Comply360";

/// E-mail verification token lifetime in seconds (24 hours).
pub const EMAIL_VERIFICATION_TTL_SECS: u64 = 24 * 60 * 60;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;
