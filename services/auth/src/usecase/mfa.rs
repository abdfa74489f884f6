use comply_domain::id::UserId;
use comply_domain::scope::TenantScope;
use comply_domain::user::MfaMethod;

use crate::domain::repository::UserRepository;
use crate::domain::types::TOTP_ISSUER;
use crate::error::AuthServiceError;
use crate::infra::totp::{self, Enrollment};

// ── Setup ────────────────────────────────────────────────────────────────────

pub struct SetupMfaUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> SetupMfaUseCase<U> {
    /// Generate and store a fresh TOTP secret. MFA stays disabled until a code is verified.
    pub async fn execute(
        &self,
        scope: &TenantScope,
        user_id: UserId,
        method: MfaMethod,
    ) -> Result<Enrollment, AuthServiceError> {
        if method != MfaMethod::Totp {
            return Err(AuthServiceError::InvalidInput(format!(
                "unsupported MFA method: {}",
                method.as_str()
            )));
        }
        let user = self
            .users
            .find_by_id(scope, user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;

        let enrollment = totp::generate_enrollment(TOTP_ISSUER, &user.email)?;
        self.users
            .set_mfa_secret(scope, user.id, method, &enrollment.secret)
            .await?;

        tracing::info!(user_id = %user.id, "mfa enrollment started");
        Ok(enrollment)
    }
}

// ── Verify ───────────────────────────────────────────────────────────────────

pub struct VerifyMfaUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> VerifyMfaUseCase<U> {
    /// Check a code against the stored secret and enable MFA on first success.
    pub async fn execute(
        &self,
        scope: &TenantScope,
        user_id: UserId,
        code: &str,
    ) -> Result<(), AuthServiceError> {
        let user = self
            .users
            .find_by_id(scope, user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;
        let secret = user
            .mfa_secret
            .as_deref()
            .ok_or(AuthServiceError::MfaNotSetUp)?;

        if !totp::verify_code(secret, code, TOTP_ISSUER, &user.email)? {
            return Err(AuthServiceError::InvalidMfaCode);
        }

        if !user.mfa_enabled {
            self.users.enable_mfa(scope, user.id).await?;
            tracing::info!(user_id = %user.id, "mfa enabled");
        }
        Ok(())
    }
}
