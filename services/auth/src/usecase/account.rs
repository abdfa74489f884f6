use chrono::Utc;
use rand::RngExt;

use comply_auth_types::authorize::{Decision, Requirement, evaluate};
use comply_auth_types::identity::IdentityHeaders;
use comply_domain::id::{TenantId, UserId};
use comply_domain::role::Role;
use comply_domain::scope::TenantScope;

use crate::domain::lockout::LockoutPolicy;
use crate::domain::repository::{TokenStore, UserRepository};
use crate::domain::types::{AuthUser, EMAIL_VERIFICATION_TTL_SECS, MIN_PASSWORD_LEN, NewUser};
use crate::error::AuthServiceError;
use crate::infra::password;
use crate::usecase::token::normalize_email;

const VERIFICATION_TOKEN_LEN: usize = 48;
const VERIFICATION_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

fn generate_verification_token() -> String {
    let mut rng = rand::rng();
    (0..VERIFICATION_TOKEN_LEN)
        .map(|_| VERIFICATION_CHARSET[rng.random_range(0..VERIFICATION_CHARSET.len())] as char)
        .collect()
}

fn validate_email(email: &str) -> Result<(), AuthServiceError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(AuthServiceError::InvalidInput("invalid email address".into())),
    }
}

// ── Register ─────────────────────────────────────────────────────────────────

pub struct RegisterInput {
    pub tenant_id: TenantId,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

pub struct RegisterUseCase<U: UserRepository, T: TokenStore> {
    pub users: U,
    pub tokens: T,
}

impl<U: UserRepository, T: TokenStore> RegisterUseCase<U, T> {
    /// Create a `client` account and mint its e-mail verification token.
    pub async fn execute(&self, input: RegisterInput) -> Result<AuthUser, AuthServiceError> {
        let email = normalize_email(&input.email);
        validate_email(&email)?;
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthServiceError::InvalidInput(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let first_name = input.first_name.trim().to_owned();
        let last_name = input.last_name.trim().to_owned();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(AuthServiceError::InvalidInput(
                "first_name and last_name are required".into(),
            ));
        }

        let user = self
            .users
            .create(&NewUser {
                id: UserId(uuid::Uuid::now_v7()),
                tenant_id: input.tenant_id,
                email,
                password_hash: password::hash_password(&input.password)?,
                first_name,
                last_name,
                roles: vec![Role::Client],
            })
            .await?;

        // Delivery is out of band.
        let token = generate_verification_token();
        match self
            .tokens
            .store_email_verification(&token, user.id, EMAIL_VERIFICATION_TTL_SECS)
            .await
        {
            Ok(()) => tracing::info!(user_id = %user.id, "email verification token issued"),
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = ?e, "failed to store email verification token")
            }
        }

        tracing::info!(user_id = %user.id, tenant_id = %input.tenant_id, "user registered");
        Ok(user)
    }
}

// ── Verify e-mail ────────────────────────────────────────────────────────────

pub struct VerifyEmailUseCase<U: UserRepository, T: TokenStore> {
    pub users: U,
    pub tokens: T,
}

impl<U: UserRepository, T: TokenStore> VerifyEmailUseCase<U, T> {
    /// Consume a verification token. Tokens are single-use.
    pub async fn execute(&self, tenant_id: TenantId, token: &str) -> Result<(), AuthServiceError> {
        let invalid =
            || AuthServiceError::InvalidInput("invalid or expired verification token".into());
        if token.is_empty() {
            return Err(invalid());
        }
        let user_id = self
            .tokens
            .take_email_verification(token)
            .await?
            .ok_or_else(invalid)?;

        let scope = TenantScope::Tenant(tenant_id);
        if !self
            .users
            .mark_email_verified(&scope, user_id, Utc::now())
            .await?
        {
            return Err(invalid());
        }
        Ok(())
    }
}

// ── Admin unlock ─────────────────────────────────────────────────────────────

/// Tenant managers and above.
pub const UNLOCK_REQUIREMENT: Requirement = Requirement::Level(3);

pub struct UnlockUserUseCase<U: UserRepository> {
    pub users: U,
    pub policy: LockoutPolicy,
}

impl<U: UserRepository> UnlockUserUseCase<U> {
    /// Clear the lock and failure count of `target`, regardless of the lock deadline.
    pub async fn execute(
        &self,
        caller: &IdentityHeaders,
        target: UserId,
    ) -> Result<(), AuthServiceError> {
        let grant = match evaluate(&caller.roles, &UNLOCK_REQUIREMENT) {
            Decision::Allowed(grant) => grant,
            Decision::Denied => {
                return Err(AuthServiceError::InsufficientPermissions(
                    UNLOCK_REQUIREMENT.to_string(),
                ));
            }
        };
        let scope = caller
            .scope()
            .ok_or(AuthServiceError::TenantContextMissing)?;

        if !self
            .users
            .save_lockout(&scope, target, &self.policy.reset())
            .await?
        {
            return Err(AuthServiceError::UserNotFound);
        }

        tracing::info!(
            user_id = %target,
            unlocked_by = %caller.user_id,
            grant = ?grant,
            "account unlocked"
        );
        Ok(())
    }
}

// ── Profile ──────────────────────────────────────────────────────────────────

pub struct GetProfileUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> GetProfileUseCase<U> {
    pub async fn execute(&self, caller: &IdentityHeaders) -> Result<AuthUser, AuthServiceError> {
        let scope = caller
            .scope()
            .ok_or(AuthServiceError::TenantContextMissing)?;
        self.users
            .find_by_id(&scope, caller.user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)
    }
}
