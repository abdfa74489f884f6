use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use comply_auth_types::token::{
    ACCESS_TOKEN_TTL_SECS, JwtClaims, MFA_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS, TokenKind,
    validate_token,
};
use comply_domain::id::TenantId;
use comply_domain::scope::TenantScope;

use crate::domain::lockout::{AccountState, LockoutPolicy};
use crate::domain::repository::{TokenStore, UserRepository};
use crate::domain::types::{AuthUser, TOTP_ISSUER};
use crate::error::AuthServiceError;
use crate::infra::{password, totp};

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn sign(claims: &JwtClaims, secret: &str) -> Result<String, AuthServiceError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthServiceError::Internal(e.into()))
}

fn tenant_claim(user: &AuthUser) -> Option<String> {
    user.tenant_id.map(|t| t.to_string())
}

/// 15-minute access token carrying the user's identity, tenant and live roles.
pub fn issue_access_token(user: &AuthUser, secret: &str) -> Result<String, AuthServiceError> {
    let iat = now_secs();
    sign(
        &JwtClaims {
            sub: user.id.to_string(),
            tenant_id: tenant_claim(user),
            email: Some(user.email.clone()),
            roles: user.roles.iter().map(|r| r.as_str().to_owned()).collect(),
            iat,
            exp: iat + ACCESS_TOKEN_TTL_SECS,
            token_type: None,
            jti: None,
        },
        secret,
    )
}

fn issue_typed_token(
    user: &AuthUser,
    secret: &str,
    kind: TokenKind,
    ttl_secs: u64,
) -> Result<String, AuthServiceError> {
    let iat = now_secs();
    sign(
        &JwtClaims {
            sub: user.id.to_string(),
            tenant_id: tenant_claim(user),
            email: None,
            roles: Vec::new(),
            iat,
            exp: iat + ttl_secs,
            token_type: kind.claim().map(str::to_owned),
            // Refresh tokens double as store keys: two sessions must never share one.
            jti: Some(Uuid::new_v4().to_string()),
        },
        secret,
    )
}

/// 7-day refresh token. Only valid while also present in the token store.
pub fn issue_refresh_token(user: &AuthUser, secret: &str) -> Result<String, AuthServiceError> {
    issue_typed_token(user, secret, TokenKind::Refresh, REFRESH_TOKEN_TTL_SECS)
}

/// 5-minute challenge token exchanged for a token pair once the second factor checks out.
pub fn issue_mfa_token(user: &AuthUser, secret: &str) -> Result<String, AuthServiceError> {
    issue_typed_token(user, secret, TokenKind::Mfa, MFA_TOKEN_TTL_SECS)
}

/// Tokens handed to a client after login or refresh.
#[derive(Debug)]
pub struct AuthTokens {
    pub access_token: String,
    /// Absent on refresh: refresh tokens are not rotated.
    pub refresh_token: Option<String>,
    pub expires_in: u64,
    pub user: AuthUser,
}

#[derive(Debug)]
pub enum LoginOutcome {
    Authenticated(AuthTokens),
    /// Password accepted, second factor pending. No access or refresh token was issued.
    MfaRequired { mfa_token: String, expires_in: u64 },
}

// ── Shared steps ─────────────────────────────────────────────────────────────

/// Apply a failed attempt. Returns the lock deadline if this failure locked the account.
async fn record_failure<U: UserRepository>(
    users: &U,
    policy: &LockoutPolicy,
    scope: &TenantScope,
    user: &AuthUser,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, AuthServiceError> {
    let next = policy.record_failure(&user.lockout, now);
    users.save_lockout(scope, user.id, &next).await?;
    match next.state(now) {
        AccountState::Locked { until } => {
            tracing::warn!(user_id = %user.id, %until, "account locked after repeated failures");
            Ok(Some(until))
        }
        AccountState::Active => Ok(None),
    }
}

fn ensure_unlocked(user: &AuthUser, now: DateTime<Utc>) -> Result<(), AuthServiceError> {
    match user.lockout.state(now) {
        AccountState::Locked { until } => Err(AuthServiceError::AccountLocked { until }),
        AccountState::Active => Ok(()),
    }
}

/// Success transition, then mint and persist the token pair.
///
/// A token store outage is logged and tolerated: the client still receives its tokens,
/// the refresh token just will not be redeemable.
async fn complete_login<U: UserRepository, T: TokenStore>(
    users: &U,
    tokens: &T,
    secret: &str,
    scope: &TenantScope,
    mut user: AuthUser,
    now: DateTime<Utc>,
) -> Result<AuthTokens, AuthServiceError> {
    users.record_login(scope, user.id, now).await?;
    user.lockout = Default::default();
    user.last_login_at = Some(now);

    let access_token = issue_access_token(&user, secret)?;
    let refresh_token = issue_refresh_token(&user, secret)?;
    if let Err(e) = tokens
        .store_refresh_token(&refresh_token, user.id, REFRESH_TOKEN_TTL_SECS)
        .await
    {
        tracing::warn!(user_id = %user.id, error = ?e, "failed to persist refresh token");
    }

    Ok(AuthTokens {
        access_token,
        refresh_token: Some(refresh_token),
        expires_in: ACCESS_TOKEN_TTL_SECS,
        user,
    })
}

/// Load the subject of a refresh or MFA token inside the tenant named by the token.
///
/// A token without a tenant resolves in the global scope, which only a system-level
/// user may own.
async fn load_subject<U: UserRepository>(
    users: &U,
    claims: &JwtClaims,
) -> Result<(TenantScope, AuthUser), AuthServiceError> {
    let user_id = claims
        .user_id()
        .map_err(|_| AuthServiceError::InvalidToken)?;
    let scope = match claims
        .tenant_id()
        .map_err(|_| AuthServiceError::InvalidToken)?
    {
        Some(tenant_id) => TenantScope::Tenant(tenant_id),
        None => TenantScope::Global,
    };
    let user = users
        .find_by_id(&scope, user_id)
        .await?
        .ok_or(AuthServiceError::InvalidToken)?;
    if scope.is_global() && !user.is_system_level() {
        return Err(AuthServiceError::InvalidToken);
    }
    Ok((scope, user))
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// ── Login ────────────────────────────────────────────────────────────────────

pub struct LoginInput {
    pub tenant_id: TenantId,
    pub email: String,
    pub password: String,
}

pub struct LoginUseCase<U: UserRepository, T: TokenStore> {
    pub users: U,
    pub tokens: T,
    pub jwt_secret: String,
    pub policy: LockoutPolicy,
}

impl<U: UserRepository, T: TokenStore> LoginUseCase<U, T> {
    pub async fn execute(&self, input: LoginInput) -> Result<LoginOutcome, AuthServiceError> {
        self.execute_at(input, Utc::now()).await
    }

    /// Same as [`execute`](Self::execute) with lockout evaluated at `now`.
    pub async fn execute_at(
        &self,
        input: LoginInput,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, AuthServiceError> {
        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(AuthServiceError::InvalidInput(
                "email and password are required".into(),
            ));
        }
        let scope = TenantScope::Tenant(input.tenant_id);
        let user = self
            .users
            .find_by_email(&scope, &normalize_email(&input.email))
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        ensure_unlocked(&user, now)?;

        if !password::verify_password(&input.password, &user.password_hash)? {
            let locked = record_failure(&self.users, &self.policy, &scope, &user, now).await?;
            return Err(match locked {
                Some(until) => AuthServiceError::AccountLocked { until },
                None => AuthServiceError::InvalidCredentials,
            });
        }

        if user.mfa_enabled {
            return Ok(LoginOutcome::MfaRequired {
                mfa_token: issue_mfa_token(&user, &self.jwt_secret)?,
                expires_in: MFA_TOKEN_TTL_SECS,
            });
        }

        let tokens =
            complete_login(&self.users, &self.tokens, &self.jwt_secret, &scope, user, now).await?;
        Ok(LoginOutcome::Authenticated(tokens))
    }
}

// ── MFA challenge login ──────────────────────────────────────────────────────

pub struct MfaLoginInput {
    pub mfa_token: String,
    pub code: String,
}

pub struct MfaLoginUseCase<U: UserRepository, T: TokenStore> {
    pub users: U,
    pub tokens: T,
    pub jwt_secret: String,
    pub policy: LockoutPolicy,
}

impl<U: UserRepository, T: TokenStore> MfaLoginUseCase<U, T> {
    pub async fn execute(&self, input: MfaLoginInput) -> Result<AuthTokens, AuthServiceError> {
        self.execute_at(input, Utc::now()).await
    }

    pub async fn execute_at(
        &self,
        input: MfaLoginInput,
        now: DateTime<Utc>,
    ) -> Result<AuthTokens, AuthServiceError> {
        let claims = validate_token(&input.mfa_token, &self.jwt_secret, TokenKind::Mfa)
            .map_err(|_| AuthServiceError::InvalidToken)?;
        let (scope, user) = load_subject(&self.users, &claims).await?;

        ensure_unlocked(&user, now)?;

        let secret = match (&user.mfa_secret, user.mfa_enabled) {
            (Some(secret), true) => secret.clone(),
            _ => return Err(AuthServiceError::MfaNotSetUp),
        };
        if !totp::verify_code(&secret, &input.code, TOTP_ISSUER, &user.email)? {
            let locked = record_failure(&self.users, &self.policy, &scope, &user, now).await?;
            return Err(match locked {
                Some(until) => AuthServiceError::AccountLocked { until },
                None => AuthServiceError::InvalidMfaCode,
            });
        }

        complete_login(&self.users, &self.tokens, &self.jwt_secret, &scope, user, now).await
    }
}

// ── Refresh ──────────────────────────────────────────────────────────────────

pub struct RefreshTokenUseCase<U: UserRepository, T: TokenStore> {
    pub users: U,
    pub tokens: T,
    pub jwt_secret: String,
}

impl<U: UserRepository, T: TokenStore> RefreshTokenUseCase<U, T> {
    /// Mint a new access token. Every failure surfaces as `InvalidToken`.
    pub async fn execute(&self, refresh_token: &str) -> Result<AuthTokens, AuthServiceError> {
        let claims = validate_token(refresh_token, &self.jwt_secret, TokenKind::Refresh)
            .map_err(|_| AuthServiceError::InvalidToken)?;
        let user_id = claims
            .user_id()
            .map_err(|_| AuthServiceError::InvalidToken)?;

        // Signature alone is not enough: revoked tokens are gone from the store.
        let owner = self
            .tokens
            .refresh_token_owner(refresh_token)
            .await
            .map_err(|e| {
                tracing::warn!(error = ?e, "refresh token lookup failed");
                AuthServiceError::InvalidToken
            })?;
        if owner != Some(user_id) {
            return Err(AuthServiceError::InvalidToken);
        }

        let (_, user) = load_subject(&self.users, &claims).await?;
        if user.lockout.is_locked(Utc::now()) {
            return Err(AuthServiceError::InvalidToken);
        }

        Ok(AuthTokens {
            access_token: issue_access_token(&user, &self.jwt_secret)?,
            refresh_token: None,
            expires_in: ACCESS_TOKEN_TTL_SECS,
            user,
        })
    }
}

// ── Logout ───────────────────────────────────────────────────────────────────

pub struct LogoutUseCase<T: TokenStore> {
    pub tokens: T,
}

impl<T: TokenStore> LogoutUseCase<T> {
    /// Revoke a refresh token. Unknown tokens are a no-op.
    pub async fn execute(&self, refresh_token: &str) -> Result<(), AuthServiceError> {
        if refresh_token.is_empty() {
            return Err(AuthServiceError::InvalidInput(
                "refresh_token is required".into(),
            ));
        }
        self.tokens.revoke_refresh_token(refresh_token).await
    }
}
