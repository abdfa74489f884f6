//! JWT claims and validation.

use comply_domain::id::{TenantId, UserId};
use comply_domain::role::{Role, parse_roles};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::Deserialize;
#[cfg(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test))]
use serde::Serialize;

/// Access-token lifetime in seconds (15 minutes).
pub const ACCESS_TOKEN_TTL_SECS: u64 = 15 * 60;

/// Refresh-token lifetime in seconds (7 days). Also the store TTL.
pub const REFRESH_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// MFA challenge-token lifetime in seconds (5 minutes).
pub const MFA_TOKEN_TTL_SECS: u64 = 5 * 60;

/// Which flavour of token a JWT is, as told by its `type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// No `type` claim.
    Access,
    Refresh,
    Mfa,
}

impl TokenKind {
    /// Value of the `type` claim for this kind.
    pub fn claim(self) -> Option<&'static str> {
        match self {
            Self::Access => None,
            Self::Refresh => Some("refresh"),
            Self::Mfa => Some("mfa"),
        }
    }
}

/// Identity carried by a validated access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub user_id: UserId,
    /// `None` only for system-level users without a tenant.
    pub tenant_id: Option<TenantId>,
    pub email: Option<String>,
    /// Known roles only; unknown labels are dropped.
    pub roles: Vec<Role>,
    pub exp: u64,
}

/// Errors returned by token validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("unexpected token type")]
    WrongType,
}

/// JWT claims payload shared by token creation (auth service) and validation (gateway).
///
/// | Field | JWT claim | Meaning |
/// |-------|-----------|---------|
/// | `sub` | `sub` | user id (UUID string) |
/// | `tenant_id` | custom | tenant id (UUID string), absent for tenantless system users |
/// | `email` | custom | access tokens only |
/// | `roles` | custom | role labels, access tokens only |
/// | `iat` / `exp` | `iat` / `exp` | seconds since epoch |
/// | `token_type` | `type` | `"refresh"` or `"mfa"`; absent on access tokens |
/// | `jti` | `jti` | random id on refresh and mfa tokens, so each issue is unique |
///
/// [`Serialize`] requires the **`USE_ONLY_IN_AUTH_SERVICE`** feature: the auth service is the
/// sole issuer.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test), derive(Serialize))]
pub struct JwtClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(default)]
    pub iat: u64,
    pub exp: u64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl JwtClaims {
    pub fn kind(&self) -> Result<TokenKind, AuthError> {
        match self.token_type.as_deref() {
            None => Ok(TokenKind::Access),
            Some("refresh") => Ok(TokenKind::Refresh),
            Some("mfa") => Ok(TokenKind::Mfa),
            Some(_) => Err(AuthError::WrongType),
        }
    }

    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub.parse().map_err(|_| AuthError::Malformed)
    }

    /// Empty or absent tenant claims both mean "no tenant".
    pub fn tenant_id(&self) -> Result<Option<TenantId>, AuthError> {
        match self.tenant_id.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => s.parse().map(Some).map_err(|_| AuthError::Malformed),
        }
    }
}

// ── Core decode (private) ────────────────────────────────────────────────

/// Decode and validate a JWT, returning raw claims.
///
/// HS256, `exp` checked with the default 60s leeway, required claims `exp` + `sub`.
fn decode_jwt(token: &str, secret: &str) -> Result<JwtClaims, AuthError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
        _ => AuthError::Malformed,
    })?;

    Ok(data.claims)
}

// ── Public: all consumers ────────────────────────────────────────────────

/// Validate a bearer access token, returning the identity it carries.
///
/// Refresh and MFA tokens are rejected with [`AuthError::WrongType`].
pub fn validate_access_token(token: &str, secret: &str) -> Result<TokenInfo, AuthError> {
    let claims = decode_jwt(token, secret)?;
    if claims.kind()? != TokenKind::Access {
        return Err(AuthError::WrongType);
    }
    Ok(TokenInfo {
        user_id: claims.user_id()?,
        tenant_id: claims.tenant_id()?,
        roles: parse_roles(claims.roles.iter().map(String::as_str)),
        email: claims.email,
        exp: claims.exp,
    })
}

// ── Feature-gated: auth service only ─────────────────────────────────────

/// Validate a token of the given kind and return its raw claims.
///
/// Used by the refresh and MFA challenge flows, which need the `sub`/`tenant_id`
/// of non-access tokens.
#[cfg(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test))]
pub fn validate_token(token: &str, secret: &str, kind: TokenKind) -> Result<JwtClaims, AuthError> {
    let claims = decode_jwt(token, secret)?;
    if claims.kind()? != kind {
        return Err(AuthError::WrongType);
    }
    Ok(claims)
}
