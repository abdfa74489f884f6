//! Gateway-injected identity headers and their extractors.

use axum::extract::FromRequestParts;
use comply_core::error::AppError;
use comply_domain::id::{TenantId, UserId};
use comply_domain::role::{Role, parse_roles};
use comply_domain::scope::TenantScope;
use http::HeaderMap;
use http::request::Parts;

pub const X_USER_ID: &str = "x-user-id";
pub const X_USER_ROLES: &str = "x-user-roles";
pub const X_TENANT_ID: &str = "x-tenant-id";
pub const X_TENANT_SCHEMA: &str = "x-tenant-schema";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Parse a comma-separated `X-User-Roles` value. Unknown labels are dropped.
pub fn parse_roles_header(value: &str) -> Vec<Role> {
    parse_roles(value.split(',').map(str::trim))
}

/// Render roles for `X-User-Roles`.
pub fn roles_header_value(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Caller identity injected by the gateway via `x-user-id`, `x-tenant-id` and `x-user-roles`.
///
/// Rejects with `UNAUTHORIZED` if `x-user-id` is absent or not a UUID, `INVALID_INPUT` if
/// `x-tenant-id` is present but not a UUID. Role enforcement (403) is done by handlers
/// after extraction.
#[derive(Debug, Clone)]
pub struct IdentityHeaders {
    pub user_id: UserId,
    pub tenant_id: Option<TenantId>,
    pub roles: Vec<Role>,
}

impl IdentityHeaders {
    /// Data scope for this caller: its tenant, or the global scope for a tenantless
    /// system-level caller. `None` means the caller has no usable scope.
    pub fn scope(&self) -> Option<TenantScope> {
        match self.tenant_id {
            Some(id) => Some(TenantScope::Tenant(id)),
            None if self.roles.iter().any(|r| r.is_system_level()) => Some(TenantScope::Global),
            None => None,
        }
    }
}

impl<S> FromRequestParts<S> for IdentityHeaders
where
    S: Send + Sync,
{
    type Rejection = AppError;

    // axum-core 0.5 declares this as `fn -> impl Future + Send`. Read the headers
    // synchronously and return a 'static async block.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let user_id = header_str(&parts.headers, X_USER_ID).map(|s| s.parse::<UserId>());
        let tenant_id = header_str(&parts.headers, X_TENANT_ID).map(|s| s.parse::<TenantId>());
        let roles = header_str(&parts.headers, X_USER_ROLES)
            .map(parse_roles_header)
            .unwrap_or_default();

        async move {
            let user_id = user_id
                .and_then(Result::ok)
                .ok_or_else(|| AppError::Unauthorized("missing caller identity".into()))?;
            let tenant_id = tenant_id
                .transpose()
                .map_err(|_| invalid_tenant_id())?;
            Ok(Self {
                user_id,
                tenant_id,
                roles,
            })
        }
    }
}

/// Tenant selected by `x-tenant-id` on public endpoints (login, register, ...).
///
/// Rejects with `TENANT_NOT_FOUND` (400) if the header is absent, `INVALID_INPUT` if it is
/// not a UUID.
#[derive(Debug, Clone, Copy)]
pub struct TenantHeader(pub TenantId);

fn invalid_tenant_id() -> AppError {
    AppError::InvalidInput("invalid tenant ID format".into())
}

impl<S> FromRequestParts<S> for TenantHeader
where
    S: Send + Sync,
{
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let tenant_id = header_str(&parts.headers, X_TENANT_ID).map(|s| s.parse::<TenantId>());

        async move {
            match tenant_id {
                Some(Ok(id)) => Ok(Self(id)),
                Some(Err(_)) => Err(invalid_tenant_id()),
                None => Err(AppError::TenantContextMissing),
            }
        }
    }
}
