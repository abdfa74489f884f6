use axum::http::{HeaderMap, header};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};

use comply_auth_types::authorize::{Decision, Requirement, evaluate};
use comply_auth_types::identity::X_TENANT_ID;
use comply_auth_types::token::{AuthError, TokenInfo, validate_access_token};
use comply_core::error::AppError;
use comply_core::middleware::record_tenant;
use comply_domain::scope::TenantScope;

use crate::domain::repository::{CounterStore, TenantLookup};
use crate::domain::route::{Access, RoutePolicy};
use crate::usecase::rate_limit::{RateLimitStatus, RateLimiter};
use crate::usecase::tenant::{Resolution, TenantHints, TenantResolver};

/// The parts of an inbound request the pipeline looks at.
#[derive(Debug, Clone, Default)]
pub struct GateRequest {
    pub hints: TenantHints,
    pub bearer: Option<String>,
}

impl GateRequest {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let text = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        Self {
            hints: TenantHints {
                host: text(header::HOST.as_str()),
                tenant_header: text(X_TENANT_ID),
            },
            bearer: headers
                .typed_get::<Authorization<Bearer>>()
                .map(|auth| auth.token().to_owned()),
        }
    }
}

/// A request that passed every check.
#[derive(Debug, Clone)]
pub struct Admission {
    pub resolution: Resolution,
    /// Present on authenticated routes.
    pub identity: Option<TokenInfo>,
    /// Absent for the global scope or when the limiter failed open.
    pub rate: Option<RateLimitStatus>,
}

impl Admission {
    pub fn scope(&self) -> TenantScope {
        self.resolution.scope
    }
}

/// Validate a bearer access token.
pub fn authenticate(bearer: Option<&str>, secret: &str) -> Result<TokenInfo, AppError> {
    let token = bearer.ok_or_else(|| {
        AppError::Unauthorized("missing or malformed authorization header".into())
    })?;
    validate_access_token(token, secret).map_err(|e| match e {
        AuthError::Expired => AppError::TokenExpired,
        AuthError::InvalidSignature | AuthError::Malformed | AuthError::WrongType => {
            AppError::InvalidToken
        }
    })
}

/// Every requirement must allow the caller.
pub fn authorize(identity: &TokenInfo, requirements: &[Requirement]) -> Result<(), AppError> {
    for requirement in requirements {
        match evaluate(&identity.roles, requirement) {
            Decision::Allowed(grant) => {
                tracing::debug!(user_id = %identity.user_id, grant = ?grant, "requirement met");
            }
            Decision::Denied => {
                return Err(AppError::InsufficientPermissions(requirement.to_string()));
            }
        }
    }
    Ok(())
}

/// A tenant-bound token may only act inside its own tenant. System-level callers may
/// cross tenants.
fn check_tenant_binding(identity: &TokenInfo, resolution: &Resolution) -> Result<(), AppError> {
    let (Some(claimed), Some(resolved)) = (identity.tenant_id, resolution.scope.tenant_id()) else {
        return Ok(());
    };
    if claimed == resolved || identity.roles.iter().any(|r| r.is_system_level()) {
        return Ok(());
    }
    tracing::warn!(
        user_id = %identity.user_id,
        token_tenant = %claimed,
        request_tenant = %resolved,
        "cross-tenant request rejected"
    );
    Err(AppError::Forbidden)
}

/// Request pipeline run before any proxying or local handling: resolve the tenant the
/// request names, authenticate, fall back to the token's tenant, authorize, rate-limit.
pub struct Gate<L: TenantLookup, C: CounterStore> {
    pub resolver: TenantResolver<L>,
    pub limiter: RateLimiter<C>,
    pub jwt_secret: String,
}

impl<L: TenantLookup, C: CounterStore> Gate<L, C> {
    pub async fn admit(
        &self,
        request: &GateRequest,
        policy: &RoutePolicy,
    ) -> Result<Admission, AppError> {
        // A named tenant that is unknown or inactive fails before credentials are looked at.
        let named = self.resolver.resolve_named(&request.hints).await?;

        let identity = match policy.access {
            Access::Public => None,
            Access::Authenticated => {
                Some(authenticate(request.bearer.as_deref(), &self.jwt_secret)?)
            }
        };

        let resolution = match named {
            Some(resolution) => resolution,
            None => self.resolver.resolve_caller(identity.as_ref()).await?,
        };
        if let Some(tenant_id) = resolution.scope.tenant_id() {
            record_tenant(&tenant_id);
        }

        match &identity {
            Some(identity) => {
                check_tenant_binding(identity, &resolution)?;
                authorize(identity, &policy.requirements)?;
            }
            None if !policy.requirements.is_empty() => {
                return Err(AppError::Unauthorized("authentication required".into()));
            }
            None => {}
        }

        let rate = match resolution.scope {
            TenantScope::Tenant(tenant_id) => self.limiter.check(tenant_id).await?,
            TenantScope::Global => None,
        };

        Ok(Admission {
            resolution,
            identity,
            rate,
        })
    }
}
