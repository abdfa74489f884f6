use comply_auth_types::token::TokenInfo;
use comply_core::error::AppError;
use comply_domain::id::TenantId;
use comply_domain::scope::TenantScope;
use comply_domain::tenant::Tenant;

use crate::domain::repository::TenantLookup;

/// Labels that name the platform itself rather than a tenant.
const RESERVED_SUBDOMAINS: [&str; 2] = ["www", "api"];

/// Tenant subdomain carried by a `Host` value, if any.
///
/// `acme.comply360.co.za:443` → `acme`, `acme.localhost` → `acme`. Reserved labels, bare
/// domains and IPv4 literals yield `None`.
pub fn extract_subdomain(host: &str) -> Option<String> {
    let host = host.split(':').next().unwrap_or(host);
    let labels: Vec<&str> = host.split('.').collect();
    let label = match labels.as_slice() {
        [first, _, _, ..] if !labels.iter().all(|l| l.bytes().all(|b| b.is_ascii_digit())) => {
            *first
        }
        [first, tld] if tld.eq_ignore_ascii_case("localhost") => *first,
        _ => return None,
    };
    let label = label.to_ascii_lowercase();
    if label.is_empty() || RESERVED_SUBDOMAINS.contains(&label.as_str()) {
        None
    } else {
        Some(label)
    }
}

/// How the tenant was identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantSource {
    Subdomain,
    Header,
    TokenClaim,
    /// System-level caller with no tenant.
    Global,
}

/// Result of tenant resolution: the isolation scope plus the tenant row when one applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub scope: TenantScope,
    pub tenant: Option<Tenant>,
    pub source: TenantSource,
}

/// Tenant-identifying parts of an inbound request.
#[derive(Debug, Clone, Default)]
pub struct TenantHints {
    pub host: Option<String>,
    pub tenant_header: Option<String>,
}

pub struct TenantResolver<L: TenantLookup> {
    pub lookup: L,
}

impl<L: TenantLookup> TenantResolver<L> {
    /// Resolve in order subdomain, `X-Tenant-ID`, token claim. The first source that yields
    /// an identifier wins; a miss on that source is final.
    pub async fn resolve(
        &self,
        hints: &TenantHints,
        identity: Option<&TokenInfo>,
    ) -> Result<Resolution, AppError> {
        match self.resolve_named(hints).await? {
            Some(resolution) => Ok(resolution),
            None => self.resolve_caller(identity).await,
        }
    }

    /// Tenant the request names itself, by subdomain then `X-Tenant-ID`. Needs no
    /// credentials; `Ok(None)` when the request names no tenant.
    pub async fn resolve_named(&self, hints: &TenantHints) -> Result<Option<Resolution>, AppError> {
        if let Some(subdomain) = hints.host.as_deref().and_then(extract_subdomain) {
            let tenant = self
                .lookup
                .by_subdomain(&subdomain)
                .await?
                .ok_or(AppError::TenantNotFound)?;
            return admit(tenant, TenantSource::Subdomain).map(Some);
        }

        if let Some(raw) = hints
            .tenant_header
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let id: TenantId = raw
                .parse()
                .map_err(|_| AppError::InvalidInput("invalid tenant ID format".into()))?;
            return self.by_id(id, TenantSource::Header).await.map(Some);
        }

        Ok(None)
    }

    /// Fallback from a validated caller: the token's tenant claim, else the global scope
    /// for system-level roles.
    pub async fn resolve_caller(&self, identity: Option<&TokenInfo>) -> Result<Resolution, AppError> {
        if let Some(id) = identity.and_then(|i| i.tenant_id) {
            return self.by_id(id, TenantSource::TokenClaim).await;
        }

        if identity.is_some_and(|i| i.roles.iter().any(|r| r.is_system_level())) {
            return Ok(Resolution {
                scope: TenantScope::Global,
                tenant: None,
                source: TenantSource::Global,
            });
        }

        Err(AppError::TenantContextMissing)
    }

    async fn by_id(&self, id: TenantId, source: TenantSource) -> Result<Resolution, AppError> {
        let tenant = self
            .lookup
            .by_id(id)
            .await?
            .ok_or(AppError::TenantNotFound)?;
        admit(tenant, source)
    }
}

fn admit(tenant: Tenant, source: TenantSource) -> Result<Resolution, AppError> {
    if !tenant.is_active() {
        tracing::info!(tenant_id = %tenant.id, status = tenant.status.as_str(), "inactive tenant rejected");
        return Err(AppError::TenantSuspended);
    }
    Ok(Resolution {
        scope: TenantScope::Tenant(tenant.id),
        tenant: Some(tenant),
        source,
    })
}
