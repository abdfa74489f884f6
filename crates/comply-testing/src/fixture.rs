//! Domain fixtures.

use comply_domain::id::TenantId;
use comply_domain::tenant::{Tenant, TenantStatus};
use uuid::Uuid;

/// A tenant with a random id and the given subdomain and status.
pub fn tenant(subdomain: &str, status: TenantStatus) -> Tenant {
    Tenant {
        id: TenantId(Uuid::new_v4()),
        name: format!("{subdomain} Ltd"),
        subdomain: subdomain.to_owned(),
        status,
    }
}

pub fn active_tenant(subdomain: &str) -> Tenant {
    tenant(subdomain, TenantStatus::Active)
}
