//! Mock identity helpers for integration tests.
//!
//! Services behind the gateway receive `x-user-id`, `x-tenant-id` and `x-user-roles`
//! headers injected by the gateway. `MockIdentity` builds those headers directly so no
//! gateway or JWT is needed.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use comply_auth_types::identity::{X_TENANT_ID, X_USER_ID, X_USER_ROLES, roles_header_value};
use comply_domain::id::{TenantId, UserId};
use comply_domain::role::Role;
use uuid::Uuid;

/// Identity injected into test requests.
pub struct MockIdentity {
    pub user_id: UserId,
    pub tenant_id: Option<TenantId>,
    pub roles: Vec<Role>,
}

impl MockIdentity {
    pub fn new(user_id: UserId, tenant_id: Option<TenantId>, roles: Vec<Role>) -> Self {
        Self {
            user_id,
            tenant_id,
            roles,
        }
    }

    /// A fresh user in `tenant_id` holding `roles`.
    pub fn in_tenant(tenant_id: TenantId, roles: Vec<Role>) -> Self {
        Self::new(UserId(Uuid::new_v4()), Some(tenant_id), roles)
    }

    /// A tenantless `system_admin`.
    pub fn system_admin() -> Self {
        Self::new(UserId(Uuid::new_v4()), None, vec![Role::SystemAdmin])
    }

    /// Return headers as if the gateway injected them.
    pub fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(
            HeaderName::from_static(X_USER_ID),
            HeaderValue::from_str(&self.user_id.to_string()).unwrap(),
        );
        if let Some(tenant_id) = self.tenant_id {
            map.insert(
                HeaderName::from_static(X_TENANT_ID),
                HeaderValue::from_str(&tenant_id.to_string()).unwrap(),
            );
        }
        map.insert(
            HeaderName::from_static(X_USER_ROLES),
            HeaderValue::from_str(&roles_header_value(&self.roles)).unwrap(),
        );
        map
    }
}
