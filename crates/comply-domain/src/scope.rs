//! Tenant isolation scope threaded through every data-access call.

use crate::id::TenantId;

/// Which rows a unit of work may see.
///
/// `Tenant` confines access to one tenant. `Global` is the privileged bypass used only by
/// system-level callers for cross-tenant operations; it never leaves the request that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TenantScope {
    Tenant(TenantId),
    Global,
}

impl TenantScope {
    pub fn tenant_id(&self) -> Option<TenantId> {
        match self {
            Self::Tenant(id) => Some(*id),
            Self::Global => None,
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }
}

impl From<TenantId> for TenantScope {
    fn from(id: TenantId) -> Self {
        Self::Tenant(id)
    }
}
