//! Tenant domain types.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::id::TenantId;

/// Prefix of every per-tenant Postgres schema. Must match what provisioning uses.
pub const TENANT_SCHEMA_PREFIX: &str = "tenant_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    Active,
    Suspended,
    Deleted,
}

impl TenantStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tenant status: {0}")]
pub struct UnknownTenantStatus(pub String);

impl FromStr for TenantStatus {
    type Err = UnknownTenantStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            "deleted" => Ok(Self::Deleted),
            other => Err(UnknownTenantStatus(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub subdomain: String,
    pub status: TenantStatus,
}

impl Tenant {
    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active
    }

    pub fn schema_name(&self) -> String {
        schema_name(self.id)
    }
}

/// Derive the tenant's schema name from its id alone: `tenant_` + the hyphen-less UUID.
pub fn schema_name(id: TenantId) -> String {
    format!("{TENANT_SCHEMA_PREFIX}{}", id.0.simple())
}
