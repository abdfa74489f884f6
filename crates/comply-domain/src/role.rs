//! Role hierarchy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A role held by a user.
///
/// Roles form a total order by [`Role::level`]: a lower level is more privileged.
///
/// | Role | Level |
/// |------|-------|
/// | `system_admin` | 0 |
/// | `global_admin` | 1 |
/// | `tenant_admin` | 2 |
/// | `tenant_manager` | 3 |
/// | `agent` | 4 |
/// | `agent_assistant` | 5 |
/// | `client` | 6 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SystemAdmin,
    GlobalAdmin,
    TenantAdmin,
    TenantManager,
    Agent,
    AgentAssistant,
    Client,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 7] = [
        Role::SystemAdmin,
        Role::GlobalAdmin,
        Role::TenantAdmin,
        Role::TenantManager,
        Role::Agent,
        Role::AgentAssistant,
        Role::Client,
    ];

    pub fn level(self) -> u8 {
        match self {
            Self::SystemAdmin => 0,
            Self::GlobalAdmin => 1,
            Self::TenantAdmin => 2,
            Self::TenantManager => 3,
            Self::Agent => 4,
            Self::AgentAssistant => 5,
            Self::Client => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SystemAdmin => "system_admin",
            Self::GlobalAdmin => "global_admin",
            Self::TenantAdmin => "tenant_admin",
            Self::TenantManager => "tenant_manager",
            Self::Agent => "agent",
            Self::AgentAssistant => "agent_assistant",
            Self::Client => "client",
        }
    }

    /// System-level roles operate across tenants and may have no tenant at all.
    pub fn is_system_level(self) -> bool {
        matches!(self, Self::SystemAdmin | Self::GlobalAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_owned()))
    }
}

/// Parse role labels, silently dropping the ones this build does not know.
pub fn parse_roles<'a>(labels: impl IntoIterator<Item = &'a str>) -> Vec<Role> {
    labels.into_iter().filter_map(|l| l.parse().ok()).collect()
}
