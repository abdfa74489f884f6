//! Role-hierarchy authorization.
//!
//! Evaluation order is fixed:
//! 1. a caller holding `system_admin` is allowed as [`Grant::SuperUser`], before anything else;
//! 2. a satisfied [`Requirement`] is allowed as [`Grant::RoleSatisfied`];
//! 3. everything else is [`Decision::Denied`].

use std::fmt;

use comply_domain::role::Role;

/// What a route demands of the caller's roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Exact membership: the caller holds at least one of these roles.
    AnyRole(Vec<Role>),
    /// The caller's effective level is at most this value.
    Level(u8),
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnyRole(roles) => {
                let labels: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
                write!(f, "requires one of the roles: {}", labels.join(", "))
            }
            Self::Level(level) => write!(f, "requires role level {level} or higher"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    SuperUser,
    RoleSatisfied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed(Grant),
    Denied,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed(_))
    }
}

/// Most privileged (lowest) level among `roles`, or `None` when no role is held.
pub fn effective_level(roles: &[Role]) -> Option<u8> {
    roles.iter().map(|r| r.level()).min()
}

pub fn evaluate(roles: &[Role], requirement: &Requirement) -> Decision {
    if roles.contains(&Role::SystemAdmin) {
        return Decision::Allowed(Grant::SuperUser);
    }
    let satisfied = match requirement {
        Requirement::AnyRole(required) => roles.iter().any(|r| required.contains(r)),
        Requirement::Level(max) => effective_level(roles).is_some_and(|level| level <= *max),
    };
    if satisfied {
        Decision::Allowed(Grant::RoleSatisfied)
    } else {
        Decision::Denied
    }
}
