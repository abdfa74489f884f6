//! Auth types shared across Comply360 services.
//!
//! Provides JWT validation, the role authorizer, and the gateway identity-header extractors.

pub mod authorize;
pub mod identity;
pub mod token;
