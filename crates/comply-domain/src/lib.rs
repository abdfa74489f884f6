//! Domain types shared across all Comply360 services.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers; never in `infra/` or `handlers/`.

pub mod id;
pub mod role;
pub mod scope;
pub mod tenant;
pub mod user;
