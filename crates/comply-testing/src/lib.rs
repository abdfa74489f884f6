//! Test utilities for Comply360 services.
//!
//! Provides gateway identity headers, signed token fixtures and tenant fixtures.
//! Import in tests only, never in production code.

pub mod auth;
pub mod fixture;
pub mod token;
