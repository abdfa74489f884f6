pub mod config;
pub mod domain;
pub mod handlers;
pub mod hub;
pub mod infra;
pub mod router;
pub mod state;
pub mod usecase;
