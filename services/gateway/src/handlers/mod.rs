pub mod analytics;
pub mod health;
pub mod proxy;
pub mod ws;
