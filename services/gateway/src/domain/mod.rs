pub mod proxy;
pub mod repository;
pub mod route;
