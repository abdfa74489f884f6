//! sea-orm entities owned by the auth service.

pub mod user_roles;
pub mod users;
