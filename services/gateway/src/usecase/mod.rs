pub mod forward;
pub mod gate;
pub mod rate_limit;
pub mod tenant;
