pub mod account;
pub mod mfa;
pub mod token;
