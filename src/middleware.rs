pub mod auth;
pub mod logger;
pub mod rate_limit;
