pub mod auth;
pub mod company_service;
pub mod credentials;
pub mod tenancy_service;
pub mod token;
