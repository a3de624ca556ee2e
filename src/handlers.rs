pub mod auth;
pub mod branches;
pub mod companies;
pub mod staff;
pub mod users;
