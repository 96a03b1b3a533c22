pub mod auth;
pub mod validate_user;
