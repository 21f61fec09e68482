pub mod auth_helpers;
pub mod codes;
