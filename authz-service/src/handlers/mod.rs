pub mod admin;
pub mod auth;
pub mod role;
pub mod user;
