pub mod auth;
pub mod youtube;
