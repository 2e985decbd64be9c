//! Domain Entities

pub mod credential;
pub mod email_verification;
pub mod refresh_token;
pub mod session;
pub mod user;
