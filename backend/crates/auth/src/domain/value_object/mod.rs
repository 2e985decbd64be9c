//! Value Objects

pub mod email;
pub mod role;
pub mod totp_secret;
