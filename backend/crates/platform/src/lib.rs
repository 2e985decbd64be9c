//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations with no domain
//! knowledge:
//! - Cryptographic utilities (SHA-256, random bytes, Base64)
//! - Password hashing (Argon2id)
//! - Cookie command registry and Set-Cookie writer
//! - Client identification (User-Agent, OS, hashed IP)

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod password;
