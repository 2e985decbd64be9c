//! Auth Crate - Session & Token Authentication
//!
//! Implements the authentication core for the booking platform:
//! - JWT access tokens and refresh-token rotation with reuse detection
//! - Server-side session tracking (list/revoke per device)
//! - CSRF double-submit cookie protection
//! - Role and strong-authentication (TOTP/passkey) enforcement
//! - Email one-time-code verification
//!
//! Layered in Clean Architecture order: `domain` (entities, value
//! objects, repository ports), `application` (use cases), `infra`
//! (Postgres/in-memory adapters), `presentation` (axum handlers,
//! middleware, router).

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::postgres::PgAuthRepository;
pub use presentation::router::auth_router;
