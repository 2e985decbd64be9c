//! Presentation Layer - HTTP Interface

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

use crate::domain::repository::{
    CredentialRepository, EmailVerificationRepository, Mailer, RefreshTokenRepository,
    SessionRepository, UserRepository,
};

/// Everything the HTTP layer needs from one storage backend
pub trait AuthRepo:
    UserRepository
    + SessionRepository
    + RefreshTokenRepository
    + EmailVerificationRepository
    + CredentialRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> AuthRepo for T where
    T: UserRepository
        + SessionRepository
        + RefreshTokenRepository
        + EmailVerificationRepository
        + CredentialRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}

/// Mailer bound usable as shared axum state
pub trait MailPort: Mailer + Clone + Send + Sync + 'static {}

impl<T> MailPort for T where T: Mailer + Clone + Send + Sync + 'static {}
