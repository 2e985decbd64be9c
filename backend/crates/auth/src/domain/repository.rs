//! Repository Traits
//!
//! Interfaces for data persistence and outbound ports. Implementations
//! live in the infrastructure layer.

use chrono::{DateTime, Duration, Utc};
use kernel::id::{SessionId, UserId};

use crate::domain::entity::{
    credential::TotpCredential, email_verification::EmailVerification,
    refresh_token::RefreshToken, session::Session, user::User,
};
use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Create a new user
    async fn create(&self, user: &User) -> AuthResult<()>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    /// Find user by normalized email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// Update user
    async fn update(&self, user: &User) -> AuthResult<()>;
}

/// Session repository trait
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    /// Create a new session
    async fn create(&self, session: &Session) -> AuthResult<()>;

    /// Find a session by ID (active or revoked)
    async fn find_by_id(&self, session_id: &SessionId) -> AuthResult<Option<Session>>;

    /// List active sessions for a user, most recent activity first
    async fn find_active_by_user_id(&self, user_id: &UserId) -> AuthResult<Vec<Session>>;

    /// Record activity on a session
    async fn touch(&self, session_id: &SessionId, at: DateTime<Utc>) -> AuthResult<()>;

    /// Revoke a session; returns false if it did not exist or was
    /// already revoked
    async fn revoke(&self, session_id: &SessionId, at: DateTime<Utc>) -> AuthResult<bool>;

    /// Revoke every active session for a user; returns the count
    async fn revoke_all_for_user(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<u64>;

    /// Delete sessions revoked before the cutoff
    async fn cleanup_revoked(&self, before: DateTime<Utc>) -> AuthResult<u64>;
}

/// Outcome of a refresh-token rotation attempt
#[derive(Debug, Clone)]
pub enum RotationOutcome {
    /// The presented jti was current; it is now consumed and a
    /// successor exists
    Rotated {
        session_id: SessionId,
        user_id: UserId,
        successor: RefreshToken,
    },
    /// The jti exists but was already consumed or expired — replay
    /// evidence pointing at its owning session
    Reused { session_id: SessionId },
    /// No such jti was ever issued (or it aged out of storage)
    Unknown,
}

/// Refresh token repository trait
#[trait_variant::make(RefreshTokenRepository: Send)]
pub trait LocalRefreshTokenRepository {
    /// Store a freshly issued token
    async fn create(&self, token: &RefreshToken) -> AuthResult<()>;

    /// Atomically consume `old_jti` and insert its successor
    ///
    /// The consume step must be conditional on the row still being
    /// current, so that of two racing calls exactly one rotates and
    /// the other observes [`RotationOutcome::Reused`].
    async fn rotate(&self, old_jti: &str, ttl: Duration) -> AuthResult<RotationOutcome>;

    /// Delete all tokens belonging to a session
    async fn delete_for_session(&self, session_id: &SessionId) -> AuthResult<u64>;

    /// Delete tokens past their expiry
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64>;
}

/// Email verification repository trait
#[trait_variant::make(EmailVerificationRepository: Send)]
pub trait LocalEmailVerificationRepository {
    /// Store a new verification
    async fn create(&self, verification: &EmailVerification) -> AuthResult<()>;

    /// Latest verification for an email, used or not
    async fn find_latest_by_email(&self, email: &Email) -> AuthResult<Option<EmailVerification>>;

    /// Persist attempt counter / used_at changes
    async fn update(&self, verification: &EmailVerification) -> AuthResult<()>;

    /// Delete verifications past their expiry
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64>;
}

/// Second-factor credential repository trait
#[trait_variant::make(CredentialRepository: Send)]
pub trait LocalCredentialRepository {
    /// Find a user's TOTP enrollment
    async fn find_totp_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<TotpCredential>>;

    /// Insert or update a TOTP enrollment
    async fn save_totp(&self, credential: &TotpCredential) -> AuthResult<()>;

    /// Whether the user has at least one registered passkey
    async fn has_passkey(&self, user_id: &UserId) -> AuthResult<bool>;
}

/// Outbound mail port
#[trait_variant::make(Mailer: Send)]
pub trait LocalMailer {
    /// Deliver one message; retry policy belongs to the adapter
    async fn send_mail(&self, to: &str, subject: &str, body: &str) -> AuthResult<()>;
}
