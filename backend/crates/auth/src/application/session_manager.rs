//! Session Manager
//!
//! Session lifecycle and refresh-token rotation. Rotation is the one
//! concurrency-sensitive operation: the repository consumes the old
//! `jti` conditionally, so of two racing refreshes exactly one wins
//! and the loser is handled as reuse.

use chrono::Utc;
use kernel::id::{SessionId, UserId};
use platform::client::DeviceInfo;

use crate::domain::entity::{refresh_token::RefreshToken, session::Session};
use crate::domain::repository::{RefreshTokenRepository, RotationOutcome, SessionRepository};
use crate::error::{AuthError, AuthResult};

pub struct SessionManager<S, R> {
    sessions: S,
    tokens: R,
}

impl<S, R> SessionManager<S, R>
where
    S: SessionRepository,
    R: RefreshTokenRepository,
{
    pub fn new(sessions: S, tokens: R) -> Self {
        Self { sessions, tokens }
    }

    /// Open a session and issue its first refresh token
    pub async fn create_session(
        &self,
        user_id: UserId,
        device: Option<DeviceInfo>,
        refresh_ttl: chrono::Duration,
    ) -> AuthResult<(Session, RefreshToken)> {
        let session = Session::open(user_id, device);
        self.sessions.create(&session).await?;

        let token = RefreshToken::issue(user_id, session.id, refresh_ttl);
        self.tokens.create(&token).await?;

        tracing::info!(session_id = %session.id, user_id = %user_id, "Session created");
        Ok((session, token))
    }

    /// Active sessions for a user
    pub async fn list_sessions(&self, user_id: &UserId) -> AuthResult<Vec<Session>> {
        self.sessions.find_active_by_user_id(user_id).await
    }

    /// Record activity on a session
    pub async fn touch_session(&self, session_id: &SessionId) -> AuthResult<()> {
        self.sessions.touch(session_id, Utc::now()).await
    }

    /// Consume `old_jti` and return the successor token
    ///
    /// A jti that was already consumed is replay evidence: the owning
    /// session is revoked server-side before the error is returned, so
    /// whichever party holds the stolen token chain loses it.
    pub async fn rotate_refresh_token(&self, old_jti: &str, refresh_ttl: chrono::Duration) -> AuthResult<RefreshToken> {
        match self.tokens.rotate(old_jti, refresh_ttl).await? {
            RotationOutcome::Rotated {
                session_id,
                successor,
                ..
            } => {
                self.sessions.touch(&session_id, Utc::now()).await?;
                Ok(successor)
            }
            RotationOutcome::Reused { session_id } => {
                tracing::warn!(session_id = %session_id, "Refresh token replay, revoking session");
                self.sessions.revoke(&session_id, Utc::now()).await?;
                self.tokens.delete_for_session(&session_id).await?;
                Err(AuthError::TokenReuseDetected)
            }
            RotationOutcome::Unknown => Err(AuthError::InvalidToken),
        }
    }

    /// Revoke one session owned by `user_id`
    pub async fn revoke_session(&self, user_id: &UserId, session_id: &SessionId) -> AuthResult<()> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .filter(|s| s.user_id == *user_id && s.is_active())
            .ok_or(AuthError::SessionNotFound)?;

        self.sessions.revoke(&session.id, Utc::now()).await?;
        self.tokens.delete_for_session(&session.id).await?;
        tracing::info!(session_id = %session.id, "Session revoked");
        Ok(())
    }

    /// Revoke every active session for a user; returns the count
    pub async fn revoke_all_sessions(&self, user_id: &UserId) -> AuthResult<u64> {
        let sessions = self.sessions.find_active_by_user_id(user_id).await?;
        let revoked = self.sessions.revoke_all_for_user(user_id, Utc::now()).await?;
        for session in &sessions {
            self.tokens.delete_for_session(&session.id).await?;
        }
        Ok(revoked)
    }
}
