//! Refresh Token Entity
//!
//! Refresh tokens rotate on every use: the presented row is marked
//! used and a successor bound to the same session is inserted. Used
//! rows are kept until expiry so a replayed `jti` can be traced back
//! to its owning session (theft evidence), instead of looking like a
//! token that never existed.

use chrono::{DateTime, Duration, Utc};
use kernel::id::{RefreshTokenId, SessionId, UserId};

/// Random bytes behind each `jti`, base64url-encoded
const JTI_BYTES: usize = 32;

#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub id: RefreshTokenId,
    pub user_id: UserId,
    pub session_id: SessionId,
    pub jti: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    /// Issue a fresh token for a session
    pub fn issue(user_id: UserId, session_id: SessionId, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: RefreshTokenId::new(),
            user_id,
            session_id,
            jti: Self::new_jti(),
            issued_at: now,
            expires_at: now + ttl,
            used_at: None,
        }
    }

    /// Issue the successor during rotation, inheriting session binding
    pub fn successor(&self, ttl: Duration) -> Self {
        Self::issue(self.user_id, self.session_id, ttl)
    }

    pub fn new_jti() -> String {
        platform::crypto::random_token(JTI_BYTES)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Current means never used and not yet expired
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && !self.is_expired(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_is_current() {
        let token = RefreshToken::issue(UserId::new(), SessionId::new(), Duration::days(14));
        assert!(token.is_current(Utc::now()));
        assert!(!token.jti.is_empty());
    }

    #[test]
    fn test_jti_uniqueness() {
        assert_ne!(RefreshToken::new_jti(), RefreshToken::new_jti());
    }

    #[test]
    fn test_successor_keeps_session_binding() {
        let token = RefreshToken::issue(UserId::new(), SessionId::new(), Duration::days(14));
        let next = token.successor(Duration::days(14));
        assert_eq!(next.session_id, token.session_id);
        assert_eq!(next.user_id, token.user_id);
        assert_ne!(next.jti, token.jti);
    }

    #[test]
    fn test_used_token_is_not_current() {
        let mut token = RefreshToken::issue(UserId::new(), SessionId::new(), Duration::days(14));
        token.used_at = Some(Utc::now());
        assert!(!token.is_current(Utc::now()));
    }

    #[test]
    fn test_expired_token_is_not_current() {
        let token = RefreshToken::issue(UserId::new(), SessionId::new(), Duration::seconds(-1));
        assert!(!token.is_current(Utc::now()));
    }
}
