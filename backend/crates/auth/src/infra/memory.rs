//! In-Memory Repository
//!
//! Mutex-backed implementation of every repository port. Used by the
//! test suite and usable as a throwaway dev backend. Rotation holds
//! the store lock for the whole consume-and-insert step, which gives
//! the same single-winner guarantee the Postgres adapter gets from its
//! conditional UPDATE.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use kernel::id::{SessionId, UserId};

use crate::domain::entity::{
    credential::TotpCredential, email_verification::EmailVerification,
    refresh_token::RefreshToken, session::Session, user::User,
};
use crate::domain::repository::{
    CredentialRepository, EmailVerificationRepository, RefreshTokenRepository, RotationOutcome,
    SessionRepository, UserRepository,
};
use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    sessions: HashMap<SessionId, Session>,
    refresh_tokens: HashMap<String, RefreshToken>,
    verifications: Vec<EmailVerification>,
    totp_credentials: HashMap<UserId, TotpCredential>,
    passkey_holders: Vec<UserId>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert a user directly, bypassing the use-case layer
    pub fn seed_user(&self, user: User) {
        self.lock().users.insert(user.id, user);
    }

    /// Register a passkey holder directly
    pub fn seed_passkey(&self, user_id: UserId) {
        self.lock().passkey_holders.push(user_id);
    }

    pub fn user_by_email(&self, email: &Email) -> Option<User> {
        self.lock()
            .users
            .values()
            .find(|u| u.email == *email)
            .cloned()
    }

    pub fn totp_for_user(&self, user_id: &UserId) -> Option<TotpCredential> {
        self.lock().totp_credentials.get(user_id).cloned()
    }

    pub fn session_count(&self) -> usize {
        self.lock().sessions.values().filter(|s| s.is_active()).count()
    }

    pub fn refresh_token_count(&self) -> usize {
        self.lock().refresh_tokens.len()
    }
}

impl UserRepository for InMemoryStore {
    async fn create(&self, user: &User) -> AuthResult<()> {
        self.lock().users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.lock().users.get(user_id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        Ok(self.user_by_email(email))
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        self.lock().users.insert(user.id, user.clone());
        Ok(())
    }
}

impl SessionRepository for InMemoryStore {
    async fn create(&self, session: &Session) -> AuthResult<()> {
        self.lock().sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn find_by_id(&self, session_id: &SessionId) -> AuthResult<Option<Session>> {
        Ok(self.lock().sessions.get(session_id).cloned())
    }

    async fn find_active_by_user_id(&self, user_id: &UserId) -> AuthResult<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .lock()
            .sessions
            .values()
            .filter(|s| s.user_id == *user_id && s.is_active())
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.last_seen_at.cmp(&a.last_seen_at));
        Ok(sessions)
    }

    async fn touch(&self, session_id: &SessionId, at: DateTime<Utc>) -> AuthResult<()> {
        if let Some(session) = self.lock().sessions.get_mut(session_id) {
            session.touch(at);
        }
        Ok(())
    }

    async fn revoke(&self, session_id: &SessionId, at: DateTime<Utc>) -> AuthResult<bool> {
        let mut state = self.lock();
        match state.sessions.get_mut(session_id) {
            Some(session) if session.is_active() => {
                session.revoke(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_for_user(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<u64> {
        let mut state = self.lock();
        let mut revoked = 0;
        for session in state.sessions.values_mut() {
            if session.user_id == *user_id && session.is_active() {
                session.revoke(at);
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn cleanup_revoked(&self, before: DateTime<Utc>) -> AuthResult<u64> {
        let mut state = self.lock();
        let before_len = state.sessions.len();
        state
            .sessions
            .retain(|_, s| !matches!(s.revoked_at, Some(at) if at < before));
        Ok((before_len - state.sessions.len()) as u64)
    }
}

impl RefreshTokenRepository for InMemoryStore {
    async fn create(&self, token: &RefreshToken) -> AuthResult<()> {
        self.lock()
            .refresh_tokens
            .insert(token.jti.clone(), token.clone());
        Ok(())
    }

    async fn rotate(&self, old_jti: &str, ttl: Duration) -> AuthResult<RotationOutcome> {
        let mut state = self.lock();
        let now = Utc::now();

        let Some(token) = state.refresh_tokens.get_mut(old_jti) else {
            return Ok(RotationOutcome::Unknown);
        };
        if !token.is_current(now) {
            return Ok(RotationOutcome::Reused {
                session_id: token.session_id,
            });
        }

        token.used_at = Some(now);
        let successor = token.successor(ttl);
        let outcome = RotationOutcome::Rotated {
            session_id: successor.session_id,
            user_id: successor.user_id,
            successor: successor.clone(),
        };
        state.refresh_tokens.insert(successor.jti.clone(), successor);
        Ok(outcome)
    }

    async fn delete_for_session(&self, session_id: &SessionId) -> AuthResult<u64> {
        let mut state = self.lock();
        let before_len = state.refresh_tokens.len();
        state.refresh_tokens.retain(|_, t| t.session_id != *session_id);
        Ok((before_len - state.refresh_tokens.len()) as u64)
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let mut state = self.lock();
        let before_len = state.refresh_tokens.len();
        state.refresh_tokens.retain(|_, t| !t.is_expired(now));
        Ok((before_len - state.refresh_tokens.len()) as u64)
    }
}

impl EmailVerificationRepository for InMemoryStore {
    async fn create(&self, verification: &EmailVerification) -> AuthResult<()> {
        self.lock().verifications.push(verification.clone());
        Ok(())
    }

    async fn find_latest_by_email(&self, email: &Email) -> AuthResult<Option<EmailVerification>> {
        Ok(self
            .lock()
            .verifications
            .iter()
            .filter(|v| v.email == *email)
            .max_by_key(|v| v.created_at)
            .cloned())
    }

    async fn update(&self, verification: &EmailVerification) -> AuthResult<()> {
        let mut state = self.lock();
        if let Some(slot) = state.verifications.iter_mut().find(|v| v.id == verification.id) {
            *slot = verification.clone();
        }
        Ok(())
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let mut state = self.lock();
        let before_len = state.verifications.len();
        state.verifications.retain(|v| !v.is_expired(now));
        Ok((before_len - state.verifications.len()) as u64)
    }
}

impl CredentialRepository for InMemoryStore {
    async fn find_totp_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<TotpCredential>> {
        Ok(self.totp_for_user(user_id))
    }

    async fn save_totp(&self, credential: &TotpCredential) -> AuthResult<()> {
        self.lock()
            .totp_credentials
            .insert(credential.user_id, credential.clone());
        Ok(())
    }

    async fn has_passkey(&self, user_id: &UserId) -> AuthResult<bool> {
        Ok(self.lock().passkey_holders.contains(user_id))
    }
}
