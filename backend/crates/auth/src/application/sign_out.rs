//! Sign-Out Use Case

use kernel::id::{SessionId, UserId};
use platform::cookie::CookieRegistry;

use crate::application::config::AuthConfig;
use crate::application::session_manager::SessionManager;
use crate::domain::repository::{RefreshTokenRepository, SessionRepository};
use crate::error::AuthResult;

pub struct SignOutUseCase<S, R> {
    sessions: SessionManager<S, R>,
    config: AuthConfig,
}

impl<S, R> SignOutUseCase<S, R>
where
    S: SessionRepository,
    R: RefreshTokenRepository,
{
    pub fn new(sessions: SessionManager<S, R>, config: AuthConfig) -> Self {
        Self { sessions, config }
    }

    /// Revoke the caller's session and clear the cookie trio
    pub async fn logout(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        registry: &mut CookieRegistry,
    ) -> AuthResult<()> {
        self.sessions.revoke_session(user_id, session_id).await?;
        super::queue_auth_cookie_clears(registry, &self.config);
        Ok(())
    }

    /// Revoke every session for the user; returns the count
    pub async fn logout_all(
        &self,
        user_id: &UserId,
        registry: &mut CookieRegistry,
    ) -> AuthResult<u64> {
        let revoked = self.sessions.revoke_all_sessions(user_id).await?;
        super::queue_auth_cookie_clears(registry, &self.config);
        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::infra::memory::InMemoryStore;
    use chrono::Duration;
    use platform::cookie::CookieCommand;

    fn use_case(store: &InMemoryStore) -> SignOutUseCase<InMemoryStore, InMemoryStore> {
        SignOutUseCase::new(
            SessionManager::new(store.clone(), store.clone()),
            AuthConfig::with_random_secret(),
        )
    }

    #[tokio::test]
    async fn test_logout_revokes_and_clears_cookies() {
        let store = InMemoryStore::new();
        let use_case = use_case(&store);
        let user_id = UserId::new();
        let manager = SessionManager::new(store.clone(), store.clone());
        let (session, _) = manager
            .create_session(user_id, None, Duration::days(14))
            .await
            .unwrap();

        let mut registry = CookieRegistry::new();
        use_case
            .logout(&user_id, &session.id, &mut registry)
            .await
            .unwrap();

        assert_eq!(registry.commands().len(), 3);
        assert!(
            registry
                .commands()
                .iter()
                .all(|c| matches!(c, CookieCommand::Clear { .. }))
        );
        // The refresh token is orphaned with its session
        assert_eq!(store.refresh_token_count(), 0);
    }

    #[tokio::test]
    async fn test_logout_twice_is_session_not_found() {
        let store = InMemoryStore::new();
        let use_case = use_case(&store);
        let user_id = UserId::new();
        let manager = SessionManager::new(store.clone(), store.clone());
        let (session, _) = manager
            .create_session(user_id, None, Duration::days(14))
            .await
            .unwrap();

        let mut registry = CookieRegistry::new();
        use_case
            .logout(&user_id, &session.id, &mut registry)
            .await
            .unwrap();
        let err = use_case
            .logout(&user_id, &session.id, &mut registry)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::SessionNotFound));
    }

    #[tokio::test]
    async fn test_logout_all_counts_sessions() {
        let store = InMemoryStore::new();
        let use_case = use_case(&store);
        let user_id = UserId::new();
        let manager = SessionManager::new(store.clone(), store.clone());
        for _ in 0..2 {
            manager
                .create_session(user_id, None, Duration::days(14))
                .await
                .unwrap();
        }

        let mut registry = CookieRegistry::new();
        let revoked = use_case.logout_all(&user_id, &mut registry).await.unwrap();
        assert_eq!(revoked, 2);
    }
}
