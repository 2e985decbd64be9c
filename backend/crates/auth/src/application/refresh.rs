//! Refresh Use Case
//!
//! Verifies the refresh JWT, rotates its `jti` through the session
//! manager, and re-queues the full cookie trio (the CSRF token rotates
//! together with the refresh token).

use platform::cookie::CookieRegistry;

use crate::application::config::AuthConfig;
use crate::application::session_manager::SessionManager;
use crate::application::tokens::TokenService;
use crate::domain::repository::{RefreshTokenRepository, SessionRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

const CSRF_TOKEN_BYTES: usize = 32;

#[derive(Debug)]
pub struct RefreshOutput {
    pub access_token: String,
}

pub struct RefreshUseCase<U, S, R> {
    users: U,
    sessions: SessionManager<S, R>,
    tokens: TokenService,
    config: AuthConfig,
}

impl<U, S, R> RefreshUseCase<U, S, R>
where
    U: UserRepository,
    S: SessionRepository,
    R: RefreshTokenRepository,
{
    pub fn new(users: U, sessions: SessionManager<S, R>, tokens: TokenService, config: AuthConfig) -> Self {
        Self {
            users,
            sessions,
            tokens,
            config,
        }
    }

    pub async fn execute(
        &self,
        refresh_jwt: &str,
        registry: &mut CookieRegistry,
    ) -> AuthResult<RefreshOutput> {
        let claims = self.tokens.verify_refresh(refresh_jwt)?;
        let user_id = claims.user_id()?;

        let successor = self
            .sessions
            .rotate_refresh_token(&claims.jti, self.config.refresh_ttl_chrono())
            .await?;

        // The row must belong to the JWT subject; a mismatch means the
        // token was minted for a different account.
        if successor.user_id != user_id {
            return Err(AuthError::InvalidToken);
        }

        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AuthError::InvalidToken)?;

        let access_jwt = self.tokens.issue_access(&user, &successor.session_id)?;
        let refresh_jwt = self.tokens.issue_refresh(&user.id, &successor.jti)?;
        let csrf_token = platform::crypto::random_token(CSRF_TOKEN_BYTES);

        super::queue_auth_cookies(registry, &self.config, &access_jwt, &refresh_jwt, &csrf_token);

        Ok(RefreshOutput {
            access_token: access_jwt,
        })
    }
}
