//! Sign-In Use Case

use kernel::id::SessionId;
use platform::client::DeviceInfo;
use platform::cookie::CookieRegistry;
use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::application::session_manager::SessionManager;
use crate::application::tokens::TokenService;
use crate::domain::repository::{RefreshTokenRepository, SessionRepository, UserRepository};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Bytes of entropy behind the CSRF double-submit token
const CSRF_TOKEN_BYTES: usize = 32;

#[derive(Debug)]
pub struct SignInOutput {
    pub access_token: String,
    pub session_id: SessionId,
}

pub struct SignInUseCase<U, S, R> {
    users: U,
    sessions: SessionManager<S, R>,
    tokens: TokenService,
    config: AuthConfig,
}

impl<U, S, R> SignInUseCase<U, S, R>
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

    /// Authenticate and open a session
    ///
    /// Unknown email, wrong password, and deactivated account all
    /// surface as `InvalidCredentials` so responses cannot be used to
    /// enumerate accounts. The internal log tells them apart.
    pub async fn execute(
        &self,
        email: &str,
        password: &str,
        device: Option<DeviceInfo>,
        registry: &mut CookieRegistry,
    ) -> AuthResult<SignInOutput> {
        let email = Email::new(email).map_err(|_| AuthError::InvalidCredentials)?;
        let password =
            ClearTextPassword::new(password.to_string()).map_err(|_| AuthError::InvalidCredentials)?;

        let Some(mut user) = self.users.find_by_email(&email).await? else {
            tracing::debug!("Sign-in attempt for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !user.is_active {
            tracing::warn!(user_id = %user.id, "Sign-in attempt on deactivated account");
            return Err(AuthError::InvalidCredentials);
        }

        let verified = user
            .verify_password(&password)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        if !verified {
            return Err(AuthError::InvalidCredentials);
        }

        user.record_login(chrono::Utc::now());
        self.users.update(&user).await?;

        let (session, refresh_row) = self
            .sessions
            .create_session(user.id, device, self.config.refresh_ttl_chrono())
            .await?;

        let access_jwt = self.tokens.issue_access(&user, &session.id)?;
        let refresh_jwt = self.tokens.issue_refresh(&user.id, &refresh_row.jti)?;
        let csrf_token = platform::crypto::random_token(CSRF_TOKEN_BYTES);

        super::queue_auth_cookies(registry, &self.config, &access_jwt, &refresh_jwt, &csrf_token);

        Ok(SignInOutput {
            access_token: access_jwt,
            session_id: session.id,
        })
    }
}
