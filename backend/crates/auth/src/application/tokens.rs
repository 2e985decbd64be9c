//! Token Service
//!
//! HS256 JWT issuance and verification for access and refresh tokens.
//! A verified refresh JWT is necessary but not sufficient: its `jti`
//! must still be confirmed current by the session manager before the
//! rotation proceeds.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use kernel::id::{SessionId, UserId};
use serde::{Deserialize, Serialize};

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::value_object::role::Role;
use crate::error::{AuthError, AuthResult};

/// Claims carried by the access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id
    pub sub: String,
    /// Session the token was minted under
    pub sid: String,
    pub email: String,
    pub roles: Vec<Role>,
    pub iat: i64,
    pub exp: i64,
}

impl AccessClaims {
    pub fn user_id(&self) -> AuthResult<UserId> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }

    pub fn session_id(&self) -> AuthResult<SessionId> {
        self.sid.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Claims carried by the refresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// User id
    pub sub: String,
    /// Server-side token identifier; only current while its row is
    /// unused and unexpired
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl RefreshClaims {
    pub fn user_id(&self) -> AuthResult<UserId> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Issues and verifies both token families
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(&config.jwt_secret),
            decoding: DecodingKey::from_secret(&config.jwt_secret),
            access_ttl_secs: config.access_ttl.as_secs() as i64,
            refresh_ttl_secs: config.refresh_ttl.as_secs() as i64,
        }
    }

    /// Mint an access token for a signed-in user
    pub fn issue_access(&self, user: &User, session_id: &SessionId) -> AuthResult<String> {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: user.id.to_string(),
            sid: session_id.to_string(),
            email: user.email.as_str().to_string(),
            roles: user.roles.clone(),
            iat: now,
            exp: now + self.access_ttl_secs,
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// Mint a refresh token bound to a stored `jti`
    pub fn issue_refresh(&self, user_id: &UserId, jti: &str) -> AuthResult<String> {
        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            jti: jti.to_string(),
            iat: now,
            exp: now + self.refresh_ttl_secs,
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// Verify an access token's signature and expiry
    pub fn verify_access(&self, token: &str) -> AuthResult<AccessClaims> {
        let data = jsonwebtoken::decode::<AccessClaims>(token, &self.decoding, &self.validation())?;
        Ok(data.claims)
    }

    /// Verify a refresh token's signature and expiry
    pub fn verify_refresh(&self, token: &str) -> AuthResult<RefreshClaims> {
        let data =
            jsonwebtoken::decode::<RefreshClaims>(token, &self.decoding, &self.validation())?;
        Ok(data.claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::email::Email;
    use platform::password::ClearTextPassword;

    fn service() -> TokenService {
        TokenService::new(&AuthConfig::with_random_secret())
    }

    fn sample_user() -> User {
        let password = ClearTextPassword::new("correct horse".into()).unwrap();
        User::new(
            Email::new("user@example.com").unwrap(),
            &password,
            vec![Role::Staff, Role::Customer],
        )
        .unwrap()
    }

    #[test]
    fn test_access_token_roundtrip() {
        let service = service();
        let user = sample_user();
        let session_id = SessionId::new();
        let token = service.issue_access(&user, &session_id).unwrap();

        let claims = service.verify_access(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.session_id().unwrap(), session_id);
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims.roles, vec![Role::Staff, Role::Customer]);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_refresh_token_roundtrip() {
        let service = service();
        let user_id = UserId::new();
        let token = service.issue_refresh(&user_id, "some-jti").unwrap();

        let claims = service.verify_refresh(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.jti, "some-jti");
    }

    #[test]
    fn test_wrong_key_rejected() {
        let token = service()
            .issue_access(&sample_user(), &SessionId::new())
            .unwrap();
        let other = service();
        assert!(matches!(
            other.verify_access(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_maps_to_token_expired() {
        let config = AuthConfig::with_random_secret();
        let service = TokenService::new(&config);

        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: UserId::new().to_string(),
            sid: SessionId::new().to_string(),
            email: "user@example.com".into(),
            roles: vec![Role::Customer],
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&config.jwt_secret),
        )
        .unwrap();

        assert!(matches!(
            service.verify_access(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(matches!(
            service().verify_access("not.a.jwt"),
            Err(AuthError::InvalidToken)
        ));
    }
}
