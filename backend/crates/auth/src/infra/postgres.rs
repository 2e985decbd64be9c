//! PostgreSQL Repository Implementations

use chrono::{DateTime, Duration, Utc};
use kernel::id::{EmailVerificationId, RefreshTokenId, SessionId, UserId};
use platform::password::HashedPassword;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    credential::TotpCredential, email_verification::EmailVerification,
    refresh_token::RefreshToken, session::Session, user::User,
};
use crate::domain::repository::{
    CredentialRepository, EmailVerificationRepository, RefreshTokenRepository, RotationOutcome,
    SessionRepository, UserRepository,
};
use crate::domain::value_object::{email::Email, role::Role, totp_secret::TotpSecret};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Startup housekeeping: drop expired tokens/verifications and
    /// long-revoked sessions
    pub async fn cleanup(&self) -> AuthResult<()> {
        let now = Utc::now();
        let tokens = self.cleanup_expired_tokens(now).await?;
        let verifications =
            EmailVerificationRepository::cleanup_expired(self, now).await?;
        let sessions = self.cleanup_revoked(now - Duration::days(30)).await?;
        tracing::info!(
            tokens_deleted = tokens,
            verifications_deleted = verifications,
            sessions_deleted = sessions,
            "Auth storage cleanup"
        );
        Ok(())
    }

    async fn cleanup_expired_tokens(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        RefreshTokenRepository::cleanup_expired(self, now).await
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let roles: Vec<i16> = user.roles.iter().map(|r| r.code()).collect();
        sqlx::query(
            r#"
            INSERT INTO users (
                id,
                email,
                password_hash,
                name,
                phone,
                roles,
                is_active,
                is_verified,
                email_verified_at,
                last_login_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(user.email.as_str())
        .bind(user.password_hash.as_str())
        .bind(&user.name)
        .bind(&user.phone)
        .bind(&roles)
        .bind(user.is_active)
        .bind(user.is_verified)
        .bind(user.email_verified_at)
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, name, phone, roles,
                   is_active, is_verified, email_verified_at,
                   last_login_at, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, name, phone, roles,
                   is_active, is_verified, email_verified_at,
                   last_login_at, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        let roles: Vec<i16> = user.roles.iter().map(|r| r.code()).collect();
        sqlx::query(
            r#"
            UPDATE users SET
                email = $2,
                password_hash = $3,
                name = $4,
                phone = $5,
                roles = $6,
                is_active = $7,
                is_verified = $8,
                email_verified_at = $9,
                last_login_at = $10,
                updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(user.email.as_str())
        .bind(user.password_hash.as_str())
        .bind(&user.name)
        .bind(&user.phone)
        .bind(&roles)
        .bind(user.is_active)
        .bind(user.is_verified)
        .bind(user.email_verified_at)
        .bind(user.last_login_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Session Repository Implementation
// ============================================================================

impl SessionRepository for PgAuthRepository {
    async fn create(&self, session: &Session) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (
                id, user_id, device_ua, device_os, ip_hash,
                created_at, last_seen_at, revoked_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(session.id.as_uuid())
        .bind(session.user_id.as_uuid())
        .bind(&session.device_ua)
        .bind(&session.device_os)
        .bind(&session.ip_hash)
        .bind(session.created_at)
        .bind(session.last_seen_at)
        .bind(session.revoked_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, session_id: &SessionId) -> AuthResult<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, device_ua, device_os, ip_hash,
                   created_at, last_seen_at, revoked_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(session_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionRow::into_session))
    }

    async fn find_active_by_user_id(&self, user_id: &UserId) -> AuthResult<Vec<Session>> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, device_ua, device_os, ip_hash,
                   created_at, last_seen_at, revoked_at
            FROM sessions
            WHERE user_id = $1 AND revoked_at IS NULL
            ORDER BY last_seen_at DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SessionRow::into_session).collect())
    }

    async fn touch(&self, session_id: &SessionId, at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query("UPDATE sessions SET last_seen_at = $2 WHERE id = $1")
            .bind(session_id.as_uuid())
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn revoke(&self, session_id: &SessionId, at: DateTime<Utc>) -> AuthResult<bool> {
        let affected =
            sqlx::query("UPDATE sessions SET revoked_at = $2 WHERE id = $1 AND revoked_at IS NULL")
                .bind(session_id.as_uuid())
                .bind(at)
                .execute(&self.pool)
                .await?
                .rows_affected();
        Ok(affected > 0)
    }

    async fn revoke_all_for_user(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<u64> {
        let affected = sqlx::query(
            "UPDATE sessions SET revoked_at = $2 WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id.as_uuid())
        .bind(at)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected)
    }

    async fn cleanup_revoked(&self, before: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM sessions WHERE revoked_at < $1")
            .bind(before)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted)
    }
}

// ============================================================================
// Refresh Token Repository Implementation
// ============================================================================

impl RefreshTokenRepository for PgAuthRepository {
    async fn create(&self, token: &RefreshToken) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (
                id, user_id, session_id, jti, issued_at, expires_at, used_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(token.id.as_uuid())
        .bind(token.user_id.as_uuid())
        .bind(token.session_id.as_uuid())
        .bind(&token.jti)
        .bind(token.issued_at)
        .bind(token.expires_at)
        .bind(token.used_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn rotate(&self, old_jti: &str, ttl: Duration) -> AuthResult<RotationOutcome> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Conditional consume: of two racing calls exactly one sees a
        // current row here, the other falls through to the reuse path.
        let consumed = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            UPDATE refresh_tokens
            SET used_at = $2
            WHERE jti = $1 AND used_at IS NULL AND expires_at > $2
            RETURNING id, user_id, session_id, jti, issued_at, expires_at, used_at
            "#,
        )
        .bind(old_jti)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(consumed) = consumed else {
            tx.rollback().await?;
            let owner = sqlx::query_as::<_, (Uuid,)>(
                "SELECT session_id FROM refresh_tokens WHERE jti = $1",
            )
            .bind(old_jti)
            .fetch_optional(&self.pool)
            .await?;
            return Ok(match owner {
                Some((session_id,)) => RotationOutcome::Reused {
                    session_id: SessionId::from_uuid(session_id),
                },
                None => RotationOutcome::Unknown,
            });
        };

        let consumed = consumed.into_token();
        let successor = consumed.successor(ttl);
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (
                id, user_id, session_id, jti, issued_at, expires_at, used_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(successor.id.as_uuid())
        .bind(successor.user_id.as_uuid())
        .bind(successor.session_id.as_uuid())
        .bind(&successor.jti)
        .bind(successor.issued_at)
        .bind(successor.expires_at)
        .bind(successor.used_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(RotationOutcome::Rotated {
            session_id: successor.session_id,
            user_id: successor.user_id,
            successor,
        })
    }

    async fn delete_for_session(&self, session_id: &SessionId) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM refresh_tokens WHERE session_id = $1")
            .bind(session_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted)
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted)
    }
}

// ============================================================================
// Email Verification Repository Implementation
// ============================================================================

impl EmailVerificationRepository for PgAuthRepository {
    async fn create(&self, verification: &EmailVerification) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO email_verifications (
                id, email, code_hash, attempts, created_at, expires_at, used_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(verification.id.as_uuid())
        .bind(verification.email.as_str())
        .bind(verification.code_hash.as_slice())
        .bind(verification.attempts)
        .bind(verification.created_at)
        .bind(verification.expires_at)
        .bind(verification.used_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_latest_by_email(&self, email: &Email) -> AuthResult<Option<EmailVerification>> {
        let row = sqlx::query_as::<_, EmailVerificationRow>(
            r#"
            SELECT id, email, code_hash, attempts, created_at, expires_at, used_at
            FROM email_verifications
            WHERE email = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_verification()).transpose()
    }

    async fn update(&self, verification: &EmailVerification) -> AuthResult<()> {
        sqlx::query(
            "UPDATE email_verifications SET attempts = $2, used_at = $3 WHERE id = $1",
        )
        .bind(verification.id.as_uuid())
        .bind(verification.attempts)
        .bind(verification.used_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM email_verifications WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted)
    }
}

// ============================================================================
// Credential Repository Implementation
// ============================================================================

impl CredentialRepository for PgAuthRepository {
    async fn find_totp_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<TotpCredential>> {
        let row = sqlx::query_as::<_, TotpRow>(
            r#"
            SELECT user_id, secret, created_at, verified_at
            FROM totp_credentials
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_credential()).transpose()
    }

    async fn save_totp(&self, credential: &TotpCredential) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO totp_credentials (user_id, secret, created_at, verified_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET secret = EXCLUDED.secret,
                created_at = EXCLUDED.created_at,
                verified_at = EXCLUDED.verified_at
            "#,
        )
        .bind(credential.user_id.as_uuid())
        .bind(credential.secret.as_encoded())
        .bind(credential.created_at)
        .bind(credential.verified_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn has_passkey(&self, user_id: &UserId) -> AuthResult<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM passkey_credentials WHERE user_id = $1)",
        )
        .bind(user_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    name: Option<String>,
    phone: Option<String>,
    roles: Vec<i16>,
    is_active: bool,
    is_verified: bool,
    email_verified_at: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let email = Email::new(&self.email)
            .map_err(|e| AuthError::Internal(format!("Invalid stored email: {}", e)))?;
        let password_hash = HashedPassword::from_stored(self.password_hash)
            .map_err(|e| AuthError::Internal(format!("Invalid stored hash: {}", e)))?;
        let roles = self
            .roles
            .iter()
            .map(|&code| {
                Role::from_code(code)
                    .ok_or_else(|| AuthError::Internal(format!("Unknown role code: {}", code)))
            })
            .collect::<AuthResult<Vec<_>>>()?;

        Ok(User {
            id: UserId::from_uuid(self.id),
            email,
            password_hash,
            name: self.name,
            phone: self.phone,
            roles,
            is_active: self.is_active,
            is_verified: self.is_verified,
            email_verified_at: self.email_verified_at,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    user_id: Uuid,
    device_ua: Option<String>,
    device_os: Option<String>,
    ip_hash: Option<String>,
    created_at: DateTime<Utc>,
    last_seen_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl SessionRow {
    fn into_session(self) -> Session {
        Session {
            id: SessionId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            device_ua: self.device_ua,
            device_os: self.device_os,
            ip_hash: self.ip_hash,
            created_at: self.created_at,
            last_seen_at: self.last_seen_at,
            revoked_at: self.revoked_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    id: Uuid,
    user_id: Uuid,
    session_id: Uuid,
    jti: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    used_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRow {
    fn into_token(self) -> RefreshToken {
        RefreshToken {
            id: RefreshTokenId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            session_id: SessionId::from_uuid(self.session_id),
            jti: self.jti,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            used_at: self.used_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EmailVerificationRow {
    id: Uuid,
    email: String,
    code_hash: Vec<u8>,
    attempts: i16,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    used_at: Option<DateTime<Utc>>,
}

impl EmailVerificationRow {
    fn into_verification(self) -> AuthResult<EmailVerification> {
        let email = Email::new(&self.email)
            .map_err(|e| AuthError::Internal(format!("Invalid stored email: {}", e)))?;
        let code_hash: [u8; 32] = self
            .code_hash
            .try_into()
            .map_err(|_| AuthError::Internal("Invalid stored code hash length".into()))?;

        Ok(EmailVerification {
            id: EmailVerificationId::from_uuid(self.id),
            email,
            code_hash,
            attempts: self.attempts,
            created_at: self.created_at,
            expires_at: self.expires_at,
            used_at: self.used_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TotpRow {
    user_id: Uuid,
    secret: String,
    created_at: DateTime<Utc>,
    verified_at: Option<DateTime<Utc>>,
}

impl TotpRow {
    fn into_credential(self) -> AuthResult<TotpCredential> {
        let secret = TotpSecret::from_encoded(self.secret)
            .map_err(|e| AuthError::Internal(format!("Invalid stored TOTP secret: {}", e)))?;
        Ok(TotpCredential {
            user_id: UserId::from_uuid(self.user_id),
            secret,
            created_at: self.created_at,
            verified_at: self.verified_at,
        })
    }
}
