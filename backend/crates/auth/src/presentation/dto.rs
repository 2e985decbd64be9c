//! API DTOs (Data Transfer Objects)
//!
//! Validation is explicit: each request type exposes `validate()` and
//! handlers call it before touching the use-case layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entity::session::Session;
use crate::error::{AuthError, AuthResult};
use kernel::id::SessionId;

// ============================================================================
// Login
// ============================================================================

/// Login request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> AuthResult<()> {
        if self.email.trim().is_empty() {
            return Err(AuthError::Validation("email must not be empty".into()));
        }
        if self.password.is_empty() {
            return Err(AuthError::Validation("password must not be empty".into()));
        }
        Ok(())
    }
}

/// Login response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub session_id: SessionId,
}

// ============================================================================
// Refresh
// ============================================================================

/// Refresh request (body token is optional; the cookie is preferred)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Refresh response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

// ============================================================================
// Sessions
// ============================================================================

/// One entry in the session listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: SessionId,
    pub device_ua: Option<String>,
    pub device_os: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    /// Whether this is the session behind the presented access token
    pub current: bool,
}

impl SessionView {
    pub fn from_session(session: Session, current_session_id: &SessionId) -> Self {
        Self {
            current: session.id == *current_session_id,
            id: session.id,
            device_ua: session.device_ua,
            device_os: session.device_os,
            created_at: session.created_at,
            last_seen_at: session.last_seen_at,
        }
    }
}

/// Logout-all response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutAllResponse {
    pub revoked: u64,
}

// ============================================================================
// Email verification
// ============================================================================

/// OTP request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailVerifyRequest {
    pub email: String,
}

impl EmailVerifyRequest {
    pub fn validate(&self) -> AuthResult<()> {
        if self.email.trim().is_empty() {
            return Err(AuthError::Validation("email must not be empty".into()));
        }
        Ok(())
    }
}

/// OTP confirmation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailConfirmRequest {
    pub email: String,
    pub code: String,
}

impl EmailConfirmRequest {
    pub fn validate(&self) -> AuthResult<()> {
        if self.email.trim().is_empty() {
            return Err(AuthError::Validation("email must not be empty".into()));
        }
        if self.code.len() != 6 || !self.code.chars().all(|c| c.is_ascii_digit()) {
            return Err(AuthError::Validation("code must be 6 digits".into()));
        }
        Ok(())
    }
}

// ============================================================================
// TOTP setup
// ============================================================================

/// TOTP setup response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotpSetupResponse {
    pub secret: String,
    pub provisioning_uri: String,
}

/// TOTP confirmation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotpConfirmRequest {
    pub code: String,
}

impl TotpConfirmRequest {
    pub fn validate(&self) -> AuthResult<()> {
        if self.code.len() != 6 || !self.code.chars().all(|c| c.is_ascii_digit()) {
            return Err(AuthError::Validation("code must be 6 digits".into()));
        }
        Ok(())
    }
}
