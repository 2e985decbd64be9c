//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// Invalid credentials (wrong password or unknown email)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Token is malformed or its signature does not verify
    #[error("Invalid token")]
    InvalidToken,

    /// Token signature is valid but the token has expired
    #[error("Token expired")]
    TokenExpired,

    /// A rotated-out refresh token was presented again
    #[error("Refresh token reuse detected")]
    TokenReuseDetected,

    /// Session not found or already revoked
    #[error("Session not found")]
    SessionNotFound,

    /// Email verification code does not match
    #[error("Invalid verification code")]
    InvalidOtp,

    /// Email verification code expired, already used, or attempts exhausted
    #[error("Verification code expired")]
    OtpExpired,

    /// Privileged role without a verified second factor
    #[error("Strong authentication required")]
    StrongAuthRequired,

    /// CSRF header/cookie pair missing or mismatched
    #[error("CSRF token mismatch")]
    CsrfMismatch,

    /// Authenticated but not allowed
    #[error("Forbidden")]
    Forbidden,

    /// Request payload validation error
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::UserNotFound | AuthError::SessionNotFound => StatusCode::NOT_FOUND,
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::TokenReuseDetected => StatusCode::UNAUTHORIZED,
            AuthError::StrongAuthRequired | AuthError::CsrfMismatch | AuthError::Forbidden => {
                StatusCode::FORBIDDEN
            }
            AuthError::InvalidOtp | AuthError::OtpExpired | AuthError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::UserNotFound | AuthError::SessionNotFound => ErrorKind::NotFound,
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::TokenReuseDetected => ErrorKind::Unauthorized,
            AuthError::StrongAuthRequired | AuthError::CsrfMismatch | AuthError::Forbidden => {
                ErrorKind::Forbidden
            }
            AuthError::InvalidOtp | AuthError::OtpExpired | AuthError::Validation(_) => {
                ErrorKind::BadRequest
            }
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::TokenReuseDetected => {
                tracing::warn!("Refresh token reuse detected, session revoked");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::CsrfMismatch => {
                tracing::warn!("CSRF token mismatch");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        }
    }
}
