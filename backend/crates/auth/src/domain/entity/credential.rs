//! Second-Factor Credentials
//!
//! TOTP and passkey records backing the strong-auth requirement for
//! admin accounts.

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::value_object::totp_secret::TotpSecret;

/// A per-user TOTP enrollment
///
/// The secret only counts toward strong auth once the user has proven
/// possession by submitting a valid code (`verified_at` set).
#[derive(Debug, Clone)]
pub struct TotpCredential {
    pub user_id: UserId,
    pub secret: TotpSecret,
    pub created_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl TotpCredential {
    pub fn enroll(user_id: UserId) -> Self {
        Self {
            user_id,
            secret: TotpSecret::generate(),
            created_at: Utc::now(),
            verified_at: None,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.verified_at.is_some()
    }

    pub fn mark_verified(&mut self, at: DateTime<Utc>) {
        if self.verified_at.is_none() {
            self.verified_at = Some(at);
        }
    }
}
