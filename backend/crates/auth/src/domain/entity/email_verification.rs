//! Email Verification Entity
//!
//! One row per issued OTP. Only the SHA-256 of the code is stored.
//! Codes are single-use, time-boxed, and attempt-limited.

use chrono::{DateTime, Duration, Utc};
use kernel::id::EmailVerificationId;
use platform::crypto::{constant_time_eq, sha256};

use crate::domain::value_object::email::Email;

/// Default OTP lifetime
pub const OTP_TTL_MINUTES: i64 = 10;
/// Wrong-code attempts before the code is burned
pub const OTP_MAX_ATTEMPTS: i16 = 5;

/// Outcome of checking a candidate code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpCheck {
    /// Code matches and the verification is still live
    Valid,
    /// Code does not match; the attempt was counted
    Mismatch,
    /// Attempt limit reached; the code is burned
    Exhausted,
    /// Already used or expired
    Dead,
}

#[derive(Debug, Clone)]
pub struct EmailVerification {
    pub id: EmailVerificationId,
    pub email: Email,
    pub code_hash: [u8; 32],
    pub attempts: i16,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl EmailVerification {
    /// Issue a verification for a plaintext code
    pub fn issue(email: Email, code: &str, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: EmailVerificationId::new(),
            email,
            code_hash: sha256(code.as_bytes()),
            attempts: 0,
            created_at: now,
            expires_at: now + ttl,
            used_at: None,
        }
    }

    /// Generate a 6-digit numeric OTP
    pub fn generate_code() -> String {
        use rand::Rng;
        format!("{:06}", rand::rng().random_range(0..1_000_000))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && !self.is_expired(now) && self.attempts < OTP_MAX_ATTEMPTS
    }

    /// Count one attempt and check the candidate code
    ///
    /// The attempt is counted before the comparison so a wrong guess
    /// always burns an attempt, and the persisted counter must be
    /// written back even on failure.
    pub fn check(&mut self, code: &str, now: DateTime<Utc>) -> OtpCheck {
        if self.used_at.is_some() || self.is_expired(now) {
            return OtpCheck::Dead;
        }
        if self.attempts >= OTP_MAX_ATTEMPTS {
            return OtpCheck::Exhausted;
        }
        self.attempts += 1;
        if !constant_time_eq(&self.code_hash, &sha256(code.as_bytes())) {
            return OtpCheck::Mismatch;
        }
        self.used_at = Some(now);
        OtpCheck::Valid
    }
}
