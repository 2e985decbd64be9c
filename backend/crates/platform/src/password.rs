//! Password Hashing
//!
//! Argon2id password hashing with zeroization of plaintext material.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Password errors
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password must be at least {min} characters")]
    TooShort { min: usize },

    #[error("password must be at most {max} characters")]
    TooLong { max: usize },

    #[error("password hashing failed")]
    HashingFailed,

    #[error("stored password hash is malformed")]
    MalformedHash,
}

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

/// A plaintext password, zeroized when dropped
///
/// Never implement Display/Debug exposing the inner value.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Accept a candidate password, enforcing length bounds
    pub fn new(raw: String) -> Result<Self, PasswordError> {
        let len = raw.chars().count();
        if len < MIN_PASSWORD_LEN {
            return Err(PasswordError::TooShort {
                min: MIN_PASSWORD_LEN,
            });
        }
        if len > MAX_PASSWORD_LEN {
            return Err(PasswordError::TooLong {
                max: MAX_PASSWORD_LEN,
            });
        }
        Ok(Self(raw))
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ClearTextPassword(***)")
    }
}

/// An Argon2id hash in PHC string format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Hash a plaintext password with a fresh random salt
    pub fn from_clear_text(password: &ClearTextPassword) -> Result<Self, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|_| PasswordError::HashingFailed)?;
        Ok(Self(hash.to_string()))
    }

    /// Wrap an already-stored PHC hash string
    pub fn from_stored(phc: String) -> Result<Self, PasswordError> {
        PasswordHash::new(&phc).map_err(|_| PasswordError::MalformedHash)?;
        Ok(Self(phc))
    }

    /// Verify a candidate password against this hash
    pub fn verify(&self, password: &ClearTextPassword) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(&self.0).map_err(|_| PasswordError::MalformedHash)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_length_bounds() {
        assert!(matches!(
            ClearTextPassword::new("short".into()),
            Err(PasswordError::TooShort { .. })
        ));
        assert!(matches!(
            ClearTextPassword::new("x".repeat(129)),
            Err(PasswordError::TooLong { .. })
        ));
        assert!(ClearTextPassword::new("long enough".into()).is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let password = ClearTextPassword::new("correct horse battery".into()).unwrap();
        let hash = HashedPassword::from_clear_text(&password).unwrap();

        assert!(hash.as_str().starts_with("$argon2id$"));
        assert!(hash.verify(&password).unwrap());

        let wrong = ClearTextPassword::new("incorrect horse".into()).unwrap();
        assert!(!hash.verify(&wrong).unwrap());
    }

    #[test]
    fn test_distinct_salts() {
        let password = ClearTextPassword::new("same password".into()).unwrap();
        let a = HashedPassword::from_clear_text(&password).unwrap();
        let b = HashedPassword::from_clear_text(&password).unwrap();
        assert_ne!(a.as_str(), b.as_str());
    }

    #[test]
    fn test_malformed_stored_hash_rejected() {
        assert!(matches!(
            HashedPassword::from_stored("not a phc string".into()),
            Err(PasswordError::MalformedHash)
        ));
    }
}
