//! TOTP Secret Value Object

use totp_rs::{Algorithm, Secret, TOTP};

const TOTP_ISSUER: &str = "bsaas";
const TOTP_DIGITS: usize = 6;
const TOTP_STEP: u64 = 30;

/// TOTP errors
#[derive(Debug, thiserror::Error)]
pub enum TotpError {
    #[error("invalid TOTP secret")]
    InvalidSecret,

    #[error("TOTP code verification failed")]
    VerificationFailed,
}

/// A base32-encoded TOTP secret
#[derive(Clone, PartialEq, Eq)]
pub struct TotpSecret(String);

impl TotpSecret {
    /// Generate a fresh random secret
    pub fn generate() -> Self {
        Self(Secret::generate_secret().to_encoded().to_string())
    }

    /// Wrap a stored base32 secret
    pub fn from_encoded(encoded: String) -> Result<Self, TotpError> {
        Secret::Encoded(encoded.clone())
            .to_bytes()
            .map_err(|_| TotpError::InvalidSecret)?;
        Ok(Self(encoded))
    }

    /// Check a 6-digit code against the current time step
    pub fn verify_code(&self, code: &str, account_name: &str) -> Result<bool, TotpError> {
        let totp = self.totp(account_name)?;
        totp.check_current(code)
            .map_err(|_| TotpError::VerificationFailed)
    }

    /// otpauth:// provisioning URI for authenticator apps
    pub fn provisioning_uri(&self, account_name: &str) -> Result<String, TotpError> {
        Ok(self.totp(account_name)?.get_url())
    }

    pub fn as_encoded(&self) -> &str {
        &self.0
    }

    fn totp(&self, account_name: &str) -> Result<TOTP, TotpError> {
        let secret = Secret::Encoded(self.0.clone())
            .to_bytes()
            .map_err(|_| TotpError::InvalidSecret)?;
        TOTP::new(
            Algorithm::SHA1,
            TOTP_DIGITS,
            1,
            TOTP_STEP,
            secret,
            Some(TOTP_ISSUER.to_string()),
            account_name.to_string(),
        )
        .map_err(|_| TotpError::InvalidSecret)
    }
}

// Secrets never appear in logs
impl std::fmt::Debug for TotpSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TotpSecret(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_verify() {
        let secret = TotpSecret::generate();
        let totp = secret.totp("user@example.com").unwrap();
        let code = totp.generate_current().unwrap();
        assert!(secret.verify_code(&code, "user@example.com").unwrap());
        assert!(!secret.verify_code("000000", "user@example.com").unwrap());
    }

    #[test]
    fn test_provisioning_uri() {
        let secret = TotpSecret::generate();
        let uri = secret.provisioning_uri("user@example.com").unwrap();
        assert!(uri.starts_with("otpauth://totp/"));
        assert!(uri.contains("issuer=bsaas"));
    }

    #[test]
    fn test_invalid_stored_secret_rejected() {
        assert!(TotpSecret::from_encoded("not base32 !!!".into()).is_err());
    }
}
