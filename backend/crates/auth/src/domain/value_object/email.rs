//! Email Address Value Object

use serde::{Deserialize, Serialize};
use std::fmt;

/// Email validation errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("email must not be empty")]
    Empty,

    #[error("email is too long (max {max} characters)")]
    TooLong { max: usize },

    #[error("email format is invalid")]
    InvalidFormat,
}

const MAX_EMAIL_LEN: usize = 254;

/// A validated, lowercased email address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and normalize an email address
    ///
    /// Normalization is lowercasing only. Validation is intentionally
    /// shallow (`local@domain.tld` shape); deliverability is proven by
    /// the OTP flow, not by parsing.
    pub fn new(raw: &str) -> Result<Self, EmailError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EmailError::Empty);
        }
        if trimmed.len() > MAX_EMAIL_LEN {
            return Err(EmailError::TooLong { max: MAX_EMAIL_LEN });
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(EmailError::InvalidFormat);
        };
        if local.is_empty()
            || domain.is_empty()
            || !domain.contains('.')
            || domain.starts_with('.')
            || domain.ends_with('.')
            || trimmed.contains(char::is_whitespace)
        {
            return Err(EmailError::InvalidFormat);
        }

        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Email::new(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}
