//! User Entity

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use platform::password::{ClearTextPassword, HashedPassword, PasswordError};

use crate::domain::value_object::{email::Email, role::Role};

/// A platform account
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub password_hash: HashedPassword,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub roles: Vec<Role>,
    pub is_active: bool,
    pub is_verified: bool,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new unverified account
    pub fn new(email: Email, password: &ClearTextPassword, roles: Vec<Role>) -> Result<Self, PasswordError> {
        let now = Utc::now();
        Ok(Self {
            id: UserId::new(),
            email,
            password_hash: HashedPassword::from_clear_text(password)?,
            name: None,
            phone: None,
            roles,
            is_active: true,
            is_verified: false,
            email_verified_at: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Verify a candidate password against the stored hash
    pub fn verify_password(&self, password: &ClearTextPassword) -> Result<bool, PasswordError> {
        self.password_hash.verify(password)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Record a successful sign-in
    pub fn record_login(&mut self, at: DateTime<Utc>) {
        self.last_login_at = Some(at);
        self.updated_at = at;
    }

    /// Mark the email address as verified
    pub fn mark_email_verified(&mut self, at: DateTime<Utc>) {
        self.is_verified = true;
        self.email_verified_at = Some(at);
        self.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let password = ClearTextPassword::new("correct horse".into()).unwrap();
        User::new(
            Email::new("user@example.com").unwrap(),
            &password,
            vec![Role::Customer],
        )
        .unwrap()
    }

    #[test]
    fn test_new_user_defaults() {
        let user = sample_user();
        assert!(user.is_active);
        assert!(!user.is_verified);
        assert!(user.email_verified_at.is_none());
        assert!(user.last_login_at.is_none());
    }

    #[test]
    fn test_password_verification() {
        let user = sample_user();
        let right = ClearTextPassword::new("correct horse".into()).unwrap();
        let wrong = ClearTextPassword::new("wrong horse!".into()).unwrap();
        assert!(user.verify_password(&right).unwrap());
        assert!(!user.verify_password(&wrong).unwrap());
    }

    #[test]
    fn test_roles() {
        let user = sample_user();
        assert!(user.has_role(Role::Customer));
        assert!(!user.is_admin());
    }

    #[test]
    fn test_mark_email_verified() {
        let mut user = sample_user();
        let now = Utc::now();
        user.mark_email_verified(now);
        assert!(user.is_verified);
        assert_eq!(user.email_verified_at, Some(now));
    }
}
