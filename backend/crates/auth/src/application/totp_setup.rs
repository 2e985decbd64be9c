//! TOTP Setup Use Case
//!
//! Step-up enrollment for admin accounts: generate a secret, hand the
//! provisioning URI to the client, and mark the credential verified
//! once the user proves possession with a current code. Only verified
//! credentials satisfy the strong-auth guard.

use kernel::id::UserId;

use crate::domain::entity::credential::TotpCredential;
use crate::domain::repository::{CredentialRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

#[derive(Debug)]
pub struct TotpSetupOutput {
    pub secret: String,
    pub provisioning_uri: String,
}

pub struct TotpSetupUseCase<U, C> {
    users: U,
    credentials: C,
}

impl<U, C> TotpSetupUseCase<U, C>
where
    U: UserRepository,
    C: CredentialRepository,
{
    pub fn new(users: U, credentials: C) -> Self {
        Self { users, credentials }
    }

    /// Enroll a fresh secret, replacing any unverified one
    pub async fn setup(&self, user_id: &UserId) -> AuthResult<TotpSetupOutput> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if let Some(existing) = self.credentials.find_totp_by_user_id(user_id).await?
            && existing.is_verified()
        {
            return Err(AuthError::Validation(
                "TOTP is already set up for this account".into(),
            ));
        }

        let credential = TotpCredential::enroll(*user_id);
        let uri = credential
            .secret
            .provisioning_uri(user.email.as_str())
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let secret = credential.secret.as_encoded().to_string();
        self.credentials.save_totp(&credential).await?;

        Ok(TotpSetupOutput {
            secret,
            provisioning_uri: uri,
        })
    }

    /// Prove possession of the enrolled secret
    pub async fn confirm(&self, user_id: &UserId, code: &str) -> AuthResult<()> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let Some(mut credential) = self.credentials.find_totp_by_user_id(user_id).await? else {
            return Err(AuthError::Validation("TOTP is not enrolled".into()));
        };

        let valid = credential
            .secret
            .verify_code(code, user.email.as_str())
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        if !valid {
            return Err(AuthError::InvalidOtp);
        }

        credential.mark_verified(chrono::Utc::now());
        self.credentials.save_totp(&credential).await?;
        tracing::info!(user_id = %user_id, "TOTP credential verified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::user::User;
    use crate::domain::value_object::{email::Email, role::Role};
    use crate::infra::memory::InMemoryStore;
    use platform::password::ClearTextPassword;

    fn fixture() -> (TotpSetupUseCase<InMemoryStore, InMemoryStore>, InMemoryStore, UserId) {
        let store = InMemoryStore::new();
        let password = ClearTextPassword::new("hunter2hunter2".into()).unwrap();
        let user = User::new(
            Email::new("admin@example.com").unwrap(),
            &password,
            vec![Role::Admin],
        )
        .unwrap();
        let user_id = user.id;
        store.seed_user(user);
        (
            TotpSetupUseCase::new(store.clone(), store.clone()),
            store,
            user_id,
        )
    }

    #[tokio::test]
    async fn test_setup_returns_provisioning_uri() {
        let (use_case, _, user_id) = fixture();
        let output = use_case.setup(&user_id).await.unwrap();
        assert!(output.provisioning_uri.starts_with("otpauth://totp/"));
        assert!(!output.secret.is_empty());
    }

    #[tokio::test]
    async fn test_confirm_with_valid_code_verifies_credential() {
        let (use_case, store, user_id) = fixture();
        use_case.setup(&user_id).await.unwrap();

        let credential = store.totp_for_user(&user_id).unwrap();
        let current = current_code(&credential);
        use_case.confirm(&user_id, &current).await.unwrap();
        assert!(store.totp_for_user(&user_id).unwrap().is_verified());
    }

    #[tokio::test]
    async fn test_confirm_with_wrong_code_fails() {
        let (use_case, _, user_id) = fixture();
        use_case.setup(&user_id).await.unwrap();
        let err = use_case.confirm(&user_id, "000000").await.unwrap_err();
        // One-in-a-million flake if 000000 happens to be current
        assert!(matches!(err, AuthError::InvalidOtp));
    }

    #[tokio::test]
    async fn test_setup_refused_once_verified() {
        let (use_case, store, user_id) = fixture();
        use_case.setup(&user_id).await.unwrap();
        let credential = store.totp_for_user(&user_id).unwrap();
        use_case
            .confirm(&user_id, &current_code(&credential))
            .await
            .unwrap();

        let err = use_case.setup(&user_id).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    fn current_code(credential: &TotpCredential) -> String {
        use totp_rs::{Algorithm, Secret, TOTP};
        let secret = Secret::Encoded(credential.secret.as_encoded().to_string())
            .to_bytes()
            .unwrap();
        TOTP::new(
            Algorithm::SHA1,
            6,
            1,
            30,
            secret,
            Some("bsaas".into()),
            "admin@example.com".into(),
        )
        .unwrap()
        .generate_current()
        .unwrap()
    }
}
