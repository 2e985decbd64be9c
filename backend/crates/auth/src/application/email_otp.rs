//! Email OTP Use Case
//!
//! Issues and verifies the one-time email verification codes. The
//! request side always reports accepted so responses cannot be used
//! to probe which addresses have accounts.

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::domain::entity::email_verification::{EmailVerification, OtpCheck};
use crate::domain::repository::{EmailVerificationRepository, Mailer, UserRepository};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

const MAIL_SUBJECT: &str = "Your verification code";

pub struct EmailOtpUseCase<U, V, M> {
    users: U,
    verifications: V,
    mailer: M,
    config: AuthConfig,
}

impl<U, V, M> EmailOtpUseCase<U, V, M>
where
    U: UserRepository,
    V: EmailVerificationRepository,
    M: Mailer,
{
    pub fn new(users: U, verifications: V, mailer: M, config: AuthConfig) -> Self {
        Self {
            users,
            verifications,
            mailer,
            config,
        }
    }

    /// Issue a code for an address
    ///
    /// Returns Ok whether or not the address has an account; a code is
    /// only stored and mailed when one exists. Mail failures are
    /// logged, not surfaced, so they cannot distinguish the two cases
    /// either.
    pub async fn request(&self, email: &str) -> AuthResult<()> {
        let email = Email::new(email).map_err(|e| AuthError::Validation(e.to_string()))?;

        if self.users.find_by_email(&email).await?.is_none() {
            tracing::debug!("OTP requested for unknown email");
            return Ok(());
        }

        let code = EmailVerification::generate_code();
        let verification =
            EmailVerification::issue(email.clone(), &code, self.config.otp_ttl_chrono());
        self.verifications.create(&verification).await?;

        let body = format!(
            "Your verification code is {code}. It expires in {} minutes.",
            self.config.otp_ttl.as_secs() / 60
        );
        if let Err(e) = self.mailer.send_mail(email.as_str(), MAIL_SUBJECT, &body).await {
            tracing::error!(error = %e, "Failed to send verification mail");
        }
        Ok(())
    }

    /// Check a submitted code and mark the account's email verified
    pub async fn verify(&self, email: &str, code: &str) -> AuthResult<()> {
        let email = Email::new(email).map_err(|e| AuthError::Validation(e.to_string()))?;
        let now = Utc::now();

        let Some(mut verification) = self.verifications.find_latest_by_email(&email).await? else {
            return Err(AuthError::OtpExpired);
        };

        let outcome = verification.check(code, now);
        // Attempt counters and used_at must persist even on failure
        self.verifications.update(&verification).await?;

        match outcome {
            OtpCheck::Valid => {}
            OtpCheck::Mismatch | OtpCheck::Exhausted => return Err(AuthError::InvalidOtp),
            OtpCheck::Dead => return Err(AuthError::OtpExpired),
        }

        let Some(mut user) = self.users.find_by_email(&email).await? else {
            return Err(AuthError::UserNotFound);
        };
        user.mark_email_verified(now);
        self.users.update(&user).await?;

        tracing::info!(user_id = %user.id, "Email verified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::email_verification::OTP_MAX_ATTEMPTS;
    use crate::domain::entity::user::User;
    use crate::domain::value_object::role::Role;
    use crate::infra::mailer::RecordingMailer;
    use crate::infra::memory::InMemoryStore;
    use platform::password::ClearTextPassword;

    fn fixture() -> (
        EmailOtpUseCase<InMemoryStore, InMemoryStore, RecordingMailer>,
        InMemoryStore,
        RecordingMailer,
    ) {
        let store = InMemoryStore::new();
        let password = ClearTextPassword::new("hunter2hunter2".into()).unwrap();
        let user = User::new(
            Email::new("user@example.com").unwrap(),
            &password,
            vec![Role::Customer],
        )
        .unwrap();
        store.seed_user(user);

        let mailer = RecordingMailer::new();
        let use_case = EmailOtpUseCase::new(
            store.clone(),
            store.clone(),
            mailer.clone(),
            AuthConfig::with_random_secret(),
        );
        (use_case, store, mailer)
    }

    /// Pull the 6-digit code out of the recorded mail body
    fn sent_code(mailer: &RecordingMailer) -> String {
        let body = mailer.last_body().unwrap();
        body.split_whitespace()
            .find(|w| w.len() >= 6 && w.chars().take(6).all(|c| c.is_ascii_digit()))
            .unwrap()
            .chars()
            .take(6)
            .collect()
    }

    #[tokio::test]
    async fn test_request_and_verify_roundtrip() {
        let (use_case, store, mailer) = fixture();
        use_case.request("user@example.com").await.unwrap();
        let code = sent_code(&mailer);

        use_case.verify("user@example.com", &code).await.unwrap();

        let email = Email::new("user@example.com").unwrap();
        let user = store.user_by_email(&email).unwrap();
        assert!(user.is_verified);
        assert!(user.email_verified_at.is_some());
    }

    #[tokio::test]
    async fn test_request_for_unknown_email_accepted_silently() {
        let (use_case, _, mailer) = fixture();
        use_case.request("nobody@example.com").await.unwrap();
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_code_is_single_use() {
        let (use_case, _, mailer) = fixture();
        use_case.request("user@example.com").await.unwrap();
        let code = sent_code(&mailer);

        use_case.verify("user@example.com", &code).await.unwrap();
        let err = use_case
            .verify("user@example.com", &code)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::OtpExpired));
    }

    #[tokio::test]
    async fn test_wrong_code_burns_attempts() {
        let (use_case, store, mailer) = fixture();
        use_case.request("user@example.com").await.unwrap();
        let code = sent_code(&mailer);
        let wrong = if code == "000000" { "111111" } else { "000000" };

        for _ in 0..OTP_MAX_ATTEMPTS {
            let err = use_case
                .verify("user@example.com", wrong)
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::InvalidOtp));
        }

        // Exhausted: even the right code fails now
        let err = use_case
            .verify("user@example.com", &code)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidOtp));

        let email = Email::new("user@example.com").unwrap();
        assert!(!store.user_by_email(&email).unwrap().is_verified);
    }

    #[tokio::test]
    async fn test_verify_without_request_is_expired() {
        let (use_case, _, _) = fixture();
        let err = use_case
            .verify("user@example.com", "123456")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::OtpExpired));
    }
}
