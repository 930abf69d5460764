//! Account service: registration, credential verification, email
//! verification and password reset token flows.
//!
//! Tokens are 32-byte CSPRNG values with a one hour expiry, single-use by
//! virtue of being cleared on consumption. All user-facing failures map to
//! generic messages at the web layer so nothing leaks about which part of
//! a check failed.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::core::security;
use crate::mailer::Mailer;

use super::store::{NewUserRecord, UserStore};
use super::types::{Department, User};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("email not verified")]
    EmailNotVerified,
    #[error("email or employee id already registered")]
    AlreadyRegistered,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("email not found")]
    EmailNotFound,
    #[error("email already verified")]
    AlreadyVerified,
    #[error("email delivery failed")]
    MailFailed,
    #[error("internal error: {0}")]
    Internal(String),
}

pub(crate) fn internal<E: std::fmt::Display>(err: E) -> AccountError {
    AccountError::Internal(err.to_string())
}

/// Raw registration form input, untrimmed.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub employee_id: String,
    pub department: String,
    pub job_title: String,
}

#[derive(Clone)]
pub struct AccountService {
    store: UserStore,
    mailer: Arc<dyn Mailer>,
    base_url: String,
}

impl AccountService {
    pub fn new(store: UserStore, mailer: Arc<dyn Mailer>, base_url: String) -> Self {
        Self {
            store,
            mailer,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Register a new user and send their verification email.
    ///
    /// The row is committed (with its token) before the email goes out;
    /// a send failure surfaces as `MailFailed` but leaves the row in
    /// place, recoverable via the resend flow.
    pub async fn register(&self, registration: Registration) -> Result<(), AccountError> {
        let name = registration.name.trim();
        let email = registration.email.trim().to_lowercase();
        let password = registration.password.trim();
        let employee_id = registration.employee_id.trim();
        let department_raw = registration.department.trim();
        let job_title = registration.job_title.trim();

        if [name, email.as_str(), password, employee_id, department_raw, job_title]
            .iter()
            .any(|field| field.is_empty())
        {
            return Err(AccountError::Validation(
                "All fields are required!".to_string(),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AccountError::Validation(
                "Password must be at least 8 characters long.".to_string(),
            ));
        }
        if !email.contains('@') || !email.contains('.') {
            return Err(AccountError::Validation(
                "Invalid email format.".to_string(),
            ));
        }
        let department = Department::parse(department_raw).ok_or_else(|| {
            AccountError::Validation("Invalid department selected.".to_string())
        })?;

        let password_hash = security::hash_password(password).map_err(internal)?;
        let token = security::generate_token();

        self.store
            .insert_user(NewUserRecord {
                email: &email,
                password_hash: &password_hash,
                name,
                employee_id,
                department,
                job_title,
                token: &token,
                token_expiry: token_expiry(),
            })
            .await?;

        self.send_verification_email(&email, &token, false).await
    }

    /// Verify credentials. Unverified users are refused; no session should
    /// be established for them.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AccountError> {
        let email = email.trim().to_lowercase();
        let user = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        if !security::verify_password(password.trim(), &user.password_hash) {
            return Err(AccountError::InvalidCredentials);
        }
        if !user.is_verified {
            return Err(AccountError::EmailNotVerified);
        }

        Ok(user)
    }

    /// Consume a verification token. Missing, expired and mismatched
    /// tokens all collapse to `InvalidToken`.
    pub async fn verify_email(&self, token: &str) -> Result<(), AccountError> {
        let user = self.store.find_by_token(token).await?;

        match user {
            Some(user) if user.token.is_valid(token, Utc::now()) => {
                self.store.mark_verified(token).await
            }
            _ => Err(AccountError::InvalidToken),
        }
    }

    /// Issue a fresh verification token, overwriting any pending one.
    pub async fn resend_verification(&self, email: &str) -> Result<(), AccountError> {
        let email = email.trim().to_lowercase();
        let user = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AccountError::EmailNotFound)?;

        if user.is_verified {
            return Err(AccountError::AlreadyVerified);
        }

        let token = security::generate_token();
        self.store.set_token(&email, &token, token_expiry()).await?;

        self.send_verification_email(&email, &token, true).await
    }

    /// Issue a password reset token and email the reset link.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AccountError> {
        let email = email.trim().to_lowercase();
        if self.store.find_by_email(&email).await?.is_none() {
            return Err(AccountError::EmailNotFound);
        }

        let token = security::generate_token();
        self.store.set_token(&email, &token, token_expiry()).await?;

        let reset_url = format!("{}/reset_password?token={}", self.base_url, token);
        let body = reset_email_body(&reset_url);
        self.mailer
            .send(&email, "GBS HR Assistant Password Reset", &body)
            .await
            .map_err(|_| AccountError::MailFailed)
    }

    /// Whether a reset token exists and is unexpired (for rendering the
    /// reset form without consuming the token).
    pub async fn reset_token_valid(&self, token: &str) -> Result<bool, AccountError> {
        let user = self.store.find_by_token(token).await?;
        Ok(matches!(user, Some(user) if user.token.is_valid(token, Utc::now())))
    }

    /// Consume a reset token and replace the password. Exactly one change
    /// per token; the token is cleared regardless of verification state.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AccountError> {
        let user = self.store.find_by_token(token).await?;
        let valid = matches!(&user, Some(user) if user.token.is_valid(token, Utc::now()));
        if !valid {
            return Err(AccountError::InvalidToken);
        }

        let new_password = new_password.trim();
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AccountError::Validation(
                "Password must be at least 8 characters long.".to_string(),
            ));
        }

        let password_hash = security::hash_password(new_password).map_err(internal)?;
        self.store.update_password(token, &password_hash).await
    }

    async fn send_verification_email(
        &self,
        email: &str,
        token: &str,
        resend: bool,
    ) -> Result<(), AccountError> {
        let verify_url = format!("{}/verify_email?token={}", self.base_url, token);
        let body = verification_email_body(&verify_url, resend);
        self.mailer
            .send(email, "Verify Your GBS HR Assistant Account", &body)
            .await
            .map_err(|_| AccountError::MailFailed)
    }
}

fn token_expiry() -> DateTime<Utc> {
    Utc::now() + Duration::hours(1)
}

fn verification_email_body(verify_url: &str, resend: bool) -> String {
    let lead = if resend {
        "We've resent your verification link.".to_string()
    } else {
        "<h2>Welcome to GBS HR Assistant!</h2>\n<p>Please verify your email to activate your account.</p>".to_string()
    };
    format!(
        r#"<html>
    <body style="font-family: Arial, sans-serif; color: #333;">
        {lead}
        <a href="{verify_url}" style="display: inline-block; padding: 10px 20px; background-color: #007bff; color: #fff; text-decoration: none; border-radius: 5px;">Verify Email</a>
        <p>Or copy this link: {verify_url}</p>
        <p>This link expires in 1 hour.</p>
        <p>Best regards,<br>GBS HR Assistant Team</p>
    </body>
</html>"#
    )
}

fn reset_email_body(reset_url: &str) -> String {
    format!(
        r#"<html>
    <body style="font-family: Arial, sans-serif; color: #333;">
        <h2>GBS HR Assistant Password Reset</h2>
        <p>Click below to reset your password.</p>
        <a href="{reset_url}" style="display: inline-block; padding: 10px 20px; background-color: #007bff; color: #fff; text-decoration: none; border-radius: 5px;">Reset Password</a>
        <p>Or copy this link: {reset_url}</p>
        <p>This link expires in 1 hour.</p>
        <p>Best regards,<br>GBS HR Assistant Team</p>
    </body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::core::errors::ApiError;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String, String)>>,
        fail: AtomicBool,
    }

    impl RecordingMailer {
        fn last_body(&self) -> String {
            self.sent
                .lock()
                .unwrap()
                .last()
                .map(|(_, _, body)| body.clone())
                .unwrap_or_default()
        }

        fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), ApiError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ApiError::Internal("smtp down".to_string()));
            }
            self.sent.lock().unwrap().push((
                to.to_string(),
                subject.to_string(),
                html_body.to_string(),
            ));
            Ok(())
        }
    }

    async fn test_service() -> (AccountService, UserStore, Arc<RecordingMailer>) {
        let path =
            std::env::temp_dir().join(format!("hr-accounts-test-{}.db", uuid::Uuid::new_v4()));
        let store = UserStore::new(path).await.unwrap();
        let mailer = Arc::new(RecordingMailer::default());
        let service = AccountService::new(
            store.clone(),
            mailer.clone(),
            "http://localhost:8000".to_string(),
        );
        (service, store, mailer)
    }

    fn registration(email: &str, employee_id: &str) -> Registration {
        Registration {
            name: "Test User".to_string(),
            email: email.to_string(),
            password: "password1".to_string(),
            employee_id: employee_id.to_string(),
            department: "HR".to_string(),
            job_title: "Analyst".to_string(),
        }
    }

    fn token_from_body(body: &str) -> String {
        let start = body.find("token=").expect("link in email body") + "token=".len();
        body[start..]
            .chars()
            .take_while(|c| c.is_ascii_hexdigit())
            .collect()
    }

    #[tokio::test]
    async fn short_password_rejected_without_row() {
        let (service, store, _) = test_service().await;

        let mut reg = registration("a@b.com", "E1");
        reg.password = "short".to_string();

        let result = service.register(reg).await;
        assert!(matches!(result, Err(AccountError::Validation(msg)) if msg.contains("8 characters")));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn invalid_email_and_department_rejected() {
        let (service, store, _) = test_service().await;

        let mut reg = registration("no-at-sign", "E1");
        reg.email = "not-an-email".to_string();
        assert!(matches!(
            service.register(reg).await,
            Err(AccountError::Validation(msg)) if msg.contains("email format")
        ));

        let mut reg = registration("a@b.com", "E1");
        reg.department = "Legal".to_string();
        assert!(matches!(
            service.register(reg).await,
            Err(AccountError::Validation(msg)) if msg.contains("department")
        ));

        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_registration_is_generic() {
        let (service, store, _) = test_service().await;

        service.register(registration("a@b.com", "E1")).await.unwrap();

        let same_email = service.register(registration("a@b.com", "E2")).await;
        assert!(matches!(same_email, Err(AccountError::AlreadyRegistered)));

        let same_employee = service.register(registration("c@d.com", "E1")).await;
        assert!(matches!(same_employee, Err(AccountError::AlreadyRegistered)));

        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn mail_failure_keeps_row() {
        let (service, store, mailer) = test_service().await;
        mailer.fail.store(true, Ordering::SeqCst);

        let result = service.register(registration("a@b.com", "E1")).await;
        assert!(matches!(result, Err(AccountError::MailFailed)));
        assert_eq!(store.count().await.unwrap(), 1);

        // Recoverable through the resend flow once mail is back.
        mailer.fail.store(false, Ordering::SeqCst);
        service.resend_verification("a@b.com").await.unwrap();
        assert_eq!(mailer.sent_count(), 1);
    }

    #[tokio::test]
    async fn verification_token_is_single_use() {
        let (service, _, mailer) = test_service().await;

        service.register(registration("a@b.com", "E1")).await.unwrap();
        let token = token_from_body(&mailer.last_body());

        service.verify_email(&token).await.unwrap();

        let reuse = service.verify_email(&token).await;
        assert!(matches!(reuse, Err(AccountError::InvalidToken)));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let (service, store, mailer) = test_service().await;

        service.register(registration("a@b.com", "E1")).await.unwrap();
        let _ = mailer.last_body();

        store
            .set_token("a@b.com", "deadbeef", Utc::now() - Duration::minutes(1))
            .await
            .unwrap();

        let result = service.verify_email("deadbeef").await;
        assert!(matches!(result, Err(AccountError::InvalidToken)));
    }

    #[tokio::test]
    async fn login_failures_are_generic() {
        let (service, _, mailer) = test_service().await;

        service.register(registration("a@b.com", "E1")).await.unwrap();

        // Unknown email and wrong password look identical.
        assert!(matches!(
            service.login("nobody@b.com", "password1").await,
            Err(AccountError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("a@b.com", "wrongpass1").await,
            Err(AccountError::InvalidCredentials)
        ));

        // Correct credentials but unverified.
        assert!(matches!(
            service.login("a@b.com", "password1").await,
            Err(AccountError::EmailNotVerified)
        ));

        let token = token_from_body(&mailer.last_body());
        service.verify_email(&token).await.unwrap();

        let user = service.login("a@b.com", "password1").await.unwrap();
        assert!(user.is_verified);
        assert_eq!(user.email, "a@b.com");
    }

    #[tokio::test]
    async fn resend_overwrites_pending_token() {
        let (service, _, mailer) = test_service().await;

        service.register(registration("a@b.com", "E1")).await.unwrap();
        let first = token_from_body(&mailer.last_body());

        service.resend_verification("a@b.com").await.unwrap();
        let second = token_from_body(&mailer.last_body());
        assert_ne!(first, second);

        // The overwritten token is dead; the fresh one works.
        assert!(matches!(
            service.verify_email(&first).await,
            Err(AccountError::InvalidToken)
        ));
        service.verify_email(&second).await.unwrap();

        // A verified user is never re-sent a verification email.
        assert!(matches!(
            service.resend_verification("a@b.com").await,
            Err(AccountError::AlreadyVerified)
        ));
        assert!(matches!(
            service.resend_verification("nobody@b.com").await,
            Err(AccountError::EmailNotFound)
        ));
    }

    #[tokio::test]
    async fn password_reset_flow() {
        let (service, _, mailer) = test_service().await;

        service.register(registration("a@b.com", "E1")).await.unwrap();
        let verify_token = token_from_body(&mailer.last_body());
        service.verify_email(&verify_token).await.unwrap();

        service.request_password_reset("a@b.com").await.unwrap();
        let reset_token = token_from_body(&mailer.last_body());

        assert!(service.reset_token_valid(&reset_token).await.unwrap());

        // Too-short replacement leaves the token pending.
        assert!(matches!(
            service.reset_password(&reset_token, "short").await,
            Err(AccountError::Validation(_))
        ));
        assert!(service.reset_token_valid(&reset_token).await.unwrap());

        service
            .reset_password(&reset_token, "newpassword1")
            .await
            .unwrap();

        // Token consumed; old password dead, new one works.
        assert!(matches!(
            service.reset_password(&reset_token, "newpassword2").await,
            Err(AccountError::InvalidToken)
        ));
        assert!(matches!(
            service.login("a@b.com", "password1").await,
            Err(AccountError::InvalidCredentials)
        ));
        service.login("a@b.com", "newpassword1").await.unwrap();
    }

    #[tokio::test]
    async fn reset_request_for_unknown_email() {
        let (service, _, _) = test_service().await;

        assert!(matches!(
            service.request_password_reset("nobody@b.com").await,
            Err(AccountError::EmailNotFound)
        ));
    }
}
