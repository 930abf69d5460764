//! Outbound transactional mail.
//!
//! `Mailer` is the seam the account service talks to; the production
//! implementation relays through an authenticated SMTP server with
//! STARTTLS. Send failures are reported to the caller and logged, never
//! retried.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::core::config::SmtpConfig;
use crate::core::errors::ApiError;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), ApiError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, ApiError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(ApiError::internal)?
            .port(config.port)
            .credentials(Credentials::new(
                config.user.clone(),
                config.password.clone(),
            ))
            .build();

        let from = format!("{} <{}>", config.sender_name, config.user)
            .parse()
            .map_err(ApiError::internal)?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), ApiError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse().map_err(ApiError::internal)?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(ApiError::internal)?;

        if let Err(err) = self.transport.send(message).await {
            tracing::error!("Email sending failed: {}", err);
            return Err(ApiError::internal(err));
        }

        Ok(())
    }
}
