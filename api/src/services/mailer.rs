//! Outbound email over SMTP via lettre.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::Error as SmtpError;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

const SENDER_NAME: &str = "Creative ScrapCraft";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

#[rocket::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), NotificationError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// `user` is both the SMTP login and the sender address.
    pub fn new(host: &str, port: u16, user: &str, password: &str) -> Result<Self, NotificationError> {
        let credentials = Credentials::new(user.to_string(), password.to_string());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
            .port(port)
            .credentials(credentials)
            .build();
        let from = format!("{SENDER_NAME} <{user}>")
            .parse()
            .map_err(|_| NotificationError::InvalidAddress(user.to_string()))?;
        Ok(Self { transport, from })
    }
}

#[rocket::async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: Email) -> Result<(), NotificationError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|_| NotificationError::InvalidAddress(email.to.clone()))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_HTML)
            .body(email.html)?;

        self.transport.send(message).await?;
        tracing::info!(to = %email.to, subject = %email.subject, "email sent");
        Ok(())
    }
}

/// Stand-in when no SMTP credentials are configured: logs and drops.
pub struct DisabledMailer;

#[rocket::async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, email: Email) -> Result<(), NotificationError> {
        tracing::warn!(to = %email.to, subject = %email.subject, "email delivery disabled, message dropped");
        Ok(())
    }
}
