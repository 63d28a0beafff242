//! Outbound email delivery.
//!
//! Handlers hand messages to a `Mailer`, which forwards them to the configured
//! `EmailSender` and only logs delivery failures. The user flow never waits on
//! or reacts to SMTP errors.
//!
//! The default sender for local dev is `LogEmailSender`, which logs the message
//! (including the verification link) and returns `Ok(())`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::APP_USER_AGENT;

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub subject: String,
    pub html_body: String,
}

/// Email delivery abstraction.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error describing why it failed.
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the message instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            subject = %message.subject,
            body = %message.html_body,
            "email send stub"
        );
        Ok(())
    }
}

#[derive(Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub from: String,
}

/// STARTTLS relay sender.
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    /// Build the relay transport and validate the sender address.
    ///
    /// # Errors
    /// Returns an error if the relay host or the from address is invalid.
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let from = config
            .from
            .parse::<Mailbox>()
            .with_context(|| format!("invalid from address: {}", config.from))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .with_context(|| format!("failed to create SMTP transport for {}", config.host))?
            .port(config.port)
            .timeout(Some(Duration::from_secs(10)));

        if let (Some(username), Some(password)) = (config.username, config.password) {
            builder = builder.credentials(Credentials::new(
                username,
                password.expose_secret().to_string(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let to = message
            .to_email
            .parse::<Mailbox>()
            .with_context(|| format!("invalid recipient address: {}", message.to_email))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .user_agent(APP_USER_AGENT.to_string())
            .header(ContentType::TEXT_HTML)
            .body(message.html_body.clone())
            .context("failed to build email message")?;

        self.transport
            .send(email)
            .await
            .context("failed to send email")?;

        Ok(())
    }
}

/// Fire-and-forget front for an `EmailSender`.
#[derive(Clone)]
pub struct Mailer {
    sender: Arc<dyn EmailSender>,
}

impl Mailer {
    #[must_use]
    pub fn new(sender: Arc<dyn EmailSender>) -> Self {
        Self { sender }
    }

    /// Send one HTML message. Failures are logged and swallowed.
    pub async fn send(&self, to: &str, subject: &str, html_body: String) {
        let message = EmailMessage {
            to_email: to.to_string(),
            subject: subject.to_string(),
            html_body,
        };

        match self.sender.send(&message).await {
            Ok(()) => info!(to_email = %message.to_email, subject = %message.subject, "email sent"),
            Err(err) => error!(
                to_email = %message.to_email,
                "email delivery failed: {err:#}"
            ),
        }
    }
}
