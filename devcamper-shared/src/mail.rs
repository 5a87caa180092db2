/// Outbound email
///
/// The only message the API sends today is the password-reset email, but the
/// [`Mailer`] trait keeps the transport swappable:
///
/// - [`SmtpMailer`]: STARTTLS relay through `lettre`
/// - [`LogMailer`]: writes the message to the log (used when SMTP is unset)
///
/// # Example
///
/// ```no_run
/// use devcamper_shared::mail::{EmailMessage, LogMailer, Mailer};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mailer = LogMailer;
/// mailer
///     .send(EmailMessage {
///         to: "john@gmail.com".into(),
///         subject: "Password reset token".into(),
///         text: "Reset link inside".into(),
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// A plain-text email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Error type for sending mail
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// Custom transport failure
    #[error("Mail delivery failed: {0}")]
    Delivery(String),
}

/// Sends email
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError>;
}

/// SMTP settings
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_name: String,
    pub from_email: String,
}

/// Builds the SMTP mailer when configured, otherwise a [`LogMailer`]
pub fn build_mailer(config: Option<&SmtpConfig>) -> Result<Arc<dyn Mailer>, MailError> {
    match config {
        Some(smtp) => Ok(Arc::new(SmtpMailer::new(smtp)?)),
        None => {
            tracing::warn!("SMTP not configured; outgoing mail will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// STARTTLS SMTP relay
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let from = Mailbox::new(
            Some(config.from_name.clone()),
            config.from_email.parse()?,
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(message.to.parse()?)
            .subject(message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.text)?;

        let response = self.transport.send(email).await?;

        tracing::info!(
            to = %message.to,
            code = %response.code(),
            "Email sent"
        );

        Ok(())
    }
}

/// Mailer that only logs
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.text,
            "Email not sent (SMTP not configured)"
        );
        Ok(())
    }
}
