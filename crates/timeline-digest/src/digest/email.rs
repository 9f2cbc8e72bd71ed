//! Digest delivery over SMTP.

use async_trait::async_trait;
use chrono::NaiveDate;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpSettings;
use crate::error::DispatchError;

/// Display name on every digest.
pub const SENDER_NAME: &str = "Today on Twitter";

/// One outgoing digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestEmail {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub html: String,
}

/// `Today on Twitter DD.MM.YYYY`
#[must_use]
pub fn digest_subject(date: NaiveDate) -> String {
    format!("{SENDER_NAME} {}", date.format("%d.%m.%Y"))
}

/// Anything that can deliver a digest.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailDispatcher: Send + Sync {
    /// Deliver the message. Completion means the relay accepted it.
    async fn send(&self, email: &DigestEmail) -> Result<(), DispatchError>;
}

fn parse_address(address: &str) -> Result<Address, DispatchError> {
    address.parse().map_err(|e: lettre::address::AddressError| {
        DispatchError::Address {
            address: address.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Assemble the MIME message for a digest.
pub fn build_message(email: &DigestEmail) -> Result<Message, DispatchError> {
    let from = Mailbox::new(Some(SENDER_NAME.to_string()), parse_address(&email.from)?);
    let to = Mailbox::new(None, parse_address(&email.to)?);

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(&email.subject)
        .header(ContentType::TEXT_HTML)
        .body(email.html.clone())?;
    Ok(message)
}

/// SMTP relay with STARTTLS and login credentials.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
}

impl SmtpMailer {
    /// Create a mailer for the relay. No connection is made until a send.
    pub fn new(settings: &SmtpSettings) -> Result<Self, DispatchError> {
        let creds = Credentials::new(settings.username.clone(), settings.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            .port(settings.port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            host: settings.host.clone(),
        })
    }
}

#[async_trait]
impl MailDispatcher for SmtpMailer {
    async fn send(&self, email: &DigestEmail) -> Result<(), DispatchError> {
        let message = build_message(email)?;

        self.transport.send(message).await?;

        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            relay = %self.host,
            "Email sent successfully"
        );
        Ok(())
    }
}
