//! Optional summary mail for a completed run.
//!
//! [`Notifier`] formats a plain-text summary of a [`RunRecord`] and hands it
//! to a [`MailTransport`]. The production transport is SMTP over an
//! authenticated, encrypted session ([`SmtpMailTransport`]); tests plug in
//! their own.
//!
//! Dispatch only reads the record. Whatever happens here, the record the
//! caller already holds stays valid.

use crate::config::{MailConfig, MailSecurity};
use crate::error::NotificationError;
use crate::output::RunRecord;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A summary message ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingMail {
    /// Build the RFC 5322 message.
    pub fn to_message(&self) -> Result<Message, NotificationError> {
        let from = parse_mailbox(&self.from)?;
        let to = parse_mailbox(&self.to)?;
        Message::builder()
            .from(from)
            .to(to)
            .subject(self.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(self.body.clone())
            .map_err(|e| NotificationError::Build(e.to_string()))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotificationError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|e| NotificationError::InvalidAddress {
            address: address.to_string(),
            detail: e.to_string(),
        })
}

/// Delivers one message.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), NotificationError>;
}

/// SMTP delivery through a configured relay.
pub struct SmtpMailTransport {
    relay: String,
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    pub fn new(config: &MailConfig) -> Result<Self, NotificationError> {
        let builder = match config.security {
            MailSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.relay)
            }
            MailSecurity::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.relay),
        }
        .map_err(|e| NotificationError::Transport {
            relay: config.relay.clone(),
            detail: e.to_string(),
        })?;

        let inner = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(Duration::from_secs(config.timeout_secs)))
            .build();

        Ok(Self {
            relay: format!("{}:{}", config.relay, config.port),
            inner,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), NotificationError> {
        let message = mail.to_message()?;
        AsyncTransport::send(&self.inner, message)
            .await
            .map(|_| ())
            .map_err(|e| NotificationError::Transport {
                relay: self.relay.clone(),
                detail: e.to_string(),
            })
    }
}

/// Formats and sends run summaries.
pub struct Notifier {
    config: MailConfig,
    transport: Arc<dyn MailTransport>,
}

impl Notifier {
    /// Notifier delivering through SMTP with `config`'s relay and credentials.
    pub fn smtp(config: MailConfig) -> Result<Self, NotificationError> {
        let transport = SmtpMailTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: MailConfig, transport: Arc<dyn MailTransport>) -> Self {
        Self { config, transport }
    }

    /// Validate inputs and build the summary for `record`.
    pub fn compose(
        &self,
        record: &RunRecord,
        destination: &str,
    ) -> Result<OutgoingMail, NotificationError> {
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(NotificationError::MissingDestination);
        }
        if record.ocr_results.len() != 2 {
            return Err(NotificationError::IncompleteRun {
                found: record.ocr_results.len(),
            });
        }
        let sender = self.config.sender_address();
        parse_mailbox(sender)?;
        parse_mailbox(destination)?;
        Ok(format_summary(record, sender, destination))
    }

    /// Send the summary of `record` to `destination`.
    pub async fn dispatch(
        &self,
        record: &RunRecord,
        destination: &str,
    ) -> Result<(), NotificationError> {
        let mail = self.compose(record, destination)?;
        match self.transport.send(&mail).await {
            Ok(()) => {
                info!("Summary sent to {}", mail.to);
                Ok(())
            }
            Err(e) => {
                warn!("Summary to {} failed: {}", mail.to, e);
                Err(e)
            }
        }
    }
}

/// Plain-text summary: sender, destination, both filenames, the narrative.
pub fn format_summary(record: &RunRecord, sender: &str, destination: &str) -> OutgoingMail {
    let names = record.filenames();
    let subject = format!("Document comparison: {}", names.join(" vs "));

    let mut body = format!("From: {sender}\nTo: {destination}\n\nDocuments compared:\n");
    for (i, name) in names.iter().enumerate() {
        body.push_str(&format!("  {}. {}\n", i + 1, name));
    }
    body.push_str("\nAnalysis:\n");
    body.push_str(record.analysis.narrative.trim_end());
    body.push('\n');

    OutgoingMail {
        from: sender.to_string(),
        to: destination.to_string(),
        subject,
        body,
    }
}
