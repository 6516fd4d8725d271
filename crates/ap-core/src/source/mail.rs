//! Outgoing mail delivery.

use ap_config::EmailNotificationConfig;
use chrono::Utc;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// A message ready for delivery. Addresses are already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
    pub html_body: Option<String>,
    pub attachments: Vec<PathBuf>,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address '{address}': {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("failed to read attachment {}: {source}", path.display())]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Hands a message to a mail server; returns the Message-ID.
pub trait MailTransport {
    fn send(&self, config: &EmailNotificationConfig, mail: &OutgoingMail)
        -> Result<String, MailError>;
}

// ── SMTP ────────────────────────────────────────────────────────────────

/// Synchronous SMTP submission through `lettre`.
#[derive(Debug, Default)]
pub struct SmtpMailer;

impl SmtpMailer {
    fn build_message(
        config: &EmailNotificationConfig,
        mail: &OutgoingMail,
        message_id: &str,
    ) -> Result<Message, MailError> {
        let mut builder = Message::builder()
            .from(mailbox(&config.from_email)?)
            .subject(mail.subject.as_str())
            .message_id(Some(message_id.to_string()));
        for addr in &mail.to {
            builder = builder.to(mailbox(addr)?);
        }
        for addr in &mail.cc {
            builder = builder.cc(mailbox(addr)?);
        }
        for addr in &mail.bcc {
            builder = builder.bcc(mailbox(addr)?);
        }

        let mut content = match &mail.html_body {
            Some(html) => MultiPart::mixed()
                .multipart(MultiPart::alternative_plain_html(mail.body.clone(), html.clone())),
            None => MultiPart::mixed().singlepart(SinglePart::plain(mail.body.clone())),
        };
        for path in &mail.attachments {
            if !path.is_file() {
                warn!(path = %path.display(), "skipping attachment that is not a regular file");
                continue;
            }
            let bytes = std::fs::read(path).map_err(|source| MailError::Attachment {
                path: path.clone(),
                source,
            })?;
            content = content.singlepart(Attachment::new(file_name(path)).body(bytes, octet_stream()));
        }

        Ok(builder.multipart(content)?)
    }
}

impl MailTransport for SmtpMailer {
    fn send(
        &self,
        config: &EmailNotificationConfig,
        mail: &OutgoingMail,
    ) -> Result<String, MailError> {
        let message_id = format!("<{}@{}>", Uuid::new_v4(), domain_of(&config.from_email));
        let message = Self::build_message(config, mail, &message_id)?;

        let builder = if config.use_tls {
            SmtpTransport::starttls_relay(&config.smtp_server)?
        } else {
            SmtpTransport::builder_dangerous(&config.smtp_server)
        };
        let transport = builder
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(config.timeout()))
            .build();

        transport.send(&message)?;
        info!(
            server = %config.smtp_server,
            port = config.smtp_port,
            recipients = mail.to.len() + mail.cc.len() + mail.bcc.len(),
            %message_id,
            "email delivered"
        );
        Ok(message_id)
    }
}

fn mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|source| MailError::Address {
        address: address.to_string(),
        source,
    })
}

fn octet_stream() -> ContentType {
    ContentType::parse("application/octet-stream").unwrap_or(ContentType::TEXT_PLAIN)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string())
}

fn domain_of(address: &str) -> &str {
    address
        .rsplit_once('@')
        .map(|(_, domain)| domain)
        .filter(|domain| !domain.is_empty())
        .unwrap_or("localhost")
}

// ── Simulated ───────────────────────────────────────────────────────────

/// Logs the would-be message and always succeeds.
#[derive(Debug, Default)]
pub struct SimulatedMailer;

impl MailTransport for SimulatedMailer {
    fn send(
        &self,
        _config: &EmailNotificationConfig,
        mail: &OutgoingMail,
    ) -> Result<String, MailError> {
        let token = Uuid::new_v4().simple().to_string();
        let message_id = format!("<demo-{}-{}@stavily-demo>", Utc::now().timestamp(), &token[..8]);
        info!(
            to = %mail.to.join(", "),
            cc = %mail.cc.join(", "),
            bcc = %mail.bcc.join(", "),
            subject = %mail.subject,
            body_len = mail.body.len(),
            html_body_len = mail.html_body.as_ref().map_or(0, String::len),
            attachments = mail.attachments.len(),
            %message_id,
            "simulated email send"
        );
        Ok(message_id)
    }
}
