//! Email notification action.

use crate::plugin::{ActionOutcome, ActionPlugin, PluginCore, PluginDescriptor};
use crate::source::{MailTransport, OutgoingMail};
use ap_common::{ConfigSchema, Parameters, PluginKind};
use ap_config::email::{DEFAULT_SUBJECT, MAX_SUBJECT_LEN};
use ap_config::{string_list, ConfigError, ConfigMap, EmailNotificationConfig, Options, SourceMode};
use regex::Regex;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, info};

pub static DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    id: "email-notification",
    name: "Email Notification",
    description: "Sends email notifications for alerts, reports, and automation updates",
    kind: PluginKind::Action,
    tags: &["notification", "email", "alert", "communication"],
    categories: &["communication"],
};

static ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email address regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailRejection {
    #[error("At least one recipient email is required")]
    NoRecipients,

    #[error("Subject must be at most 200 characters")]
    SubjectTooLong,

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl From<ConfigError> for EmailRejection {
    fn from(err: ConfigError) -> Self {
        EmailRejection::InvalidParameter(err.to_string())
    }
}

pub fn is_valid_address(address: &str) -> bool {
    ADDRESS_RE.is_match(address)
}

pub struct EmailNotification {
    config: EmailNotificationConfig,
    mode: SourceMode,
    transport: Box<dyn MailTransport>,
}

impl EmailNotification {
    pub fn new(mode: SourceMode, transport: Box<dyn MailTransport>) -> Self {
        Self {
            config: EmailNotificationConfig::default(),
            mode,
            transport,
        }
    }

    pub fn config(&self) -> &EmailNotificationConfig {
        &self.config
    }

    /// Build the outgoing message from request parameters.
    pub fn validate(&self, parameters: &Parameters) -> Result<OutgoingMail, EmailRejection> {
        let to = addresses(parameters, "to")?;
        if to.is_empty() {
            return Err(EmailRejection::NoRecipients);
        }
        let cc = addresses(parameters, "cc")?;
        let bcc = addresses(parameters, "bcc")?;

        let opts = Options::new(parameters);
        let subject = opts.string_or("subject", DEFAULT_SUBJECT)?;
        if subject.chars().count() > MAX_SUBJECT_LEN {
            return Err(EmailRejection::SubjectTooLong);
        }
        let body = opts.string_or("body", "")?;
        let html_body = Some(opts.string_or("html_body", "")?).filter(|html| !html.is_empty());
        let attachments = opts
            .string_list_or("attachments", &[])?
            .into_iter()
            .map(PathBuf::from)
            .collect();

        Ok(OutgoingMail {
            to,
            cc,
            bcc,
            subject,
            body,
            html_body,
            attachments,
        })
    }
}

/// Optional string-or-list address field; every entry must look like an address.
fn addresses(parameters: &Parameters, field: &str) -> Result<Vec<String>, EmailRejection> {
    let list = match parameters.get(field) {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => string_list(field, value)?,
    };
    let list: Vec<String> = list
        .into_iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();
    if let Some(bad) = list.iter().find(|a| !is_valid_address(a)) {
        return Err(EmailRejection::InvalidAddress(bad.clone()));
    }
    Ok(list)
}

impl PluginCore for EmailNotification {
    fn descriptor(&self) -> &'static PluginDescriptor {
        &DESCRIPTOR
    }

    fn configure(&mut self, options: &ConfigMap) -> Result<(), ConfigError> {
        self.config = EmailNotificationConfig::from_options(options, self.mode)?;
        Ok(())
    }

    fn health_metrics(&self) -> Value {
        let (server, from) = if self.mode.is_simulated() {
            ("demo-smtp-server", "demo@example.com")
        } else {
            (self.config.smtp_server.as_str(), self.config.from_email.as_str())
        };
        json!({
            "demo_mode": self.mode.is_simulated(),
            "smtp_server": server,
            "smtp_port": self.config.smtp_port,
            "from_email": from,
        })
    }
}

impl ActionPlugin for EmailNotification {
    fn request_schema(&self) -> ConfigSchema {
        EmailNotificationConfig::request_schema()
    }

    fn execute(&self, parameters: &Parameters) -> ActionOutcome {
        let mail = match self.validate(parameters) {
            Ok(mail) => mail,
            Err(rejection) => {
                debug!(%rejection, "email rejected");
                return ActionOutcome::Rejected(rejection.to_string());
            }
        };

        match self.transport.send(&self.config, &mail) {
            Ok(message_id) => {
                info!(recipients = mail.to.len(), %message_id, "email sent");
                ActionOutcome::Completed(json!({
                    "recipients": mail.to,
                    "cc": mail.cc,
                    "bcc": mail.bcc,
                    "subject": mail.subject,
                    "message_id": message_id,
                    "attachments_count": mail.attachments.len(),
                    "demo_mode": self.mode.is_simulated(),
                }))
            }
            Err(err) => ActionOutcome::Failed {
                error: err.to_string(),
                data: Some(json!({
                    "recipients": mail.to,
                    "subject": mail.subject,
                })),
            },
        }
    }
}
