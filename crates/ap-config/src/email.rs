//! Email notification action configuration.

use crate::mode::SourceMode;
use crate::options::{ConfigMap, Options};
use crate::validate::{check_positive, ConfigError, ValidationResult};
use ap_common::{ConfigSchema, FieldSpec};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_SMTP_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SUBJECT: &str = "Stavily Notification";
pub const MAX_SUBJECT_LEN: usize = 200;

/// Validated SMTP settings.
#[derive(Clone, PartialEq, Serialize)]
pub struct EmailNotificationConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub username: String,
    #[serde(skip)]
    pub password: String,
    /// Sender address; falls back to `username`.
    pub from_email: String,
    pub use_tls: bool,
    pub timeout: u64,
}

impl fmt::Debug for EmailNotificationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailNotificationConfig")
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("from_email", &self.from_email)
            .field("use_tls", &self.use_tls)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for EmailNotificationConfig {
    fn default() -> Self {
        Self {
            smtp_server: String::new(),
            smtp_port: DEFAULT_SMTP_PORT,
            username: String::new(),
            password: String::new(),
            from_email: String::new(),
            use_tls: true,
            timeout: DEFAULT_SMTP_TIMEOUT_SECS,
        }
    }
}

impl EmailNotificationConfig {
    /// Parse options. Live mode requires complete SMTP credentials.
    pub fn from_options(map: &ConfigMap, mode: SourceMode) -> ValidationResult<Self> {
        let opts = Options::new(map);

        let smtp_server = opts.string_or("smtp_server", "")?;
        let port = opts.i64_or("smtp_port", i64::from(DEFAULT_SMTP_PORT))?;
        let username = opts.string_or("username", "")?;
        let password = opts.string_or("password", "")?;
        let from_email = opts.string_or("from_email", &username)?;
        let use_tls = opts.bool_or("use_tls", true)?;
        let timeout = opts.i64_or("timeout", DEFAULT_SMTP_TIMEOUT_SECS as i64)?;

        if !(1..=i64::from(u16::MAX)).contains(&port) {
            return Err(ConfigError::OutOfRange {
                field: "smtp_port".to_string(),
                min: 1.0,
                max: f64::from(u16::MAX),
                value: port as f64,
            });
        }

        let config = Self {
            smtp_server,
            smtp_port: port as u16,
            username,
            password,
            from_email,
            use_tls,
            timeout: check_positive("timeout", timeout)?,
        };

        if mode == SourceMode::Live {
            let missing = config.missing_credentials();
            if !missing.is_empty() {
                return Err(ConfigError::MissingRequired(missing));
            }
        }
        Ok(config)
    }

    fn missing_credentials(&self) -> Vec<String> {
        [
            ("smtp_server", &self.smtp_server),
            ("username", &self.username),
            ("password", &self.password),
            ("from_email", &self.from_email),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name.to_string())
        .collect()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Schema of `execute_action` parameters returned by `get_action_config`.
    pub fn request_schema() -> ConfigSchema {
        ConfigSchema::new("Email notification configuration")
            .field(
                "to",
                FieldSpec::union(&["string", "array"], "Recipient email address(es)")
                    .required()
                    .examples([
                        json!("user@example.com"),
                        json!(["user1@example.com", "user2@example.com"]),
                    ]),
            )
            .field(
                "cc",
                FieldSpec::union(&["string", "array"], "CC email address(es)")
                    .examples([json!("cc@example.com")]),
            )
            .field(
                "bcc",
                FieldSpec::union(&["string", "array"], "BCC email address(es)")
                    .examples([json!("bcc@example.com")]),
            )
            .field(
                "subject",
                FieldSpec::new("string", "Email subject line")
                    .default_value(DEFAULT_SUBJECT)
                    .max_length(MAX_SUBJECT_LEN)
                    .examples([
                        json!("Alert: High CPU Usage"),
                        json!("System Maintenance Complete"),
                    ]),
            )
            .field(
                "body",
                FieldSpec::new("string", "Plain text email body")
                    .examples([json!("CPU usage has exceeded 90% on server-01")]),
            )
            .field(
                "html_body",
                FieldSpec::new("string", "HTML email body (optional)")
                    .examples([json!("<h1>Alert</h1><p>CPU usage high</p>")]),
            )
            .field(
                "attachments",
                FieldSpec::new("array", "List of file paths to attach")
                    .items("string")
                    .examples([json!(["/tmp/report.pdf", "/tmp/logs.txt"])]),
            )
            .example(json!({
                "to": "admin@example.com",
                "subject": "High Memory Usage Alert",
                "body": "Memory usage on server-01 has exceeded 85%"
            }))
            .example(json!({
                "to": ["admin@example.com", "ops@example.com"],
                "cc": "manager@example.com",
                "subject": "System Maintenance Report",
                "html_body": "<h2>Maintenance Complete</h2><p>All systems operational</p>",
                "attachments": ["/tmp/maintenance-report.pdf"]
            }))
            .timeout(DEFAULT_SMTP_TIMEOUT_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(value: serde_json::Value) -> ConfigMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn simulated_mode_needs_nothing() {
        let config =
            EmailNotificationConfig::from_options(&ConfigMap::new(), SourceMode::Simulated)
                .unwrap();
        assert_eq!(config.smtp_port, 587);
        assert!(config.use_tls);
        assert!(config.smtp_server.is_empty());
    }

    #[test]
    fn live_mode_lists_missing_credentials() {
        let err = EmailNotificationConfig::from_options(
            &opts(json!({"smtp_server": "smtp.example.com"})),
            SourceMode::Live,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingRequired(vec![
                "username".into(),
                "password".into(),
                "from_email".into()
            ])
        );
    }

    #[test]
    fn from_email_defaults_to_username() {
        let config = EmailNotificationConfig::from_options(
            &opts(json!({
                "smtp_server": "smtp.example.com",
                "username": "alerts@example.com",
                "password": "hunter2",
                "smtp_port": "2525",
                "use_tls": false
            })),
            SourceMode::Live,
        )
        .unwrap();
        assert_eq!(config.from_email, "alerts@example.com");
        assert_eq!(config.smtp_port, 2525);
        assert!(!config.use_tls);
    }

    #[test]
    fn port_out_of_range() {
        let err = EmailNotificationConfig::from_options(
            &opts(json!({"smtp_port": 70000})),
            SourceMode::Simulated,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { .. }));
    }

    #[test]
    fn debug_masks_password() {
        let config = EmailNotificationConfig {
            password: "hunter2".into(),
            ..EmailNotificationConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn request_schema_subject_limit() {
        let schema = EmailNotificationConfig::request_schema();
        assert_eq!(schema.required, vec!["to".to_string()]);
        assert_eq!(schema.schema["subject"].max_length, Some(200));
    }
}
