//! Shell command action configuration.

use crate::options::{ConfigMap, Options};
use crate::validate::{check_positive, check_positive_at_most, ValidationResult};
use ap_common::{ConfigSchema, FieldSpec};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_BLOCKED_COMMANDS: &[&str] = &["rm", "rmdir", "dd", "mkfs", "fdisk", "format"];
pub const DEFAULT_ALLOWED_PATHS: &[&str] = &["/tmp", "/var/tmp"];
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_MAX_OUTPUT_SIZE: u64 = 1024 * 1024;
pub const DEFAULT_WORKING_DIR: &str = "/tmp";

/// Longest timeout accepted in the options or on a single request.
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 3600;

/// Validated shell command settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellCommandConfig {
    /// Executables that may run. Empty disables the allow-list.
    pub allowed_commands: Vec<String>,
    pub blocked_commands: Vec<String>,
    /// Working directory prefixes. Empty allows any directory.
    pub allowed_paths: Vec<String>,
    /// Default wall-clock limit per command, in seconds.
    pub timeout: u64,
    /// Per-stream output cap, in bytes.
    pub max_output_size: u64,
}

impl Default for ShellCommandConfig {
    fn default() -> Self {
        Self {
            allowed_commands: Vec::new(),
            blocked_commands: DEFAULT_BLOCKED_COMMANDS.iter().map(|s| s.to_string()).collect(),
            allowed_paths: DEFAULT_ALLOWED_PATHS.iter().map(|s| s.to_string()).collect(),
            timeout: DEFAULT_TIMEOUT_SECS,
            max_output_size: DEFAULT_MAX_OUTPUT_SIZE,
        }
    }
}

impl ShellCommandConfig {
    pub fn from_options(map: &ConfigMap) -> ValidationResult<Self> {
        let opts = Options::new(map);

        let timeout = opts.i64_or("timeout", DEFAULT_TIMEOUT_SECS as i64)?;
        let max_output_size = opts.i64_or("max_output_size", DEFAULT_MAX_OUTPUT_SIZE as i64)?;

        Ok(Self {
            allowed_commands: opts.string_list_or("allowed_commands", &[])?,
            blocked_commands: opts.string_list_or("blocked_commands", DEFAULT_BLOCKED_COMMANDS)?,
            allowed_paths: opts.string_list_or("allowed_paths", DEFAULT_ALLOWED_PATHS)?,
            timeout: check_positive_at_most("timeout", timeout, MAX_REQUEST_TIMEOUT_SECS)?,
            max_output_size: check_positive("max_output_size", max_output_size)?,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn output_limit(&self) -> usize {
        usize::try_from(self.max_output_size).unwrap_or(usize::MAX)
    }

    /// Schema of `execute_action` parameters returned by `get_action_config`.
    pub fn request_schema() -> ConfigSchema {
        ConfigSchema::new("Shell command execution configuration")
            .field(
                "command",
                FieldSpec::new("string", "Shell command to execute")
                    .required()
                    .examples([
                        json!("ls -la"),
                        json!("ps aux | grep nginx"),
                        json!("systemctl status nginx"),
                    ]),
            )
            .field(
                "working_dir",
                FieldSpec::new("string", "Working directory for command execution")
                    .default_value(DEFAULT_WORKING_DIR)
                    .examples([json!("/tmp"), json!("/var/log"), json!("/home/user")]),
            )
            .field(
                "env_vars",
                FieldSpec::new("object", "Environment variables to set").examples([json!({
                    "PATH": "/usr/local/bin:/usr/bin:/bin",
                    "LANG": "en_US.UTF-8"
                })]),
            )
            .field(
                "input",
                FieldSpec::new("string", "Input data to pass to command via stdin")
                    .examples([json!("yes\n"), json!("user input data")]),
            )
            .field(
                "timeout",
                FieldSpec::new("integer", "Command timeout in seconds")
                    .default_value(DEFAULT_TIMEOUT_SECS)
                    .minimum(1)
                    .maximum(MAX_REQUEST_TIMEOUT_SECS),
            )
            .example(json!({"command": "ls -la /var/log", "working_dir": "/tmp"}))
            .example(json!({"command": "systemctl status nginx", "timeout": 30}))
            .example(json!({
                "command": "grep ERROR /var/log/application.log | tail -10",
                "working_dir": "/var/log"
            }))
            .timeout(MAX_REQUEST_TIMEOUT_SECS)
    }
}
