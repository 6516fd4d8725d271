//! Shell command action.
//!
//! Requests are checked in a fixed order (syntax, block list, allow list,
//! working directory, dangerous patterns) and the first failing rule wins.
//! A rejected request never reaches the runner.

use crate::plugin::{ActionOutcome, ActionPlugin, PluginCore, PluginDescriptor};
use crate::source::shell::executable_name;
use crate::source::{CommandRunner, CommandSpec, RunError};
use ap_common::{ConfigSchema, Parameters, PluginKind};
use ap_config::shell::{DEFAULT_WORKING_DIR, MAX_REQUEST_TIMEOUT_SECS};
use ap_config::{ConfigError, ConfigMap, Options, ShellCommandConfig, SourceMode};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub static DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    id: "shell-command",
    name: "Shell Command",
    description: "Executes shell commands safely with configurable restrictions",
    kind: PluginKind::Action,
    tags: &["system", "command", "shell", "automation", "execution"],
    categories: &["system-management"],
};

/// Substrings refused anywhere in the lower-cased command line.
pub const DANGEROUS_PATTERNS: &[&str] = &["rm -rf", ":(){ :|:& };:", "chmod 777", "chown root"];

/// Why a request was refused before execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandRejection {
    #[error("Command parameter is required")]
    MissingCommand,

    #[error("Empty command")]
    Empty,

    #[error("Invalid command syntax: {0}")]
    Syntax(String),

    #[error("Command '{0}' is blocked for security")]
    Blocked(String),

    #[error("Command '{0}' is not in allowed list")]
    NotAllowed(String),

    #[error("Working directory '{0}' is not allowed")]
    WorkingDirNotAllowed(String),

    #[error("Command contains dangerous pattern: {0}")]
    DangerousPattern(&'static str),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl From<ConfigError> for CommandRejection {
    fn from(err: ConfigError) -> Self {
        CommandRejection::InvalidParameter(err.to_string())
    }
}

pub struct ShellCommand {
    config: ShellCommandConfig,
    mode: SourceMode,
    runner: Box<dyn CommandRunner>,
}

impl ShellCommand {
    pub fn new(mode: SourceMode, runner: Box<dyn CommandRunner>) -> Self {
        Self {
            config: ShellCommandConfig::default(),
            mode,
            runner,
        }
    }

    pub fn config(&self) -> &ShellCommandConfig {
        &self.config
    }

    /// Turn request parameters into a runnable spec, or say why not.
    pub fn validate(&self, parameters: &Parameters) -> Result<CommandSpec, CommandRejection> {
        let command = match parameters.get("command") {
            None | Some(Value::Null) => return Err(CommandRejection::MissingCommand),
            Some(Value::String(s)) if s.is_empty() => return Err(CommandRejection::MissingCommand),
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                return Err(CommandRejection::InvalidParameter(
                    "command must be a string".to_string(),
                ))
            }
        };
        let opts = Options::new(parameters);
        let working_dir = opts.string_or("working_dir", DEFAULT_WORKING_DIR)?;
        let input = opts.string_or("input", "")?;
        let timeout = opts.i64_or("timeout", self.config.timeout as i64)?;
        if !(1..=MAX_REQUEST_TIMEOUT_SECS as i64).contains(&timeout) {
            return Err(CommandRejection::InvalidParameter(format!(
                "timeout must be between 1 and {MAX_REQUEST_TIMEOUT_SECS} seconds"
            )));
        }
        let env_vars = env_vars(parameters.get("env_vars"))?;

        let tokens =
            shell_words::split(&command).map_err(|e| CommandRejection::Syntax(e.to_string()))?;
        let Some(first) = tokens.first() else {
            return Err(CommandRejection::Empty);
        };
        let name = executable_name(first);

        if self.config.blocked_commands.iter().any(|b| b == name) {
            return Err(CommandRejection::Blocked(name.to_string()));
        }
        if !self.config.allowed_commands.is_empty()
            && !self.config.allowed_commands.iter().any(|a| a == name)
        {
            return Err(CommandRejection::NotAllowed(name.to_string()));
        }
        if !self.config.allowed_paths.is_empty()
            && !self
                .config
                .allowed_paths
                .iter()
                .any(|p| working_dir.starts_with(p.as_str()))
        {
            return Err(CommandRejection::WorkingDirNotAllowed(working_dir));
        }
        let lowered = command.to_lowercase();
        if let Some(pattern) = DANGEROUS_PATTERNS.iter().copied().find(|p| lowered.contains(*p)) {
            return Err(CommandRejection::DangerousPattern(pattern));
        }

        Ok(CommandSpec {
            command,
            working_dir,
            env_vars,
            input,
            timeout: Duration::from_secs(timeout as u64),
            max_output: self.config.output_limit(),
        })
    }
}

fn env_vars(value: Option<&Value>) -> Result<BTreeMap<String, String>, CommandRejection> {
    let invalid =
        || CommandRejection::InvalidParameter("env_vars must be an object of strings".to_string());
    match value {
        None | Some(Value::Null) => Ok(BTreeMap::new()),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => Ok((k.clone(), s.clone())),
                Value::Number(n) => Ok((k.clone(), n.to_string())),
                Value::Bool(b) => Ok((k.clone(), b.to_string())),
                _ => Err(invalid()),
            })
            .collect(),
        Some(_) => Err(invalid()),
    }
}

impl PluginCore for ShellCommand {
    fn descriptor(&self) -> &'static PluginDescriptor {
        &DESCRIPTOR
    }

    fn configure(&mut self, options: &ConfigMap) -> Result<(), ConfigError> {
        self.config = ShellCommandConfig::from_options(options)?;
        Ok(())
    }

    fn health_metrics(&self) -> Value {
        json!({
            "demo_mode": self.mode.is_simulated(),
            "timeout": self.config.timeout,
            "max_output_size": self.config.max_output_size,
            "allowed_commands_count": self.config.allowed_commands.len(),
            "blocked_commands_count": self.config.blocked_commands.len(),
        })
    }
}

impl ActionPlugin for ShellCommand {
    fn request_schema(&self) -> ConfigSchema {
        ShellCommandConfig::request_schema()
    }

    fn execute(&self, parameters: &Parameters) -> ActionOutcome {
        let spec = match self.validate(parameters) {
            Ok(spec) => spec,
            Err(rejection) => {
                debug!(%rejection, "command rejected");
                return ActionOutcome::Rejected(rejection.to_string());
            }
        };

        match self.runner.run(&spec) {
            Ok(output) if output.succeeded() => ActionOutcome::Completed(json!({
                "command": spec.command,
                "working_dir": spec.working_dir,
                "return_code": output.return_code,
                "stdout": output.stdout,
                "stderr": output.stderr,
                "execution_time": output.execution_time,
                "output_incomplete": output.output_incomplete,
                "demo_mode": self.mode.is_simulated(),
            })),
            Ok(output) => ActionOutcome::Failed {
                error: format!("Command exited with code {}", output.return_code),
                data: Some(json!({
                    "command": spec.command,
                    "return_code": output.return_code,
                    "stdout": output.stdout,
                    "stderr": output.stderr,
                    "output_incomplete": output.output_incomplete,
                })),
            },
            Err(err) => {
                let error = err.to_string();
                let data = match err {
                    RunError::TimedOut { stdout, stderr, .. } => Some(json!({
                        "command": spec.command,
                        "return_code": -1,
                        "stdout": stdout,
                        "stderr": stderr,
                    })),
                    _ => None,
                };
                ActionOutcome::Failed { error, data }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{CommandOutput, SimulatedRunner, SubprocessRunner};
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Records every spec it is handed and answers with a fixed result.
    struct Recording {
        seen: RefCell<Vec<CommandSpec>>,
        answer: fn() -> Result<CommandOutput, RunError>,
    }

    impl CommandRunner for std::rc::Rc<Recording> {
        fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, RunError> {
            self.seen.borrow_mut().push(spec.clone());
            (self.answer)()
        }
    }

    fn ok_output() -> Result<CommandOutput, RunError> {
        Ok(CommandOutput {
            return_code: 0,
            stdout: "ok".to_string(),
            stderr: String::new(),
            execution_time: 0.01,
            output_incomplete: false,
        })
    }

    fn recording(answer: fn() -> Result<CommandOutput, RunError>) -> (ShellCommand, std::rc::Rc<Recording>) {
        let rec = std::rc::Rc::new(Recording {
            seen: RefCell::new(Vec::new()),
            answer,
        });
        let plugin = ShellCommand::new(SourceMode::Simulated, Box::new(rec.clone()));
        (plugin, rec)
    }

    fn params(value: Value) -> Parameters {
        value.as_object().unwrap().clone()
    }

    fn rejection(plugin: &ShellCommand, value: Value) -> String {
        match plugin.execute(&params(value)) {
            ActionOutcome::Rejected(reason) => reason,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    // ── Validation ──────────────────────────────────────────────────

    #[test]
    fn rm_rf_is_blocked_before_running() {
        let (plugin, rec) = recording(ok_output);
        let reason = rejection(&plugin, json!({"command": "rm -rf /"}));
        assert_eq!(reason, "Command 'rm' is blocked for security");
        assert!(rec.seen.borrow().is_empty());
    }

    #[test]
    fn missing_and_empty_commands() {
        let (plugin, _) = recording(ok_output);
        assert_eq!(rejection(&plugin, json!({})), "Command parameter is required");
        assert_eq!(rejection(&plugin, json!({"command": ""})), "Command parameter is required");
        assert_eq!(rejection(&plugin, json!({"command": "   "})), "Empty command");
    }

    #[test]
    fn unbalanced_quotes_are_syntax_errors() {
        let (plugin, _) = recording(ok_output);
        let reason = rejection(&plugin, json!({"command": "echo 'oops"}));
        assert!(reason.starts_with("Invalid command syntax: "), "{reason}");
    }

    #[test]
    fn block_list_matches_basename() {
        let (plugin, _) = recording(ok_output);
        let reason = rejection(&plugin, json!({"command": "/usr/bin/dd if=/dev/zero"}));
        assert_eq!(reason, "Command 'dd' is blocked for security");
    }

    #[test]
    fn configured_timeout_is_capped_and_used_as_default() {
        let (mut plugin, rec) = recording(ok_output);
        assert!(plugin.configure(&params(json!({"timeout": 7200}))).is_err());
        assert_eq!(plugin.config().timeout, 300);

        plugin.configure(&params(json!({"timeout": 3600}))).unwrap();
        assert!(matches!(
            plugin.execute(&params(json!({"command": "ls"}))),
            ActionOutcome::Completed(_)
        ));
        assert_eq!(rec.seen.borrow()[0].timeout, Duration::from_secs(3600));
    }

    #[test]
    fn allow_list_restricts_executables() {
        let (mut plugin, _) = recording(ok_output);
        plugin
            .configure(&params(json!({"allowed_commands": ["ls", "df"]})))
            .unwrap();
        let reason = rejection(&plugin, json!({"command": "cat /etc/hostname"}));
        assert_eq!(reason, "Command 'cat' is not in allowed list");
        assert!(matches!(
            plugin.execute(&params(json!({"command": "df -h"}))),
            ActionOutcome::Completed(_)
        ));
    }

    #[test]
    fn working_dir_must_be_under_allowed_prefix() {
        let (plugin, _) = recording(ok_output);
        let reason = rejection(&plugin, json!({"command": "ls", "working_dir": "/etc"}));
        assert_eq!(reason, "Working directory '/etc' is not allowed");
    }

    #[test]
    fn dangerous_patterns_are_case_insensitive() {
        let (plugin, _) = recording(ok_output);
        let reason = rejection(&plugin, json!({"command": "CHMOD 777 /tmp/x"}));
        assert_eq!(reason, "Command contains dangerous pattern: chmod 777");
    }

    #[test]
    fn request_timeout_is_bounded() {
        let (plugin, _) = recording(ok_output);
        let reason = rejection(&plugin, json!({"command": "ls", "timeout": 0}));
        assert!(reason.contains("timeout must be between 1 and 3600"), "{reason}");
    }

    #[test]
    fn spec_carries_request_settings() {
        let (plugin, rec) = recording(ok_output);
        plugin.execute(&params(json!({
            "command": "env",
            "working_dir": "/var/tmp",
            "env_vars": {"APP_ENV": "test", "RETRIES": 3},
            "input": "hello",
            "timeout": "15"
        })));
        let seen = rec.seen.borrow();
        let spec = &seen[0];
        assert_eq!(spec.working_dir, "/var/tmp");
        assert_eq!(spec.env_vars["APP_ENV"], "test");
        assert_eq!(spec.env_vars["RETRIES"], "3");
        assert_eq!(spec.input, "hello");
        assert_eq!(spec.timeout, Duration::from_secs(15));
        assert_eq!(spec.max_output, 1024 * 1024);
    }

    // ── Outcomes ────────────────────────────────────────────────────

    #[test]
    fn simulated_ls_completes() {
        let plugin = ShellCommand::new(SourceMode::Simulated, Box::new(SimulatedRunner));
        let ActionOutcome::Completed(data) = plugin.execute(&params(json!({"command": "ls -la"}))) else {
            panic!("expected completion");
        };
        assert_eq!(data["return_code"], 0);
        assert_eq!(data["working_dir"], "/tmp");
        assert_eq!(data["demo_mode"], true);
        assert!(data["stdout"].as_str().unwrap().contains("file1.txt"));
    }

    #[test]
    fn simulated_false_fails_with_partial_data() {
        let plugin = ShellCommand::new(SourceMode::Simulated, Box::new(SimulatedRunner));
        let ActionOutcome::Failed { error, data } = plugin.execute(&params(json!({"command": "false"}))) else {
            panic!("expected failure");
        };
        assert_eq!(error, "Command exited with code 1");
        let data = data.unwrap();
        assert_eq!(data["return_code"], 1);
        assert!(data["stderr"].as_str().unwrap().contains("Simulated error"));
    }

    #[test]
    fn timeout_reports_partial_output() {
        fn timed_out() -> Result<CommandOutput, RunError> {
            Err(RunError::TimedOut {
                seconds: 5,
                stdout: "partial".to_string(),
                stderr: String::new(),
            })
        }
        let (plugin, _) = recording(timed_out);
        let ActionOutcome::Failed { error, data } = plugin.execute(&params(json!({"command": "sleep 60"}))) else {
            panic!("expected failure");
        };
        assert_eq!(error, "Command timed out after 5 seconds");
        assert_eq!(data.unwrap()["stdout"], "partial");
    }

    #[test]
    fn live_runner_executes_in_allowed_dir() {
        let dir = TempDir::new_in("/tmp").unwrap();
        let plugin = ShellCommand::new(SourceMode::Live, Box::new(SubprocessRunner));
        let outcome = plugin.execute(&params(json!({
            "command": "printf \"$GREETING\"",
            "working_dir": dir.path().to_str().unwrap(),
            "env_vars": {"GREETING": "hi"}
        })));
        let ActionOutcome::Completed(data) = outcome else {
            panic!("expected completion, got {outcome:?}");
        };
        assert_eq!(data["stdout"], "hi");
        assert_eq!(data["demo_mode"], false);
        assert_eq!(data["output_incomplete"], false);
    }

    #[test]
    fn background_process_output_is_reported_incomplete() {
        let dir = TempDir::new_in("/tmp").unwrap();
        let plugin = ShellCommand::new(SourceMode::Live, Box::new(SubprocessRunner));
        let outcome = plugin.execute(&params(json!({
            "command": "echo hello; sleep 3 &",
            "working_dir": dir.path().to_str().unwrap(),
        })));
        let ActionOutcome::Completed(data) = outcome else {
            panic!("expected completion, got {outcome:?}");
        };
        assert_eq!(data["stdout"], "hello\n");
        assert_eq!(data["output_incomplete"], true);
    }

    #[test]
    fn health_metrics_reflect_config() {
        let plugin = ShellCommand::new(SourceMode::Simulated, Box::new(SimulatedRunner));
        let metrics = plugin.health_metrics();
        assert_eq!(metrics["demo_mode"], true);
        assert_eq!(metrics["timeout"], 300);
        assert_eq!(metrics["blocked_commands_count"], 6);
        assert_eq!(metrics["allowed_commands_count"], 0);
    }
}
