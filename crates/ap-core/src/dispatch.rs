//! Line-oriented command loop.
//!
//! Reads one JSON command per line, routes it through the fixed action
//! table and writes exactly one JSON reply per non-blank line. Nothing a
//! single line contains can end the loop; only end of input or a failed
//! write does.

use crate::protocol::{ActionName, Reply, ResponseData};
use crate::runtime::PluginRuntime;
use ap_common::{ActionRequest, Error, Result};
use ap_config::ConfigMap;
use serde_json::{Map, Value};
use std::any::Any;
use std::io::{BufRead, Write};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info, warn};

/// Counters reported when the loop ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ServeStats {
    pub lines: u64,
    pub replies: u64,
}

pub struct Dispatcher {
    runtime: PluginRuntime,
}

impl Dispatcher {
    pub fn new(runtime: PluginRuntime) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &PluginRuntime {
        &self.runtime
    }

    /// Handle one input line. Blank lines produce no reply.
    pub fn handle_line(&mut self, line: &str) -> Option<Reply> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let command: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(err) => {
                debug!(error = %err, "unparseable command line");
                return Some(Reply::invalid_json());
            }
        };

        match panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(command))) {
            Ok(reply) => Some(reply),
            Err(payload) => {
                self.runtime.record_error();
                let message = panic_message(payload.as_ref());
                error!(%message, "handler panicked");
                Some(Reply::plugin_error(message))
            }
        }
    }

    fn dispatch(&mut self, command: Value) -> Reply {
        let Value::Object(mut command) = command else {
            return Reply::plugin_error(Error::NotAnObject);
        };
        let raw = command.remove("action").unwrap_or(Value::Null);
        let Some(action) = raw
            .as_str()
            .and_then(|name| ActionName::parse(name, self.runtime.kind()))
        else {
            debug!(action = %raw, "unknown action");
            return Reply::unknown_action(raw);
        };

        match self.handle(action, &mut command) {
            Ok(data) => Reply::success(action, data),
            Err(err) => {
                warn!(action = action.as_str(), code = err.code(), error = %err, "command failed");
                Reply::failure(action, err.to_string())
            }
        }
    }

    fn handle(
        &mut self,
        action: ActionName,
        command: &mut Map<String, Value>,
    ) -> Result<Option<ResponseData>> {
        let rt = &mut self.runtime;
        let data = match action {
            ActionName::GetInfo => Some(ResponseData::Info(rt.info())),
            ActionName::Initialize => {
                let config = config_map(command.remove("config"))?;
                rt.initialize(&config)?;
                None
            }
            ActionName::Start => {
                rt.start()?;
                None
            }
            ActionName::Stop => {
                rt.stop()?;
                None
            }
            ActionName::GetStatus => Some(ResponseData::Status(rt.state())),
            ActionName::GetHealth => Some(ResponseData::Health(rt.health())),
            ActionName::ExecuteAction => {
                let request = action_request(command.remove("action_request"))?;
                Some(ResponseData::ActionResult(rt.execute(&request)?))
            }
            ActionName::DetectTriggers => Some(ResponseData::Trigger(rt.detect()?)),
            ActionName::GetActionConfig | ActionName::GetTriggerConfig => {
                Some(ResponseData::Schema(rt.schema()))
            }
        };
        Ok(data)
    }

    /// Serve until end of input. Invalid UTF-8 is replaced, not rejected.
    pub fn serve<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> Result<ServeStats> {
        let plugin = self.runtime.info().id;
        info!(%plugin, kind = ?self.runtime.kind(), "plugin ready");

        let mut stats = ServeStats::default();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            stats.lines += 1;
            let line = String::from_utf8_lossy(&buf);
            let Some(reply) = self.handle_line(&line) else {
                continue;
            };
            let mut text = serde_json::to_string(&reply)?;
            text.push('\n');
            output.write_all(text.as_bytes())?;
            output.flush()?;
            stats.replies += 1;
        }

        info!(%plugin, lines = stats.lines, replies = stats.replies, "input closed");
        Ok(stats)
    }
}

fn config_map(value: Option<Value>) -> Result<ConfigMap> {
    match value {
        None | Some(Value::Null) => Ok(ConfigMap::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(Error::invalid_request("config", "must be a JSON object")),
    }
}

fn action_request(value: Option<Value>) -> Result<ActionRequest> {
    let value = value.ok_or_else(|| Error::invalid_request("action_request", "missing"))?;
    serde_json::from_value(value).map_err(|e| Error::invalid_request("action_request", e.to_string()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use ap_config::SourceMode;
    use serde_json::json;

    fn disk() -> Dispatcher {
        Dispatcher::new(PluginRuntime::new(catalog::disk_space_monitor(SourceMode::Simulated)))
    }

    fn shell() -> Dispatcher {
        Dispatcher::new(PluginRuntime::new(catalog::shell_command(SourceMode::Simulated)))
    }

    fn send(d: &mut Dispatcher, line: &str) -> Value {
        serde_json::to_value(d.handle_line(line).unwrap()).unwrap()
    }

    // ── Framing ─────────────────────────────────────────────────────

    #[test]
    fn blank_lines_are_skipped() {
        assert!(disk().handle_line("   ").is_none());
    }

    #[test]
    fn invalid_json_then_recovery() {
        let mut d = disk();
        assert_eq!(send(&mut d, "{not json"), json!({"error": "Invalid JSON command"}));
        assert_eq!(send(&mut d, r#"{"action":"get_status"}"#)["data"], "stopped");
    }

    #[test]
    fn non_object_is_plugin_error() {
        assert_eq!(
            send(&mut disk(), "[1,2]"),
            json!({"error": "Plugin error: command must be a JSON object"})
        );
    }

    #[test]
    fn missing_and_foreign_actions_are_unknown() {
        let mut d = disk();
        assert_eq!(
            send(&mut d, r#"{"config":{}}"#),
            json!({"action": null, "success": false, "error": "Unknown action: null"})
        );
        let reply = send(&mut d, r#"{"action":"execute_action","action_request":{"id":"x"}}"#);
        assert_eq!(reply["error"], "Unknown action: execute_action");
        assert_eq!(reply["action"], "execute_action");
    }

    // ── Lifecycle commands ──────────────────────────────────────────

    #[test]
    fn failed_initialize_reports_error() {
        let mut d = disk();
        let reply = send(
            &mut d,
            r#"{"action":"initialize","config":{"threshold":95,"critical_threshold":90}}"#,
        );
        assert_eq!(reply["success"], false);
        assert!(reply["error"].as_str().unwrap().contains("critical_threshold"));
        assert_eq!(send(&mut d, r#"{"action":"get_status"}"#)["data"], "error");
    }

    #[test]
    fn non_object_config_leaves_state_alone() {
        let mut d = disk();
        let reply = send(&mut d, r#"{"action":"initialize","config":[1]}"#);
        assert_eq!(reply["error"], "invalid config: must be a JSON object");
        assert_eq!(send(&mut d, r#"{"action":"get_status"}"#)["data"], "stopped");
    }

    #[test]
    fn detect_scenario() {
        let mut d = disk();
        let init = send(
            &mut d,
            r#"{"action":"initialize","config":{"threshold":85,"critical_threshold":95}}"#,
        );
        assert_eq!(init, json!({"action": "initialize", "success": true}));
        assert_eq!(send(&mut d, r#"{"action":"start"}"#)["success"], true);

        let reply = send(&mut d, r#"{"action":"detect_triggers"}"#);
        assert_eq!(reply["success"], true);
        assert_eq!(reply["data"]["type"], "disk.space.critical");
        assert_eq!(reply["data"]["data"]["alert_level"], "critical");
    }

    #[test]
    fn detect_when_stopped_is_null() {
        let reply = send(&mut disk(), r#"{"action":"detect_triggers"}"#);
        assert_eq!(reply, json!({"action": "detect_triggers", "success": true, "data": null}));
    }

    // ── Action commands ─────────────────────────────────────────────

    #[test]
    fn blocked_command_fails_result() {
        let mut d = shell();
        send(&mut d, r#"{"action":"start"}"#);
        let reply = send(
            &mut d,
            r#"{"action":"execute_action","action_request":{"id":"r1","parameters":{"command":"rm -rf /"}}}"#,
        );
        assert_eq!(reply["success"], true);
        assert_eq!(reply["data"]["status"], "failed");
        assert_eq!(reply["data"]["id"], "r1");
        assert!(reply["data"]["error"].as_str().unwrap().contains("blocked"));
        assert!(reply["data"].get("data").is_none());
    }

    #[test]
    fn malformed_action_request() {
        let mut d = shell();
        let reply = send(&mut d, r#"{"action":"execute_action","action_request":{"parameters":{}}}"#);
        assert_eq!(reply["success"], false);
        assert!(reply["error"].as_str().unwrap().starts_with("invalid action_request: "));
    }

    #[test]
    fn schema_and_info() {
        let mut d = shell();
        let schema = send(&mut d, r#"{"action":"get_action_config"}"#);
        assert_eq!(schema["data"]["required"], json!(["command"]));
        let info = send(&mut d, r#"{"action":"get_info"}"#);
        assert_eq!(info["data"]["type"], "action");
        assert_eq!(info["data"]["id"], "shell-command");
    }

    // ── Loop ────────────────────────────────────────────────────────

    #[test]
    fn serve_writes_one_line_per_command() {
        let input = b"{\"action\":\"get_status\"}\n\nnot json\n{\"action\":\"start\"}".to_vec();
        let mut output = Vec::new();
        let stats = disk().serve(&input[..], &mut output).unwrap();

        assert_eq!(stats, ServeStats { lines: 4, replies: 3 });
        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            let value: Value = serde_json::from_str(line).unwrap();
            assert!(value.get("action").is_some() || value.get("error").is_some());
        }
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut input = b"{\"action\":\"get_status\",\"x\":\"".to_vec();
        input.extend_from_slice(&[0xff, 0xfe]);
        input.extend_from_slice(b"\"}\n");
        let mut output = Vec::new();
        disk().serve(&input[..], &mut output).unwrap();
        let reply: Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(reply["data"], "stopped");
    }

    #[test]
    fn panic_payloads_render() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
    }
}
