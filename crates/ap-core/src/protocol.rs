//! Wire shapes of the line protocol.
//!
//! Every input line is one JSON command `{"action": "<name>", ...}`; every
//! reply is one JSON object with either an `action` or a bare `error` key.

use ap_common::{
    ActionResult, ConfigSchema, HealthReport, PluginInfo, PluginKind, PluginState, TriggerEvent,
};
use serde::Serialize;
use serde_json::Value;

pub const INVALID_JSON: &str = "Invalid JSON command";

/// Every command a plugin may understand. Which ones it does depends on
/// its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionName {
    GetInfo,
    Initialize,
    Start,
    Stop,
    GetStatus,
    GetHealth,
    ExecuteAction,
    GetActionConfig,
    DetectTriggers,
    GetTriggerConfig,
}

impl ActionName {
    pub const ALL: [ActionName; 10] = [
        ActionName::GetInfo,
        ActionName::Initialize,
        ActionName::Start,
        ActionName::Stop,
        ActionName::GetStatus,
        ActionName::GetHealth,
        ActionName::ExecuteAction,
        ActionName::GetActionConfig,
        ActionName::DetectTriggers,
        ActionName::GetTriggerConfig,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionName::GetInfo => "get_info",
            ActionName::Initialize => "initialize",
            ActionName::Start => "start",
            ActionName::Stop => "stop",
            ActionName::GetStatus => "get_status",
            ActionName::GetHealth => "get_health",
            ActionName::ExecuteAction => "execute_action",
            ActionName::GetActionConfig => "get_action_config",
            ActionName::DetectTriggers => "detect_triggers",
            ActionName::GetTriggerConfig => "get_trigger_config",
        }
    }

    /// The plugin kind a command is restricted to; `None` for common commands.
    pub fn kind(self) -> Option<PluginKind> {
        match self {
            ActionName::ExecuteAction | ActionName::GetActionConfig => Some(PluginKind::Action),
            ActionName::DetectTriggers | ActionName::GetTriggerConfig => Some(PluginKind::Trigger),
            _ => None,
        }
    }

    /// Look up `name` in the table for a plugin of `kind`.
    pub fn parse(name: &str, kind: PluginKind) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == name && a.kind().map_or(true, |k| k == kind))
    }
}

/// Payload of a successful reply.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResponseData {
    Info(PluginInfo),
    Status(PluginState),
    Health(HealthReport),
    ActionResult(ActionResult),
    /// `null` when nothing fired.
    Trigger(Option<TriggerEvent>),
    Schema(ConfigSchema),
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Action {
        action: Value,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<ResponseData>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Error {
        error: String,
    },
}

impl Reply {
    pub fn success(action: ActionName, data: Option<ResponseData>) -> Self {
        Reply::Action {
            action: Value::from(action.as_str()),
            success: true,
            data,
            error: None,
        }
    }

    pub fn failure(action: ActionName, error: impl Into<String>) -> Self {
        Reply::Action {
            action: Value::from(action.as_str()),
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Echoes whatever was in the `action` field (`null` when absent).
    pub fn unknown_action(action: Value) -> Self {
        let name = match &action {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Reply::Action {
            action,
            success: false,
            data: None,
            error: Some(format!("Unknown action: {name}")),
        }
    }

    pub fn invalid_json() -> Self {
        Reply::Error {
            error: INVALID_JSON.to_string(),
        }
    }

    pub fn plugin_error(message: impl std::fmt::Display) -> Self {
        Reply::Error {
            error: format!("Plugin error: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_specific_names_are_filtered() {
        assert_eq!(
            ActionName::parse("execute_action", PluginKind::Action),
            Some(ActionName::ExecuteAction)
        );
        assert_eq!(ActionName::parse("execute_action", PluginKind::Trigger), None);
        assert_eq!(ActionName::parse("detect_triggers", PluginKind::Action), None);
        assert_eq!(
            ActionName::parse("get_health", PluginKind::Trigger),
            Some(ActionName::GetHealth)
        );
        assert_eq!(ActionName::parse("GET_INFO", PluginKind::Trigger), None);
    }

    #[test]
    fn names_round_trip_through_table() {
        for name in ActionName::ALL {
            let kind = name.kind().unwrap_or(PluginKind::Action);
            assert_eq!(ActionName::parse(name.as_str(), kind), Some(name));
        }
    }

    #[test]
    fn no_event_serializes_as_null_data() {
        let reply = Reply::success(ActionName::DetectTriggers, Some(ResponseData::Trigger(None)));
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"action": "detect_triggers", "success": true, "data": null})
        );
    }

    #[test]
    fn status_is_a_bare_string() {
        let reply = Reply::success(ActionName::GetStatus, Some(ResponseData::Status(PluginState::Running)));
        assert_eq!(serde_json::to_value(&reply).unwrap()["data"], "running");
    }

    #[test]
    fn acknowledgement_has_no_data_key() {
        let text = serde_json::to_string(&Reply::success(ActionName::Start, None)).unwrap();
        assert_eq!(text, r#"{"action":"start","success":true}"#);
    }

    #[test]
    fn unknown_action_echoes_value() {
        assert_eq!(
            serde_json::to_value(Reply::unknown_action(Value::Null)).unwrap(),
            json!({"action": null, "success": false, "error": "Unknown action: null"})
        );
        assert_eq!(
            serde_json::to_value(Reply::unknown_action(json!("reboot"))).unwrap()["error"],
            "Unknown action: reboot"
        );
    }

    #[test]
    fn bare_errors() {
        assert_eq!(
            serde_json::to_string(&Reply::invalid_json()).unwrap(),
            r#"{"error":"Invalid JSON command"}"#
        );
        assert_eq!(
            serde_json::to_value(Reply::plugin_error("boom")).unwrap(),
            json!({"error": "Plugin error: boom"})
        );
    }
}
