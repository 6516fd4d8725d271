//! Action requests and results exchanged with action plugins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Parameters of an action request: a free-form JSON object.
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// A request to execute one action. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Caller-supplied id, unique per invocation.
    pub id: String,
    #[serde(default)]
    pub parameters: Parameters,
}

/// Execution status of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Running,
    Completed,
    Failed,
}

impl ActionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ActionStatus::Running)
    }
}

/// Provenance attached to every action result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub plugin_id: String,
    pub plugin_version: String,
    pub execution_host: String,
}

/// Normalized outcome of an action request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub id: String,
    pub status: ActionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Wall-clock seconds between `started_at` and `completed_at`.
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: ResultMetadata,
}

impl ActionResult {
    pub fn is_completed(&self) -> bool {
        self.status == ActionStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_parameters_default_to_empty() {
        let req: ActionRequest = serde_json::from_str(r#"{"id": "a1"}"#).unwrap();
        assert_eq!(req.id, "a1");
        assert!(req.parameters.is_empty());
    }

    #[test]
    fn test_request_requires_id() {
        let err = serde_json::from_str::<ActionRequest>(r#"{"parameters": {}}"#).unwrap_err();
        assert!(err.to_string().contains("id"));
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&ActionStatus::Completed).unwrap(),
            r#""completed""#
        );
        assert!(ActionStatus::Failed.is_terminal());
        assert!(!ActionStatus::Running.is_terminal());
    }

    #[test]
    fn test_result_omits_absent_data_and_error() {
        let now = Utc::now();
        let result = ActionResult {
            id: "a1".to_string(),
            status: ActionStatus::Completed,
            started_at: now,
            completed_at: now,
            duration: 0.0,
            data: None,
            error: None,
            metadata: ResultMetadata {
                plugin_id: "shell-command".to_string(),
                plugin_version: "1.0.0".to_string(),
                execution_host: "host".to_string(),
            },
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("\"data\""));
        assert!(!json.contains("\"error\""));
        assert!(json.contains("\"execution_host\":\"host\""));
    }
}
