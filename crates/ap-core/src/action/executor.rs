//! Lifecycle-gated action execution.

use crate::host::HostInfo;
use crate::plugin::{ActionOutcome, ActionPlugin, PLUGIN_VERSION};
use ap_common::{ActionRequest, ActionResult, ActionStatus, ResultMetadata};
use chrono::Utc;
use std::time::Instant;
use tracing::{info, warn};

pub const NOT_RUNNING: &str = "Plugin is not running";

/// Wraps an action plugin and normalizes every outcome into an
/// [`ActionResult`] with timestamps, duration and provenance filled in.
pub struct ActionExecutor {
    plugin: Box<dyn ActionPlugin>,
    host: HostInfo,
}

impl ActionExecutor {
    pub fn new(plugin: Box<dyn ActionPlugin>, host: HostInfo) -> Self {
        Self { plugin, host }
    }

    pub fn plugin(&self) -> &dyn ActionPlugin {
        self.plugin.as_ref()
    }

    pub fn plugin_mut(&mut self) -> &mut dyn ActionPlugin {
        self.plugin.as_mut()
    }

    /// Run one request. `running` is the lifecycle gate; when false the
    /// plugin is never consulted.
    pub fn execute(&self, request: &ActionRequest, running: bool) -> ActionResult {
        let started_at = Utc::now();
        let clock = Instant::now();

        let (status, data, error) = if !running {
            (ActionStatus::Failed, None, Some(NOT_RUNNING.to_string()))
        } else {
            match self.plugin.execute(&request.parameters) {
                ActionOutcome::Completed(data) => (ActionStatus::Completed, Some(data), None),
                ActionOutcome::Rejected(reason) => (ActionStatus::Failed, None, Some(reason)),
                ActionOutcome::Failed { error, data } => (ActionStatus::Failed, data, Some(error)),
            }
        };

        let duration = clock.elapsed().as_secs_f64();
        let plugin_id = self.plugin.descriptor().id;
        match &error {
            None => info!(plugin = plugin_id, request_id = %request.id, duration, "action completed"),
            Some(reason) => warn!(plugin = plugin_id, request_id = %request.id, %reason, "action failed"),
        }

        ActionResult {
            id: request.id.clone(),
            status,
            started_at,
            completed_at: Utc::now(),
            duration,
            data,
            error,
            metadata: ResultMetadata {
                plugin_id: plugin_id.to_string(),
                plugin_version: PLUGIN_VERSION.to_string(),
                execution_host: self.host.hostname.clone(),
            },
        }
    }
}
