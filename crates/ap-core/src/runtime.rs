//! Per-process plugin runtime.
//!
//! One [`PluginRuntime`] owns everything that survives between requests:
//! the lifecycle, the plugin (behind its executor or detector), the error
//! counter and the construction time reported by `get_info`.

use crate::action::ActionExecutor;
use crate::lifecycle::{Lifecycle, LifecycleError, StartOutcome, StopOutcome};
use crate::plugin::{PluginDescriptor, PLUGIN_AUTHOR, PLUGIN_LICENSE, PLUGIN_VERSION};
use crate::trigger::TriggerDetector;
use ap_common::{
    ActionRequest, ActionResult, ConfigSchema, HealthReport, HealthStatus, PluginInfo, PluginKind,
    PluginState, TriggerEvent,
};
use ap_config::{ConfigError, ConfigMap};
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

/// A plugin tagged with the side of the protocol it implements.
pub enum PluginHandle {
    Action(ActionExecutor),
    Trigger(TriggerDetector),
}

impl PluginHandle {
    pub fn descriptor(&self) -> &'static PluginDescriptor {
        match self {
            PluginHandle::Action(exec) => exec.plugin().descriptor(),
            PluginHandle::Trigger(det) => det.plugin().descriptor(),
        }
    }

    pub fn kind(&self) -> PluginKind {
        match self {
            PluginHandle::Action(_) => PluginKind::Action,
            PluginHandle::Trigger(_) => PluginKind::Trigger,
        }
    }

    /// `get_action_config` for actions, `get_trigger_config` for triggers.
    pub fn schema(&self) -> ConfigSchema {
        match self {
            PluginHandle::Action(exec) => exec.plugin().request_schema(),
            PluginHandle::Trigger(det) => det.plugin().trigger_schema(),
        }
    }

    fn configure(&mut self, options: &ConfigMap) -> Result<(), ConfigError> {
        match self {
            PluginHandle::Action(exec) => exec.plugin_mut().configure(options),
            PluginHandle::Trigger(det) => det.plugin_mut().configure(options),
        }
    }

    fn health_metrics(&self) -> Value {
        match self {
            PluginHandle::Action(exec) => exec.plugin().health_metrics(),
            PluginHandle::Trigger(det) => det.plugin().health_metrics(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("{operation} is not supported by {kind:?} plugins")]
    WrongKind {
        operation: &'static str,
        kind: PluginKind,
    },
}

impl From<RuntimeError> for ap_common::Error {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Config(e) => ap_common::Error::Config(e.to_string()),
            RuntimeError::Lifecycle(e) => ap_common::Error::Lifecycle(e.to_string()),
            other @ RuntimeError::WrongKind { .. } => ap_common::Error::Internal(other.to_string()),
        }
    }
}

pub struct PluginRuntime {
    lifecycle: Lifecycle,
    handle: PluginHandle,
    error_count: u64,
    created_at: DateTime<Utc>,
}

impl PluginRuntime {
    pub fn new(handle: PluginHandle) -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            handle,
            error_count: 0,
            created_at: Utc::now(),
        }
    }

    pub fn handle(&self) -> &PluginHandle {
        &self.handle
    }

    pub fn kind(&self) -> PluginKind {
        self.handle.kind()
    }

    pub fn state(&self) -> PluginState {
        self.lifecycle.state()
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    /// Count a failure that happened outside the runtime (a caught panic).
    pub fn record_error(&mut self) {
        self.error_count += 1;
    }

    pub fn info(&self) -> PluginInfo {
        let d = self.handle.descriptor();
        PluginInfo {
            id: d.id.to_string(),
            name: d.name.to_string(),
            description: d.description.to_string(),
            version: PLUGIN_VERSION.to_string(),
            author: PLUGIN_AUTHOR.to_string(),
            license: PLUGIN_LICENSE.to_string(),
            kind: d.kind,
            tags: d.tags.iter().map(|t| t.to_string()).collect(),
            categories: d.categories.iter().map(|c| c.to_string()).collect(),
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }

    pub fn schema(&self) -> ConfigSchema {
        self.handle.schema()
    }

    /// Validate and adopt `options`. A rejected configuration leaves the
    /// previous one in place and moves the plugin to `error`.
    pub fn initialize(&mut self, options: &ConfigMap) -> Result<(), RuntimeError> {
        self.lifecycle.ensure_can_initialize()?;
        let now = Utc::now();
        match self.handle.configure(options) {
            Ok(()) => {
                self.lifecycle.mark_initialized(now)?;
                info!(plugin = self.handle.descriptor().id, options = options.len(), "plugin initialized");
                Ok(())
            }
            Err(err) => {
                self.lifecycle.mark_failed(now)?;
                self.error_count += 1;
                warn!(plugin = self.handle.descriptor().id, error = %err, "configuration rejected");
                Err(err.into())
            }
        }
    }

    /// Start the plugin. A plugin that was never configured is first
    /// initialized with defaults.
    pub fn start(&mut self) -> Result<StartOutcome, RuntimeError> {
        let outcome = match self.lifecycle.start(Utc::now()) {
            Err(LifecycleError::NotConfigured) => {
                self.initialize(&ConfigMap::new())?;
                self.lifecycle.start(Utc::now())?
            }
            other => other?,
        };
        if outcome == StartOutcome::Started {
            info!(plugin = self.handle.descriptor().id, "plugin started");
        }
        Ok(outcome)
    }

    pub fn stop(&mut self) -> Result<StopOutcome, RuntimeError> {
        let outcome = self.lifecycle.stop(Utc::now())?;
        if outcome == StopOutcome::Stopped {
            info!(plugin = self.handle.descriptor().id, "plugin stopped");
        }
        Ok(outcome)
    }

    pub fn health(&self) -> HealthReport {
        let state = self.lifecycle.state();
        let (status, message) = match state {
            PluginState::Running => (HealthStatus::Healthy, "Plugin is running normally"),
            PluginState::Error => (HealthStatus::Unhealthy, "Plugin is in error state"),
            PluginState::Stopped | PluginState::Initialized => {
                (HealthStatus::Unhealthy, "Plugin is not running")
            }
        };
        HealthReport {
            status,
            message: message.to_string(),
            last_check: Utc::now(),
            uptime: self.lifecycle.uptime_secs(),
            error_count: self.error_count,
            metrics: self.handle.health_metrics(),
        }
    }

    pub fn execute(&self, request: &ActionRequest) -> Result<ActionResult, RuntimeError> {
        let PluginHandle::Action(exec) = &self.handle else {
            return Err(RuntimeError::WrongKind {
                operation: "execute_action",
                kind: self.kind(),
            });
        };
        Ok(exec.execute(request, self.lifecycle.is_running()))
    }

    /// One detection poll. Not running, or a failing source, means no event.
    pub fn detect(&mut self) -> Result<Option<TriggerEvent>, RuntimeError> {
        let running = self.lifecycle.is_running();
        let PluginHandle::Trigger(det) = &mut self.handle else {
            return Err(RuntimeError::WrongKind {
                operation: "detect_triggers",
                kind: PluginKind::Action,
            });
        };
        if !running {
            return Ok(None);
        }
        match det.detect(Utc::now()) {
            Ok(event) => Ok(event),
            Err(source_err) => {
                let err = ap_common::Error::Source(source_err.to_string());
                warn!(code = err.code(), error = %err, "trigger detection failed");
                self.error_count += 1;
                Ok(None)
            }
        }
    }
}
