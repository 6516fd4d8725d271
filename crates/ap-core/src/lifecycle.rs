//! Plugin lifecycle state machine.
//!
//! ```text
//! stopped | initialized | error  --initialize ok-->  initialized
//! stopped | initialized | error  --initialize err--> error
//! initialized | stopped*         --start-->          running
//! initialized | running          --stop-->           stopped
//! ```
//!
//! `*` only once a configuration has been accepted. `start` while running and
//! `stop` while stopped are no-ops; `initialize` while running is rejected.
//!
//! Only the runtime mutates this state; every transition is timestamped.

use ap_common::PluginState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

/// Transitions kept for inspection; older entries are dropped.
pub const HISTORY_LIMIT: usize = 64;

/// Rejected lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("plugin is running; stop it before re-initializing")]
    InitializeWhileRunning,

    #[error("plugin is in error state; initialize it with a valid configuration first")]
    InErrorState,

    #[error("plugin has no accepted configuration")]
    NotConfigured,

    #[error("illegal transition from {from} to {to}")]
    Illegal { from: PluginState, to: PluginState },
}

/// Result of a `start` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

/// Result of a `stop` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    AlreadyStopped,
}

/// One recorded state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionRecord {
    pub from: PluginState,
    pub to: PluginState,
    pub at: DateTime<Utc>,
}

/// Whether `from → to` appears in the transition table.
pub fn is_legal(from: PluginState, to: PluginState) -> bool {
    use PluginState::*;
    matches!(
        (from, to),
        (Stopped, Initialized)
            | (Stopped, Error)
            | (Stopped, Running)
            | (Initialized, Initialized)
            | (Initialized, Error)
            | (Initialized, Running)
            | (Initialized, Stopped)
            | (Running, Stopped)
            | (Error, Initialized)
            | (Error, Error)
    )
}

/// Owner of the current [`PluginState`].
#[derive(Debug)]
pub struct Lifecycle {
    state: PluginState,
    configured: bool,
    running_since: Option<Instant>,
    last_started_at: Option<DateTime<Utc>>,
    history: VecDeque<TransitionRecord>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: PluginState::Stopped,
            configured: false,
            running_since: None,
            last_started_at: None,
            history: VecDeque::new(),
        }
    }

    pub fn state(&self) -> PluginState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PluginState::Running
    }

    /// Whether a configuration has been accepted since the process started.
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Seconds since the last `→ running` transition; zero when not running.
    pub fn uptime_secs(&self) -> f64 {
        match (self.state, self.running_since) {
            (PluginState::Running, Some(since)) => since.elapsed().as_secs_f64(),
            _ => 0.0,
        }
    }

    pub fn last_started_at(&self) -> Option<DateTime<Utc>> {
        self.last_started_at
    }

    pub fn history(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.history.iter()
    }

    /// Check that `initialize` may run in the current state.
    pub fn ensure_can_initialize(&self) -> Result<(), LifecycleError> {
        if self.state == PluginState::Running {
            return Err(LifecycleError::InitializeWhileRunning);
        }
        Ok(())
    }

    /// Record an accepted configuration.
    pub fn mark_initialized(&mut self, at: DateTime<Utc>) -> Result<(), LifecycleError> {
        self.ensure_can_initialize()?;
        self.transition(PluginState::Initialized, at)?;
        self.configured = true;
        Ok(())
    }

    /// Record a rejected configuration.
    pub fn mark_failed(&mut self, at: DateTime<Utc>) -> Result<(), LifecycleError> {
        self.ensure_can_initialize()?;
        self.transition(PluginState::Error, at)
    }

    pub fn start(&mut self, at: DateTime<Utc>) -> Result<StartOutcome, LifecycleError> {
        match self.state {
            PluginState::Running => Ok(StartOutcome::AlreadyRunning),
            PluginState::Error => Err(LifecycleError::InErrorState),
            PluginState::Stopped if !self.configured => Err(LifecycleError::NotConfigured),
            PluginState::Stopped | PluginState::Initialized => {
                self.transition(PluginState::Running, at)?;
                self.running_since = Some(Instant::now());
                self.last_started_at = Some(at);
                Ok(StartOutcome::Started)
            }
        }
    }

    pub fn stop(&mut self, at: DateTime<Utc>) -> Result<StopOutcome, LifecycleError> {
        match self.state {
            PluginState::Stopped => Ok(StopOutcome::AlreadyStopped),
            PluginState::Error => Err(LifecycleError::InErrorState),
            PluginState::Initialized | PluginState::Running => {
                self.transition(PluginState::Stopped, at)?;
                self.running_since = None;
                Ok(StopOutcome::Stopped)
            }
        }
    }

    fn transition(&mut self, to: PluginState, at: DateTime<Utc>) -> Result<(), LifecycleError> {
        let from = self.state;
        if !is_legal(from, to) {
            return Err(LifecycleError::Illegal { from, to });
        }
        debug!(%from, %to, "lifecycle transition");
        self.state = to;
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(TransitionRecord { from, to, at });
        Ok(())
    }
}
