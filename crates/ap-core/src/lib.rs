//! Agent plugin runtime.
//!
//! Each shipped plugin is a standalone binary that reads JSON commands from
//! stdin and writes one JSON reply per command to stdout. This crate holds
//! everything those binaries share:
//! - The lifecycle state machine and the per-plugin runtime around it
//! - Command parsing, dispatch and reply framing
//! - Trigger detection with per-alert cooldowns
//! - Action execution with result timing and metadata
//! - Live and simulated system sources

pub mod action;
pub mod catalog;
pub mod cli;
pub mod dispatch;
pub mod exit_codes;
pub mod host;
pub mod lifecycle;
pub mod logging;
pub mod plugin;
pub mod protocol;
pub mod runtime;
pub mod source;
pub mod trigger;

pub use dispatch::{Dispatcher, ServeStats};
pub use exit_codes::ExitCode;
pub use lifecycle::{Lifecycle, LifecycleError};
pub use plugin::{ActionPlugin, PluginCore, PluginDescriptor, TriggerPlugin};
pub use protocol::{ActionName, Reply};
pub use runtime::{PluginHandle, PluginRuntime, RuntimeError};
