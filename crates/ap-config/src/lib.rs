//! Agent plugin configuration parsing and validation.
//!
//! This crate provides:
//! - Lenient option readers over the JSON map sent with `initialize`
//! - Typed, validated settings for each shipped plugin
//! - Self-describing schemas for `get_action_config` / `get_trigger_config`
//! - Simulated vs live source selection

pub mod disk;
pub mod email;
pub mod memory;
pub mod mode;
pub mod options;
pub mod shell;
pub mod validate;

pub use disk::DiskMonitorConfig;
pub use email::EmailNotificationConfig;
pub use memory::MemoryMonitorConfig;
pub use mode::{SourceMode, DEMO_MODE_ENV};
pub use options::{string_list, ConfigMap, Options};
pub use shell::ShellCommandConfig;
pub use validate::{ConfigError, ValidationResult};
