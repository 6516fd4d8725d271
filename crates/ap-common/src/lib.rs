//! Agent plugin common types, IDs, and errors.
//!
//! This crate provides foundational types shared by the plugin runtime and
//! every plugin binary:
//! - Lifecycle state, plugin metadata and health reports
//! - Action requests/results and trigger events (the wire payloads)
//! - Event and alert identity types
//! - Self-describing configuration schemas
//! - Common error types

pub mod action;
pub mod error;
pub mod event;
pub mod id;
pub mod schema;
pub mod state;

pub use action::{ActionRequest, ActionResult, ActionStatus, Parameters, ResultMetadata};
pub use error::{Error, Result};
pub use event::{tag_set, AlertLevel, EventMetadata, Severity, TriggerEvent};
pub use id::{AlertKey, EventId};
pub use schema::{ConfigSchema, FieldSpec, FieldType, PROTOCOL_VERSION};
pub use state::{HealthReport, HealthStatus, PluginInfo, PluginKind, PluginState};
