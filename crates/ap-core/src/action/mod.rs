//! Action plugins and the executor that drives them.

pub mod email;
pub mod executor;
pub mod shell;

pub use email::{EmailNotification, EmailRejection};
pub use executor::{ActionExecutor, NOT_RUNNING};
pub use shell::{CommandRejection, ShellCommand};
