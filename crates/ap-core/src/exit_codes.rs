//! Exit codes for the plugin binaries.
//!
//! A plugin normally exits when the host closes its stdin. Anything else is
//! reported through these stable codes so supervisors need not parse stderr.

/// Exit codes for plugin processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Input closed, all commands answered
    Clean = 0,

    /// Invalid command-line arguments or environment
    ConfigError = 10,

    /// The protocol streams failed (closed stdout, unreadable stdin)
    IoError = 13,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean)
    }

    /// Check if this exit code indicates an error requiring attention.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}
