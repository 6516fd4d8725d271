//! Metric and action sources.
//!
//! Every plugin talks to the outside world through one trait from this
//! module. Each trait has a live implementation and a deterministic
//! simulated one; the binary picks between them once, at startup, from
//! [`SourceMode`](ap_config::SourceMode).

pub mod disk;
pub mod mail;
pub mod memory;
pub mod shell;

pub use disk::{DiskSource, FilesystemUsage, SimulatedDisks, SystemDisks};
pub use mail::{MailError, MailTransport, OutgoingMail, SimulatedMailer, SmtpMailer};
pub use memory::{MemorySnapshot, MemorySource, SimulatedMemory, SystemMemory};
pub use shell::{
    CommandOutput, CommandRunner, CommandSpec, RunError, SimulatedRunner, SubprocessRunner,
};

use thiserror::Error;

/// A metrics source could not produce readings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("{source_name} unavailable: {message}")]
    Unavailable {
        source_name: &'static str,
        message: String,
    },

    #[error("{source_name} reported no data")]
    Empty { source_name: &'static str },
}

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Bytes to GiB, rounded to two decimal places.
pub(crate) fn gib(bytes: u64) -> f64 {
    round2(bytes as f64 / BYTES_PER_GIB)
}

/// `part / whole` as a percentage; zero when `whole` is zero.
pub(crate) fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_of_zero_total() {
        assert_eq!(percent(5, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
    }

    #[test]
    fn gib_rounds_to_two_places() {
        assert_eq!(gib(16 * 1024 * 1024 * 1024), 16.0);
        assert_eq!(gib(1_500_000_000), 1.4);
        assert_eq!(round2(12.345_6), 12.35);
    }
}
