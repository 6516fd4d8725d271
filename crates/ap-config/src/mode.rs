//! Simulated vs live source selection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variable selecting simulated sources. Read once at startup.
pub const DEMO_MODE_ENV: &str = "STAVILY_DEMO_MODE";

/// Whether plugins talk to the real system or to deterministic stand-ins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    #[default]
    Simulated,
    Live,
}

impl SourceMode {
    pub fn from_demo_flag(demo: bool) -> Self {
        if demo {
            SourceMode::Simulated
        } else {
            SourceMode::Live
        }
    }

    pub fn is_simulated(self) -> bool {
        self == SourceMode::Simulated
    }
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceMode::Simulated => write!(f, "simulated"),
            SourceMode::Live => write!(f, "live"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_flag_maps_to_mode() {
        assert_eq!(SourceMode::from_demo_flag(true), SourceMode::Simulated);
        assert_eq!(SourceMode::from_demo_flag(false), SourceMode::Live);
        assert!(SourceMode::default().is_simulated());
    }
}
