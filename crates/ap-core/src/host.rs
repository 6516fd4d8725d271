//! Host identity reported in event metadata and action results.

use serde::Serialize;
use std::ffi::CStr;

/// `uname(2)` fields attached to events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostInfo {
    pub hostname: String,
    pub platform: String,
    pub architecture: String,
}

impl HostInfo {
    /// Query the kernel; fields fall back to `unknown` if `uname` fails.
    pub fn detect() -> Self {
        // SAFETY: utsname is plain old data and uname only writes into it.
        let mut uts: libc::utsname = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::uname(&mut uts) };
        if rc != 0 {
            return Self::unknown();
        }
        Self {
            hostname: field(&uts.nodename),
            platform: field(&uts.sysname),
            architecture: field(&uts.machine),
        }
    }

    fn unknown() -> Self {
        Self {
            hostname: "unknown".to_string(),
            platform: "unknown".to_string(),
            architecture: "unknown".to_string(),
        }
    }
}

fn field(raw: &[libc::c_char]) -> String {
    // SAFETY: uname NUL-terminates every field within its buffer.
    unsafe { CStr::from_ptr(raw.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}
