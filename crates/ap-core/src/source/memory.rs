//! RAM and swap readings.

use super::{percent, round2, SourceError};
use serde::Serialize;
use sysinfo::System;

/// Memory and swap usage in bytes, with percentages to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemorySnapshot {
    pub memory_percent: f64,
    pub total_memory: u64,
    pub available_memory: u64,
    pub used_memory: u64,
    pub swap_percent: f64,
    pub total_swap: u64,
    pub used_swap: u64,
    pub free_swap: u64,
}

impl MemorySnapshot {
    pub fn from_bytes(
        total_memory: u64,
        available_memory: u64,
        used_memory: u64,
        total_swap: u64,
        used_swap: u64,
    ) -> Self {
        let used_swap = used_swap.min(total_swap);
        Self {
            // Same basis as `free`: what is not available counts as used.
            memory_percent: round2(percent(
                total_memory.saturating_sub(available_memory),
                total_memory,
            )),
            total_memory,
            available_memory,
            used_memory,
            swap_percent: round2(percent(used_swap, total_swap)),
            total_swap,
            used_swap,
            free_swap: total_swap - used_swap,
        }
    }
}

pub trait MemorySource {
    fn snapshot(&self) -> Result<MemorySnapshot, SourceError>;
}

/// Live memory counters via `sysinfo`.
#[derive(Debug, Default)]
pub struct SystemMemory;

impl MemorySource for SystemMemory {
    fn snapshot(&self) -> Result<MemorySnapshot, SourceError> {
        let mut sys = System::new();
        sys.refresh_memory();
        if sys.total_memory() == 0 {
            return Err(SourceError::Empty {
                source_name: "memory counters",
            });
        }
        Ok(MemorySnapshot::from_bytes(
            sys.total_memory(),
            sys.available_memory(),
            sys.used_memory(),
            sys.total_swap(),
            sys.used_swap(),
        ))
    }
}

const GIB: u64 = 1024 * 1024 * 1024;

/// Memory at 91.5 % of 16 GiB and swap at 12.5 % of 4 GiB.
#[derive(Debug, Default)]
pub struct SimulatedMemory;

impl MemorySource for SimulatedMemory {
    fn snapshot(&self) -> Result<MemorySnapshot, SourceError> {
        let total_memory = 16 * GIB;
        let used_memory = total_memory / 1000 * 915;
        let total_swap = 4 * GIB;
        let used_swap = total_swap / 8;
        let mut snapshot = MemorySnapshot::from_bytes(
            total_memory,
            total_memory - used_memory,
            used_memory,
            total_swap,
            used_swap,
        );
        snapshot.memory_percent = 91.5;
        Ok(snapshot)
    }
}
