//! Filesystem usage readings.

use super::{gib, percent, round2, SourceError};
use serde::Serialize;
use sysinfo::Disks;
use tracing::trace;

/// Usage of one mounted filesystem, as reported to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilesystemUsage {
    pub device: String,
    pub mountpoint: String,
    pub fstype: String,
    pub total: u64,
    pub used: u64,
    pub free: u64,
    /// Percent used, two decimal places.
    pub percent: f64,
    pub total_gb: f64,
    pub used_gb: f64,
    pub free_gb: f64,
}

impl FilesystemUsage {
    pub fn new(device: &str, mountpoint: &str, fstype: &str, total: u64, free: u64) -> Self {
        let free = free.min(total);
        let used = total - free;
        Self {
            device: device.to_string(),
            mountpoint: mountpoint.to_string(),
            fstype: fstype.to_string(),
            total,
            used,
            free,
            percent: round2(percent(used, total)),
            total_gb: gib(total),
            used_gb: gib(used),
            free_gb: gib(free),
        }
    }

    /// Simulated filesystem with an exact usage percentage.
    fn with_percent(device: &str, mountpoint: &str, fstype: &str, total: u64, pct: f64) -> Self {
        let used = (total as f64 * pct / 100.0).round() as u64;
        let mut fs = Self::new(device, mountpoint, fstype, total, total - used);
        fs.percent = pct;
        fs
    }
}

/// Enumerates mounted filesystems. Filtering is the caller's job.
pub trait DiskSource {
    fn filesystems(&self) -> Result<Vec<FilesystemUsage>, SourceError>;
}

/// Live filesystems via `sysinfo`.
#[derive(Debug, Default)]
pub struct SystemDisks;

impl DiskSource for SystemDisks {
    fn filesystems(&self) -> Result<Vec<FilesystemUsage>, SourceError> {
        let disks = Disks::new_with_refreshed_list();
        let usages: Vec<FilesystemUsage> = disks
            .list()
            .iter()
            .map(|disk| {
                FilesystemUsage::new(
                    &disk.name().to_string_lossy(),
                    &disk.mount_point().to_string_lossy(),
                    &disk.file_system().to_string_lossy(),
                    disk.total_space(),
                    disk.available_space(),
                )
            })
            .collect();
        trace!(count = usages.len(), "enumerated filesystems");
        if usages.is_empty() {
            return Err(SourceError::Empty {
                source_name: "disk list",
            });
        }
        Ok(usages)
    }
}

const GIB: u64 = 1024 * 1024 * 1024;

/// Fixed filesystem table for demos and tests.
///
/// `/` sits above the default critical threshold and `/home` above the
/// default warning threshold, so a default-configured monitor alerts.
#[derive(Debug, Default)]
pub struct SimulatedDisks;

impl DiskSource for SimulatedDisks {
    fn filesystems(&self) -> Result<Vec<FilesystemUsage>, SourceError> {
        Ok(vec![
            FilesystemUsage::with_percent("/dev/sda1", "/", "ext4", 100 * GIB, 97.0),
            FilesystemUsage::with_percent("/dev/sda2", "/var", "ext4", 200 * GIB, 72.5),
            FilesystemUsage::with_percent("/dev/sdb1", "/home", "ext4", 500 * GIB, 88.0),
            FilesystemUsage::with_percent("tmpfs", "/tmp", "tmpfs", 8 * GIB, 12.0),
            FilesystemUsage::with_percent("proc", "/proc", "proc", 0, 0.0),
        ])
    }
}
