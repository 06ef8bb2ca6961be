//! CPU, memory and storage readings

use std::path::{Path, PathBuf};

use serde::Serialize;
use sysinfo::{Disks, System};

use crate::{Error, Result};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Point-in-time system usage
///
/// Percentages are 0–100; sizes are gigabytes rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SystemSnapshot {
    /// CPU usage percent
    pub cpu: f32,
    /// Memory usage percent
    pub memory: f32,
    /// Memory in use
    pub memory_used: f64,
    /// Installed memory
    pub memory_total: f64,
    /// Storage used on the workspace disk
    pub disk_used: f64,
    /// Storage free on the workspace disk
    pub disk_free: f64,
    /// Capacity of the workspace disk
    pub disk_total: f64,
}

/// Source of system usage snapshots
pub trait Telemetry: Send + Sync {
    /// Take a snapshot
    ///
    /// # Errors
    ///
    /// Returns error if the readings are unavailable
    fn snapshot(&self) -> Result<SystemSnapshot>;
}

/// Telemetry read through `sysinfo`
///
/// Blocks for the minimum CPU sampling interval on every snapshot.
#[derive(Debug, Clone)]
pub struct SysinfoTelemetry {
    disk_root: PathBuf,
}

impl SysinfoTelemetry {
    /// Report storage for the disk holding `disk_root`
    #[must_use]
    pub fn new(disk_root: impl Into<PathBuf>) -> Self {
        Self {
            disk_root: disk_root.into(),
        }
    }
}

impl Telemetry for SysinfoTelemetry {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn snapshot(&self) -> Result<SystemSnapshot> {
        let mut system = System::new();
        system.refresh_cpu();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        system.refresh_cpu();
        system.refresh_memory();

        let cpu = system.global_cpu_info().cpu_usage();

        let total = system.total_memory();
        if total == 0 {
            return Err(Error::Telemetry("memory size unavailable".to_string()));
        }
        let used = total.saturating_sub(system.available_memory());
        let memory = (used as f64 / total as f64 * 100.0) as f32;

        let disks = Disks::new_with_refreshed_list();
        let mounts: Vec<(PathBuf, u64, u64)> = disks
            .list()
            .iter()
            .map(|d| (d.mount_point().to_path_buf(), d.total_space(), d.available_space()))
            .collect();
        let (disk_total, disk_free) = pick_disk(&mounts, &self.disk_root)
            .ok_or_else(|| Error::Telemetry("no disks found".to_string()))?;

        let snapshot = SystemSnapshot {
            cpu: round1(cpu),
            memory: round1(memory),
            memory_used: gigabytes(used),
            memory_total: gigabytes(total),
            disk_used: gigabytes(disk_total.saturating_sub(disk_free)),
            disk_free: gigabytes(disk_free),
            disk_total: gigabytes(disk_total),
        };

        tracing::debug!(?snapshot, "system snapshot");
        Ok(snapshot)
    }
}

/// Pick the disk mounted closest to `root`, else the largest one
///
/// Returns `(total, available)` in bytes.
fn pick_disk(mounts: &[(PathBuf, u64, u64)], root: &Path) -> Option<(u64, u64)> {
    mounts
        .iter()
        .filter(|(mount, _, _)| root.starts_with(mount))
        .max_by_key(|(mount, _, _)| mount.components().count())
        .or_else(|| mounts.iter().max_by_key(|(_, total, _)| *total))
        .map(|(_, total, free)| (*total, *free))
}

#[allow(clippy::cast_precision_loss)]
fn gigabytes(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_GB * 100.0).round() / 100.0
}

fn round1(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const GB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn test_gigabytes_rounds_to_two_decimals() {
        assert!((gigabytes(GB) - 1.0).abs() < f64::EPSILON);
        assert!((gigabytes(GB + GB / 3) - 1.33).abs() < 1e-9);
        assert!(gigabytes(0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pick_disk_prefers_deepest_mount() {
        let mounts = vec![
            (PathBuf::from("/"), 100 * GB, 40 * GB),
            (PathBuf::from("/home"), 500 * GB, 200 * GB),
            (PathBuf::from("/mnt/backup"), 900 * GB, 800 * GB),
        ];

        assert_eq!(
            pick_disk(&mounts, Path::new("/home/user/projects")),
            Some((500 * GB, 200 * GB))
        );
        assert_eq!(pick_disk(&mounts, Path::new("/etc")), Some((100 * GB, 40 * GB)));
    }

    #[test]
    fn test_pick_disk_falls_back_to_largest() {
        let mounts = vec![
            (PathBuf::from("D:\\"), 200 * GB, 10 * GB),
            (PathBuf::from("E:\\"), 800 * GB, 300 * GB),
        ];
        assert_eq!(pick_disk(&mounts, Path::new("relative")), Some((800 * GB, 300 * GB)));
        assert_eq!(pick_disk(&[], Path::new("/")), None);
    }
}
