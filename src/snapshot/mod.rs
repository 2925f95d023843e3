//! Per-tick process snapshots
//!
//! A snapshot is a point-in-time view of one process, immutable after
//! creation and at most one tick stale. Attributes that cannot be read
//! (process exited mid-scan, permission denied) degrade to empty or
//! zero values instead of failing the scan.

use serde::{Deserialize, Serialize};
use sysinfo::System;

/// Attributes of one process, captured at a single point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    pub pid: u32,
    /// Short process name, display fallback when the command line is empty
    pub name: String,
    pub cmdline: Vec<String>,
    /// Working directory, empty when unreadable
    pub cwd: String,
    /// Cumulative user+system CPU seconds over the process lifetime
    pub cpu_time_secs: f64,
    pub cpu_percent: f32,
    pub rss_mb: f64,
    pub memory_percent: f32,
    /// 0 when the fd table is unreadable; an unknown count never counts
    /// toward the open-file limit
    pub open_files: u64,
    pub status: String,
}

impl ProcessSnapshot {
    /// Command line joined for display, falling back to the short name
    pub fn display_command(&self) -> String {
        if self.cmdline.is_empty() {
            if self.name.is_empty() {
                "<unknown>".to_string()
            } else {
                self.name.clone()
            }
        } else {
            self.cmdline.join(" ")
        }
    }
}

/// Source of per-tick process snapshots
pub trait SnapshotSource {
    /// Query the process table once and return a snapshot per process
    fn snapshot(&mut self) -> Vec<ProcessSnapshot>;
}

/// Live source backed by the OS process table.
///
/// Holds a persistent [`System`] so that successive refreshes yield
/// usable per-process CPU percentages.
pub struct SystemSource {
    sys: System,
}

impl SystemSource {
    pub fn new() -> Self {
        Self {
            sys: System::new_all(),
        }
    }
}

impl Default for SystemSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotSource for SystemSource {
    fn snapshot(&mut self) -> Vec<ProcessSnapshot> {
        self.sys.refresh_processes();
        self.sys.refresh_memory();
        let total_memory = self.sys.total_memory();

        self.sys
            .processes()
            .iter()
            .map(|(pid, process)| {
                let pid = pid.as_u32();
                let rss = process.memory();
                let memory_percent = if total_memory > 0 {
                    (rss as f64 / total_memory as f64 * 100.0) as f32
                } else {
                    0.0
                };

                ProcessSnapshot {
                    pid,
                    name: process.name().to_string(),
                    cmdline: process.cmd().to_vec(),
                    cwd: process
                        .cwd()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
                    cpu_time_secs: proc_cpu_time_secs(pid).unwrap_or(0.0),
                    cpu_percent: process.cpu_usage(),
                    rss_mb: rss as f64 / (1024.0 * 1024.0),
                    memory_percent,
                    open_files: proc_open_fds(pid),
                    status: format!("{:?}", process.status()).to_lowercase(),
                }
            })
            .collect()
    }
}

/// Cumulative CPU seconds from `/proc/<pid>/stat` (utime + stime).
///
/// The comm field may contain spaces, so fields are taken after the
/// closing paren rather than by naive whitespace splitting.
#[cfg(target_os = "linux")]
fn proc_cpu_time_secs(pid: u32) -> Option<f64> {
    let stat = std::fs::read_to_string(format!("/proc/{}/stat", pid)).ok()?;
    let rest = &stat[stat.rfind(')')? + 1..];
    let fields: Vec<&str> = rest.split_whitespace().collect();

    // fields[0] is the state; utime and stime are stat fields 14 and 15
    let utime: u64 = fields.get(11)?.parse().ok()?;
    let stime: u64 = fields.get(12)?.parse().ok()?;

    let clk_tck = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if clk_tck <= 0 {
        return None;
    }
    Some((utime + stime) as f64 / clk_tck as f64)
}

/// Open file descriptor count from `/proc/<pid>/fd`, 0 when unreadable
#[cfg(target_os = "linux")]
fn proc_open_fds(pid: u32) -> u64 {
    std::fs::read_dir(format!("/proc/{}/fd", pid))
        .map(|entries| entries.count() as u64)
        .unwrap_or(0)
}

#[cfg(not(target_os = "linux"))]
fn proc_cpu_time_secs(_pid: u32) -> Option<f64> {
    None
}

#[cfg(not(target_os = "linux"))]
fn proc_open_fds(_pid: u32) -> u64 {
    0
}
