//! Stateful registry of sandbox processes
//!
//! Diffs each tick's classified snapshot set against the previous one,
//! emitting arrival and departure log entries and pinning a CPU-time
//! baseline per PID.

use std::collections::{HashMap, HashSet};

use crate::activity::ActivityLog;
use crate::snapshot::ProcessSnapshot;

#[derive(Debug, Clone)]
struct RegistryEntry {
    /// Last known command line, kept for the departure log message
    command: String,
    /// Cumulative CPU seconds observed at first sighting
    cpu_baseline_secs: f64,
}

/// Result of one reconcile pass
#[derive(Debug, Default)]
pub struct Reconciliation {
    pub arrived: Vec<u32>,
    pub departed: Vec<(u32, String)>,
}

/// One entry per currently-tracked PID; created on first classified
/// sighting, removed on the first tick the PID is absent.
#[derive(Debug, Default)]
pub struct ProcessRegistry {
    entries: HashMap<u32, RegistryEntry>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff the classified set against the tracked set, once per tick.
    ///
    /// New PIDs get an entry whose CPU baseline is the process's current
    /// cumulative CPU time, so its delta starts at zero even when it
    /// accumulated CPU before being discovered. Departed PIDs are
    /// reported with the cached command line since the process itself is
    /// usually already gone. The registry is the only component that
    /// emits lifecycle log entries.
    pub fn reconcile(
        &mut self,
        classified: &[ProcessSnapshot],
        log: &mut ActivityLog,
    ) -> Reconciliation {
        let mut result = Reconciliation::default();

        for snap in classified {
            if !self.entries.contains_key(&snap.pid) {
                let command = snap.display_command();
                log.info(format!("New process detected: PID {} - {}", snap.pid, command));
                self.entries.insert(
                    snap.pid,
                    RegistryEntry {
                        command,
                        cpu_baseline_secs: snap.cpu_time_secs,
                    },
                );
                result.arrived.push(snap.pid);
            }
        }

        let live: HashSet<u32> = classified.iter().map(|s| s.pid).collect();
        let gone: Vec<u32> = self
            .entries
            .keys()
            .copied()
            .filter(|pid| !live.contains(pid))
            .collect();
        for pid in gone {
            if let Some(entry) = self.entries.remove(&pid) {
                log.info(format!("Process ended: PID {} - {}", pid, entry.command));
                result.departed.push((pid, entry.command));
            }
        }

        result
    }

    /// CPU-time baseline captured at first sighting
    pub fn cpu_baseline(&self, pid: u32) -> Option<f64> {
        self.entries.get(&pid).map(|e| e.cpu_baseline_secs)
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.entries.contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::Level;

    fn snap(pid: u32, command: &str, cpu_time_secs: f64) -> ProcessSnapshot {
        ProcessSnapshot {
            pid,
            name: "sh".to_string(),
            cmdline: vec![command.to_string()],
            cwd: String::new(),
            cpu_time_secs,
            cpu_percent: 0.0,
            rss_mb: 0.0,
            memory_percent: 0.0,
            open_files: 0,
            status: "run".to_string(),
        }
    }

    #[test]
    fn test_arrival_creates_entry_and_logs() {
        let mut registry = ProcessRegistry::new();
        let mut log = ActivityLog::new(100);

        let result = registry.reconcile(&[snap(10, "sandbox_env sh", 0.5)], &mut log);

        assert_eq!(result.arrived, vec![10]);
        assert!(result.departed.is_empty());
        assert!(registry.contains(10));
        assert_eq!(registry.cpu_baseline(10), Some(0.5));

        let tail = log.tail(10, 0);
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].level, Level::Info);
        assert!(tail[0].message.contains("New process detected: PID 10"));
    }

    #[test]
    fn test_reconcile_is_idempotent_on_unchanged_set() {
        let mut registry = ProcessRegistry::new();
        let mut log = ActivityLog::new(100);
        let set = [snap(10, "a", 1.0), snap(11, "b", 2.0)];

        registry.reconcile(&set, &mut log);
        let second = registry.reconcile(&set, &mut log);

        assert!(second.arrived.is_empty());
        assert!(second.departed.is_empty());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_baseline_set_once_and_never_rewritten() {
        let mut registry = ProcessRegistry::new();
        let mut log = ActivityLog::new(100);

        // first observed with 50s of lifetime CPU already accumulated
        registry.reconcile(&[snap(10, "a", 50.0)], &mut log);
        assert_eq!(registry.cpu_baseline(10), Some(50.0));

        // later ticks see more CPU but must not move the baseline
        registry.reconcile(&[snap(10, "a", 50.1)], &mut log);
        registry.reconcile(&[snap(10, "a", 53.0)], &mut log);
        assert_eq!(registry.cpu_baseline(10), Some(50.0));
    }

    #[test]
    fn test_departure_removes_entry_with_cached_command() {
        let mut registry = ProcessRegistry::new();
        let mut log = ActivityLog::new(100);

        registry.reconcile(&[snap(10, "sandbox_env worker", 0.0)], &mut log);
        let result = registry.reconcile(&[], &mut log);

        assert_eq!(result.departed, vec![(10, "sandbox_env worker".to_string())]);
        assert!(!registry.contains(10));
        assert!(registry.cpu_baseline(10).is_none());

        let tail = log.tail(10, 0);
        assert!(tail
            .last()
            .unwrap()
            .message
            .contains("Process ended: PID 10 - sandbox_env worker"));
    }

    #[test]
    fn test_registry_mirrors_classified_set() {
        let mut registry = ProcessRegistry::new();
        let mut log = ActivityLog::new(100);

        registry.reconcile(&[snap(1, "a", 0.0), snap(2, "b", 0.0)], &mut log);
        let result = registry.reconcile(&[snap(2, "b", 0.1), snap(3, "c", 0.0)], &mut log);

        assert_eq!(result.arrived, vec![3]);
        assert_eq!(result.departed.len(), 1);
        assert_eq!(result.departed[0].0, 1);

        assert!(!registry.contains(1));
        assert!(registry.contains(2));
        assert!(registry.contains(3));
        assert_eq!(registry.len(), 2);
    }
}
