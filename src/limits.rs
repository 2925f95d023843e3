//! Resource-limit profiles and the violation evaluator

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BoxwatchError;
use crate::registry::ProcessRegistry;
use crate::snapshot::ProcessSnapshot;

/// Sandbox operating mode, selecting a default limit profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Open,
    Restricted,
    Locked,
}

impl Mode {
    /// Fixed cycle used by the mode key: OPEN -> RESTRICTED -> LOCKED -> OPEN
    pub fn next(self) -> Mode {
        match self {
            Mode::Open => Mode::Restricted,
            Mode::Restricted => Mode::Locked,
            Mode::Locked => Mode::Open,
        }
    }

    /// Default limit profile for this mode
    pub fn defaults(self) -> LimitProfile {
        match self {
            Mode::Open => LimitProfile::unbounded(),
            Mode::Restricted => LimitProfile {
                cpu_time_secs: Some(3),
                ram_mb: Some(256),
                max_processes: Some(10),
                max_open_files: Some(32),
            },
            Mode::Locked => LimitProfile {
                cpu_time_secs: Some(1),
                ram_mb: Some(128),
                max_processes: Some(5),
                max_open_files: Some(16),
            },
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Open => write!(f, "OPEN"),
            Mode::Restricted => write!(f, "RESTRICTED"),
            Mode::Locked => write!(f, "LOCKED"),
        }
    }
}

impl FromStr for Mode {
    type Err = BoxwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(Mode::Open),
            "restricted" => Ok(Mode::Restricted),
            "locked" => Ok(Mode::Locked),
            other => Err(BoxwatchError::InvalidMode(other.to_string())),
        }
    }
}

/// Active resource bounds. `None` means unbounded; that check is never
/// run. A bound is always positive, never zero-as-disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitProfile {
    pub cpu_time_secs: Option<u64>,
    pub ram_mb: Option<u64>,
    pub max_processes: Option<usize>,
    pub max_open_files: Option<u64>,
}

impl LimitProfile {
    pub fn unbounded() -> Self {
        Self {
            cpu_time_secs: None,
            ram_mb: None,
            max_processes: None,
            max_open_files: None,
        }
    }
}

/// Operator-entered overrides; an absent field means unbounded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LimitEdit {
    pub cpu_time_secs: Option<u64>,
    pub ram_mb: Option<u64>,
    pub max_processes: Option<usize>,
    pub max_open_files: Option<u64>,
}

impl LimitEdit {
    /// Parse one prompt answer. Empty or non-numeric input means
    /// unbounded, not an error.
    pub fn parse_field(input: &str) -> Option<u64> {
        input.trim().parse().ok()
    }
}

/// Display helper shared by the log and the limits box
pub fn fmt_bound<T: fmt::Display>(bound: Option<T>) -> String {
    bound
        .map(|b| b.to_string())
        .unwrap_or_else(|| "unlimited".to_string())
}

/// A measured value exceeding an active bound
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    CpuTime {
        pid: u32,
        name: String,
        delta_secs: f64,
        bound_secs: u64,
    },
    Memory {
        pid: u32,
        name: String,
        rss_mb: f64,
        bound_mb: u64,
    },
    ProcessCount {
        count: usize,
        bound: usize,
    },
    OpenFiles {
        total: u64,
        bound: u64,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::CpuTime {
                pid,
                name,
                delta_secs,
                bound_secs,
            } => write!(
                f,
                "PID {} ({}) exceeded CPU time {:.1}s > {}s",
                pid, name, delta_secs, bound_secs
            ),
            Violation::Memory {
                pid,
                name,
                rss_mb,
                bound_mb,
            } => write!(f, "PID {} ({}) using {:.1}MB > {}MB", pid, name, rss_mb, bound_mb),
            Violation::ProcessCount { count, bound } => {
                write!(f, "Sandbox processes {} > limit {}", count, bound)
            }
            Violation::OpenFiles { total, bound } => {
                write!(f, "Total open files {} > limit {}", total, bound)
            }
        }
    }
}

/// Holds the active mode and profile and evaluates snapshots against it
#[derive(Debug, Clone)]
pub struct LimitPolicy {
    mode: Mode,
    profile: LimitProfile,
}

impl LimitPolicy {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            profile: mode.defaults(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn profile(&self) -> &LimitProfile {
        &self.profile
    }

    /// Advance to the next mode, replacing the whole profile with that
    /// mode's defaults in one step. Previously logged violations are
    /// not revisited.
    pub fn cycle_mode(&mut self) -> Mode {
        self.mode = self.mode.next();
        self.profile = self.mode.defaults();
        self.mode
    }

    /// Replace all four bounds with operator-entered values; the mode
    /// stays unchanged and takes effect from the next evaluation.
    pub fn apply_edit(&mut self, edit: &LimitEdit) {
        self.profile = LimitProfile {
            cpu_time_secs: edit.cpu_time_secs,
            ram_mb: edit.ram_mb,
            max_processes: edit.max_processes,
            max_open_files: edit.max_open_files,
        };
    }

    /// Check the classified set against the active profile.
    ///
    /// Per-process checks run first, then the aggregates computed over
    /// the same snapshot set. All comparisons are strict; an unbounded
    /// field is never compared. The per-process iteration order does
    /// not affect which violations are produced.
    pub fn evaluate(
        &self,
        classified: &[ProcessSnapshot],
        registry: &ProcessRegistry,
    ) -> Vec<Violation> {
        let mut violations = Vec::new();

        for snap in classified {
            if let Some(bound) = self.profile.cpu_time_secs {
                // unknown baseline counts as "just arrived", delta zero
                let baseline = registry.cpu_baseline(snap.pid).unwrap_or(snap.cpu_time_secs);
                let delta = snap.cpu_time_secs - baseline;
                if delta > bound as f64 {
                    violations.push(Violation::CpuTime {
                        pid: snap.pid,
                        name: snap.name.clone(),
                        delta_secs: delta,
                        bound_secs: bound,
                    });
                }
            }

            if let Some(bound) = self.profile.ram_mb {
                if snap.rss_mb > bound as f64 {
                    violations.push(Violation::Memory {
                        pid: snap.pid,
                        name: snap.name.clone(),
                        rss_mb: snap.rss_mb,
                        bound_mb: bound,
                    });
                }
            }
        }

        if let Some(bound) = self.profile.max_processes {
            if classified.len() > bound {
                violations.push(Violation::ProcessCount {
                    count: classified.len(),
                    bound,
                });
            }
        }

        if let Some(bound) = self.profile.max_open_files {
            let total: u64 = classified.iter().map(|s| s.open_files).sum();
            if total > bound {
                violations.push(Violation::OpenFiles { total, bound });
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityLog;

    fn snap(pid: u32, cpu_time_secs: f64, rss_mb: f64, open_files: u64) -> ProcessSnapshot {
        ProcessSnapshot {
            pid,
            name: "worker".to_string(),
            cmdline: vec!["sandbox_env".to_string()],
            cwd: String::new(),
            cpu_time_secs,
            cpu_percent: 0.0,
            rss_mb,
            memory_percent: 0.0,
            open_files,
            status: "run".to_string(),
        }
    }

    fn tracked(registry: &mut ProcessRegistry, snaps: &[ProcessSnapshot]) {
        let mut log = ActivityLog::new(100);
        registry.reconcile(snaps, &mut log);
    }

    #[test]
    fn test_mode_cycle() {
        assert_eq!(Mode::Open.next(), Mode::Restricted);
        assert_eq!(Mode::Restricted.next(), Mode::Locked);
        assert_eq!(Mode::Locked.next(), Mode::Open);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("restricted".parse::<Mode>().unwrap(), Mode::Restricted);
        assert_eq!("LOCKED".parse::<Mode>().unwrap(), Mode::Locked);
        assert!("paranoid".parse::<Mode>().is_err());
    }

    #[test]
    fn test_mode_defaults() {
        assert_eq!(Mode::Open.defaults(), LimitProfile::unbounded());
        let restricted = Mode::Restricted.defaults();
        assert_eq!(restricted.cpu_time_secs, Some(3));
        assert_eq!(restricted.ram_mb, Some(256));
        assert_eq!(restricted.max_processes, Some(10));
        assert_eq!(restricted.max_open_files, Some(32));
        let locked = Mode::Locked.defaults();
        assert_eq!(locked.cpu_time_secs, Some(1));
        assert_eq!(locked.ram_mb, Some(128));
        assert_eq!(locked.max_processes, Some(5));
        assert_eq!(locked.max_open_files, Some(16));
    }

    #[test]
    fn test_cpu_delta_violation_is_strict() {
        let mut registry = ProcessRegistry::new();
        let policy = LimitPolicy::new(Mode::Restricted); // cpu bound 3s

        tracked(&mut registry, &[snap(10, 1.0, 0.0, 0)]);

        // delta 3.5s: exactly one WARN naming the PID
        let violations = policy.evaluate(&[snap(10, 4.5, 0.0, 0)], &registry);
        assert_eq!(violations.len(), 1);
        match &violations[0] {
            Violation::CpuTime { pid, delta_secs, bound_secs, .. } => {
                assert_eq!(*pid, 10);
                assert!((delta_secs - 3.5).abs() < 1e-9);
                assert_eq!(*bound_secs, 3);
            }
            other => panic!("unexpected violation {:?}", other),
        }

        // delta 2.9s: no violation
        let violations = policy.evaluate(&[snap(10, 3.9, 0.0, 0)], &registry);
        assert!(violations.is_empty());

        // delta exactly at the bound: no violation (strict comparison)
        let violations = policy.evaluate(&[snap(10, 4.0, 0.0, 0)], &registry);
        assert!(violations.is_empty());
    }

    #[test]
    fn test_baseline_absorbs_preexisting_cpu_time() {
        let mut registry = ProcessRegistry::new();
        let policy = LimitPolicy::new(Mode::Restricted);

        // long-running shell reused by the sandbox, 50s already burned
        tracked(&mut registry, &[snap(10, 50.0, 0.0, 0)]);

        // immediately afterwards at 50.1s: delta is 0.1s, not 50.1s
        let violations = policy.evaluate(&[snap(10, 50.1, 0.0, 0)], &registry);
        assert!(violations.is_empty());
    }

    #[test]
    fn test_memory_violation() {
        let mut registry = ProcessRegistry::new();
        let policy = LimitPolicy::new(Mode::Restricted); // ram bound 256MB

        tracked(&mut registry, &[snap(10, 0.0, 300.0, 0)]);
        let violations = policy.evaluate(&[snap(10, 0.0, 300.0, 0)], &registry);
        assert_eq!(violations.len(), 1);
        assert!(matches!(violations[0], Violation::Memory { pid: 10, .. }));
    }

    #[test]
    fn test_aggregate_violations_follow_per_process_checks() {
        let mut registry = ProcessRegistry::new();
        let mut policy = LimitPolicy::new(Mode::Open);
        policy.apply_edit(&LimitEdit {
            cpu_time_secs: None,
            ram_mb: Some(100),
            max_processes: Some(1),
            max_open_files: Some(5),
        });

        let set = [snap(1, 0.0, 150.0, 4), snap(2, 0.0, 10.0, 4)];
        tracked(&mut registry, &set);
        let violations = policy.evaluate(&set, &registry);

        assert_eq!(violations.len(), 3);
        assert!(matches!(violations[0], Violation::Memory { pid: 1, .. }));
        assert!(matches!(violations[1], Violation::ProcessCount { count: 2, bound: 1 }));
        assert!(matches!(violations[2], Violation::OpenFiles { total: 8, bound: 5 }));
    }

    #[test]
    fn test_unbounded_disables_checks() {
        let mut registry = ProcessRegistry::new();
        let policy = LimitPolicy::new(Mode::Open);

        let set: Vec<ProcessSnapshot> =
            (0..50).map(|pid| snap(pid, 1_000.0, 10_000.0, 1_000)).collect();
        tracked(&mut registry, &set);
        // second pass so CPU deltas are huge, still nothing fires
        let grown: Vec<ProcessSnapshot> =
            (0..50).map(|pid| snap(pid, 9_999.0, 10_000.0, 1_000)).collect();
        assert!(policy.evaluate(&grown, &registry).is_empty());
    }

    #[test]
    fn test_mode_switch_replaces_profile_atomically() {
        let mut policy = LimitPolicy::new(Mode::Restricted);
        policy.apply_edit(&LimitEdit {
            cpu_time_secs: Some(99),
            ram_mb: None,
            max_processes: Some(2),
            max_open_files: None,
        });

        let mode = policy.cycle_mode();
        assert_eq!(mode, Mode::Locked);
        // every field is LOCKED's default, no leftovers from the edit
        assert_eq!(*policy.profile(), Mode::Locked.defaults());
    }

    #[test]
    fn test_edit_replaces_fields_but_keeps_mode() {
        let mut policy = LimitPolicy::new(Mode::Restricted);
        policy.apply_edit(&LimitEdit {
            cpu_time_secs: Some(10),
            ram_mb: None,
            max_processes: None,
            max_open_files: Some(64),
        });

        assert_eq!(policy.mode(), Mode::Restricted);
        assert_eq!(policy.profile().cpu_time_secs, Some(10));
        assert_eq!(policy.profile().ram_mb, None);
        assert_eq!(policy.profile().max_open_files, Some(64));
    }

    #[test]
    fn test_parse_field_treats_garbage_as_unbounded() {
        assert_eq!(LimitEdit::parse_field("42"), Some(42));
        assert_eq!(LimitEdit::parse_field(" 7 "), Some(7));
        assert_eq!(LimitEdit::parse_field(""), None);
        assert_eq!(LimitEdit::parse_field("lots"), None);
        assert_eq!(LimitEdit::parse_field("-3"), None);
    }

    #[test]
    fn test_fmt_bound() {
        assert_eq!(fmt_bound(Some(3)), "3");
        assert_eq!(fmt_bound::<u64>(None), "unlimited");
    }
}
