//! The snapshot -> classify -> reconcile -> evaluate pipeline

use std::cmp::Ordering;

use serde::Serialize;

use crate::activity::ActivityLog;
use crate::classify::SandboxClassifier;
use crate::limits::{fmt_bound, LimitEdit, LimitPolicy, Mode};
use crate::registry::ProcessRegistry;
use crate::snapshot::{ProcessSnapshot, SnapshotSource};

/// One row of the dashboard process table
#[derive(Debug, Clone, Serialize)]
pub struct ProcessRow {
    pub pid: u32,
    pub cpu_percent: f32,
    pub memory_percent: f32,
    /// Lifetime cumulative CPU seconds (not the delta since arrival)
    pub cpu_secs: f64,
    pub command: String,
    pub status: String,
}

/// Summary of one tick, consumed by the presentation layer
#[derive(Debug, Default)]
pub struct TickReport {
    /// Classified processes sorted descending by CPU usage; ties keep
    /// discovery order
    pub rows: Vec<ProcessRow>,
    pub arrived: usize,
    pub departed: usize,
    pub violations: usize,
}

/// Owns the core components and runs them in order once per tick
pub struct Engine<S: SnapshotSource> {
    source: S,
    classifier: SandboxClassifier,
    registry: ProcessRegistry,
    policy: LimitPolicy,
    log: ActivityLog,
}

impl<S: SnapshotSource> Engine<S> {
    pub fn new(
        source: S,
        classifier: SandboxClassifier,
        policy: LimitPolicy,
        log: ActivityLog,
    ) -> Self {
        Self {
            source,
            classifier,
            registry: ProcessRegistry::new(),
            policy,
            log,
        }
    }

    /// Run one full pass: snapshot, classify, reconcile, evaluate.
    ///
    /// Lifecycle entries for a tick always land in the log before that
    /// tick's violation entries.
    pub fn tick(&mut self) -> TickReport {
        let snapshots = self.source.snapshot();
        let classified: Vec<ProcessSnapshot> = snapshots
            .into_iter()
            .filter(|s| self.classifier.classify(s))
            .collect();

        let recon = self.registry.reconcile(&classified, &mut self.log);

        let violations = self.policy.evaluate(&classified, &self.registry);
        for violation in &violations {
            self.log.warn(violation.to_string());
        }

        let mut rows: Vec<ProcessRow> = classified
            .iter()
            .map(|s| ProcessRow {
                pid: s.pid,
                cpu_percent: s.cpu_percent,
                memory_percent: s.memory_percent,
                cpu_secs: s.cpu_time_secs,
                command: s.display_command(),
                status: s.status.clone(),
            })
            .collect();
        // stable sort keeps discovery order for equal CPU readings
        rows.sort_by(|a, b| {
            b.cpu_percent
                .partial_cmp(&a.cpu_percent)
                .unwrap_or(Ordering::Equal)
        });

        TickReport {
            rows,
            arrived: recon.arrived.len(),
            departed: recon.departed.len(),
            violations: violations.len(),
        }
    }

    /// Advance the mode cycle, replacing the profile with the new
    /// mode's defaults
    pub fn cycle_mode(&mut self) -> Mode {
        let mode = self.policy.cycle_mode();
        self.log
            .info(format!("Mode switched to {}; limits updated", mode));
        mode
    }

    /// Replace the active bounds with operator-entered values
    pub fn edit_limits(&mut self, edit: &LimitEdit) {
        self.policy.apply_edit(edit);
        let profile = self.policy.profile();
        self.log.info(format!(
            "Limits edited: CPU={} RAM={} NPROC={} NOFILE={}",
            fmt_bound(profile.cpu_time_secs),
            fmt_bound(profile.ram_mb),
            fmt_bound(profile.max_processes),
            fmt_bound(profile.max_open_files),
        ));
    }

    pub fn policy(&self) -> &LimitPolicy {
        &self.policy
    }

    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut ActivityLog {
        &mut self.log
    }
}
