//! One-shot classified process scan

use bytesize::ByteSize;
use serde::Serialize;

use crate::classify::SandboxClassifier;
use crate::error::Result;
use crate::snapshot::{ProcessSnapshot, SnapshotSource, SystemSource};

/// Result of a single scan pass
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub matched: Vec<ProcessSnapshot>,
}

/// Scan the process table once and keep the classified processes.
///
/// Takes two snapshots a short pause apart so per-process CPU
/// percentages have something to compare against.
pub fn scan_once(classifier: &SandboxClassifier) -> ScanReport {
    let mut source = SystemSource::new();
    source.snapshot();
    std::thread::sleep(std::time::Duration::from_millis(200));

    let matched = source
        .snapshot()
        .into_iter()
        .filter(|s| classifier.classify(s))
        .collect();
    ScanReport { matched }
}

impl ScanReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_human(&self) -> String {
        if self.matched.is_empty() {
            return "No sandbox processes found".to_string();
        }

        let mut out = String::from("Sandbox Processes\n-----------------\n");
        for snap in &self.matched {
            out.push_str(&format!(
                "\nPID {} ({})\n  CPU: {:.1}% | Mem: {} ({:.1}%) | CPUsec: {:.2} | FDs: {} | {}\n  {}\n",
                snap.pid,
                snap.name,
                snap.cpu_percent,
                ByteSize((snap.rss_mb * 1024.0 * 1024.0) as u64),
                snap.memory_percent,
                snap.cpu_time_secs,
                snap.open_files,
                snap.status,
                snap.display_command(),
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(matched: Vec<ProcessSnapshot>) -> ScanReport {
        ScanReport { matched }
    }

    fn snap(pid: u32) -> ProcessSnapshot {
        ProcessSnapshot {
            pid,
            name: "sh".to_string(),
            cmdline: vec!["sandbox_env".to_string()],
            cwd: String::new(),
            cpu_time_secs: 1.25,
            cpu_percent: 3.5,
            rss_mb: 2.0,
            memory_percent: 0.1,
            open_files: 4,
            status: "sleep".to_string(),
        }
    }

    #[test]
    fn test_human_output_empty() {
        assert_eq!(report(Vec::new()).to_human(), "No sandbox processes found");
    }

    #[test]
    fn test_human_output_lists_processes() {
        let out = report(vec![snap(7)]).to_human();
        assert!(out.contains("PID 7 (sh)"));
        assert!(out.contains("CPUsec: 1.25"));
    }

    #[test]
    fn test_json_output_round_trips() {
        let json = report(vec![snap(7)]).to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["matched"][0]["pid"], 7);
    }
}
