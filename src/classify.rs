//! Sandbox membership heuristics
//!
//! Classification is string-based on the command line and working
//! directory rather than the process tree, because sandbox descendants
//! may be reparented or orphaned while their invocation still carries
//! the marker.

use std::path::Path;

use crate::snapshot::ProcessSnapshot;

/// Marker string propagated into every sandboxed invocation
pub const SANDBOX_MARKER: &str = "sandbox_env";

/// Pure predicate deciding whether a process belongs to the sandbox
#[derive(Debug, Clone)]
pub struct SandboxClassifier {
    /// Lowercased base name of the project directory, an additional
    /// (broad) command-line marker
    project_marker: Option<String>,
}

impl SandboxClassifier {
    pub fn new(project_dir: &Path) -> Self {
        let project_marker = project_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .filter(|n| !n.is_empty());
        Self { project_marker }
    }

    /// True when the snapshot looks sandbox-related. Never panics; a
    /// process with no readable attributes classifies false.
    pub fn classify(&self, snap: &ProcessSnapshot) -> bool {
        let cmd = snap.cmdline.join(" ").to_lowercase();
        let cwd = snap.cwd.to_lowercase();

        if cmd.contains(SANDBOX_MARKER) || cwd.contains(SANDBOX_MARKER) {
            return true;
        }

        // Broader fallback: a command line referencing the project
        // directory. Known to over-match unrelated processes that
        // happen to share the directory name.
        if let Some(marker) = &self.project_marker {
            if cmd.contains(marker) {
                return true;
            }
        }

        false
    }
}
