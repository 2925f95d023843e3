//! Dashboard configuration

use std::path::PathBuf;
use std::time::Duration;

/// Number of log entries kept in memory for the live display
pub const LOG_CAPACITY: usize = 2000;

/// Default polling interval for the dashboard loop
pub const DEFAULT_TICK: Duration = Duration::from_millis(300);

/// Configuration for one dashboard session.
///
/// The launch script and log file default to conventional locations
/// under the project directory but can be overridden individually.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Sandbox project directory; its base name doubles as a classifier marker
    pub project_dir: PathBuf,

    /// Interpreter the launch script is run with
    pub launch_program: PathBuf,

    /// Script invoked to start a sandboxed shell session
    pub launch_script: PathBuf,

    /// Durable activity log, truncated once at startup
    pub log_file: PathBuf,

    /// Polling interval
    pub tick: Duration,

    /// In-memory log capacity
    pub log_capacity: usize,
}

impl WatchConfig {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        let project_dir = project_dir.into();
        Self {
            launch_program: PathBuf::from("bash"),
            launch_script: project_dir.join("scripts").join("run_sandbox.sh"),
            log_file: project_dir.join("sandbox_activity.log"),
            tick: DEFAULT_TICK,
            log_capacity: LOG_CAPACITY,
            project_dir,
        }
    }
}
