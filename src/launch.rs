//! Fire-and-forget sandbox session launcher

use std::process::{Command, Stdio};

use crate::activity::ActivityLog;
use crate::classify::SANDBOX_MARKER;
use crate::config::WatchConfig;
use crate::limits::Mode;

/// Build the launch command for the active mode. The marker argument is
/// what lets the classifier pick up every descendant of the session.
pub fn launch_command(config: &WatchConfig, mode: Mode) -> Command {
    let mut cmd = Command::new(&config.launch_program);
    cmd.arg(&config.launch_script)
        .arg(SANDBOX_MARKER)
        .arg(mode.to_string().to_lowercase())
        .arg("/bin/sh")
        .arg("-i")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    cmd
}

/// Spawn a sandboxed shell session. The child is never awaited or
/// cancelled; success or failure only shows up in the activity log and
/// alters no core state.
pub fn launch_sandbox(config: &WatchConfig, mode: Mode, log: &mut ActivityLog) {
    log.info("Launching sandbox terminal...");
    match launch_command(config, mode).spawn() {
        Ok(_) => log.info(format!(
            "Sandbox launch requested with mode={}",
            mode.to_string().to_lowercase()
        )),
        Err(e) => log.err(format!("Could not launch sandbox terminal: {}", e)),
    }
}
