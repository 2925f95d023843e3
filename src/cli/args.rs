//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "boxwatch")]
#[command(author, version, about = "Live dashboard for sandboxed processes", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: SubCommand,

    /// Sandbox project directory (its base name is also a classifier marker)
    #[arg(long, global = true, env = "BOXWATCH_PROJECT_DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// Output format as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum SubCommand {
    /// Run the live dashboard
    Watch {
        /// Polling interval in milliseconds
        #[arg(long, short, default_value = "300")]
        interval: u64,

        /// Starting mode (open, restricted, locked)
        #[arg(long, short, default_value = "restricted")]
        mode: String,

        /// Activity log file (defaults to <project-dir>/sandbox_activity.log)
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Sandbox launch script (defaults to <project-dir>/scripts/run_sandbox.sh)
        #[arg(long)]
        script: Option<PathBuf>,
    },

    /// Scan the process table once and print classified processes
    Scan,
}
