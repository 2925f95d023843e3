//! Boxwatch CLI - live dashboard for sandboxed processes

use clap::Parser;

use boxwatch::cli::{Args, SubCommand};
use boxwatch::{scan_once, Mode, SandboxClassifier, WatchConfig};

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> boxwatch::Result<()> {
    match args.command {
        SubCommand::Watch {
            interval,
            mode,
            log_file,
            script,
        } => {
            let mode: Mode = mode.parse()?;
            let mut config = WatchConfig::new(&args.project_dir);
            config.tick = std::time::Duration::from_millis(interval.max(50));
            if let Some(path) = log_file {
                config.log_file = path;
            }
            if let Some(path) = script {
                config.launch_script = path;
            }
            boxwatch::ui::run(config, mode)
        }

        SubCommand::Scan => {
            let classifier = SandboxClassifier::new(&args.project_dir);
            let report = scan_once(&classifier);
            if args.json {
                println!("{}", report.to_json()?);
            } else {
                println!("{}", report.to_human());
            }
            Ok(())
        }
    }
}
