//! Boxwatch - a live dashboard for sandboxed processes
//!
//! Boxwatch discovers the processes belonging to a sandbox environment,
//! tracks their arrivals and departures, and checks them against a
//! mode-selected resource-limit profile, surfacing everything in a
//! terminal dashboard refreshed on a fixed tick. Limits are observed
//! and reported, never enforced.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use boxwatch::{ActivityLog, Engine, LimitPolicy, Mode, SandboxClassifier, SystemSource};
//!
//! let classifier = SandboxClassifier::new(Path::new("/opt/minibox"));
//! let log = ActivityLog::new(2000);
//! let mut engine = Engine::new(
//!     SystemSource::new(),
//!     classifier,
//!     LimitPolicy::new(Mode::Restricted),
//!     log,
//! );
//! let report = engine.tick();
//! println!("{} sandbox processes", report.rows.len());
//! ```

pub mod activity;
pub mod classify;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod launch;
pub mod limits;
pub mod registry;
pub mod snapshot;
pub mod ui;

pub use activity::{ActivityLog, Level, LogEntry};
pub use classify::{SandboxClassifier, SANDBOX_MARKER};
pub use config::WatchConfig;
pub use engine::{scan_once, Engine, ProcessRow, ScanReport, TickReport};
pub use error::{BoxwatchError, Result};
pub use limits::{LimitEdit, LimitPolicy, LimitProfile, Mode, Violation};
pub use registry::{ProcessRegistry, Reconciliation};
pub use snapshot::{ProcessSnapshot, SnapshotSource, SystemSource};
