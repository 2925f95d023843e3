//! Per-tick orchestration of the monitoring core

pub mod scan;
pub mod tick;

pub use scan::{scan_once, ScanReport};
pub use tick::{Engine, ProcessRow, TickReport};
