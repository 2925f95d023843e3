//! Bounded activity log with a durable file sink

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::Serialize;

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Level {
    Info,
    Warn,
    Err,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Info => write!(f, "INFO"),
            Level::Warn => write!(f, "WARN"),
            Level::Err => write!(f, "ERR"),
        }
    }
}

/// One timestamped entry, immutable once appended
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: Level,
    pub message: String,
}

impl LogEntry {
    /// Line format shared by the display and the durable sink
    pub fn render(&self) -> String {
        format!(
            "{} [{}] {}",
            self.timestamp.format("%H:%M:%S"),
            self.level,
            self.message
        )
    }
}

/// Capacity-bounded FIFO log of dashboard events.
///
/// Appends never block the tick pipeline. Sink failures are swallowed:
/// the in-memory buffer is the source of truth for the live display,
/// the file is only a convenience copy.
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    sink: Option<File>,
}

impl ActivityLog {
    /// In-memory only
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            sink: None,
        }
    }

    /// Attach a durable sink, truncating any previous contents. An
    /// unopenable path leaves the log memory-only.
    pub fn with_sink(capacity: usize, path: &Path) -> Self {
        let sink = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .ok();
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            sink,
        }
    }

    /// Append an entry, evicting the oldest when at capacity
    pub fn append(&mut self, level: Level, message: impl Into<String>) {
        let entry = LogEntry {
            timestamp: Local::now(),
            level,
            message: message.into(),
        };

        if let Some(sink) = self.sink.as_mut() {
            let _ = writeln!(sink, "{}", entry.render());
        }

        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.append(Level::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.append(Level::Warn, message);
    }

    pub fn err(&mut self, message: impl Into<String>) {
        self.append(Level::Err, message);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Window of up to `n` entries ending `scroll` entries before the
    /// newest. Offsets are clamped so the view never leaves the buffer.
    pub fn tail(&self, n: usize, scroll: usize) -> Vec<&LogEntry> {
        let total = self.entries.len();
        let scroll = scroll.min(self.max_scroll(n));
        let end = total - scroll;
        let start = end.saturating_sub(n);
        self.entries.iter().skip(start).take(end - start).collect()
    }

    /// Largest useful scroll offset for a window of `n` entries
    pub fn max_scroll(&self, n: usize) -> usize {
        self.entries.len().saturating_sub(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_evicts_oldest_first() {
        let mut log = ActivityLog::new(3);
        for i in 0..5 {
            log.info(format!("entry {}", i));
        }
        assert_eq!(log.len(), 3);
        let tail = log.tail(3, 0);
        assert_eq!(tail[0].message, "entry 2");
        assert_eq!(tail[2].message, "entry 4");
    }

    #[test]
    fn test_tail_returns_newest_window() {
        let mut log = ActivityLog::new(100);
        for i in 0..10 {
            log.info(format!("entry {}", i));
        }
        let tail = log.tail(3, 0);
        assert_eq!(tail.len(), 3);
        assert_eq!(tail[0].message, "entry 7");
        assert_eq!(tail[2].message, "entry 9");
    }

    #[test]
    fn test_tail_scroll_moves_window_back() {
        let mut log = ActivityLog::new(100);
        for i in 0..10 {
            log.info(format!("entry {}", i));
        }
        let tail = log.tail(3, 2);
        assert_eq!(tail[0].message, "entry 5");
        assert_eq!(tail[2].message, "entry 7");
    }

    #[test]
    fn test_tail_clamps_out_of_range_scroll() {
        let mut log = ActivityLog::new(100);
        for i in 0..5 {
            log.info(format!("entry {}", i));
        }
        // scroll far beyond the buffer start
        let tail = log.tail(3, 1000);
        assert_eq!(tail.len(), 3);
        assert_eq!(tail[0].message, "entry 0");

        // window larger than the buffer
        let tail = log.tail(50, 0);
        assert_eq!(tail.len(), 5);
    }

    #[test]
    fn test_tail_on_empty_log() {
        let log = ActivityLog::new(10);
        assert!(log.tail(5, 0).is_empty());
        assert_eq!(log.max_scroll(5), 0);
    }

    #[test]
    fn test_render_format() {
        let mut log = ActivityLog::new(10);
        log.warn("PID 7 over limit");
        let rendered = log.tail(1, 0)[0].render();
        // HH:MM:SS [LEVEL] message
        assert_eq!(&rendered[2..3], ":");
        assert_eq!(&rendered[5..6], ":");
        assert!(rendered.ends_with("[WARN] PID 7 over limit"));
    }

    #[test]
    fn test_sink_truncated_at_open_and_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.log");
        std::fs::write(&path, "stale line\n").unwrap();

        let mut log = ActivityLog::with_sink(10, &path);
        log.info("fresh start");
        drop(log);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("stale line"));
        assert!(contents.trim_end().ends_with("[INFO] fresh start"));
    }

    #[test]
    fn test_unwritable_sink_is_silently_dropped() {
        let path = Path::new("/nonexistent-dir/activity.log");
        let mut log = ActivityLog::with_sink(10, path);
        log.info("still logged in memory");
        assert_eq!(log.len(), 1);
    }
}
