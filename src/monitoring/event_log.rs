/*!
 * Event Log
 *
 * Append-only sink for the daemon's human-readable events (startup, each
 * spawn, each reap, shutdown). Sinks never fail towards the caller: a write
 * error is reported through tracing and otherwise ignored.
 */

use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{info, warn};

/// Receives already-formatted event messages
pub trait EventSink: Send + Sync {
    fn record(&self, message: &str);
}

/// Appends `[timestamp] PID <pid>: <message>` lines to a file
///
/// The file is opened per event so that rotation or deletion by an operator
/// is picked up without a restart.
pub struct FileEventLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileEventLog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let _guard = self.write_lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

impl EventSink for FileEventLog {
    fn record(&self, message: &str) {
        let line = format_line(std::process::id(), message);
        if let Err(e) = self.append(&line) {
            warn!(path = %self.path.display(), error = %e, "Could not append to event log");
        }
    }
}

/// Forwards events to the tracing subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventLog;

impl EventSink for TracingEventLog {
    fn record(&self, message: &str) {
        info!(target: "zombie_guard::events", "{}", message);
    }
}

/// Keeps events in memory
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    entries: Mutex<Vec<String>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries.lock().iter().any(|e| e.contains(needle))
    }
}

impl EventSink for MemoryEventLog {
    fn record(&self, message: &str) {
        self.entries.lock().push(message.to_string());
    }
}

/// Format one log line, terminated by a newline
pub fn format_line(pid: u32, message: &str) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let stamp = now
        .format(&format)
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    format!("[{}] PID {}: {}\n", stamp, pid, message)
}
