//! Bounded in-process log buffer for the debug surface.
//!
//! Retains the last [`MAX_LOG_ENTRIES`] structured records, oldest evicted
//! first.  Key codes and typed text never reach this buffer: callers log
//! them as structured `tracing` fields, and the record message passed here
//! is the redacted rendering.

use std::collections::VecDeque;
use std::sync::Mutex;

use konflikt_core::protocol::unix_timestamp_ms;

/// Retention bound.
pub const MAX_LOG_ENTRIES: usize = 500;

/// One retained record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: u64,
    pub level: String,
    pub message: String,
}

/// Mutex-guarded ring of recent log records.
#[derive(Debug, Default)]
pub struct LogBuffer {
    entries: Mutex<VecDeque<LogEntry>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record, evicting the oldest when full.
    pub fn push(&self, level: &str, message: impl Into<String>) {
        let mut entries = self.entries.lock().expect("lock poisoned");
        if entries.len() == MAX_LOG_ENTRIES {
            entries.pop_front();
        }
        entries.push_back(LogEntry {
            timestamp: unix_timestamp_ms(),
            level: level.to_string(),
            message: message.into(),
        });
    }

    /// Snapshot of the retained records, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().expect("lock poisoned").iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
