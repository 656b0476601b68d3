//! Clipboard replication state.
//!
//! Each side polls its local clipboard on a 500 ms throttle and broadcasts a
//! `clipboard_sync` when the text changed.  Incoming updates are applied
//! under a per-source monotonic sequence: anything at or below the last
//! applied sequence is dropped, so replayed or reordered frames are no-ops.
//!
//! Applying an update records `last_text` *before* the caller writes it back
//! to the OS clipboard, so the next poll sees the new text, compares equal,
//! and does not re-publish a value the replicator itself just wrote.

use std::time::{Duration, Instant};

use crate::protocol::messages::{ClipboardSync, CLIPBOARD_FORMAT_TEXT};

/// Minimum interval between clipboard reads.
pub const CLIPBOARD_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Outgoing clipboard broadcast produced by a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardBroadcast {
    pub data: String,
    pub sequence: u32,
}

/// Last known clipboard value plus the replication sequence.
#[derive(Debug, Default)]
pub struct ClipboardReplicator {
    last_text: String,
    last_sequence: u32,
    last_check_at: Option<Instant>,
}

impl ClipboardReplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_sequence(&self) -> u32 {
        self.last_sequence
    }

    pub fn last_text(&self) -> &str {
        &self.last_text
    }

    /// Considers the current local clipboard content.
    ///
    /// Returns a broadcast payload when the poll throttle has elapsed and
    /// the text is non-empty and differs from the last known value.
    pub fn poll(&mut self, now: Instant, current_text: &str) -> Option<ClipboardBroadcast> {
        if let Some(last) = self.last_check_at {
            if now.duration_since(last) < CLIPBOARD_POLL_INTERVAL {
                return None;
            }
        }
        self.last_check_at = Some(now);

        if current_text.is_empty() || current_text == self.last_text {
            return None;
        }

        self.last_text = current_text.to_string();
        self.last_sequence += 1;
        Some(ClipboardBroadcast {
            data: current_text.to_string(),
            sequence: self.last_sequence,
        })
    }

    /// Applies an incoming `clipboard_sync`.
    ///
    /// Returns the text the caller should write to the OS clipboard, or
    /// `None` when the update is our own echo, stale, or in a format we do
    /// not replicate.  Stale means `sequence <= last_sequence` regardless of
    /// source; ties across sources are dropped rather than re-applied.
    pub fn apply(&mut self, msg: &ClipboardSync, self_id: &str) -> Option<String> {
        if msg.source_instance_id == self_id {
            return None;
        }
        if msg.sequence <= self.last_sequence {
            return None;
        }

        self.last_sequence = msg.sequence;

        if msg.format != CLIPBOARD_FORMAT_TEXT {
            return None;
        }

        self.last_text = msg.data.clone();
        Some(msg.data.clone())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
