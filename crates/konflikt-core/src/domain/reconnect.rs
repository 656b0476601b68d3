//! Client reconnection policy.
//!
//! The delay before the next attempt depends on how the connection was lost:
//!
//! - graceful shutdown with an announced restart delay: `delay + 500 ms`
//! - graceful shutdown without a delay: 1000 ms
//! - abrupt disconnect: 3000 ms
//!
//! At most [`MAX_RECONNECT_ATTEMPTS`] attempts are made; the counter resets
//! on a successful connect, and a `server_shutdown` notice also resets it
//! since the outage is expected.

use std::time::{Duration, Instant};

/// Attempts stop after this many consecutive failures.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;

const GRACEFUL_DELAY: Duration = Duration::from_millis(1000);
const ABRUPT_DELAY: Duration = Duration::from_millis(3000);
const RESTART_DELAY_BUFFER: Duration = Duration::from_millis(500);

/// Reconnection bookkeeping, owned by the client supervisor.
#[derive(Debug, Default)]
pub struct ReconnectState {
    attempts: u32,
    last_attempt_at: Option<Instant>,
    expecting_reconnect: bool,
    expected_delay_ms: Option<u32>,
}

impl ReconnectState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn expecting_reconnect(&self) -> bool {
        self.expecting_reconnect
    }

    /// All attempts used up without a successful connect.
    pub fn exhausted(&self) -> bool {
        self.attempts >= MAX_RECONNECT_ATTEMPTS
    }

    /// Records a `server_shutdown` notice.  The next disconnect is expected,
    /// so the attempt counter restarts and the announced restart delay (if
    /// any) drives the schedule.
    pub fn on_server_shutdown(&mut self, delay_ms: i32) {
        self.expecting_reconnect = true;
        self.expected_delay_ms = (delay_ms > 0).then_some(delay_ms as u32);
        self.attempts = 0;
    }

    /// The delay to wait before the next attempt.
    pub fn current_delay(&self) -> Duration {
        if self.expecting_reconnect {
            match self.expected_delay_ms {
                Some(ms) => Duration::from_millis(ms as u64) + RESTART_DELAY_BUFFER,
                None => GRACEFUL_DELAY,
            }
        } else {
            ABRUPT_DELAY
        }
    }

    /// Whether an attempt should be made now.
    pub fn should_attempt(&self, now: Instant) -> bool {
        if self.exhausted() {
            return false;
        }
        match self.last_attempt_at {
            Some(last) => now.duration_since(last) >= self.current_delay(),
            None => true,
        }
    }

    /// Marks an attempt as started.
    pub fn record_attempt(&mut self, now: Instant) {
        self.attempts += 1;
        self.last_attempt_at = Some(now);
    }

    /// A connection was established; everything resets.
    pub fn on_connected(&mut self) {
        self.attempts = 0;
        self.last_attempt_at = None;
        self.expecting_reconnect = false;
        self.expected_delay_ms = None;
    }

    /// The connection dropped.  Starts the delay window so the first retry
    /// does not fire immediately.
    pub fn on_disconnected(&mut self, now: Instant) {
        self.last_attempt_at = Some(now);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
