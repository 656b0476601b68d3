//! Input event statistics.
//!
//! Counters for the admin surface: totals per event class, a rolling
//! events-per-second figure over a 1-second window, and replay latency
//! measured from the event's source timestamp (client side only, so clock
//! skew between machines shows up as zero rather than a negative latency).

use konflikt_core::protocol::messages::EventKind;
use konflikt_core::protocol::unix_timestamp_ms;

/// Replay latency aggregates, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencyStats {
    pub last_ms: f64,
    pub avg_ms: f64,
    pub max_ms: f64,
    pub samples: u64,
}

/// Rolling input statistics.
#[derive(Debug, Default)]
pub struct InputStats {
    pub total_events: u64,
    pub mouse_events: u64,
    pub key_events: u64,
    pub scroll_events: u64,
    pub events_per_second: f64,

    window_start: u64,
    events_in_window: u64,
    latency_sum: f64,
    latency: LatencyStats,
}

impl InputStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one event and refreshes the per-second window.
    pub fn record(&mut self, kind: EventKind) {
        self.record_at(kind, unix_timestamp_ms());
    }

    fn record_at(&mut self, kind: EventKind, now_ms: u64) {
        self.total_events += 1;
        match kind {
            EventKind::MouseMove | EventKind::MousePress | EventKind::MouseRelease => {
                self.mouse_events += 1
            }
            EventKind::KeyPress | EventKind::KeyRelease => self.key_events += 1,
            EventKind::Scroll => self.scroll_events += 1,
        }

        if self.window_start == 0 {
            self.window_start = now_ms;
        }
        self.events_in_window += 1;

        let elapsed = now_ms.saturating_sub(self.window_start);
        if elapsed >= 1000 {
            self.events_per_second = self.events_in_window as f64 * 1000.0 / elapsed as f64;
            self.window_start = now_ms;
            self.events_in_window = 0;
        }
    }

    /// Records replay latency against the event's source timestamp.
    /// Events with no timestamp or from a skewed clock are skipped.
    pub fn record_latency(&mut self, event_timestamp_ms: u64) {
        self.record_latency_at(event_timestamp_ms, unix_timestamp_ms());
    }

    fn record_latency_at(&mut self, event_timestamp_ms: u64, now_ms: u64) {
        if event_timestamp_ms == 0 || now_ms < event_timestamp_ms {
            return;
        }
        let latency = (now_ms - event_timestamp_ms) as f64;
        self.latency.last_ms = latency;
        self.latency.samples += 1;
        self.latency_sum += latency;
        self.latency.avg_ms = self.latency_sum / self.latency.samples as f64;
        if latency > self.latency.max_ms {
            self.latency.max_ms = latency;
        }
    }

    pub fn latency(&self) -> LatencyStats {
        self.latency
    }
}
