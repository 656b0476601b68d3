//! Client-side mirror of the edge engine.
//!
//! When the server activates a client, that client warps its local cursor to
//! the hand-off position and starts replaying every incoming `input_event`
//! whose source is not itself.  When a replayed mouse move lands on the left
//! edge still heading left, the client asks the server to take input back.
//!
//! The server does not announce deactivations to clients; a client's active
//! flag clears when it sees an `activate_client` naming someone else.  A
//! stale active flag is harmless because the server only emits input events
//! while a remote is active.

use std::time::{Duration, Instant};

use crate::protocol::messages::{ActivateClient, EventKind, InputEvent};

/// Deactivation requests are rate-limited to one per this interval.
pub const DEACTIVATION_REQUEST_INTERVAL: Duration = Duration::from_millis(500);

/// What to do with one incoming `input_event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MirrorDecision {
    /// Replay the event through the input backend.
    pub replay: bool,
    /// Send a `deactivation_request` to the server.
    pub request_deactivation: bool,
}

/// Per-client activation state.
#[derive(Debug)]
pub struct ClientMirror {
    instance_id: String,
    is_active: bool,
    last_deactivation_request: Option<Instant>,
}

impl ClientMirror {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            is_active: false,
            last_deactivation_request: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Handles an `activate_client` broadcast.
    ///
    /// Returns the warp position when the directive targets this instance;
    /// a directive for any other instance clears the active flag.
    pub fn handle_activate(&mut self, msg: &ActivateClient) -> Option<(i32, i32)> {
        if msg.target_instance_id == self.instance_id {
            self.is_active = true;
            Some((msg.cursor_x, msg.cursor_y))
        } else {
            self.is_active = false;
            None
        }
    }

    /// Classifies one incoming `input_event`.
    ///
    /// Events are replayed only while active and never when they originated
    /// here.  A mouse move that lands at `x <= 1` still moving left
    /// additionally requests deactivation, at most once per
    /// [`DEACTIVATION_REQUEST_INTERVAL`].
    pub fn handle_input_event(&mut self, msg: &InputEvent, now: Instant) -> MirrorDecision {
        if !self.is_active || msg.source_instance_id == self.instance_id {
            return MirrorDecision::default();
        }

        let mut decision = MirrorDecision { replay: true, request_deactivation: false };

        if msg.event_type == EventKind::MouseMove
            && msg.event_data.x <= 1
            && msg.event_data.dx < 0
        {
            let allowed = self
                .last_deactivation_request
                .map(|t| now.duration_since(t) >= DEACTIVATION_REQUEST_INTERVAL)
                .unwrap_or(true);
            if allowed {
                self.last_deactivation_request = Some(now);
                decision.request_deactivation = true;
            }
        }

        decision
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
