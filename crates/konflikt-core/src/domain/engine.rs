//! Server-side edge/cursor engine.
//!
//! The engine is an explicit two-state machine:
//!
//! - [`FocusState::Local`]: the server owns input, the cursor is visible.
//! - [`FocusState::Remote`]: a remote client is active; the server keeps an
//!   off-screen *virtual cursor* in the client's local coordinates, clamped
//!   to the client's bounds, and every captured event is forwarded.
//!
//! All transitions go through labelled methods that return an
//! [`EngineAction`] for the supervisor to execute (broadcast a message, hide
//! or show the cursor, warp it).  The engine itself performs no I/O and
//! takes an explicit `Instant` wherever a cooldown applies.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::domain::layout::{Edge, LayoutManager};
use crate::protocol::messages::{EventKind, InputEventData, MouseButton};

/// Transitions are suppressed for this long after a deactivation, so the
/// freshly warped cursor cannot immediately re-trigger the same edge.
pub const DEACTIVATION_COOLDOWN: Duration = Duration::from_millis(500);

/// Cursor is "at edge" when within this many pixels of the screen border.
const EDGE_THRESHOLD: i32 = 1;

/// Cursor/button/modifier snapshot attached to a captured event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorSnapshot {
    /// Absolute position in the server's local coordinates.
    pub x: i32,
    pub y: i32,
    /// Relative motion since the previous event.
    pub dx: i32,
    pub dy: i32,
    pub scroll_x: i32,
    pub scroll_y: i32,
    pub keyboard_modifiers: u32,
    pub mouse_buttons: u32,
}

/// One raw input event delivered by the platform capture layer.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub kind: EventKind,
    pub state: CursorSnapshot,
    pub keycode: u32,
    pub button: Option<MouseButton>,
    pub text: Option<String>,
    pub timestamp: u64,
}

impl CapturedEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            state: CursorSnapshot::default(),
            keycode: 0,
            button: None,
            text: None,
            timestamp: 0,
        }
    }

    pub fn mouse_move(x: i32, y: i32, dx: i32, dy: i32) -> Self {
        let mut event = Self::new(EventKind::MouseMove);
        event.state = CursorSnapshot { x, y, dx, dy, ..Default::default() };
        event
    }

    pub fn button(kind: EventKind, button: MouseButton) -> Self {
        let mut event = Self::new(kind);
        event.button = Some(button);
        event
    }

    pub fn scroll(scroll_x: i32, scroll_y: i32) -> Self {
        let mut event = Self::new(EventKind::Scroll);
        event.state = CursorSnapshot { scroll_x, scroll_y, ..Default::default() };
        event
    }

    pub fn key_press(keycode: u32) -> Self {
        let mut event = Self::new(EventKind::KeyPress);
        event.keycode = keycode;
        event
    }
}

/// One local monitor, used to resolve per-display edge overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayBounds {
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub is_primary: bool,
}

impl DisplayBounds {
    fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Which edges of a screen may trigger a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeSettings {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl Default for EdgeSettings {
    fn default() -> Self {
        Self { left: true, right: true, top: true, bottom: true }
    }
}

impl EdgeSettings {
    fn enabled(&self, edge: Edge) -> bool {
        match edge {
            Edge::Left => self.left,
            Edge::Right => self.right,
            Edge::Top => self.top,
            Edge::Bottom => self.bottom,
        }
    }
}

/// Runtime configuration for the engine.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Global edge enables.
    pub edges: EdgeSettings,
    /// Per-display overrides, keyed by display id.  A display without an
    /// entry falls back to the global settings.
    pub display_edges: HashMap<u32, EdgeSettings>,
    /// When set, no transition fires; an already-active remote stays active.
    pub lock_cursor: bool,
    /// Keycode that toggles `lock_cursor`.  0 disables the hotkey.
    pub lock_hotkey: u32,
    /// Keycode substitutions applied before a key event leaves the server
    /// (e.g. Mac Command 55 to Linux Super 133).  Direction-agnostic at this
    /// layer; the policy lives in configuration.
    pub key_remap: HashMap<u32, u32>,
}

/// Who currently receives input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusState {
    /// The server owns input; the cursor is visible.
    Local,
    /// A remote client is active; the virtual cursor tracks its position in
    /// the client's local coordinates.
    Remote {
        target: String,
        cursor_x: i32,
        cursor_y: i32,
        remote_width: i32,
        remote_height: i32,
    },
}

/// What the supervisor must do after feeding the engine an event.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineAction {
    /// Nothing to do; the event stays local.
    Ignore,
    /// Broadcast `activate_client`, hide the local cursor.  The engine is
    /// now in [`FocusState::Remote`].
    Activate {
        target: String,
        cursor_x: i32,
        cursor_y: i32,
    },
    /// Broadcast one `input_event` with the given payload.
    Forward { kind: EventKind, data: InputEventData },
    /// Show the cursor and warp it to the given position.  The engine is
    /// back in [`FocusState::Local`].
    Deactivate { warp_x: i32, warp_y: i32 },
    /// The lock hotkey fired; the event is swallowed.
    LockToggled(bool),
}

/// The server-side state machine.
#[derive(Debug)]
pub struct EdgeEngine {
    server_id: String,
    config: EngineConfig,
    state: FocusState,
    last_deactivation: Option<Instant>,
}

impl EdgeEngine {
    pub fn new(server_id: impl Into<String>, config: EngineConfig) -> Self {
        Self {
            server_id: server_id.into(),
            config,
            state: FocusState::Local,
            last_deactivation: None,
        }
    }

    pub fn state(&self) -> &FocusState {
        &self.state
    }

    /// The instance id of the active client, if any.
    pub fn active_client(&self) -> Option<&str> {
        match &self.state {
            FocusState::Local => None,
            FocusState::Remote { target, .. } => Some(target),
        }
    }

    /// The virtual cursor position while a remote is active.
    pub fn virtual_cursor(&self) -> Option<(i32, i32)> {
        match &self.state {
            FocusState::Local => None,
            FocusState::Remote { cursor_x, cursor_y, .. } => Some((*cursor_x, *cursor_y)),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Updates the lock flag directly (configuration surface; the hotkey
    /// path goes through [`handle_event`](Self::handle_event)).  Locking
    /// while a remote is active blocks new transitions only; it does not
    /// force a deactivation.
    pub fn set_lock_cursor(&mut self, locked: bool) {
        self.config.lock_cursor = locked;
    }

    pub fn set_edges(&mut self, edges: EdgeSettings) {
        self.config.edges = edges;
    }

    /// Feeds one captured event through the state machine.
    pub fn handle_event(
        &mut self,
        event: &CapturedEvent,
        layout: &LayoutManager,
        displays: &[DisplayBounds],
        now: Instant,
    ) -> EngineAction {
        let kind = event.kind;

        // The lock hotkey is checked before anything else and swallowed, in
        // both states.
        if kind == EventKind::KeyPress
            && self.config.lock_hotkey != 0
            && event.keycode == self.config.lock_hotkey
        {
            self.config.lock_cursor = !self.config.lock_cursor;
            return EngineAction::LockToggled(self.config.lock_cursor);
        }

        match self.state {
            FocusState::Local => self.handle_local(kind, event, layout, displays, now),
            FocusState::Remote { .. } => self.handle_remote(kind, event),
        }
    }

    /// Deactivation requested by the active client (or forced because the
    /// active client disconnected).  Requests naming a non-active instance
    /// are ignored.
    ///
    /// The warp target is the right edge of the server screen at the
    /// virtual cursor's row; the virtual cursor integrates the same deltas
    /// as the hidden physical cursor, so its height is where the user left
    /// off.
    pub fn handle_deactivation_request(
        &mut self,
        requester: &str,
        layout: &LayoutManager,
        now: Instant,
    ) -> Option<EngineAction> {
        match &self.state {
            FocusState::Remote { target, cursor_y, .. } if target == requester => {
                let warp_y = *cursor_y;
                self.state = FocusState::Local;
                self.last_deactivation = Some(now);
                let warp_x = layout
                    .screen(&self.server_id)
                    .map(|s| s.right() - 1)
                    .unwrap_or(0);
                Some(EngineAction::Deactivate { warp_x, warp_y })
            }
            _ => None,
        }
    }

    /// Same path as a deactivation request, taken when the disconnecting
    /// peer is the active client.
    pub fn handle_peer_disconnected(
        &mut self,
        instance_id: &str,
        layout: &LayoutManager,
        now: Instant,
    ) -> Option<EngineAction> {
        self.handle_deactivation_request(instance_id, layout, now)
    }

    // ── Local state ───────────────────────────────────────────────────────────

    fn handle_local(
        &mut self,
        kind: EventKind,
        event: &CapturedEvent,
        layout: &LayoutManager,
        displays: &[DisplayBounds],
        now: Instant,
    ) -> EngineAction {
        if kind != EventKind::MouseMove {
            return EngineAction::Ignore;
        }

        if self.config.lock_cursor {
            return EngineAction::Ignore;
        }

        if let Some(last) = self.last_deactivation {
            if now.duration_since(last) < DEACTIVATION_COOLDOWN {
                return EngineAction::Ignore;
            }
        }

        let Some(server) = layout.screen(&self.server_id) else {
            return EngineAction::Ignore;
        };

        let (x, y) = (event.state.x, event.state.y);
        let edges = self.edge_settings_at(displays, x, y);

        let edge = if x <= server.x + EDGE_THRESHOLD && edges.enabled(Edge::Left) {
            Edge::Left
        } else if x >= server.right() - EDGE_THRESHOLD - 1 && edges.enabled(Edge::Right) {
            Edge::Right
        } else if y <= server.y + EDGE_THRESHOLD && edges.enabled(Edge::Top) {
            Edge::Top
        } else if y >= server.bottom() - EDGE_THRESHOLD - 1 && edges.enabled(Edge::Bottom) {
            Edge::Bottom
        } else {
            return EngineAction::Ignore;
        };

        let Some(transition) = layout.transition_target(&self.server_id, edge, x, y) else {
            return EngineAction::Ignore;
        };

        self.state = FocusState::Remote {
            target: transition.target.instance_id.clone(),
            cursor_x: transition.new_x,
            cursor_y: transition.new_y,
            remote_width: transition.target.width,
            remote_height: transition.target.height,
        };

        EngineAction::Activate {
            target: transition.target.instance_id,
            cursor_x: transition.new_x,
            cursor_y: transition.new_y,
        }
    }

    /// Resolves the edge enables for the display containing `(x, y)`,
    /// falling back to the global settings when the point is outside every
    /// known display or the display has no override.
    fn edge_settings_at(&self, displays: &[DisplayBounds], x: i32, y: i32) -> EdgeSettings {
        displays
            .iter()
            .find(|d| d.contains(x, y))
            .and_then(|d| self.config.display_edges.get(&d.id).copied())
            .unwrap_or(self.config.edges)
    }

    // ── Remote state ──────────────────────────────────────────────────────────

    fn handle_remote(&mut self, kind: EventKind, event: &CapturedEvent) -> EngineAction {
        let FocusState::Remote {
            cursor_x,
            cursor_y,
            remote_width,
            remote_height,
            ..
        } = &mut self.state
        else {
            return EngineAction::Ignore;
        };

        let mut data = InputEventData {
            timestamp: event.timestamp,
            keyboard_modifiers: event.state.keyboard_modifiers,
            mouse_buttons: event.state.mouse_buttons,
            ..Default::default()
        };

        match kind {
            EventKind::MouseMove => {
                *cursor_x = (*cursor_x + event.state.dx).clamp(0, *remote_width - 1);
                *cursor_y = (*cursor_y + event.state.dy).clamp(0, *remote_height - 1);
                data.x = *cursor_x;
                data.y = *cursor_y;
                data.dx = event.state.dx;
                data.dy = event.state.dy;
            }
            EventKind::MousePress | EventKind::MouseRelease => {
                data.x = *cursor_x;
                data.y = *cursor_y;
                data.button = event.button;
            }
            EventKind::Scroll => {
                data.x = *cursor_x;
                data.y = *cursor_y;
                data.scroll_x = event.state.scroll_x;
                data.scroll_y = event.state.scroll_y;
            }
            EventKind::KeyPress | EventKind::KeyRelease => {
                data.x = *cursor_x;
                data.y = *cursor_y;
                data.keycode = self
                    .config
                    .key_remap
                    .get(&event.keycode)
                    .copied()
                    .unwrap_or(event.keycode);
                data.text = event.text.clone();
            }
        }

        EngineAction::Forward { kind, data }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn layout_with_client() -> LayoutManager {
        let mut layout = LayoutManager::new();
        layout.set_server_screen("server-01", "workstation", "m0", 1920, 1080);
        layout.register_client("lappy-7f3a", "lappy", "m1", 1280, 720);
        layout
    }

    fn engine() -> EdgeEngine {
        EdgeEngine::new("server-01", EngineConfig::default())
    }

    // ── Activation ────────────────────────────────────────────────────────────

    #[test]
    fn test_right_edge_move_activates_adjacent_client() {
        let layout = layout_with_client();
        let mut engine = engine();
        let now = Instant::now();

        let action = engine.handle_event(
            &CapturedEvent::mouse_move(1919, 400, 2, 0),
            &layout,
            &[],
            now,
        );

        assert_eq!(
            action,
            EngineAction::Activate {
                target: "lappy-7f3a".to_string(),
                cursor_x: 1,
                cursor_y: 400,
            }
        );
        assert_eq!(engine.active_client(), Some("lappy-7f3a"));
        assert_eq!(engine.virtual_cursor(), Some((1, 400)));
    }

    #[test]
    fn test_no_activation_away_from_edge() {
        let layout = layout_with_client();
        let mut engine = engine();

        let action = engine.handle_event(
            &CapturedEvent::mouse_move(960, 540, 1, 1),
            &layout,
            &[],
            Instant::now(),
        );
        assert_eq!(action, EngineAction::Ignore);
        assert_eq!(engine.active_client(), None);
    }

    #[test]
    fn test_disabled_edge_does_not_activate() {
        let layout = layout_with_client();
        let mut engine = EdgeEngine::new(
            "server-01",
            EngineConfig {
                edges: EdgeSettings { right: false, ..Default::default() },
                ..Default::default()
            },
        );

        let action = engine.handle_event(
            &CapturedEvent::mouse_move(1919, 400, 2, 0),
            &layout,
            &[],
            Instant::now(),
        );
        assert_eq!(action, EngineAction::Ignore);
    }

    #[test]
    fn test_lock_cursor_blocks_activation() {
        let layout = layout_with_client();
        let mut engine = engine();
        engine.set_lock_cursor(true);

        let action = engine.handle_event(
            &CapturedEvent::mouse_move(1919, 400, 2, 0),
            &layout,
            &[],
            Instant::now(),
        );
        assert_eq!(action, EngineAction::Ignore);
    }

    #[test]
    fn test_offline_target_does_not_activate() {
        let mut layout = layout_with_client();
        layout.set_online("lappy-7f3a", false);
        let mut engine = engine();

        let action = engine.handle_event(
            &CapturedEvent::mouse_move(1919, 400, 2, 0),
            &layout,
            &[],
            Instant::now(),
        );
        assert_eq!(action, EngineAction::Ignore);
    }

    // ── Cooldown ──────────────────────────────────────────────────────────────

    #[test]
    fn test_transition_suppressed_within_cooldown() {
        let layout = layout_with_client();
        let mut engine = engine();
        let t0 = Instant::now();

        engine.handle_event(&CapturedEvent::mouse_move(1919, 400, 2, 0), &layout, &[], t0);
        engine.handle_deactivation_request("lappy-7f3a", &layout, t0);

        // 300 ms later: still inside the 500 ms cooldown.
        let action = engine.handle_event(
            &CapturedEvent::mouse_move(1919, 400, 2, 0),
            &layout,
            &[],
            t0 + Duration::from_millis(300),
        );
        assert_eq!(action, EngineAction::Ignore);

        // 600 ms later: transitions again.
        let action = engine.handle_event(
            &CapturedEvent::mouse_move(1919, 400, 2, 0),
            &layout,
            &[],
            t0 + Duration::from_millis(600),
        );
        assert!(matches!(action, EngineAction::Activate { .. }));
    }

    // ── Remote forwarding ─────────────────────────────────────────────────────

    fn activated_engine(layout: &LayoutManager) -> EdgeEngine {
        let mut engine = engine();
        let action = engine.handle_event(
            &CapturedEvent::mouse_move(1919, 400, 2, 0),
            layout,
            &[],
            Instant::now(),
        );
        assert!(matches!(action, EngineAction::Activate { .. }));
        engine
    }

    #[test]
    fn test_remote_mouse_move_integrates_deltas() {
        let layout = layout_with_client();
        let mut engine = activated_engine(&layout);

        let action = engine.handle_event(
            &CapturedEvent::mouse_move(10, 410, 9, 10),
            &layout,
            &[],
            Instant::now(),
        );
        match action {
            EngineAction::Forward { kind, data } => {
                assert_eq!(kind, EventKind::MouseMove);
                assert_eq!((data.x, data.y), (10, 410));
                assert_eq!((data.dx, data.dy), (9, 10));
            }
            other => panic!("expected Forward, got {other:?}"),
        }
    }

    #[test]
    fn test_virtual_cursor_clamps_at_remote_bounds() {
        let layout = layout_with_client();
        let mut engine = activated_engine(&layout);

        // Drive the virtual cursor from its (1, 400) entry point to (0, 10).
        engine.handle_event(&CapturedEvent::mouse_move(0, 0, -1, -390), &layout, &[], Instant::now());
        assert_eq!(engine.virtual_cursor(), Some((0, 10)));

        // Pushing further left must not move it.
        let action = engine.handle_event(
            &CapturedEvent::mouse_move(0, 0, -5, 0),
            &layout,
            &[],
            Instant::now(),
        );
        assert_eq!(engine.virtual_cursor(), Some((0, 10)));
        match action {
            EngineAction::Forward { data, .. } => assert_eq!((data.x, data.y), (0, 10)),
            other => panic!("expected Forward, got {other:?}"),
        }
    }

    #[test]
    fn test_remote_key_event_applies_remap() {
        let layout = layout_with_client();
        let mut config = EngineConfig::default();
        config.key_remap.insert(55, 133); // Mac Command to Linux Super
        let mut engine = EdgeEngine::new("server-01", config);
        engine.handle_event(
            &CapturedEvent::mouse_move(1919, 400, 2, 0),
            &layout,
            &[],
            Instant::now(),
        );

        let action = engine.handle_event(&CapturedEvent::key_press(55), &layout, &[], Instant::now());
        match action {
            EngineAction::Forward { kind, data } => {
                assert_eq!(kind, EventKind::KeyPress);
                assert_eq!(data.keycode, 133);
            }
            other => panic!("expected Forward, got {other:?}"),
        }
    }

    #[test]
    fn test_remote_unmapped_key_passes_through() {
        let layout = layout_with_client();
        let mut engine = activated_engine(&layout);

        let action = engine.handle_event(&CapturedEvent::key_press(38), &layout, &[], Instant::now());
        match action {
            EngineAction::Forward { data, .. } => assert_eq!(data.keycode, 38),
            other => panic!("expected Forward, got {other:?}"),
        }
    }

    #[test]
    fn test_remote_scroll_carries_deltas_at_virtual_cursor() {
        let layout = layout_with_client();
        let mut engine = activated_engine(&layout);

        let action = engine.handle_event(&CapturedEvent::scroll(0, -120), &layout, &[], Instant::now());
        match action {
            EngineAction::Forward { kind, data } => {
                assert_eq!(kind, EventKind::Scroll);
                assert_eq!(data.scroll_y, -120);
                assert_eq!((data.x, data.y), (1, 400));
            }
            other => panic!("expected Forward, got {other:?}"),
        }
    }

    // ── Deactivation ──────────────────────────────────────────────────────────

    #[test]
    fn test_deactivation_request_from_active_client_returns_to_local() {
        let layout = layout_with_client();
        let mut engine = activated_engine(&layout);
        let now = Instant::now();

        let action = engine.handle_deactivation_request("lappy-7f3a", &layout, now);
        assert_eq!(action, Some(EngineAction::Deactivate { warp_x: 1919, warp_y: 400 }));
        assert_eq!(engine.state(), &FocusState::Local);
        assert_eq!(engine.active_client(), None);
    }

    #[test]
    fn test_deactivation_request_from_non_active_client_is_ignored() {
        let layout = layout_with_client();
        let mut engine = activated_engine(&layout);

        let action = engine.handle_deactivation_request("imposter", &layout, Instant::now());
        assert_eq!(action, None);
        assert_eq!(engine.active_client(), Some("lappy-7f3a"));
    }

    #[test]
    fn test_active_client_disconnect_deactivates() {
        let layout = layout_with_client();
        let mut engine = activated_engine(&layout);

        let action = engine.handle_peer_disconnected("lappy-7f3a", &layout, Instant::now());
        assert!(matches!(action, Some(EngineAction::Deactivate { .. })));
        assert_eq!(engine.state(), &FocusState::Local);
    }

    #[test]
    fn test_non_active_disconnect_does_not_deactivate() {
        let layout = layout_with_client();
        let mut engine = activated_engine(&layout);

        let action = engine.handle_peer_disconnected("other", &layout, Instant::now());
        assert_eq!(action, None);
        assert!(matches!(engine.state(), FocusState::Remote { .. }));
    }

    // ── Lock hotkey ───────────────────────────────────────────────────────────

    #[test]
    fn test_lock_hotkey_toggles_and_swallows() {
        let layout = layout_with_client();
        let mut engine = EdgeEngine::new(
            "server-01",
            EngineConfig { lock_hotkey: 107, ..Default::default() },
        );

        let action = engine.handle_event(&CapturedEvent::key_press(107), &layout, &[], Instant::now());
        assert_eq!(action, EngineAction::LockToggled(true));
        assert!(engine.config().lock_cursor);

        let action = engine.handle_event(&CapturedEvent::key_press(107), &layout, &[], Instant::now());
        assert_eq!(action, EngineAction::LockToggled(false));
    }

    #[test]
    fn test_lock_hotkey_works_while_remote_without_deactivating() {
        let layout = layout_with_client();
        let mut engine = EdgeEngine::new(
            "server-01",
            EngineConfig { lock_hotkey: 107, ..Default::default() },
        );
        engine.handle_event(&CapturedEvent::mouse_move(1919, 400, 2, 0), &layout, &[], Instant::now());
        assert!(engine.active_client().is_some());

        let action = engine.handle_event(&CapturedEvent::key_press(107), &layout, &[], Instant::now());
        assert_eq!(action, EngineAction::LockToggled(true));
        // Locking blocks new transitions only; the remote stays active.
        assert_eq!(engine.active_client(), Some("lappy-7f3a"));
    }

    #[test]
    fn test_zero_hotkey_is_disabled() {
        let layout = layout_with_client();
        let mut engine = engine();

        let action = engine.handle_event(&CapturedEvent::key_press(0), &layout, &[], Instant::now());
        assert_eq!(action, EngineAction::Ignore);
        assert!(!engine.config().lock_cursor);
    }

    // ── Per-display edges ─────────────────────────────────────────────────────

    #[test]
    fn test_per_display_override_wins_over_global() {
        let layout = layout_with_client();
        let displays = [DisplayBounds { id: 7, x: 0, y: 0, width: 1920, height: 1080, is_primary: true }];

        let mut config = EngineConfig::default();
        config
            .display_edges
            .insert(7, EdgeSettings { right: false, ..Default::default() });
        let mut engine = EdgeEngine::new("server-01", config);

        let action = engine.handle_event(
            &CapturedEvent::mouse_move(1919, 400, 2, 0),
            &layout,
            &displays,
            Instant::now(),
        );
        assert_eq!(action, EngineAction::Ignore, "display override disables the right edge");
    }

    #[test]
    fn test_point_outside_known_displays_uses_global_edges() {
        let layout = layout_with_client();
        let displays = [DisplayBounds { id: 7, x: 5000, y: 0, width: 100, height: 100, is_primary: false }];
        let mut engine = engine();

        let action = engine.handle_event(
            &CapturedEvent::mouse_move(1919, 400, 2, 0),
            &layout,
            &displays,
            Instant::now(),
        );
        assert!(matches!(action, EngineAction::Activate { .. }));
    }
}
