//! All Konflikt protocol message types.
//!
//! Messages are JSON objects discriminated by a `"type"` field.  Serde's
//! `#[serde(tag = "type")]` attribute produces exactly that representation:
//! the variant tag and the payload fields share one flat object.
//!
//! ```json
//! {"type":"activate_client","targetInstanceId":"lappy-7f3a","cursorX":1918,"cursorY":540,"timestamp":1700000000000}
//! ```
//!
//! Field names are camelCase on the wire (`instanceId`, `cursorX`, `delayMs`)
//! while the Rust structs stay snake_case; `#[serde(rename_all = "camelCase")]`
//! bridges the two.

use serde::{Deserialize, Serialize};

/// Protocol version string advertised during the handshake.
pub const PROTOCOL_VERSION: &str = "2.0.0";

/// Capabilities advertised by this implementation in handshake messages.
pub const CAPABILITIES: &[&str] = &["input_events", "screen_info"];

/// Clipboard payload format for plain text.  The only format currently
/// replicated; other formats are accepted but not applied.
pub const CLIPBOARD_FORMAT_TEXT: &str = "text/plain";

// ── Input events ──────────────────────────────────────────────────────────────

/// Kind discriminator for input events, serialized in the `eventType` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    MouseMove,
    MousePress,
    MouseRelease,
    Scroll,
    KeyPress,
    KeyRelease,
}

/// Mouse button identifier carried in the `button` field.
///
/// Buttons 4-7 (scroll wheel emulation on some platforms) are not encoded as
/// press/release pairs; scrolling travels as [`EventKind::Scroll`] with
/// `scrollX`/`scrollY` deltas instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

fn is_zero_i32(v: &i32) -> bool {
    *v == 0
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

/// State snapshot attached to every input event.
///
/// `x`/`y` are absolute coordinates in the *target* screen's local space
/// while a remote client is active (the server substitutes its virtual-cursor
/// position); `dx`/`dy` are the raw relative deltas from the capture source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputEventData {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub dx: i32,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub dy: i32,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub scroll_x: i32,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub scroll_y: i32,
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub keyboard_modifiers: u32,
    #[serde(default)]
    pub mouse_buttons: u32,
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub keycode: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<MouseButton>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

// ── Layout types ──────────────────────────────────────────────────────────────

/// One screen in the shared coordinate plane, as it appears on the wire in
/// `layout_assignment` and `layout_update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenInfo {
    pub instance_id: String,
    pub display_name: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub is_server: bool,
    pub online: bool,
}

/// Assigned position of a screen's top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// Neighbour map for one screen.  Each slot carries the instance id of the
/// screen whose opposite edge is collinear with this one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<String>,
}

// ── Per-message payload structs ───────────────────────────────────────────────

/// `handshake_request`: first message on a new connection, client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeRequest {
    pub instance_id: String,
    pub instance_name: String,
    pub version: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub timestamp: u64,
}

/// `handshake_response`: server's reply carrying its own identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeResponse {
    pub accepted: bool,
    pub instance_id: String,
    pub instance_name: String,
    pub version: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub timestamp: u64,
}

/// `client_registration`: client declares its screen geometry and machine id.
/// Only valid after an accepted handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRegistration {
    pub instance_id: String,
    pub display_name: String,
    pub machine_id: String,
    pub screen_width: i32,
    pub screen_height: i32,
}

/// `layout_assignment`: sent to a newly registered client with its assigned
/// position, neighbour map, and the full layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutAssignment {
    pub position: Position,
    pub adjacency: AdjacencyInfo,
    pub full_layout: Vec<ScreenInfo>,
}

/// `layout_update`: broadcast whenever the screen arrangement changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutUpdate {
    pub screens: Vec<ScreenInfo>,
    #[serde(default)]
    pub timestamp: u64,
}

/// `input_event`: one synthesized input, tagged with its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputEvent {
    pub source_instance_id: String,
    #[serde(default)]
    pub source_display_id: String,
    #[serde(default)]
    pub source_machine_id: String,
    pub event_type: EventKind,
    pub event_data: InputEventData,
}

/// `activate_client`: directive that the client with the matching id becomes
/// the active input target, cursor warped to the given position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateClient {
    pub target_instance_id: String,
    pub cursor_x: i32,
    pub cursor_y: i32,
    #[serde(default)]
    pub timestamp: u64,
}

/// `deactivation_request`: the active client's cursor crossed its left edge
/// moving left; it asks the server to take input back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeactivationRequest {
    pub instance_id: String,
    #[serde(default)]
    pub timestamp: u64,
}

/// `clipboard_sync`: new clipboard payload with its per-source sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardSync {
    pub source_instance_id: String,
    pub format: String,
    pub data: String,
    pub sequence: u32,
    #[serde(default)]
    pub timestamp: u64,
}

/// `server_shutdown`: graceful-shutdown notice.  `delay_ms` is the server's
/// expected restart delay; clients use it to schedule their reconnect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerShutdown {
    pub reason: String,
    #[serde(default)]
    pub delay_ms: i32,
    #[serde(default)]
    pub timestamp: u64,
}

/// `heartbeat`: liveness probe, valid in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heartbeat {
    #[serde(default)]
    pub timestamp: u64,
}

// ── Top-level message enum ────────────────────────────────────────────────────

/// All valid Konflikt messages, discriminated by the `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    HandshakeRequest(HandshakeRequest),
    HandshakeResponse(HandshakeResponse),
    ClientRegistration(ClientRegistration),
    LayoutAssignment(LayoutAssignment),
    LayoutUpdate(LayoutUpdate),
    InputEvent(InputEvent),
    ActivateClient(ActivateClient),
    DeactivationRequest(DeactivationRequest),
    ClipboardSync(ClipboardSync),
    ServerShutdown(ServerShutdown),
    Heartbeat(Heartbeat),
}

impl Message {
    /// Returns the wire `type` tag for this message.
    pub fn message_type(&self) -> &'static str {
        match self {
            Message::HandshakeRequest(_) => "handshake_request",
            Message::HandshakeResponse(_) => "handshake_response",
            Message::ClientRegistration(_) => "client_registration",
            Message::LayoutAssignment(_) => "layout_assignment",
            Message::LayoutUpdate(_) => "layout_update",
            Message::InputEvent(_) => "input_event",
            Message::ActivateClient(_) => "activate_client",
            Message::DeactivationRequest(_) => "deactivation_request",
            Message::ClipboardSync(_) => "clipboard_sync",
            Message::ServerShutdown(_) => "server_shutdown",
            Message::Heartbeat(_) => "heartbeat",
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
