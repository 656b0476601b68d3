//! JSON codec for Konflikt protocol messages.
//!
//! Incoming frames are classified with a fast-path probe that extracts only
//! the `type` field, then parsed into the matching [`Message`] variant.
//! Unknown types and malformed payloads are reported as distinct error
//! variants so the caller can log and drop the frame without tearing down
//! the connection.

use serde::Deserialize;
use thiserror::Error;

use crate::protocol::messages::Message;

/// The wire tags this implementation understands.
const KNOWN_TYPES: &[&str] = &[
    "handshake_request",
    "handshake_response",
    "client_registration",
    "layout_assignment",
    "layout_update",
    "input_event",
    "activate_client",
    "deactivation_request",
    "clipboard_sync",
    "server_shutdown",
    "heartbeat",
];

/// Errors that can occur while encoding or decoding a frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame is not valid JSON or has no `type` field.
    #[error("frame has no parseable \"type\" discriminator")]
    MissingType,

    /// The `type` value is not part of the protocol.  Unknown types are
    /// logged and dropped; the connection is preserved.
    #[error("unknown message type: {0:?}")]
    UnknownType(String),

    /// The type was recognized but the payload did not match its schema.
    #[error("malformed {message_type:?} payload: {detail}")]
    Malformed { message_type: String, detail: String },

    /// Serialization failed (should not happen for well-formed messages).
    #[error("failed to serialize message: {0}")]
    Serialize(String),
}

/// Minimal probe used by [`peek_type`]: deserializes the `type` field and
/// ignores everything else.
#[derive(Deserialize)]
struct TypeProbe {
    #[serde(rename = "type")]
    message_type: String,
}

/// Encodes a [`Message`] into a JSON string ready to be sent as a WebSocket
/// text frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Serialize`] if serialization fails.
pub fn encode(msg: &Message) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(|e| ProtocolError::Serialize(e.to_string()))
}

/// Extracts only the `type` field from a frame without parsing the payload.
///
/// Returns `None` when the frame is not a JSON object or carries no string
/// `type` field.
pub fn peek_type(frame: &str) -> Option<String> {
    serde_json::from_str::<TypeProbe>(frame)
        .ok()
        .map(|p| p.message_type)
}

/// Decodes one frame into a [`Message`].
///
/// # Errors
///
/// - [`ProtocolError::MissingType`] when the frame has no usable `type`.
/// - [`ProtocolError::UnknownType`] for tags outside the protocol.
/// - [`ProtocolError::Malformed`] when a known type fails schema validation.
pub fn decode(frame: &str) -> Result<Message, ProtocolError> {
    match serde_json::from_str::<Message>(frame) {
        Ok(msg) => Ok(msg),
        Err(err) => match peek_type(frame) {
            None => Err(ProtocolError::MissingType),
            Some(t) if !KNOWN_TYPES.contains(&t.as_str()) => Err(ProtocolError::UnknownType(t)),
            Some(t) => Err(ProtocolError::Malformed {
                message_type: t,
                detail: err.to_string(),
            }),
        },
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
