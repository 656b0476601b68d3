//! Wire protocol for Konflikt.
//!
//! All traffic is UTF-8 JSON carried in WebSocket text frames.  Every message
//! is an object with a `"type"` discriminator; the remaining fields are flat
//! in the same object.  See [`messages`] for the message set and [`codec`]
//! for encoding, decoding, and the fast-path type probe.

pub mod codec;
pub mod messages;

pub use codec::{decode, encode, peek_type, ProtocolError};
pub use messages::Message;

/// Returns the current time as milliseconds since the Unix epoch.
///
/// All protocol timestamps are wall-clock milliseconds, matching the
/// `timestamp` fields in the wire format.
pub fn unix_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
