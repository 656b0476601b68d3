//! WebSocket transport.
//!
//! The server accepts upgrades on `/ws` (plain or TLS) and runs one reader
//! task per connection; the client dials `ws(s)://host:port/ws`.  Both sides
//! deliver raw text frames to the supervisor over a bounded channel and
//! expose a cheap clonable handle for sending.
//!
//! Connections are identified by an opaque [`PeerId`] token.  The
//! connection table is mutex-guarded and is read from send paths; only the
//! accept/reader tasks mutate it.

use std::net::SocketAddr;

use thiserror::Error;

pub mod tls;
pub mod ws_client;
pub mod ws_server;

pub use ws_client::{ClientEvent, ClientHandle};
pub use ws_server::{ServerHandle, WsServerConfig};

/// Opaque per-connection token.  Never reused within a process lifetime.
pub type PeerId = u64;

/// Events delivered by the server transport to the supervisor.
#[derive(Debug)]
pub enum TransportEvent {
    PeerConnected { peer: PeerId, addr: SocketAddr },
    /// One decoded text frame from a peer.
    Frame { peer: PeerId, text: String },
    PeerDisconnected { peer: PeerId },
}

/// Error type for transport setup.  Steady-state socket errors never
/// surface here; they close the affected connection and are reported as
/// [`TransportEvent::PeerDisconnected`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind WebSocket listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },
}
