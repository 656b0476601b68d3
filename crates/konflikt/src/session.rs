//! Peer registry: connection handles bound to instance ids, and the
//! per-peer bookkeeping the server keeps between handshake and disconnect.
//!
//! Lifecycle: a connection becomes *handshaken* when its
//! `handshake_request` is accepted, and a full [`Peer`] exists once
//! `client_registration` arrives.  Registration without a prior handshake
//! is a protocol violation and drops the connection.  A new connection
//! presenting an already-known instance id replaces the old peer; the
//! previous connection is closed.

use std::collections::HashMap;

use thiserror::Error;

use konflikt_core::protocol::messages::ClientRegistration;

use crate::transport::PeerId;

/// Error type for session operations.
#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("client_registration before handshake")]
    NotHandshaken,
}

/// A handshaken (and usually registered) participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub connection: PeerId,
    pub instance_id: String,
    pub display_name: String,
    pub screen_width: i32,
    pub screen_height: i32,
    pub connected_at: u64,
    /// Currently receiving replayed input.
    pub active: bool,
}

/// Connection and peer tracking for the server role.
#[derive(Debug, Default)]
pub struct SessionManager {
    /// Connection to instance binding, established at handshake.
    by_connection: HashMap<PeerId, String>,
    /// Registered peers by instance id.
    peers: HashMap<String, Peer>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a connection to the instance id it announced in its handshake.
    ///
    /// Returns the previous connection bound to the same instance id, if
    /// any; the caller must close it (latest connection wins).
    pub fn on_handshake(&mut self, connection: PeerId, instance_id: &str) -> Option<PeerId> {
        let stale = self
            .by_connection
            .iter()
            .find(|(conn, id)| id.as_str() == instance_id && **conn != connection)
            .map(|(conn, _)| *conn);

        if let Some(old) = stale {
            self.by_connection.remove(&old);
        }
        self.by_connection.insert(connection, instance_id.to_string());
        stale
    }

    pub fn is_handshaken(&self, connection: PeerId) -> bool {
        self.by_connection.contains_key(&connection)
    }

    /// The instance id a connection handshook as.
    pub fn instance_for(&self, connection: PeerId) -> Option<&str> {
        self.by_connection.get(&connection).map(String::as_str)
    }

    /// Records a registration, creating or replacing the peer entry.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotHandshaken`] when the connection never completed
    /// a handshake; the caller drops the connection.
    pub fn register(
        &mut self,
        connection: PeerId,
        registration: &ClientRegistration,
        now_ms: u64,
    ) -> Result<(), SessionError> {
        if !self.is_handshaken(connection) {
            return Err(SessionError::NotHandshaken);
        }

        // The registration's instance id wins over whatever the handshake
        // announced for this connection.
        self.by_connection
            .insert(connection, registration.instance_id.clone());

        self.peers.insert(
            registration.instance_id.clone(),
            Peer {
                connection,
                instance_id: registration.instance_id.clone(),
                display_name: registration.display_name.clone(),
                screen_width: registration.screen_width,
                screen_height: registration.screen_height,
                connected_at: now_ms,
                active: false,
            },
        );
        Ok(())
    }

    pub fn peer(&self, instance_id: &str) -> Option<&Peer> {
        self.peers.get(instance_id)
    }

    /// Registered peers in no particular order.
    pub fn peers(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Marks exactly one peer (or none) as the active input target.
    pub fn set_active(&mut self, instance_id: Option<&str>) {
        for peer in self.peers.values_mut() {
            peer.active = Some(peer.instance_id.as_str()) == instance_id;
        }
    }

    /// Removes a disconnecting connection and its peer entry, if the peer
    /// is still bound to this connection.  Returns the removed peer.
    pub fn on_disconnect(&mut self, connection: PeerId) -> Option<Peer> {
        let instance_id = self.by_connection.remove(&connection)?;
        match self.peers.get(&instance_id) {
            // A replacement connection may already own this instance id.
            Some(peer) if peer.connection != connection => None,
            Some(_) => self.peers.remove(&instance_id),
            None => None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
