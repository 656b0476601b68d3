//! WebSocket server: accept loop and per-connection tasks.
//!
//! Each accepted connection gets a reader task (frames in, posted to the
//! supervisor) and a writer task (frames out, drained from an unbounded
//! per-connection channel).  The upgrade is restricted to the `/ws` path;
//! anything else is rejected during the handshake.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_rustls::TlsAcceptor;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use super::{PeerId, TransportError, TransportEvent};

/// Server transport configuration.
#[derive(Clone)]
pub struct WsServerConfig {
    pub bind_addr: SocketAddr,
    /// When set, connections are TLS-wrapped before the WebSocket upgrade.
    pub tls: Option<TlsAcceptor>,
}

type ConnectionTable = Arc<Mutex<HashMap<PeerId, mpsc::UnboundedSender<WsMessage>>>>;

/// Send-side handle to the server transport.  Cheap to clone; usable from
/// any task.
#[derive(Clone)]
pub struct ServerHandle {
    connections: ConnectionTable,
}

impl ServerHandle {
    /// Sends one text frame to a single peer.  Unknown or closed peers are
    /// ignored.
    pub fn send(&self, peer: PeerId, text: String) {
        let connections = self.connections.lock().expect("lock poisoned");
        if let Some(tx) = connections.get(&peer) {
            let _ = tx.send(WsMessage::Text(text));
        }
    }

    /// Sends one text frame to every connected peer.
    pub fn broadcast(&self, text: &str) {
        let connections = self.connections.lock().expect("lock poisoned");
        for tx in connections.values() {
            let _ = tx.send(WsMessage::Text(text.to_string()));
        }
    }

    /// Initiates a close for one peer.  The writer task sends a Close frame
    /// and tears the connection down; the reader reports the disconnect.
    pub fn close(&self, peer: PeerId) {
        let connections = self.connections.lock().expect("lock poisoned");
        if let Some(tx) = connections.get(&peer) {
            let _ = tx.send(WsMessage::Close(None));
        }
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().expect("lock poisoned").len()
    }
}

/// Binds the listener and spawns the accept loop.
///
/// # Errors
///
/// Returns [`TransportError::Bind`] when the port cannot be bound; that is
/// an init failure and aborts startup.
pub async fn start(
    config: WsServerConfig,
    events: mpsc::Sender<TransportEvent>,
) -> Result<ServerHandle, TransportError> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .map_err(|source| TransportError::Bind { addr: config.bind_addr, source })?;

    info!(
        "WebSocket server listening on {} ({})",
        config.bind_addr,
        if config.tls.is_some() { "wss" } else { "ws" }
    );

    let connections: ConnectionTable = Arc::new(Mutex::new(HashMap::new()));
    let handle = ServerHandle { connections: Arc::clone(&connections) };

    tokio::spawn(accept_loop(listener, config.tls, connections, events));

    Ok(handle)
}

async fn accept_loop(
    listener: TcpListener,
    tls: Option<TlsAcceptor>,
    connections: ConnectionTable,
    events: mpsc::Sender<TransportEvent>,
) {
    static NEXT_PEER_ID: AtomicU64 = AtomicU64::new(1);

    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                // Transient accept errors (fd exhaustion etc.) must not kill
                // the whole server.
                warn!("accept error: {e}");
                continue;
            }
        };

        let peer = NEXT_PEER_ID.fetch_add(1, Ordering::Relaxed);
        let connections = Arc::clone(&connections);
        let events = events.clone();
        let tls = tls.clone();

        tokio::spawn(async move {
            match tls {
                Some(acceptor) => match acceptor.accept(stream).await {
                    Ok(tls_stream) => {
                        run_connection(tls_stream, peer, addr, connections, events).await
                    }
                    Err(e) => debug!("TLS handshake with {addr} failed: {e}"),
                },
                None => run_connection(stream, peer, addr, connections, events).await,
            }
        });
    }
}

/// Accepts the WebSocket upgrade (checking the path) and runs the
/// connection until either side closes it.
async fn run_connection<S>(
    stream: S,
    peer: PeerId,
    addr: SocketAddr,
    connections: ConnectionTable,
    events: mpsc::Sender<TransportEvent>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let check_path = |req: &Request, response: Response| -> Result<Response, ErrorResponse> {
        if req.uri().path() == "/ws" {
            Ok(response)
        } else {
            debug!("rejecting upgrade for path {}", req.uri().path());
            let mut resp = ErrorResponse::new(Some("WebSocket endpoint is /ws".to_string()));
            *resp.status_mut() = tokio_tungstenite::tungstenite::http::StatusCode::NOT_FOUND;
            Err(resp)
        }
    };

    let ws_stream = match tokio_tungstenite::accept_hdr_async(stream, check_path).await {
        Ok(ws) => ws,
        Err(e) => {
            debug!("WebSocket handshake with {addr} failed: {e}");
            return;
        }
    };

    debug!("peer {peer} connected from {addr}");

    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<WsMessage>();
    connections.lock().expect("lock poisoned").insert(peer, out_tx);

    if events
        .send(TransportEvent::PeerConnected { peer, addr })
        .await
        .is_err()
    {
        // Supervisor is gone; nothing to serve.
        connections.lock().expect("lock poisoned").remove(&peer);
        return;
    }

    // Writer: drains the per-connection channel into the sink.  A Close
    // frame ends the task and with it the connection.
    let writer = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let closing = matches!(msg, WsMessage::Close(_));
            if ws_tx.send(msg).await.is_err() || closing {
                break;
            }
        }
    });

    // Reader: text frames go to the supervisor; everything else is protocol
    // noise handled here.
    while let Some(frame) = ws_rx.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => {
                if events.send(TransportEvent::Frame { peer, text }).await.is_err() {
                    break;
                }
            }
            Ok(WsMessage::Binary(_)) => {
                warn!("peer {peer}: unexpected binary frame (ignored)");
            }
            Ok(WsMessage::Close(_)) | Err(_) => break,
            Ok(_) => {} // ping/pong handled by tungstenite
        }
    }

    debug!("peer {peer} disconnected");
    connections.lock().expect("lock poisoned").remove(&peer);
    writer.abort();
    let _ = events.send(TransportEvent::PeerDisconnected { peer }).await;
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpStream;

    async fn test_client(
        addr: SocketAddr,
    ) -> tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<TcpStream>> {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
            .await
            .expect("test client connect");
        ws
    }

    async fn start_test_server() -> (ServerHandle, mpsc::Receiver<TransportEvent>, SocketAddr) {
        // Bind port 0 and read the assigned address back.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel(64);
        let connections: ConnectionTable = Arc::new(Mutex::new(HashMap::new()));
        let handle = ServerHandle { connections: Arc::clone(&connections) };
        tokio::spawn(accept_loop(listener, None, connections, tx));
        (handle, rx, addr)
    }

    #[tokio::test]
    async fn test_client_connect_and_frame_delivery() {
        let (_handle, mut events, addr) = start_test_server().await;

        let mut client = test_client(addr).await;
        let connected = events.recv().await.unwrap();
        assert!(matches!(connected, TransportEvent::PeerConnected { .. }));

        client
            .send(WsMessage::Text(r#"{"type":"heartbeat","timestamp":1}"#.to_string()))
            .await
            .unwrap();

        match events.recv().await.unwrap() {
            TransportEvent::Frame { text, .. } => assert!(text.contains("heartbeat")),
            other => panic!("expected Frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_clients() {
        let (handle, mut events, addr) = start_test_server().await;

        let mut c1 = test_client(addr).await;
        let mut c2 = test_client(addr).await;
        events.recv().await.unwrap();
        events.recv().await.unwrap();

        handle.broadcast(r#"{"type":"heartbeat","timestamp":2}"#);

        for client in [&mut c1, &mut c2] {
            match client.next().await.unwrap().unwrap() {
                WsMessage::Text(text) => assert!(text.contains("heartbeat")),
                other => panic!("expected text frame, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_disconnect_is_reported_and_table_cleaned() {
        let (handle, mut events, addr) = start_test_server().await;

        let mut client = test_client(addr).await;
        events.recv().await.unwrap();
        assert_eq!(handle.connection_count(), 1);

        client.close(None).await.unwrap();

        match events.recv().await.unwrap() {
            TransportEvent::PeerDisconnected { .. } => {}
            other => panic!("expected PeerDisconnected, got {other:?}"),
        }
        assert_eq!(handle.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_server_close_tears_down_connection() {
        let (handle, mut events, addr) = start_test_server().await;

        let mut client = test_client(addr).await;
        let peer = match events.recv().await.unwrap() {
            TransportEvent::PeerConnected { peer, .. } => peer,
            other => panic!("expected PeerConnected, got {other:?}"),
        };

        handle.close(peer);

        // Drain the client so the close handshake completes.
        while client.next().await.is_some() {}

        match events.recv().await.unwrap() {
            TransportEvent::PeerDisconnected { peer: p } => assert_eq!(p, peer),
            other => panic!("expected PeerDisconnected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_ws_path_is_rejected() {
        let (_handle, _events, addr) = start_test_server().await;
        let result = tokio_tungstenite::connect_async(format!("ws://{addr}/other")).await;
        assert!(result.is_err(), "upgrade on a path other than /ws must fail");
    }
}
