//! WebSocket client: one dial per call, reader task, send handle.
//!
//! Reconnection policy lives in the supervisor (driven by
//! `konflikt_core::ReconnectState`); this module only dials when told to
//! and reports when the connection drops.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, warn};

use super::TransportError;

/// Events delivered by the client transport to the supervisor.
#[derive(Debug)]
pub enum ClientEvent {
    /// One decoded text frame from the server.
    Frame(String),
    /// The connection dropped (either side, any reason).
    Disconnected,
}

/// Send-side handle to an established client connection.
#[derive(Clone)]
pub struct ClientHandle {
    out: mpsc::UnboundedSender<WsMessage>,
}

impl ClientHandle {
    /// Queues one text frame.  Returns `false` when the connection is gone.
    pub fn send(&self, text: String) -> bool {
        self.out.send(WsMessage::Text(text)).is_ok()
    }

    /// Requests a clean close.
    pub fn close(&self) {
        let _ = self.out.send(WsMessage::Close(None));
    }
}

/// Builds the endpoint URL for a server.
pub fn server_url(host: &str, port: u16, tls: bool) -> String {
    let scheme = if tls { "wss" } else { "ws" };
    format!("{scheme}://{host}:{port}/ws")
}

/// Dials the server and spawns the reader/writer tasks.
///
/// # Errors
///
/// Returns [`TransportError::Connect`] when the TCP connection or the
/// WebSocket handshake fails; the supervisor counts that as one failed
/// reconnect attempt.
pub async fn connect(
    url: &str,
    events: mpsc::Sender<ClientEvent>,
) -> Result<ClientHandle, TransportError> {
    let (ws_stream, _response) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| TransportError::Connect { url: url.to_string(), reason: e.to_string() })?;

    debug!("connected to {url}");

    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<WsMessage>();

    // Writer task.
    tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let closing = matches!(msg, WsMessage::Close(_));
            if ws_tx.send(msg).await.is_err() || closing {
                break;
            }
        }
    });

    // Reader task.
    tokio::spawn(async move {
        while let Some(frame) = ws_rx.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => {
                    if events.send(ClientEvent::Frame(text)).await.is_err() {
                        return;
                    }
                }
                Ok(WsMessage::Binary(_)) => {
                    warn!("unexpected binary frame from server (ignored)");
                }
                Ok(WsMessage::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
        let _ = events.send(ClientEvent::Disconnected).await;
    });

    Ok(ClientHandle { out: out_tx })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_url_plain_and_tls() {
        assert_eq!(server_url("desk.local", 3000, false), "ws://desk.local:3000/ws");
        assert_eq!(server_url("desk.local", 3000, true), "wss://desk.local:3000/ws");
    }

    #[tokio::test]
    async fn test_connect_refused_is_an_error() {
        // Bind a port and drop the listener so the port is closed.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (tx, _rx) = mpsc::channel(4);
        let result = connect(&server_url("127.0.0.1", addr.port(), false), tx).await;
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }
}
