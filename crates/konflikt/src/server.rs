//! Server supervisor: owns all core state and runs the single event loop.
//!
//! [`ServerCore`] holds the layout, session registry, edge engine, and
//! clipboard replicator, and handles every inbound event synchronously,
//! returning [`Outbound`] directives for the transport.  Nothing else
//! touches this state; transport reader tasks, the input capture thread,
//! and the mDNS daemon all post messages into the loop through channels.
//!
//! [`run`] wires the core to the real adapters and executes the directives.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, trace, warn};

use konflikt_core::domain::engine::{
    CapturedEvent, CursorSnapshot, DisplayBounds, EdgeEngine, EngineAction, EngineConfig,
};
use konflikt_core::domain::layout::LayoutManager;
use konflikt_core::protocol::codec::{decode, encode};
use konflikt_core::protocol::messages::{
    ActivateClient, ClipboardSync, EventKind, HandshakeResponse, InputEvent, LayoutAssignment,
    LayoutUpdate, Message, Position, ServerShutdown, CAPABILITIES, CLIPBOARD_FORMAT_TEXT,
    PROTOCOL_VERSION,
};
use konflikt_core::protocol::unix_timestamp_ms;
use konflikt_core::ClipboardReplicator;

use crate::backend::{BackendEvent, InputBackend, Selection};
use crate::config::Settings;
use crate::discovery::ServiceDiscovery;
use crate::identity;
use crate::logbuffer::LogBuffer;
use crate::session::{SessionError, SessionManager};
use crate::stats::InputStats;
use crate::transport::ws_server::{self, WsServerConfig};
use crate::transport::{PeerId, TransportEvent};

/// The supervisor wakes at least this often to run timers.
const TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Transport directive produced by the core.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Send { peer: PeerId, msg: Message },
    Broadcast { msg: Message },
    Close { peer: PeerId },
}

/// All server-side state, owned by the supervisor task.
pub struct ServerCore {
    instance_id: String,
    instance_name: String,
    machine_id: String,
    display_id: String,
    layout: LayoutManager,
    sessions: SessionManager,
    engine: EdgeEngine,
    clipboard: ClipboardReplicator,
    stats: InputStats,
    log_buffer: Arc<LogBuffer>,
    displays: Vec<DisplayBounds>,
}

impl ServerCore {
    /// Builds the core from resolved settings and the backend's desktop.
    pub fn new(settings: &Settings, backend: &dyn InputBackend) -> Self {
        let machine_id = identity::machine_id();
        let instance_id = settings
            .instance_id
            .clone()
            .unwrap_or_else(|| identity::default_instance_id(&machine_id));
        let instance_name = settings
            .instance_name
            .clone()
            .unwrap_or_else(identity::hostname);

        let desktop = backend.desktop();
        let width = if settings.screen_width > 0 { settings.screen_width } else { desktop.width };
        let height =
            if settings.screen_height > 0 { settings.screen_height } else { desktop.height };
        let display_id = identity::display_id(&machine_id, desktop.width, desktop.height);

        let mut layout = LayoutManager::new();
        layout.set_server_screen(&instance_id, &instance_name, &machine_id, width, height);

        let engine = EdgeEngine::new(
            instance_id.clone(),
            EngineConfig {
                edges: settings.edges,
                display_edges: settings.display_edges.clone(),
                lock_cursor: settings.lock_cursor,
                lock_hotkey: settings.lock_cursor_hotkey,
                key_remap: settings.key_remap.clone(),
            },
        );

        Self {
            instance_id,
            instance_name,
            machine_id,
            display_id,
            layout,
            sessions: SessionManager::new(),
            engine,
            clipboard: ClipboardReplicator::new(),
            stats: InputStats::new(),
            log_buffer: Arc::new(LogBuffer::new()),
            displays: desktop.displays,
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    pub fn layout(&self) -> &LayoutManager {
        &self.layout
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn engine(&self) -> &EdgeEngine {
        &self.engine
    }

    pub fn stats(&self) -> &InputStats {
        &self.stats
    }

    pub fn log_buffer(&self) -> Arc<LogBuffer> {
        Arc::clone(&self.log_buffer)
    }

    // ── Inbound frames ────────────────────────────────────────────────────────

    /// Handles one text frame from a peer connection.
    pub fn handle_frame(
        &mut self,
        peer: PeerId,
        text: &str,
        backend: &mut dyn InputBackend,
        now: Instant,
    ) -> Vec<Outbound> {
        let msg = match decode(text) {
            Ok(msg) => msg,
            Err(e) => {
                error!("dropping frame from peer {peer}: {e}");
                self.log_buffer.push("error", format!("protocol error from peer {peer}: {e}"));
                return Vec::new();
            }
        };

        match msg {
            Message::HandshakeRequest(req) => {
                info!("handshake from {} ({})", req.instance_name, req.instance_id);
                let mut out = Vec::new();
                if let Some(stale) = self.sessions.on_handshake(peer, &req.instance_id) {
                    debug!("closing stale connection {stale} for {}", req.instance_id);
                    out.push(Outbound::Close { peer: stale });
                }
                out.push(Outbound::Send {
                    peer,
                    msg: Message::HandshakeResponse(HandshakeResponse {
                        accepted: true,
                        instance_id: self.instance_id.clone(),
                        instance_name: self.instance_name.clone(),
                        version: PROTOCOL_VERSION.to_string(),
                        capabilities: CAPABILITIES.iter().map(|s| s.to_string()).collect(),
                        timestamp: unix_timestamp_ms(),
                    }),
                });
                out
            }

            Message::ClientRegistration(reg) => {
                match self.sessions.register(peer, &reg, unix_timestamp_ms()) {
                    Ok(()) => {}
                    Err(SessionError::NotHandshaken) => {
                        warn!(
                            "peer {peer} sent client_registration without handshake; dropping connection"
                        );
                        return vec![Outbound::Close { peer }];
                    }
                }

                info!(
                    "client registered: {} ({}x{})",
                    reg.display_name, reg.screen_width, reg.screen_height
                );
                let entry = self.layout.register_client(
                    &reg.instance_id,
                    &reg.display_name,
                    &reg.machine_id,
                    reg.screen_width,
                    reg.screen_height,
                );

                vec![
                    Outbound::Send {
                        peer,
                        msg: Message::LayoutAssignment(LayoutAssignment {
                            position: Position { x: entry.x, y: entry.y },
                            adjacency: self.layout.adjacency(&reg.instance_id).to_info(),
                            full_layout: self.layout.to_screen_infos(),
                        }),
                    },
                    self.layout_update(),
                ]
            }

            Message::DeactivationRequest(req) => {
                debug!("deactivation request from {}", req.instance_id);
                match self.engine.handle_deactivation_request(&req.instance_id, &self.layout, now) {
                    Some(EngineAction::Deactivate { warp_x, warp_y }) => {
                        self.apply_deactivation(backend, warp_x, warp_y);
                    }
                    _ => {
                        warn!("ignoring deactivation request from non-active {}", req.instance_id);
                    }
                }
                Vec::new()
            }

            Message::ClipboardSync(sync) => self.handle_clipboard_sync(sync, backend),

            Message::Heartbeat(_) => {
                trace!("heartbeat from peer {peer}");
                Vec::new()
            }

            other => {
                warn!(
                    "ignoring {} from peer {peer}: not valid in server role",
                    other.message_type()
                );
                Vec::new()
            }
        }
    }

    fn handle_clipboard_sync(
        &mut self,
        sync: ClipboardSync,
        backend: &mut dyn InputBackend,
    ) -> Vec<Outbound> {
        // Freshness is decided before apply so the relay below never
        // re-broadcasts stale or own-echo frames.
        let fresh = sync.source_instance_id != self.instance_id
            && sync.sequence > self.clipboard.last_sequence();

        if let Some(text) = self.clipboard.apply(&sync, &self.instance_id) {
            if let Err(e) = backend.set_clipboard_text(&text, Selection::Clipboard) {
                warn!("clipboard write failed: {e}");
            }
        }

        if fresh {
            // Relay the client's update to everyone else; recipients drop
            // it by source or sequence as needed.
            vec![Outbound::Broadcast { msg: Message::ClipboardSync(sync) }]
        } else {
            Vec::new()
        }
    }

    // ── Backend events ────────────────────────────────────────────────────────

    /// Handles one event from the input capture stream.
    pub fn handle_backend_event(
        &mut self,
        event: BackendEvent,
        backend: &mut dyn InputBackend,
        now: Instant,
    ) -> Vec<Outbound> {
        match event {
            BackendEvent::Input(captured) => {
                let action = self.engine.handle_event(&captured, &self.layout, &self.displays, now);
                self.apply_engine_action(action, backend)
            }
            BackendEvent::DesktopChanged => {
                self.displays = backend.desktop().displays;
                debug!("desktop changed: {} displays", self.displays.len());
                Vec::new()
            }
        }
    }

    fn apply_engine_action(
        &mut self,
        action: EngineAction,
        backend: &mut dyn InputBackend,
    ) -> Vec<Outbound> {
        match action {
            EngineAction::Ignore => Vec::new(),

            EngineAction::Activate { target, cursor_x, cursor_y } => {
                info!("activating client {target} at ({cursor_x}, {cursor_y})");
                backend.hide_cursor();
                self.sessions.set_active(Some(&target));
                vec![Outbound::Broadcast {
                    msg: Message::ActivateClient(ActivateClient {
                        target_instance_id: target,
                        cursor_x,
                        cursor_y,
                        timestamp: unix_timestamp_ms(),
                    }),
                }]
            }

            EngineAction::Forward { kind, data } => {
                self.stats.record(kind);
                vec![Outbound::Broadcast {
                    msg: Message::InputEvent(InputEvent {
                        source_instance_id: self.instance_id.clone(),
                        source_display_id: self.display_id.clone(),
                        source_machine_id: self.machine_id.clone(),
                        event_type: kind,
                        event_data: data,
                    }),
                }]
            }

            EngineAction::Deactivate { warp_x, warp_y } => {
                self.apply_deactivation(backend, warp_x, warp_y);
                Vec::new()
            }

            EngineAction::LockToggled(locked) => {
                info!("cursor {} to screen", if locked { "locked" } else { "unlocked" });
                self.log_buffer
                    .push("log", if locked { "cursor locked" } else { "cursor unlocked" });
                Vec::new()
            }
        }
    }

    fn apply_deactivation(&mut self, backend: &mut dyn InputBackend, warp_x: i32, warp_y: i32) {
        backend.show_cursor();
        let warp = CapturedEvent {
            kind: EventKind::MouseMove,
            state: CursorSnapshot { x: warp_x, y: warp_y, ..Default::default() },
            keycode: 0,
            button: None,
            text: None,
            timestamp: unix_timestamp_ms(),
        };
        if let Err(e) = backend.send_mouse_event(&warp) {
            warn!("cursor warp failed: {e}");
        }
        self.sessions.set_active(None);
        info!("remote screen deactivated, cursor back at ({warp_x}, {warp_y})");
    }

    // ── Disconnects ───────────────────────────────────────────────────────────

    /// Handles a peer connection closing.
    pub fn handle_disconnect(
        &mut self,
        peer: PeerId,
        backend: &mut dyn InputBackend,
        now: Instant,
    ) -> Vec<Outbound> {
        let Some(removed) = self.sessions.on_disconnect(peer) else {
            return Vec::new();
        };
        info!("client disconnected: {}", removed.instance_id);

        if let Some(EngineAction::Deactivate { warp_x, warp_y }) =
            self.engine.handle_peer_disconnected(&removed.instance_id, &self.layout, now)
        {
            self.apply_deactivation(backend, warp_x, warp_y);
        }

        self.layout.set_online(&removed.instance_id, false);
        vec![self.layout_update()]
    }

    // ── Timers ────────────────────────────────────────────────────────────────

    /// Runs the clipboard poll; throttling happens inside the replicator.
    pub fn poll_clipboard(
        &mut self,
        backend: &mut dyn InputBackend,
        now: Instant,
    ) -> Vec<Outbound> {
        let text = match backend.clipboard_text(Selection::Clipboard) {
            Ok(text) => text,
            Err(e) => {
                warn!("clipboard read failed: {e}");
                return Vec::new();
            }
        };

        match self.clipboard.poll(now, &text) {
            Some(broadcast) => vec![Outbound::Broadcast {
                msg: Message::ClipboardSync(ClipboardSync {
                    source_instance_id: self.instance_id.clone(),
                    format: CLIPBOARD_FORMAT_TEXT.to_string(),
                    data: broadcast.data,
                    sequence: broadcast.sequence,
                    timestamp: unix_timestamp_ms(),
                }),
            }],
            None => Vec::new(),
        }
    }

    /// The graceful-shutdown notice broadcast before sockets close.
    pub fn shutdown_notice(&self, reason: &str, delay_ms: i32) -> Outbound {
        Outbound::Broadcast {
            msg: Message::ServerShutdown(ServerShutdown {
                reason: reason.to_string(),
                delay_ms,
                timestamp: unix_timestamp_ms(),
            }),
        }
    }

    fn layout_update(&self) -> Outbound {
        Outbound::Broadcast {
            msg: Message::LayoutUpdate(LayoutUpdate {
                screens: self.layout.to_screen_infos(),
                timestamp: unix_timestamp_ms(),
            }),
        }
    }
}

// ── Async run loop ────────────────────────────────────────────────────────────

/// Runs the server until the shutdown signal fires.
pub async fn run(
    settings: Settings,
    mut backend: Box<dyn InputBackend>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    backend
        .initialize()
        .map_err(|e| anyhow::anyhow!("input backend initialization failed: {e}"))?;

    let mut core = ServerCore::new(&settings, backend.as_ref());
    info!(
        "Konflikt server {} ({}) starting on port {}",
        core.instance_name(),
        core.instance_id(),
        settings.port
    );

    // Transport.
    let tls = match (&settings.tls_cert, &settings.tls_key) {
        (Some(cert), Some(key)) if settings.tls => Some(crate::transport::tls::acceptor_from_pem(
            cert,
            key,
            settings.tls_passphrase.as_deref(),
        )?),
        _ if settings.tls => {
            anyhow::bail!("--tls requires --tls-cert and --tls-key");
        }
        _ => None,
    };
    let (transport_tx, mut transport_rx) = mpsc::channel::<TransportEvent>(256);
    let handle = ws_server::start(
        WsServerConfig {
            bind_addr: format!("0.0.0.0:{}", settings.port).parse()?,
            tls,
        },
        transport_tx,
    )
    .await?;

    // Discovery registration.  A registration failure (including a name
    // collision) is surfaced loudly but does not stop the server; explicit
    // --server connections still work.
    let mut discovery = match ServiceDiscovery::new() {
        Ok(mut discovery) => {
            if let Err(e) =
                discovery.register(core.instance_name(), core.instance_id(), settings.port)
            {
                error!("service discovery registration failed: {e}");
            }
            Some(discovery)
        }
        Err(e) => {
            error!("service discovery unavailable: {e}");
            None
        }
    };

    // Input capture: bridge the backend's std receiver onto the loop.
    let (backend_tx, mut backend_rx) = mpsc::channel::<BackendEvent>(256);
    let capture_rx = backend
        .start_listening()
        .map_err(|e| anyhow::anyhow!("input capture failed to start: {e}"))?;
    std::thread::Builder::new()
        .name("konflikt-capture-bridge".to_string())
        .spawn(move || {
            while let Ok(event) = capture_rx.recv() {
                if backend_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        })?;

    let mut tick = tokio::time::interval(TICK_INTERVAL);

    loop {
        let outbound = tokio::select! {
            Some(event) = transport_rx.recv() => match event {
                TransportEvent::PeerConnected { peer, addr } => {
                    debug!("connection {peer} from {addr}");
                    Vec::new()
                }
                TransportEvent::Frame { peer, text } => {
                    core.handle_frame(peer, &text, backend.as_mut(), Instant::now())
                }
                TransportEvent::PeerDisconnected { peer } => {
                    core.handle_disconnect(peer, backend.as_mut(), Instant::now())
                }
            },

            Some(event) = backend_rx.recv() => {
                core.handle_backend_event(event, backend.as_mut(), Instant::now())
            }

            _ = tick.tick() => {
                core.poll_clipboard(backend.as_mut(), Instant::now())
            }

            _ = shutdown.changed() => {
                info!("shutting down");
                execute(&handle, vec![core.shutdown_notice("shutdown", 0)]);
                break;
            }
        };

        execute(&handle, outbound);
    }

    if let Some(discovery) = discovery.take() {
        discovery.shutdown();
    }
    backend.stop_listening();
    backend.shutdown();
    info!("Konflikt server stopped");
    Ok(())
}

/// Executes transport directives against the server handle.
fn execute(handle: &ws_server::ServerHandle, outbound: Vec<Outbound>) {
    for directive in outbound {
        match directive {
            Outbound::Send { peer, msg } => match encode(&msg) {
                Ok(text) => handle.send(peer, text),
                Err(e) => error!("encode failed for {}: {e}", msg.message_type()),
            },
            Outbound::Broadcast { msg } => match encode(&msg) {
                Ok(text) => handle.broadcast(&text),
                Err(e) => error!("encode failed for {}: {e}", msg.message_type()),
            },
            Outbound::Close { peer } => handle.close(peer),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
