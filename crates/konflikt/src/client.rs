//! Client supervisor: replays the server's input, reports edge exits, and
//! keeps the connection alive across server restarts.
//!
//! [`ClientCore`] is the synchronous half: it classifies every incoming
//! frame and returns the messages to send back.  [`run`] owns the
//! connection state machine (discover, dial, handshake, reconnect) and the
//! timers.

use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, trace, warn};

use konflikt_core::domain::engine::{CapturedEvent, CursorSnapshot};
use konflikt_core::domain::mirror::ClientMirror;
use konflikt_core::protocol::codec::{decode, encode};
use konflikt_core::protocol::messages::{
    ClientRegistration, ClipboardSync, DeactivationRequest, EventKind, HandshakeRequest, Heartbeat,
    InputEvent, Message, Position, CAPABILITIES, CLIPBOARD_FORMAT_TEXT, PROTOCOL_VERSION,
};
use konflikt_core::protocol::unix_timestamp_ms;
use konflikt_core::{ClipboardReplicator, ReconnectState};

use crate::backend::{InputBackend, Selection};
use crate::config::Settings;
use crate::discovery::{DiscoveryEvent, ServiceDiscovery};
use crate::identity;
use crate::stats::InputStats;
use crate::transport::ws_client::{self, ClientEvent, ClientHandle};

/// The supervisor wakes at least this often to run timers.
const TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Application-level liveness probe interval.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// All client-side state, owned by the supervisor task.
pub struct ClientCore {
    instance_id: String,
    instance_name: String,
    machine_id: String,
    mirror: ClientMirror,
    clipboard: ClipboardReplicator,
    stats: InputStats,
    screen_width: i32,
    screen_height: i32,
    /// Position assigned by the server's layout manager.
    position: Position,
    connected_server: Option<String>,
    last_heartbeat: Option<Instant>,
}

impl ClientCore {
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

        Self {
            mirror: ClientMirror::new(instance_id.clone()),
            instance_id,
            instance_name,
            machine_id,
            clipboard: ClipboardReplicator::new(),
            stats: InputStats::new(),
            screen_width: width,
            screen_height: height,
            position: Position::default(),
            connected_server: None,
            last_heartbeat: None,
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn is_active(&self) -> bool {
        self.mirror.is_active()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn connected_server(&self) -> Option<&str> {
        self.connected_server.as_deref()
    }

    pub fn stats(&self) -> &InputStats {
        &self.stats
    }

    /// The first message on every new connection.
    pub fn handshake_request(&self) -> Message {
        Message::HandshakeRequest(HandshakeRequest {
            instance_id: self.instance_id.clone(),
            instance_name: self.instance_name.clone(),
            version: PROTOCOL_VERSION.to_string(),
            capabilities: CAPABILITIES.iter().map(|s| s.to_string()).collect(),
            timestamp: unix_timestamp_ms(),
        })
    }

    /// Handles one frame from the server.  Returns replies to send, and
    /// applies side effects (replay, warp, clipboard) through the backend.
    ///
    /// `reconnect` is updated in place for `server_shutdown` notices and
    /// accepted handshakes.
    pub fn handle_frame(
        &mut self,
        text: &str,
        backend: &mut dyn InputBackend,
        reconnect: &mut ReconnectState,
        now: Instant,
    ) -> Vec<Message> {
        let msg = match decode(text) {
            Ok(msg) => msg,
            Err(e) => {
                error!("dropping frame from server: {e}");
                return Vec::new();
            }
        };

        match msg {
            Message::HandshakeResponse(resp) => {
                if !resp.accepted {
                    warn!("server rejected handshake");
                    return Vec::new();
                }
                info!("handshake completed with {}", resp.instance_name);
                self.connected_server = Some(resp.instance_name);
                reconnect.on_connected();

                vec![Message::ClientRegistration(ClientRegistration {
                    instance_id: self.instance_id.clone(),
                    display_name: self.instance_name.clone(),
                    machine_id: self.machine_id.clone(),
                    screen_width: self.screen_width,
                    screen_height: self.screen_height,
                })]
            }

            Message::LayoutAssignment(assignment) => {
                info!(
                    "layout assigned: position ({}, {})",
                    assignment.position.x, assignment.position.y
                );
                self.position = assignment.position;
                Vec::new()
            }

            Message::LayoutUpdate(update) => {
                if let Some(own) = update.screens.iter().find(|s| s.instance_id == self.instance_id)
                {
                    self.position = Position { x: own.x, y: own.y };
                }
                Vec::new()
            }

            Message::ActivateClient(activate) => {
                if let Some((x, y)) = self.mirror.handle_activate(&activate) {
                    info!("activated at ({x}, {y})");
                    let warp = CapturedEvent::mouse_move(x, y, 0, 0);
                    if let Err(e) = backend.send_mouse_event(&warp) {
                        warn!("activation warp failed: {e}");
                    }
                }
                Vec::new()
            }

            Message::InputEvent(event) => self.handle_input_event(event, backend, now),

            Message::ClipboardSync(sync) => {
                if let Some(text) = self.clipboard.apply(&sync, &self.instance_id) {
                    if let Err(e) = backend.set_clipboard_text(&text, Selection::Clipboard) {
                        warn!("clipboard write failed: {e}");
                    }
                }
                Vec::new()
            }

            Message::ServerShutdown(shutdown) => {
                info!(
                    "server shutting down ({}); expecting restart in {} ms",
                    shutdown.reason, shutdown.delay_ms
                );
                reconnect.on_server_shutdown(shutdown.delay_ms);
                Vec::new()
            }

            Message::Heartbeat(_) => {
                trace!("heartbeat from server");
                Vec::new()
            }

            other => {
                warn!("ignoring {}: not valid in client role", other.message_type());
                Vec::new()
            }
        }
    }

    fn handle_input_event(
        &mut self,
        event: InputEvent,
        backend: &mut dyn InputBackend,
        now: Instant,
    ) -> Vec<Message> {
        let decision = self.mirror.handle_input_event(&event, now);
        if !decision.replay {
            return Vec::new();
        }

        self.stats.record(event.event_type);
        self.stats.record_latency(event.event_data.timestamp);

        let captured = replay_event(&event);
        let result = match event.event_type {
            EventKind::KeyPress | EventKind::KeyRelease => backend.send_key_event(&captured),
            _ => backend.send_mouse_event(&captured),
        };
        if let Err(e) = result {
            warn!("input replay failed: {e}");
        }

        if decision.request_deactivation {
            debug!("left edge crossed; requesting deactivation");
            return vec![Message::DeactivationRequest(DeactivationRequest {
                instance_id: self.instance_id.clone(),
                timestamp: unix_timestamp_ms(),
            })];
        }
        Vec::new()
    }

    /// Clipboard poll; throttling happens inside the replicator.
    pub fn poll_clipboard(
        &mut self,
        backend: &mut dyn InputBackend,
        now: Instant,
    ) -> Vec<Message> {
        let text = match backend.clipboard_text(Selection::Clipboard) {
            Ok(text) => text,
            Err(e) => {
                warn!("clipboard read failed: {e}");
                return Vec::new();
            }
        };

        match self.clipboard.poll(now, &text) {
            Some(broadcast) => vec![Message::ClipboardSync(ClipboardSync {
                source_instance_id: self.instance_id.clone(),
                format: CLIPBOARD_FORMAT_TEXT.to_string(),
                data: broadcast.data,
                sequence: broadcast.sequence,
                timestamp: unix_timestamp_ms(),
            })],
            None => Vec::new(),
        }
    }

    /// Emits a heartbeat when the interval elapsed.
    pub fn heartbeat_due(&mut self, now: Instant) -> Option<Message> {
        let due = self
            .last_heartbeat
            .map(|t| now.duration_since(t) >= HEARTBEAT_INTERVAL)
            .unwrap_or(true);
        if due {
            self.last_heartbeat = Some(now);
            Some(Message::Heartbeat(Heartbeat { timestamp: unix_timestamp_ms() }))
        } else {
            None
        }
    }
}

/// Converts a wire input event into the backend's replay representation.
fn replay_event(event: &InputEvent) -> CapturedEvent {
    let data = &event.event_data;
    CapturedEvent {
        kind: event.event_type,
        state: CursorSnapshot {
            x: data.x,
            y: data.y,
            dx: data.dx,
            dy: data.dy,
            scroll_x: data.scroll_x,
            scroll_y: data.scroll_y,
            keyboard_modifiers: data.keyboard_modifiers,
            mouse_buttons: data.mouse_buttons,
        },
        keycode: data.keycode,
        button: data.button,
        text: data.text.clone(),
        timestamp: data.timestamp,
    }
}

// ── Async run loop ────────────────────────────────────────────────────────────

/// Runs the client until the shutdown signal fires.
pub async fn run(
    settings: Settings,
    mut backend: Box<dyn InputBackend>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    backend
        .initialize()
        .map_err(|e| anyhow::anyhow!("input backend initialization failed: {e}"))?;

    let mut core = ClientCore::new(&settings, backend.as_ref());
    let mut reconnect = ReconnectState::new();
    info!("Konflikt client {} starting", core.instance_id());

    let (event_tx, mut event_rx) = mpsc::channel::<ClientEvent>(256);
    let (discovery_tx, mut discovery_rx) = mpsc::channel::<DiscoveryEvent>(64);

    // Explicit --server wins; otherwise browse for one.
    let mut target: Option<(String, u16)> = settings
        .server_host
        .clone()
        .map(|host| (host, settings.server_port));

    let _discovery = if target.is_none() {
        info!("no server configured; browsing for Konflikt servers");
        match ServiceDiscovery::new() {
            Ok(discovery) => {
                if let Err(e) = discovery.browse(discovery_tx) {
                    error!("mDNS browse failed: {e}");
                }
                Some(discovery)
            }
            Err(e) => {
                error!("service discovery unavailable: {e}");
                None
            }
        }
    } else {
        None
    };

    let mut handle: Option<ClientHandle> = None;
    let mut tick = tokio::time::interval(TICK_INTERVAL);

    loop {
        // Dial when disconnected, a target is known, and the policy allows.
        if handle.is_none() {
            if let Some((host, port)) = &target {
                let now = Instant::now();
                if reconnect.should_attempt(now) {
                    reconnect.record_attempt(now);
                    let url = ws_client::server_url(host, *port, settings.tls);
                    info!(
                        "connecting to {url} (attempt {}/{})",
                        reconnect.attempts(),
                        konflikt_core::MAX_RECONNECT_ATTEMPTS
                    );
                    match ws_client::connect(&url, event_tx.clone()).await {
                        Ok(connected) => {
                            send(&connected, core.handshake_request());
                            handle = Some(connected);
                        }
                        Err(e) => {
                            warn!("connect failed: {e}");
                            if reconnect.exhausted() {
                                error!(
                                    "giving up after {} attempts",
                                    konflikt_core::MAX_RECONNECT_ATTEMPTS
                                );
                            }
                        }
                    }
                }
            }
        }

        tokio::select! {
            Some(event) = event_rx.recv() => match event {
                ClientEvent::Frame(text) => {
                    if let Some(connected) = &handle {
                        for msg in core.handle_frame(&text, backend.as_mut(), &mut reconnect, Instant::now()) {
                            send(connected, msg);
                        }
                    }
                }
                ClientEvent::Disconnected => {
                    info!("disconnected from server");
                    handle = None;
                    reconnect.on_disconnected(Instant::now());
                }
            },

            Some(event) = discovery_rx.recv() => match event {
                DiscoveryEvent::ServerFound(server) => {
                    if server.instance_id == core.instance_id() {
                        debug!("ignoring our own advertisement");
                    } else if target.is_none() {
                        info!(
                            "auto-connecting to discovered server {} at {}:{}",
                            server.instance_id, server.host, server.port
                        );
                        target = Some((server.host, server.port));
                    }
                }
                DiscoveryEvent::ServerLost(name) => {
                    // Informational only; an established session stays up.
                    info!("server disappeared from mDNS: {name}");
                }
            },

            _ = tick.tick() => {
                if let Some(connected) = &handle {
                    let now = Instant::now();
                    for msg in core.poll_clipboard(backend.as_mut(), now) {
                        send(connected, msg);
                    }
                    if core.connected_server().is_some() {
                        if let Some(msg) = core.heartbeat_due(now) {
                            send(connected, msg);
                        }
                    }
                }
            }

            _ = shutdown.changed() => {
                info!("shutting down");
                if let Some(connected) = &handle {
                    connected.close();
                }
                break;
            }
        }
    }

    backend.shutdown();
    info!("Konflikt client stopped");
    Ok(())
}

fn send(handle: &ClientHandle, msg: Message) {
    match encode(&msg) {
        Ok(text) => {
            if !handle.send(text) {
                debug!("send failed; connection already closed");
            }
        }
        Err(e) => error!("encode failed for {}: {e}", msg.message_type()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
