//! # konflikt-core
//!
//! Shared library for Konflikt containing the JSON wire protocol, the screen
//! layout engine, and the edge-transition state machines used by both roles.
//!
//! This crate is used by the server and client sides of the application.  It
//! has zero dependencies on OS APIs, network sockets, or an async runtime.
//!
//! # Architecture overview
//!
//! Konflikt is a software KVM: one machine (the *server*) owns the physical
//! keyboard and mouse and drives any number of *clients* whose screens are
//! arranged next to it in a shared coordinate plane.  When the cursor crosses
//! a screen edge adjacent to a remote screen, input is redirected to that
//! machine until the cursor comes back.
//!
//! This crate defines:
//!
//! - **`protocol`** – the tagged JSON message set exchanged over WebSocket
//!   text frames, and the codec that encodes/decodes it.
//!
//! - **`domain`** – pure business logic with no I/O.  The main pieces are the
//!   [`LayoutManager`] (a 2-D map of where each screen lives relative to the
//!   server) and the [`EdgeEngine`] (the server-side state machine that
//!   decides when input leaves the local screen and where it lands).

pub mod domain;
pub mod protocol;

pub use domain::clipboard::ClipboardReplicator;
pub use domain::engine::{
    CapturedEvent, CursorSnapshot, DisplayBounds, EdgeEngine, EdgeSettings, EngineAction,
    EngineConfig, FocusState,
};
pub use domain::layout::{Adjacency, Edge, LayoutManager, ScreenEntry, TransitionTarget};
pub use domain::mirror::{ClientMirror, MirrorDecision};
pub use domain::reconnect::{ReconnectState, MAX_RECONNECT_ATTEMPTS};
pub use protocol::codec::{decode, encode, peek_type, ProtocolError};
pub use protocol::messages::Message;
