//! Konflikt application crate.
//!
//! Wires the pure core (`konflikt-core`) to the outside world: platform
//! input backends, the WebSocket transport, mDNS discovery, configuration,
//! and the per-role supervisor event loops.
//!
//! # Concurrency model
//!
//! One supervisor task per process owns all core state (layout, sessions,
//! engine, clipboard).  Everything that blocks or waits on the outside world
//! runs somewhere else and posts messages inward through channels:
//!
//! - the input capture thread delivers [`backend::BackendEvent`]s,
//! - transport reader tasks deliver decoded text frames,
//! - the mDNS daemon delivers discovery events.
//!
//! Nothing mutates core state off the supervisor task.

pub mod backend;
pub mod cli;
pub mod client;
pub mod config;
pub mod discovery;
pub mod identity;
pub mod logbuffer;
pub mod server;
pub mod session;
pub mod stats;
pub mod transport;
