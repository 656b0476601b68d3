//! Platform input backend abstraction.
//!
//! The core never talks to X11, Wayland, or CoreGraphics directly; it sees
//! only this trait.  A backend captures raw input on its own OS thread and
//! delivers it through the receiver returned by
//! [`InputBackend::start_listening`]; everything else is a synchronous call
//! made from the supervisor task.
//!
//! Per-OS implementations live behind `cfg(target_os = ...)` and are out of
//! scope here; [`mock::MockBackend`] stands in for tests and headless runs.

use std::sync::mpsc;

use konflikt_core::domain::engine::{CapturedEvent, DisplayBounds};
use thiserror::Error;

pub mod mock;

/// Which clipboard buffer to touch.  X11 distinguishes the primary
/// selection from the clipboard proper; other platforms only have the
/// latter and treat both the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selection {
    Clipboard,
    Primary,
}

/// Instantaneous input state snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub x: i32,
    pub y: i32,
    pub dx: i32,
    pub dy: i32,
    pub scroll_x: i32,
    pub scroll_y: i32,
    pub mouse_buttons: u32,
    pub keyboard_modifiers: u32,
}

/// The local desktop: total bounds plus the individual monitors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesktopInfo {
    pub width: i32,
    pub height: i32,
    pub displays: Vec<DisplayBounds>,
}

/// One event from the capture thread.
#[derive(Debug, Clone)]
pub enum BackendEvent {
    /// A captured input event.
    Input(CapturedEvent),
    /// The monitor arrangement changed; desktop geometry should be
    /// re-queried.
    DesktopChanged,
}

/// Error type for backend operations.  Steady-state failures are logged and
/// treated as no-ops; only [`BackendError::Init`] is fatal.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend initialization failed: {0}")]
    Init(String),

    #[error("input synthesis failed: {0}")]
    Synthesis(String),

    #[error("clipboard access failed: {0}")]
    Clipboard(String),

    #[error("capture listener not running")]
    NotListening,
}

/// Platform input capture and synthesis.
pub trait InputBackend: Send {
    /// Brings the backend up.  Failure here aborts startup.
    fn initialize(&mut self) -> Result<(), BackendError>;

    /// Releases platform resources.  Idempotent.
    fn shutdown(&mut self);

    /// Current cursor position, button mask, and modifier mask.
    fn state(&self) -> InputState;

    /// Desktop geometry including per-monitor bounds.
    fn desktop(&self) -> DesktopInfo;

    /// Synthesizes a mouse event (move, press, release, or scroll).
    fn send_mouse_event(&mut self, event: &CapturedEvent) -> Result<(), BackendError>;

    /// Synthesizes a key event.
    fn send_key_event(&mut self, event: &CapturedEvent) -> Result<(), BackendError>;

    /// Starts the capture stream.  Events arrive on the returned receiver
    /// from the backend's capture thread until [`stop_listening`] is called.
    ///
    /// [`stop_listening`]: InputBackend::stop_listening
    fn start_listening(&mut self) -> Result<mpsc::Receiver<BackendEvent>, BackendError>;

    /// Stops the capture stream and closes the event channel.
    fn stop_listening(&mut self);

    fn show_cursor(&mut self);
    fn hide_cursor(&mut self);
    fn is_cursor_visible(&self) -> bool;

    /// Reads the clipboard.  An empty string means empty or unreadable.
    fn clipboard_text(&self, selection: Selection) -> Result<String, BackendError>;

    /// Writes the clipboard.
    fn set_clipboard_text(&mut self, text: &str, selection: Selection)
        -> Result<(), BackendError>;
}

/// Selects the backend for this platform.
///
/// Native capture/synthesis backends (X11, Wayland, CoreGraphics) are
/// external collaborators compiled per-OS; when none is linked in, the
/// in-memory backend stands in so the networking and layout stack can run
/// headless.  `width`/`height` of 0 fall back to a 1920x1080 desktop.
pub fn platform_backend(width: i32, height: i32) -> Box<dyn InputBackend> {
    let width = if width > 0 { width } else { 1920 };
    let height = if height > 0 { height } else { 1080 };
    let (backend, _handle) = mock::MockBackend::new(width, height);
    Box::new(backend)
}
