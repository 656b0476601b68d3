//! Mock input backend for tests and headless runs.
//!
//! Tests hold a [`MockHandle`] to inject captured events and observe what
//! the supervisor synthesized, while the supervisor owns the
//! [`MockBackend`] itself as a `Box<dyn InputBackend>`.

use std::collections::HashMap;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};

use konflikt_core::domain::engine::{CapturedEvent, DisplayBounds};
use konflikt_core::protocol::messages::EventKind;

use super::{BackendError, BackendEvent, DesktopInfo, InputBackend, InputState, Selection};

#[derive(Debug, Default)]
struct Inner {
    state: InputState,
    desktop: DesktopInfo,
    cursor_visible: bool,
    synthesized_mouse: Vec<CapturedEvent>,
    synthesized_keys: Vec<CapturedEvent>,
    clipboard: HashMap<Selection, String>,
    initialized: bool,
}

/// Test-side handle into a [`MockBackend`].
#[derive(Clone)]
pub struct MockHandle {
    inner: Arc<Mutex<Inner>>,
    sender: Arc<Mutex<Option<Sender<BackendEvent>>>>,
}

impl MockHandle {
    /// Injects a synthetic captured event, as if it came from hardware.
    ///
    /// Returns `false` when the listener is not running (the event is
    /// dropped, matching a capture thread with no consumer).
    pub fn inject(&self, event: BackendEvent) -> bool {
        let guard = self.sender.lock().expect("lock poisoned");
        match guard.as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// All mouse events the supervisor synthesized, in order.
    pub fn synthesized_mouse(&self) -> Vec<CapturedEvent> {
        self.inner.lock().expect("lock poisoned").synthesized_mouse.clone()
    }

    /// All key events the supervisor synthesized, in order.
    pub fn synthesized_keys(&self) -> Vec<CapturedEvent> {
        self.inner.lock().expect("lock poisoned").synthesized_keys.clone()
    }

    pub fn cursor_visible(&self) -> bool {
        self.inner.lock().expect("lock poisoned").cursor_visible
    }

    /// Current simulated cursor position.
    pub fn cursor_pos(&self) -> (i32, i32) {
        let inner = self.inner.lock().expect("lock poisoned");
        (inner.state.x, inner.state.y)
    }

    /// Seeds the simulated OS clipboard.
    pub fn set_clipboard(&self, selection: Selection, text: &str) {
        self.inner
            .lock()
            .expect("lock poisoned")
            .clipboard
            .insert(selection, text.to_string());
    }

    pub fn clipboard(&self, selection: Selection) -> String {
        self.inner
            .lock()
            .expect("lock poisoned")
            .clipboard
            .get(&selection)
            .cloned()
            .unwrap_or_default()
    }
}

/// An [`InputBackend`] that simulates the platform in memory.
pub struct MockBackend {
    inner: Arc<Mutex<Inner>>,
    sender: Arc<Mutex<Option<Sender<BackendEvent>>>>,
}

impl MockBackend {
    /// Creates a backend simulating a single `width` x `height` display.
    pub fn new(width: i32, height: i32) -> (Self, MockHandle) {
        let inner = Arc::new(Mutex::new(Inner {
            desktop: DesktopInfo {
                width,
                height,
                displays: vec![DisplayBounds {
                    id: 0,
                    x: 0,
                    y: 0,
                    width,
                    height,
                    is_primary: true,
                }],
            },
            cursor_visible: true,
            ..Default::default()
        }));
        let sender = Arc::new(Mutex::new(None));
        let handle = MockHandle {
            inner: Arc::clone(&inner),
            sender: Arc::clone(&sender),
        };
        (Self { inner, sender }, handle)
    }
}

impl InputBackend for MockBackend {
    fn initialize(&mut self) -> Result<(), BackendError> {
        self.inner.lock().expect("lock poisoned").initialized = true;
        Ok(())
    }

    fn shutdown(&mut self) {
        self.stop_listening();
        self.inner.lock().expect("lock poisoned").initialized = false;
    }

    fn state(&self) -> InputState {
        self.inner.lock().expect("lock poisoned").state
    }

    fn desktop(&self) -> DesktopInfo {
        self.inner.lock().expect("lock poisoned").desktop.clone()
    }

    fn send_mouse_event(&mut self, event: &CapturedEvent) -> Result<(), BackendError> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        if event.kind == EventKind::MouseMove {
            inner.state.x = event.state.x;
            inner.state.y = event.state.y;
        }
        inner.synthesized_mouse.push(event.clone());
        Ok(())
    }

    fn send_key_event(&mut self, event: &CapturedEvent) -> Result<(), BackendError> {
        self.inner
            .lock()
            .expect("lock poisoned")
            .synthesized_keys
            .push(event.clone());
        Ok(())
    }

    fn start_listening(&mut self) -> Result<mpsc::Receiver<BackendEvent>, BackendError> {
        let (tx, rx) = mpsc::channel();
        *self.sender.lock().expect("lock poisoned") = Some(tx);
        Ok(rx)
    }

    fn stop_listening(&mut self) {
        *self.sender.lock().expect("lock poisoned") = None;
    }

    fn show_cursor(&mut self) {
        self.inner.lock().expect("lock poisoned").cursor_visible = true;
    }

    fn hide_cursor(&mut self) {
        self.inner.lock().expect("lock poisoned").cursor_visible = false;
    }

    fn is_cursor_visible(&self) -> bool {
        self.inner.lock().expect("lock poisoned").cursor_visible
    }

    fn clipboard_text(&self, selection: Selection) -> Result<String, BackendError> {
        Ok(self
            .inner
            .lock()
            .expect("lock poisoned")
            .clipboard
            .get(&selection)
            .cloned()
            .unwrap_or_default())
    }

    fn set_clipboard_text(&mut self, text: &str, selection: Selection) -> Result<(), BackendError> {
        self.inner
            .lock()
            .expect("lock poisoned")
            .clipboard
            .insert(selection, text.to_string());
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
