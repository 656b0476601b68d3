//! JSON configuration file handling.
//!
//! Keys match the CLI flags' semantics plus a few file-only settings
//! (`instanceId`, `keyRemap`, `displayEdges`, `lockCursorHotkey`).  Search
//! order: an explicit `--config` path, then the per-user location
//! (`$XDG_CONFIG_HOME/konflikt/config.json`, falling back to
//! `~/.config/konflikt/config.json`; `~/Library/Application Support/Konflikt`
//! on macOS), then each entry of `$XDG_CONFIG_DIRS`.
//!
//! Command-line flags override file values.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use konflikt_core::domain::engine::EdgeSettings;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::cli::{Cli, Role};

/// Default WebSocket port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default lock-cursor hotkey keycode (Scroll Lock on most layouts;
/// 0 disables the hotkey entirely).
pub const DEFAULT_LOCK_HOTKEY: u32 = 107;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// ── File schema ───────────────────────────────────────────────────────────────

/// Per-display edge enables as they appear in the file.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EdgeFlags {
    #[serde(default = "default_true")]
    left: bool,
    #[serde(default = "default_true")]
    right: bool,
    #[serde(default = "default_true")]
    top: bool,
    #[serde(default = "default_true")]
    bottom: bool,
}

fn default_true() -> bool {
    true
}

/// Raw config file contents.  Every field is optional; absent fields keep
/// their defaults so old files keep working after upgrades.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    role: Option<String>,
    instance_id: Option<String>,
    instance_name: Option<String>,
    port: Option<u16>,
    server_host: Option<String>,
    server_port: Option<u16>,
    screen_width: Option<i32>,
    screen_height: Option<i32>,
    edge_left: Option<bool>,
    edge_right: Option<bool>,
    edge_top: Option<bool>,
    edge_bottom: Option<bool>,
    lock_cursor_to_screen: Option<bool>,
    /// Keycode for the lock toggle hotkey; 0 disables it.
    lock_cursor_hotkey: Option<u32>,
    /// Decimal keycode strings mapped to replacement keycodes,
    /// e.g. `{"55": 133}` for Mac Command to Linux Super.
    #[serde(default)]
    key_remap: HashMap<String, u32>,
    /// Per-display edge overrides keyed by decimal display id.
    #[serde(default)]
    display_edges: HashMap<String, EdgeFlags>,
    tls: Option<bool>,
    tls_cert: Option<PathBuf>,
    tls_key: Option<PathBuf>,
    tls_passphrase: Option<String>,
    verbose: Option<bool>,
}

// ── Resolved settings ─────────────────────────────────────────────────────────

/// Fully resolved runtime settings: file values with CLI overrides applied.
#[derive(Debug, Clone)]
pub struct Settings {
    pub role: Role,
    /// Stable per-peer identifier; generated from the machine id when unset.
    pub instance_id: Option<String>,
    pub instance_name: Option<String>,
    pub port: u16,
    pub server_host: Option<String>,
    pub server_port: u16,
    /// Screen size overrides; 0 means auto-detect from the backend.
    pub screen_width: i32,
    pub screen_height: i32,
    pub edges: EdgeSettings,
    pub lock_cursor: bool,
    pub lock_cursor_hotkey: u32,
    pub key_remap: HashMap<u32, u32>,
    pub display_edges: HashMap<u32, EdgeSettings>,
    pub tls: bool,
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
    pub tls_passphrase: Option<String>,
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            role: Role::Client,
            instance_id: None,
            instance_name: None,
            port: DEFAULT_PORT,
            server_host: None,
            server_port: DEFAULT_PORT,
            screen_width: 0,
            screen_height: 0,
            edges: EdgeSettings::default(),
            lock_cursor: false,
            lock_cursor_hotkey: DEFAULT_LOCK_HOTKEY,
            key_remap: HashMap::new(),
            display_edges: HashMap::new(),
            tls: false,
            tls_cert: None,
            tls_key: None,
            tls_passphrase: None,
            verbose: false,
        }
    }
}

impl Settings {
    /// Loads settings from the given path, or from the first existing
    /// default location when `path` is `None`.  A missing file is not an
    /// error; defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let candidate = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_paths().into_iter().find(|p| p.exists()),
        };

        let mut settings = Settings::default();
        if let Some(path) = candidate {
            if path.exists() {
                let content = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Io { path: path.clone(), source })?;
                let file: ConfigFile = serde_json::from_str(&content)
                    .map_err(|source| ConfigError::Parse { path: path.clone(), source })?;
                settings.merge_file(file);
            }
        }
        Ok(settings)
    }

    fn merge_file(&mut self, file: ConfigFile) {
        match file.role.as_deref() {
            Some("server") => self.role = Role::Server,
            Some("client") => self.role = Role::Client,
            Some(other) => warn!("ignoring unknown role {other:?} in config file"),
            None => {}
        }
        self.instance_id = file.instance_id.or(self.instance_id.take());
        self.instance_name = file.instance_name.or(self.instance_name.take());
        if let Some(port) = file.port {
            self.port = port;
            self.server_port = port;
        }
        if let Some(port) = file.server_port {
            self.server_port = port;
        }
        self.server_host = file.server_host.or(self.server_host.take());
        if let Some(w) = file.screen_width {
            self.screen_width = w;
        }
        if let Some(h) = file.screen_height {
            self.screen_height = h;
        }
        if let Some(v) = file.edge_left {
            self.edges.left = v;
        }
        if let Some(v) = file.edge_right {
            self.edges.right = v;
        }
        if let Some(v) = file.edge_top {
            self.edges.top = v;
        }
        if let Some(v) = file.edge_bottom {
            self.edges.bottom = v;
        }
        if let Some(v) = file.lock_cursor_to_screen {
            self.lock_cursor = v;
        }
        if let Some(v) = file.lock_cursor_hotkey {
            self.lock_cursor_hotkey = v;
        }

        for (key, target) in file.key_remap {
            match key.parse::<u32>() {
                Ok(source) => {
                    self.key_remap.insert(source, target);
                }
                Err(_) => warn!("ignoring non-numeric keyRemap key {key:?}"),
            }
        }

        for (key, flags) in file.display_edges {
            match key.parse::<u32>() {
                Ok(display_id) => {
                    self.display_edges.insert(
                        display_id,
                        EdgeSettings {
                            left: flags.left,
                            right: flags.right,
                            top: flags.top,
                            bottom: flags.bottom,
                        },
                    );
                }
                Err(_) => warn!("ignoring non-numeric displayEdges key {key:?}"),
            }
        }

        if let Some(v) = file.tls {
            self.tls = v;
        }
        if file.tls_cert.is_some() {
            self.tls = true;
            self.tls_cert = file.tls_cert;
        }
        if file.tls_key.is_some() {
            self.tls = true;
            self.tls_key = file.tls_key;
        }
        self.tls_passphrase = file.tls_passphrase.or(self.tls_passphrase.take());
        if let Some(v) = file.verbose {
            self.verbose = v;
        }
    }

    /// Applies command-line overrides on top of file values.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(role) = cli.role {
            self.role = role;
        }
        if let Some(host) = &cli.server {
            self.server_host = Some(host.clone());
        }
        if let Some(port) = cli.port {
            self.port = port;
            self.server_port = port;
        }
        if let Some(name) = &cli.name {
            self.instance_name = Some(name.clone());
        }
        if cli.no_edge_left {
            self.edges.left = false;
        }
        if cli.no_edge_right {
            self.edges.right = false;
        }
        if cli.no_edge_top {
            self.edges.top = false;
        }
        if cli.no_edge_bottom {
            self.edges.bottom = false;
        }
        if cli.lock_cursor {
            self.lock_cursor = true;
        }
        if cli.tls {
            self.tls = true;
        }
        if let Some(cert) = &cli.tls_cert {
            self.tls = true;
            self.tls_cert = Some(cert.clone());
        }
        if let Some(key) = &cli.tls_key {
            self.tls = true;
            self.tls_key = Some(key.clone());
        }
        if let Some(pass) = &cli.tls_passphrase {
            self.tls_passphrase = Some(pass.clone());
        }
        if cli.verbose {
            self.verbose = true;
        }
    }
}

/// Candidate config file locations, most specific first.
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    #[cfg(target_os = "macos")]
    if let Some(home) = std::env::var_os("HOME") {
        paths.push(
            PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("Konflikt")
                .join("config.json"),
        );
    }

    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        paths.push(PathBuf::from(xdg).join("konflikt").join("config.json"));
    } else if let Some(home) = std::env::var_os("HOME") {
        paths.push(PathBuf::from(home).join(".config").join("konflikt").join("config.json"));
    }

    if let Some(dirs) = std::env::var_os("XDG_CONFIG_DIRS") {
        for dir in std::env::split_paths(&dirs) {
            paths.push(dir.join("konflikt").join("config.json"));
        }
    }

    paths
}

// ── Tests ─────────────────────────────────────────────────────────────────────
