//! Stable machine, display, and instance identifiers.
//!
//! The machine id is a truncated SHA-256 over hostname and user, so it
//! survives restarts without persisting anything.  The display id folds in
//! the desktop geometry, so the same machine presents distinct display ids
//! when its monitor arrangement changes.

use sha2::{Digest, Sha256};

fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

/// The local hostname, or `"unknown"` when it cannot be determined.
pub fn hostname() -> String {
    gethostname::gethostname().to_string_lossy().into_owned()
}

/// Stable identifier for this machine.
pub fn machine_id() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_default();
    short_hash(&format!("{}-{}", hostname(), user))
}

/// Identifier for the current desktop geometry on this machine.
pub fn display_id(machine_id: &str, desktop_width: i32, desktop_height: i32) -> String {
    short_hash(&format!("{machine_id}-{desktop_width}x{desktop_height}"))
}

/// Default instance id: hostname plus the first 8 hex chars of the machine
/// id, e.g. `lappy-7f3a0b12`.  Used when the config provides none.
pub fn default_instance_id(machine_id: &str) -> String {
    let short = &machine_id[..machine_id.len().min(8)];
    format!("{}-{}", hostname(), short)
}
