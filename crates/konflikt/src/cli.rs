//! Command-line interface.
//!
//! Flags mirror the configuration file; anything given on the command line
//! overrides the file value (see [`crate::config::Settings::apply_cli`]).

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Which side of the KVM link this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Role {
    /// Owns the physical keyboard and mouse.
    Server,
    /// Receives and replays synthesized input.
    Client,
}

/// Software KVM: one keyboard and mouse across networked machines.
#[derive(Debug, Parser)]
#[command(name = "konflikt", about, disable_version_flag = true)]
pub struct Cli {
    /// Print version information.
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Run as server or client.
    #[arg(long, value_enum)]
    pub role: Option<Role>,

    /// Server hostname (clients auto-discover via mDNS when not set).
    #[arg(long)]
    pub server: Option<String>,

    /// Port for the WebSocket endpoint.
    #[arg(long)]
    pub port: Option<u16>,

    /// Display name for this machine.
    #[arg(long)]
    pub name: Option<String>,

    /// Path to the JSON config file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Disable the left edge screen transition.
    #[arg(long = "no-edge-left")]
    pub no_edge_left: bool,

    /// Disable the right edge screen transition.
    #[arg(long = "no-edge-right")]
    pub no_edge_right: bool,

    /// Disable the top edge screen transition.
    #[arg(long = "no-edge-top")]
    pub no_edge_top: bool,

    /// Disable the bottom edge screen transition.
    #[arg(long = "no-edge-bottom")]
    pub no_edge_bottom: bool,

    /// Lock the cursor to the current screen.
    #[arg(long = "lock-cursor")]
    pub lock_cursor: bool,

    /// Enable TLS (wss://) for the WebSocket endpoint.
    #[arg(long)]
    pub tls: bool,

    /// Path to the TLS certificate file (PEM).  Implies --tls.
    #[arg(long = "tls-cert")]
    pub tls_cert: Option<PathBuf>,

    /// Path to the TLS private key file (PEM).  Implies --tls.
    #[arg(long = "tls-key")]
    pub tls_key: Option<PathBuf>,

    /// Passphrase for an encrypted TLS key.
    #[arg(long = "tls-passphrase")]
    pub tls_passphrase: Option<String>,

    /// Enable verbose logging.
    #[arg(long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_server_role_with_port() {
        let cli = Cli::parse_from(["konflikt", "--role=server", "--port=3000"]);
        assert_eq!(cli.role, Some(Role::Server));
        assert_eq!(cli.port, Some(3000));
    }

    #[test]
    fn test_parses_client_with_server_host() {
        let cli = Cli::parse_from(["konflikt", "--role=client", "--server=desk.local"]);
        assert_eq!(cli.role, Some(Role::Client));
        assert_eq!(cli.server.as_deref(), Some("desk.local"));
    }

    #[test]
    fn test_parses_edge_disables() {
        let cli = Cli::parse_from(["konflikt", "--no-edge-left", "--no-edge-top"]);
        assert!(cli.no_edge_left);
        assert!(cli.no_edge_top);
        assert!(!cli.no_edge_right);
    }

    #[test]
    fn test_parses_tls_flags() {
        let cli = Cli::parse_from([
            "konflikt",
            "--tls",
            "--tls-cert=/etc/konflikt/cert.pem",
            "--tls-key=/etc/konflikt/key.pem",
        ]);
        assert!(cli.tls);
        assert!(cli.tls_cert.is_some());
        assert!(cli.tls_key.is_some());
    }

    #[test]
    fn test_version_flag_short_and_long() {
        assert!(Cli::parse_from(["konflikt", "-v"]).version);
        assert!(Cli::parse_from(["konflikt", "--version"]).version);
        assert!(!Cli::parse_from(["konflikt"]).version);
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        assert!(Cli::try_parse_from(["konflikt", "--frobnicate"]).is_err());
    }
}
