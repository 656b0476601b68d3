//! Konflikt entry point.
//!
//! Resolves configuration (file, then CLI overrides), initialises logging,
//! and hands control to the role supervisor.  Shutdown is a watch channel
//! flipped by Ctrl-C / SIGTERM; the supervisors broadcast their goodbyes
//! and return, so a clean exit is code 0 and any init failure is code 1.

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use konflikt::backend;
use konflikt::cli::{Cli, Role};
use konflikt::config::Settings;
use konflikt::{client, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Exit 0 for --help/--version, 1 for unknown options or bad values.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if cli.version {
        println!("konflikt {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut settings = Settings::load(cli.config.as_deref()).context("loading configuration")?;
    settings.apply_cli(&cli);

    // `RUST_LOG` wins; --verbose raises the default from info to debug.
    let default_filter = if settings.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    let backend = backend::platform_backend(settings.screen_width, settings.screen_height);

    match settings.role {
        Role::Server => server::run(settings, backend, shutdown_rx).await,
        Role::Client => client::run(settings, backend, shutdown_rx).await,
    }
}
