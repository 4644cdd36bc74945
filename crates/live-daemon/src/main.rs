//! # storefront-live
//!
//! Live-activity server binary: loads settings, installs logging and
//! metrics, serves the admin dashboard channel, and shuts down on ctrl-c.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use live_server::LiveServer;
use live_server::config::ServerConfig;
use live_server::presence::start_sweep_task;
use live_settings::LiveSettings;

/// Storefront live-activity server.
#[derive(Parser, Debug)]
#[command(name = "storefront-live", about = "Storefront live-activity server")]
struct Cli {
    /// Settings file (defaults to `~/.storefront/live-settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Host to bind (overrides settings and `HOST`).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings and `PORT`).
    #[arg(long)]
    port: Option<u16>,

    /// WebSocket path (overrides settings and `LIVE_WS_PATH`).
    #[arg(long)]
    ws_path: Option<String>,

    /// Presence window in seconds (overrides settings and `LIVE_PRESENCE_WINDOW_SECS`).
    #[arg(long)]
    presence_window_secs: Option<u64>,
}

impl Cli {
    fn apply(&self, settings: &mut LiveSettings) {
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(ws_path) = &self.ws_path {
            settings.server.ws_path.clone_from(ws_path);
        }
        if let Some(secs) = self.presence_window_secs {
            settings.presence.window_secs = secs;
        }
    }
}

/// Defaults, file, env, then CLI. Validation failures are fatal.
fn resolve_settings(cli: &Cli) -> Result<LiveSettings> {
    let path = cli
        .settings
        .clone()
        .unwrap_or_else(live_settings::settings_path);
    let mut settings = live_settings::load_settings_from_path(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    cli.apply(&mut settings);
    settings.validate().context("Invalid settings")?;
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;

    live_logging::init_subscriber(&settings.logging.filter(), settings.logging.format)
        .context("Failed to initialize logging")?;

    let metrics =
        live_server::metrics::install_recorder().context("Failed to install metrics recorder")?;

    let config = ServerConfig::from_settings(&settings);
    let server = LiveServer::new(config, Some(metrics)).context("Failed to build server")?;

    let sweep = start_sweep_task(
        server.live().presence().clone(),
        server.config().presence_sweep_interval(),
        server.shutdown().token(),
    );

    let (addr, handle) = server.listen().await.context("Failed to bind server")?;
    tracing::info!(
        %addr,
        ws_path = %server.config().ws_path,
        presence_window_secs = server.config().presence_window_secs,
        "storefront-live ready"
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("shutting down");
    let drained = server
        .shutdown()
        .graceful_shutdown(vec![handle, sweep], None)
        .await;
    tracing::info!(drained, "storefront-live stopped");
    Ok(())
}
