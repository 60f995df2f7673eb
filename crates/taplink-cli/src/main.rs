//! taplink daemon.
//!
//! Runs the token service against the dry-run platform. Point a `file:`
//! reader at a text file and write token text into it to simulate scans:
//!
//! ```text
//! taplink --connect file:/tmp/taplink/tag.txt --hold-mode
//! echo "**launch.random:snes" > /tmp/taplink/tag.txt
//! ```

mod config;
mod dry_run;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use taplink_service::{SharedConfig, TokenService};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::dry_run::DryRunPlatform;

/// Reader and token coordination daemon
#[derive(Parser, Debug)]
#[command(name = "taplink", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "taplink.toml")]
    config: PathBuf,

    /// Log filter, overrides RUST_LOG (e.g. "debug" or "taplink_service=trace")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Extra reader device to connect (driver:path), may be repeated
    #[arg(long = "connect", value_name = "DEVICE")]
    connect: Vec<String>,

    /// Enable hold mode regardless of the config file
    #[arg(long)]
    hold_mode: bool,
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());

    info!("Starting taplink {}", taplink_core::VERSION);

    let mut config = config::load(&args.config)?;
    config.readers.connect.extend(args.connect);
    config.hold_mode |= args.hold_mode;
    config.validate()?;

    let platform = Arc::new(DryRunPlatform::new());
    let (service, mut handle) = TokenService::new(Arc::clone(&platform), SharedConfig::new(config));
    let registry = handle.registry().clone();

    let service_task = tokio::spawn(service.run());

    let launcher = tokio::spawn(async move {
        while let Some(token) = handle.recv_launch().await {
            info!("Launching: {}", token);
            platform.launched();
            handle.notify_software(Some(token));
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    registry.request_stop();

    if let Err(e) = service_task.await {
        error!("Token service task failed: {}", e);
    }
    if let Err(e) = launcher.await {
        error!("Launcher task failed: {}", e);
    }

    Ok(())
}
