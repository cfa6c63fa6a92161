//! Argus observatory daemon
//!
//! Thin wrapper around the controller: parse the CLI, wire up logging,
//! instantiate drivers from the configured brands and run until
//! interrupted.

use anyhow::Context;
use argus_control::config::ObservatoryConfig;
use argus_control::controller::{Controller, Devices};
use argus_control::ephemeris::SolarOracle;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "argusd", about = "Autonomous observatory supervisory controller")]
struct Args {
    /// Path to the observatory configuration file.
    #[arg(long, default_value = "argus.toml")]
    config: PathBuf,

    /// Log filter, e.g. "info" or "argus_control=debug".
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = match &args.log {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = if args.config.exists() {
        ObservatoryConfig::load(&args.config)
            .with_context(|| format!("loading {}", args.config.display()))?
    } else {
        tracing::warn!(path = %args.config.display(), "config file not found; using defaults");
        ObservatoryConfig::default()
    };

    let oracle = Arc::new(SolarOracle::new(config.site.clone()));
    let devices = Devices::from_config(&config).context("instantiating device drivers")?;
    let mut controller = Controller::new(devices, oracle, config);

    let stop = controller.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received; stopping observatory");
            stop.stop();
        }
    });

    controller.run().await;
    Ok(())
}
