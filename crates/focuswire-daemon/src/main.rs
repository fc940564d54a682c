mod forwarder;
mod watcher;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use focuswire_core::Config;
use forwarder::ForwarderActor;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "focuswire-daemon", version)]
#[command(about = "Forwards active-window changes to a D-Bus listener")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("focuswire_daemon=debug".parse()?),
        )
        .init();

    info!("focuswire daemon starting");

    let config = match args.config {
        // an explicit path that does not load is a hard error
        Some(path) => Config::load_from(&path)?,
        None => Config::load().unwrap_or_else(|error| {
            warn!(%error, "failed to load config, using defaults");
            Config::default()
        }),
    };

    let (shutdown_sender, shutdown_receiver) = broadcast::channel::<()>(1);
    let sigint_shutdown_sender = shutdown_sender.clone();

    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("SIGINT received, initiating shutdown");
        sigint_shutdown_sender.send(()).ok();
    });

    let (forwarder, event_sender) = ForwarderActor::new(config.listener.clone());

    let mut window_watcher = watcher::create_watcher(config.watcher.backend);
    info!(watcher = window_watcher.name(), "window watcher selected");

    std::thread::Builder::new()
        .name("window-watcher".to_string())
        .spawn(move || {
            if let Err(error) = window_watcher.watch(&event_sender) {
                error!(%error, "window watcher stopped");
            }
        })?;

    forwarder.run(shutdown_receiver).await?;

    info!("focuswire daemon stopped");
    std::process::exit(0);
}
