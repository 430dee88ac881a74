use std::env;
use std::error::Error;
use std::process;

use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};

use crate::cli::{main_cli, Args, Commands};
use crate::input::manager::{Manager, ManagerCommand};

mod cli;
mod config;
mod drivers;
mod input;
mod watcher;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let args = Args::parse();
    if !matches!(args.cmd, None | Some(Commands::Run)) {
        if let Err(e) = main_cli(&args) {
            eprintln!("{e}");
            process::exit(1);
        }
        return Ok(());
    }

    let log_level = match env::var("LOG_LEVEL") {
        Ok(value) => value,
        Err(_) => "info".to_string(),
    };
    env::set_var("RUST_LOG", log_level);
    env_logger::init();
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    log::info!("Starting TabletPlumber v{}", VERSION);

    let config_path = args.config_path();
    log::info!("Using config {config_path:?}");
    let mut manager = Manager::new(config_path);

    // Setup CTRL+C handler
    let tx = manager.transmitter();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Unable to listen for CTRL+C: {e}");
            return;
        }
        log::info!("Shutting down");
        if let Err(e) = tx.send(ManagerCommand::Shutdown).await {
            log::error!("Unable to stop manager: {e}");
            process::exit(1);
        }
    });

    // Reload the config on SIGHUP
    let tx = manager.transmitter();
    let mut hangup = signal(SignalKind::hangup())?;
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            if let Err(e) = tx.send(ManagerCommand::Reload).await {
                log::error!("Unable to reload config: {e}");
                break;
            }
        }
    });

    if let Err(e) = manager.run().await {
        log::error!("Error running the input manager: {e}");
        return Err(e);
    }

    log::info!("TabletPlumber stopped");

    // The device watcher thread blocks on inotify and would keep the runtime
    // from shutting down
    process::exit(0);
}
