pub mod config;
pub mod device;

use std::{error::Error, path::PathBuf};

use clap::{Parser, Subcommand};
use config::{handle_config, ConfigCommand};
use device::{handle_devices, DevicesCommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the driver configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the TabletPlumber daemon (default)
    Run,
    /// List supported and connected tablets
    Devices {
        #[command(subcommand)]
        cmd: DevicesCommand,
    },
    /// Inspect the driver configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommand,
    },
}

impl Args {
    /// Returns the config path given on the command line, or the default one
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::path::get_config_path)
    }
}

pub fn main_cli(args: &Args) -> Result<(), Box<dyn Error>> {
    let Some(cmd) = args.cmd.clone() else {
        return Ok(());
    };

    match cmd {
        Commands::Run => (),
        Commands::Devices { cmd } => handle_devices(cmd)?,
        Commands::Config { cmd } => handle_config(&args.config_path(), cmd)?,
    }

    Ok(())
}
