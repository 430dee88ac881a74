use std::{error::Error, path::Path};

use clap::Subcommand;

use crate::{config::DriverConfig, drivers::tablet::devices};

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Print the path of the configuration file
    Path,
    /// Print the configuration in use
    Show,
    /// Print the configuration a device gets when it has none stored
    Defaults {
        /// Vendor id in hex (e.g. 28bd)
        #[arg(long, value_parser = parse_hex)]
        vendor: u16,
        /// Product id in hex (e.g. 092d)
        #[arg(long, value_parser = parse_hex)]
        product: u16,
    },
}

fn parse_hex(value: &str) -> Result<u16, String> {
    let value = value.trim_start_matches("0x");
    u16::from_str_radix(value, 16).map_err(|e| format!("invalid id {value}: {e}"))
}

pub fn handle_config(path: &Path, cmd: ConfigCommand) -> Result<(), Box<dyn Error>> {
    match cmd {
        ConfigCommand::Path => println!("{}", path.display()),
        ConfigCommand::Show => {
            let config = DriverConfig::load(path)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommand::Defaults { vendor, product } => {
            let Some(descriptor) = devices::lookup(vendor, product) else {
                return Err(format!("{vendor:04x}:{product:04x} is not a supported tablet").into());
            };
            let (device_config, _) = DriverConfig::default().resolve_device(&descriptor);
            let mut config = DriverConfig::default();
            config.set_device(vendor, product, device_config);
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
