use std::error::Error;

use clap::Subcommand;
use hidapi::HidApi;
use tabled::settings::{Panel, Style};
use tabled::{Table, Tabled};

use crate::drivers::tablet::{descriptor::DeviceDescriptor, devices};
use crate::input::manager::is_supported_interface;

#[derive(Subcommand, Debug, Clone)]
pub enum DevicesCommand {
    /// List all supported tablets
    Supported,
    /// List supported tablets that are currently connected
    Connected,
}

#[derive(Tabled)]
struct SupportedRow {
    vendor: String,
    product: String,
    name: String,
    buttons: u8,
    dials: u8,
    pen: bool,
    touchpad: bool,
}

impl From<&DeviceDescriptor> for SupportedRow {
    fn from(descriptor: &DeviceDescriptor) -> Self {
        Self {
            vendor: format!("{:04x}", descriptor.vendor_id),
            product: format!("{:04x}", descriptor.product_id),
            name: descriptor.name.to_string(),
            buttons: descriptor.button_count,
            dials: descriptor.has_dial as u8 + descriptor.has_horizontal_dial as u8,
            pen: descriptor.has_pen,
            touchpad: descriptor.pointer_interface.is_some(),
        }
    }
}

#[derive(Tabled)]
struct ConnectedRow {
    path: String,
    vendor: String,
    product: String,
    interface: i32,
    name: String,
}

pub fn handle_devices(cmd: DevicesCommand) -> Result<(), Box<dyn Error>> {
    match cmd {
        DevicesCommand::Supported => {
            let rows: Vec<SupportedRow> = devices::DEVICES.iter().map(SupportedRow::from).collect();
            let count = rows.len();

            let mut table = Table::new(rows);
            table
                .with(Style::modern_rounded())
                .with(Panel::header("Supported Tablets"));
            println!("{table}");
            println!("Found {count} supported tablet(s)");
        }
        DevicesCommand::Connected => {
            let api = HidApi::new()?;
            let mut rows = Vec::new();
            for info in api.device_list() {
                if !is_supported_interface(info) {
                    continue;
                }
                let Some(descriptor) = devices::lookup_interface(
                    info.vendor_id(),
                    info.product_id(),
                    info.interface_number(),
                ) else {
                    continue;
                };
                let name = if descriptor.is_pointer() {
                    format!("{} (touch pad)", descriptor.name)
                } else {
                    descriptor.name.to_string()
                };
                rows.push(ConnectedRow {
                    path: info.path().to_string_lossy().to_string(),
                    vendor: format!("{:04x}", info.vendor_id()),
                    product: format!("{:04x}", info.product_id()),
                    interface: info.interface_number(),
                    name,
                });
            }
            rows.sort_by(|a, b| a.path.cmp(&b.path));
            let count = rows.len();

            let mut table = Table::new(rows);
            table
                .with(Style::modern_rounded())
                .with(Panel::header("Connected Tablets"));
            println!("{table}");
            println!("Found {count} connected tablet(s)");
        }
    }

    Ok(())
}
