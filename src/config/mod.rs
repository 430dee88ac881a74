pub mod defaults;
pub mod path;


use std::{collections::BTreeMap, fs, io, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::drivers::tablet::descriptor::DeviceDescriptor;

/// Represents all possible errors loading or saving a [DriverConfig]
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not read: {0}")]
    IoError(#[from] io::Error),
    #[error("Unable to deserialize: {0}")]
    DeserializeError(#[from] serde_json::Error),
}

/// Event codes keyed by stringified event class (e.g. {"1": [30, 48]})
pub type EventCodes = BTreeMap<String, Vec<u16>>;

/// Button and dial mappings of one device, in the on-disk shape
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct MappingConfig {
    /// Pad button alias code → events
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub buttons: BTreeMap<String, EventCodes>,
    /// Dial code → direction ("-1" or "1") → events
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dials: BTreeMap<String, BTreeMap<String, EventCodes>>,
    /// Stylus button code → events
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stylus_buttons: BTreeMap<String, EventCodes>,
}

impl MappingConfig {
    /// Map a pad button to the given events
    pub fn add_button(&mut self, alias: u16, event_type: u16, codes: &[u16]) {
        self.buttons
            .entry(alias.to_string())
            .or_default()
            .insert(event_type.to_string(), codes.to_vec());
    }

    /// Map one direction of a dial to the given events
    pub fn add_dial(&mut self, dial: u16, direction: i32, event_type: u16, codes: &[u16]) {
        self.dials
            .entry(dial.to_string())
            .or_default()
            .entry(direction.to_string())
            .or_default()
            .insert(event_type.to_string(), codes.to_vec());
    }

    /// Map a stylus button to the given events
    pub fn add_stylus_button(&mut self, button: u16, event_type: u16, codes: &[u16]) {
        self.stylus_buttons
            .entry(button.to_string())
            .or_default()
            .insert(event_type.to_string(), codes.to_vec());
    }
}

/// Configuration of a single tablet
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct DeviceConfig {
    #[serde(default)]
    pub mapping: Option<MappingConfig>,
    /// Control points as [input percent, output percent] pairs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure_curve: Option<Vec<(f64, f64)>>,
}

impl DeviceConfig {
    /// Returns a copy of this config where a missing mapping is replaced by the
    /// default mapping for the given device
    pub fn with_defaults(&self, descriptor: &DeviceDescriptor) -> DeviceConfig {
        let mut config = self.clone();
        if config.mapping.is_none() {
            config.mapping = Some(defaults::default_mapping(descriptor));
        }
        config
    }
}

/// The driver configuration file
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct DriverConfig {
    /// Vendor id → product id → config, both as decimal strings
    #[serde(rename = "deviceConfigurations", default)]
    pub device_configurations: BTreeMap<String, BTreeMap<String, DeviceConfig>>,
}

impl DriverConfig {
    /// Load a [DriverConfig] from the given JSON string
    pub fn from_json(content: &str) -> Result<DriverConfig, LoadError> {
        let config: DriverConfig = serde_json::from_str(content)?;
        Ok(config)
    }

    /// Load a [DriverConfig] from the given JSON file
    pub fn from_json_file(path: &Path) -> Result<DriverConfig, LoadError> {
        let file = fs::File::open(path)?;
        let config: DriverConfig = serde_json::from_reader(file)?;
        Ok(config)
    }

    /// Load the config at the given path. A missing file yields an empty
    /// config, any other failure is returned to the caller.
    pub fn load(path: &Path) -> Result<DriverConfig, LoadError> {
        if !path.exists() {
            log::info!("No config found at {path:?}. Using defaults.");
            return Ok(DriverConfig::default());
        }
        DriverConfig::from_json_file(path)
    }

    /// Write the config to the given path, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), LoadError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Returns the stored config for the given device
    pub fn device(&self, vendor_id: u16, product_id: u16) -> Option<&DeviceConfig> {
        self.device_configurations
            .get(&vendor_id.to_string())?
            .get(&product_id.to_string())
    }

    /// Store the config for the given device, replacing any existing one
    pub fn set_device(&mut self, vendor_id: u16, product_id: u16, config: DeviceConfig) {
        self.device_configurations
            .entry(vendor_id.to_string())
            .or_default()
            .insert(product_id.to_string(), config);
    }

    /// Returns the effective config for the given device. Devices without a
    /// stored config, or with a null mapping, get their default mapping. The
    /// returned flag is true if anything had to be synthesized.
    pub fn resolve_device(&self, descriptor: &DeviceDescriptor) -> (DeviceConfig, bool) {
        match self.device(descriptor.vendor_id, descriptor.product_id) {
            Some(config) => {
                let synthesized = config.mapping.is_none();
                (config.with_defaults(descriptor), synthesized)
            }
            None => (DeviceConfig::default().with_defaults(descriptor), true),
        }
    }
}
