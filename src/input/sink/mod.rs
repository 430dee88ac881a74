pub mod uinput;

#[cfg(test)]
pub mod recording;

use thiserror::Error;

use crate::{
    drivers::tablet::descriptor::DeviceDescriptor,
    input::{
        output_event::{OutputFrame, TargetDevice},
        session::SessionId,
    },
};

/// Possible errors creating or writing to virtual devices
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Virtual device I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Unable to configure virtual device: {0}")]
    Errno(#[from] nix::errno::Errno),
    #[error("No {0:?} device exists for session {1}")]
    MissingDevice(TargetDevice, SessionId),
}

/// Configuration of the virtual pen device
#[derive(Debug, Clone, PartialEq)]
pub struct PenConfig {
    pub name: String,
    pub vendor_id: u16,
    pub product_id: u16,
    pub max_x: u32,
    pub max_y: u32,
    pub max_pressure: u32,
    /// Units per millimeter
    pub resolution: u32,
}

impl PenConfig {
    pub fn from_descriptor(descriptor: &DeviceDescriptor) -> Self {
        Self {
            name: format!("{} Pen", descriptor.name),
            vendor_id: descriptor.vendor_id,
            product_id: descriptor.product_id,
            max_x: descriptor.limits.max_x,
            max_y: descriptor.limits.max_y,
            max_pressure: descriptor.limits.max_pressure,
            resolution: descriptor.limits.resolution,
        }
    }
}

/// Configuration of the virtual pad device
#[derive(Debug, Clone, PartialEq)]
pub struct PadConfig {
    pub name: String,
    pub vendor_id: u16,
    pub product_id: u16,
    /// Codes the pad buttons are exposed under
    pub buttons: Vec<u16>,
    pub has_wheel: bool,
    pub has_hwheel: bool,
}

impl PadConfig {
    pub fn from_descriptor(descriptor: &DeviceDescriptor) -> Self {
        Self {
            name: format!("{} Pad", descriptor.name),
            vendor_id: descriptor.vendor_id,
            product_id: descriptor.product_id,
            buttons: descriptor.button_aliases().to_vec(),
            has_wheel: descriptor.has_dial,
            has_hwheel: descriptor.has_horizontal_dial,
        }
    }
}

/// Configuration of the virtual pointer fed by a tablet's touch pad
#[derive(Debug, Clone, PartialEq)]
pub struct PointerConfig {
    pub name: String,
    pub vendor_id: u16,
    pub product_id: u16,
}

impl PointerConfig {
    pub fn from_descriptor(descriptor: &DeviceDescriptor) -> Self {
        Self {
            name: format!("{} Pointer", descriptor.name),
            vendor_id: descriptor.vendor_id,
            product_id: descriptor.product_id,
        }
    }
}

/// Destination of translated events. Every attached tablet gets a pen and a
/// pad device keyed by its [SessionId]. Touch pad interfaces get a pointer.
pub trait VirtualDeviceSink: Send {
    fn create_pen(&mut self, session: SessionId, config: &PenConfig) -> Result<(), SinkError>;
    fn create_pad(&mut self, session: SessionId, config: &PadConfig) -> Result<(), SinkError>;
    fn create_pointer(
        &mut self,
        session: SessionId,
        config: &PointerConfig,
    ) -> Result<(), SinkError>;
    /// Write one atomic batch of events to a device of the session
    fn emit(&mut self, session: SessionId, frame: &OutputFrame) -> Result<(), SinkError>;
    /// Remove every device belonging to the session
    fn destroy(&mut self, session: SessionId) -> Result<(), SinkError>;
}
