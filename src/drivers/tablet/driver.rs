use std::{
    ffi::CString,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use hidapi::{HidDevice, HidError};
use rusb::{Direction, Recipient, RequestType};
use thiserror::Error;

use super::{
    descriptor::{DeviceDescriptor, STRING_DESCRIPTOR_TYPE},
    devices,
};

/// Largest report any supported tablet sends
const PACKET_SIZE: usize = 64;
const HID_TIMEOUT: i32 = 1000;
const USB_TIMEOUT: Duration = Duration::from_secs(1);
/// Standard GET_DESCRIPTOR request
const GET_DESCRIPTOR: u8 = 0x06;
/// Language the capability strings are read in (en-US)
const LANGUAGE_ID: u16 = 0x0409;
const SYSFS_HIDRAW_PATH: &str = "/sys/class/hidraw";

/// Possible errors opening a tablet
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Invalid device path: {0}")]
    InvalidPath(#[from] std::ffi::NulError),
    #[error("HID error: {0}")]
    Hid(#[from] HidError),
    #[error("USB error: {0}")]
    Usb(#[from] rusb::Error),
    #[error("Device {vendor_id:04x}:{product_id:04x} is not a supported tablet")]
    Unsupported { vendor_id: u16, product_id: u16 },
    #[error("{name} uses interface {expected}, not {actual}")]
    WrongInterface {
        name: &'static str,
        expected: i32,
        actual: i32,
    },
}

impl DriverError {
    /// Returns true if opening the device again could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, DriverError::Hid(_))
    }
}

/// Raw hidraw access to one tablet interface
pub struct Driver {
    path: String,
    device: HidDevice,
    descriptor: DeviceDescriptor,
}

impl Driver {
    /// Open the given hidraw path. Fails if the device is not a supported
    /// tablet interface.
    pub fn new(path: &str) -> Result<Self, DriverError> {
        let c_path = CString::new(path)?;
        let api = hidapi::HidApi::new()?;
        let device = api.open_path(&c_path)?;
        let info = device.get_device_info()?;
        let (vendor_id, product_id) = (info.vendor_id(), info.product_id());
        let Some(tablet) = devices::lookup(vendor_id, product_id) else {
            return Err(DriverError::Unsupported {
                vendor_id,
                product_id,
            });
        };
        let interface = info.interface_number();
        let Some(descriptor) = devices::lookup_interface(vendor_id, product_id, interface) else {
            return Err(DriverError::WrongInterface {
                name: tablet.name,
                expected: tablet.interface,
                actual: interface,
            });
        };

        Ok(Self {
            path: path.to_string(),
            device,
            descriptor,
        })
    }

    /// Write the init key, switching the tablet into vendor reporting
    pub fn write_init_key(&self) -> Result<(), DriverError> {
        let Some(key) = self.descriptor.init_key else {
            return Ok(());
        };
        log::debug!("Sending init key to {}: {key:02x?}", self.descriptor.name);
        self.device.write(key)?;
        Ok(())
    }

    /// Read the capability string descriptor and return the descriptor with
    /// the probed limits. Falls back to the nominal limits if probing fails.
    pub fn probe(&self) -> DeviceDescriptor {
        let descriptor = self.descriptor;
        let Some(index) = descriptor.probe.string_index() else {
            return descriptor.without_probe();
        };

        let address = usb_address(&sysfs_usb_device(&self.path));
        let buf = match read_string_descriptor(&descriptor, address, index) {
            Ok(buf) => buf,
            Err(e) => {
                log::warn!("Unable to read capabilities of {}: {e}", descriptor.name);
                return descriptor.without_probe();
            }
        };
        log::debug!("Capability descriptor {index} of {}: {buf:02x?}", descriptor.name);

        match descriptor.with_probe(&buf) {
            Ok(probed) => probed,
            Err(e) => {
                log::warn!("Invalid capability descriptor for {}: {e}", descriptor.name);
                descriptor.without_probe()
            }
        }
    }

    /// Read the next report. Returns [None] if nothing arrived before the
    /// timeout.
    pub fn poll(&self) -> Result<Option<Vec<u8>>, DriverError> {
        let mut buf = [0; PACKET_SIZE];
        let bytes_read = self.device.read_timeout(&mut buf[..], HID_TIMEOUT)?;
        if bytes_read == 0 {
            return Ok(None);
        }
        Ok(Some(buf[..bytes_read].to_vec()))
    }
}

/// wValue of a GET_DESCRIPTOR request for the string with the given index
pub fn string_descriptor_value(index: u8) -> u16 {
    (STRING_DESCRIPTOR_TYPE as u16) << 8 | index as u16
}

/// Read a raw USB string descriptor, header included. hidraw cannot fetch
/// string descriptors, so the request goes to the USB device itself. The
/// device at the given (bus, address) is preferred over other devices of the
/// same product.
fn read_string_descriptor(
    descriptor: &DeviceDescriptor,
    address: Option<(u8, u8)>,
    index: u8,
) -> Result<Vec<u8>, DriverError> {
    let mut candidates = Vec::new();
    for device in rusb::devices()?.iter() {
        let Ok(info) = device.device_descriptor() else {
            continue;
        };
        if info.vendor_id() != descriptor.vendor_id || info.product_id() != descriptor.product_id
        {
            continue;
        }
        if Some((device.bus_number(), device.address())) == address {
            candidates.insert(0, device);
        } else {
            candidates.push(device);
        }
    }
    let Some(device) = candidates.into_iter().next() else {
        return Err(DriverError::Usb(rusb::Error::NotFound));
    };

    let handle = device.open()?;
    let mut buf = vec![0u8; descriptor.probe.request_len()];
    let read = handle.read_control(
        rusb::request_type(Direction::In, RequestType::Standard, Recipient::Device),
        GET_DESCRIPTOR,
        string_descriptor_value(index),
        LANGUAGE_ID,
        &mut buf,
        USB_TIMEOUT,
    )?;
    buf.truncate(read);
    Ok(buf)
}

/// Sysfs directory of the USB device behind a hidraw node. The hidraw
/// device sits below the HID device, which sits below the USB interface.
pub fn sysfs_usb_device(hidraw_path: &str) -> PathBuf {
    let name = Path::new(hidraw_path)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    Path::new(SYSFS_HIDRAW_PATH)
        .join(name)
        .join("device")
        .join("..")
        .join("..")
}

/// Read the (bus, address) pair of the USB device in the given sysfs directory
pub fn usb_address(dir: &Path) -> Option<(u8, u8)> {
    let read = |file: &str| -> Option<u8> {
        fs::read_to_string(dir.join(file)).ok()?.trim().parse().ok()
    };
    Some((read("busnum")?, read("devnum")?))
}
