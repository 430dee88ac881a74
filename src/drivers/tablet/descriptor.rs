use evdev::KeyCode;
use thiserror::Error;

use super::hid_report::POINTER_REPORT_ID;

/// Pad buttons are exposed to userspace under these codes, in position order.
/// BTN_0..BTN_9 followed by BTN_A..BTN_SELECT.
pub const PAD_BUTTON_ALIASES: [u16; 21] = [
    KeyCode::BTN_0.0,
    KeyCode::BTN_1.0,
    KeyCode::BTN_2.0,
    KeyCode::BTN_3.0,
    KeyCode::BTN_4.0,
    KeyCode::BTN_5.0,
    KeyCode::BTN_6.0,
    KeyCode::BTN_7.0,
    KeyCode::BTN_8.0,
    KeyCode::BTN_9.0,
    KeyCode::BTN_SOUTH.0,
    KeyCode::BTN_EAST.0,
    KeyCode::BTN_C.0,
    KeyCode::BTN_NORTH.0,
    KeyCode::BTN_WEST.0,
    KeyCode::BTN_Z.0,
    KeyCode::BTN_TL.0,
    KeyCode::BTN_TR.0,
    KeyCode::BTN_TL2.0,
    KeyCode::BTN_TR2.0,
    KeyCode::BTN_SELECT.0,
];

/// Maximum tilt reported by every supported stylus, in degrees
pub const MAX_TILT: i32 = 60;

/// USB descriptor type of string descriptors
pub const STRING_DESCRIPTOR_TYPE: u8 = 0x03;

/// Represents all possible errors parsing a capability probe
#[derive(Debug, Error, PartialEq)]
pub enum ProbeError {
    #[error("Probe descriptor too short: needed {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("Probe descriptor has type 0x{0:02x}, not a string descriptor")]
    WrongType(u8),
    #[error("Device does not support capability probing")]
    Unsupported,
}

/// The closed set of report layouts the decoder understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderShape {
    /// XP-Pen unified firmware. Pen and pad share one report id and are told
    /// apart by the state byte. Proximity is reported with dedicated bits.
    Unified,
    /// Older XP-Pen and Star firmware. Same framing as [DecoderShape::Unified]
    /// but the tool is only considered present while the tip is down.
    Legacy,
    /// Huion report 0x08 family: pen (0x8x), pad (0xe0), touch strip (0xf0)
    /// and dial (0xf1) sub-messages.
    Huion,
    /// AC19 style shortcut remotes that report keyboard scancodes
    ShortcutRemote,
    /// Touch pad on a separate interface sending relative motion
    Pointer,
}

/// Encoding of a dedicated dial report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialEncoding {
    /// bit 0 increments, bit 1 decrements
    Bitmask,
    /// The dial sends a fixed code per direction
    Keycode { increment: u8, decrement: u8 },
}

/// Some families send dial movement on its own report id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialReport {
    pub report_id: u8,
    pub encoding: DialEncoding,
}

/// Layout of the string descriptor used to probe digitizer limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeLayout {
    None,
    /// String descriptor 0x64: 16-bit width, height, pressure and resolution
    XpPen,
    /// String descriptor 200: 24-bit width and height, 16-bit pressure
    Huion,
}

impl ProbeLayout {
    /// String descriptor index to read for this layout
    pub fn string_index(&self) -> Option<u8> {
        match self {
            ProbeLayout::None => None,
            ProbeLayout::XpPen => Some(0x64),
            ProbeLayout::Huion => Some(200),
        }
    }

    /// Number of bytes to request when reading the descriptor
    pub fn request_len(&self) -> usize {
        match self {
            ProbeLayout::None => 0,
            ProbeLayout::XpPen => 12,
            ProbeLayout::Huion => 32,
        }
    }
}

/// Family of default button/dial mappings synthesized for unconfigured devices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultMapping {
    None,
    XpPen,
    ArtistPro,
    Huion,
    ShortcutRemote,
    Star,
}

/// Limits of the digitizer surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PenLimits {
    pub max_x: u32,
    pub max_y: u32,
    pub max_pressure: u32,
    /// Units per millimeter
    pub resolution: u32,
}

impl PenLimits {
    pub const DEFAULT: PenLimits = PenLimits {
        max_x: 0x7fff,
        max_y: 0x7fff,
        max_pressure: 8191,
        resolution: 200,
    };
}

impl Default for PenLimits {
    fn default() -> Self {
        PenLimits::DEFAULT
    }
}

/// Everything the translation engine needs to know about one product. Entries
/// are static data; [DeviceDescriptor::with_probe] fills in the limits read
/// from the device when it is attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceDescriptor {
    pub vendor_id: u16,
    pub product_id: u16,
    pub name: &'static str,
    /// HID interface carrying the vendor reports
    pub interface: i32,
    /// Interface of a touch pad that gets its own pointer device
    pub pointer_interface: Option<i32>,
    pub shape: DecoderShape,
    /// Message-type byte of the primary report
    pub report_id: u8,
    /// Highest state byte value that still carries digitizer data
    pub pen_state_max: u8,
    /// Lowest state byte value that carries pad data
    pub frame_state_min: u8,
    pub has_pen: bool,
    /// Shortest digitizer report. Bytes of the packed layout past this
    /// length, such as tilt, read as 0.
    pub pen_report_len: usize,
    /// Byte extending x to 24 bits, when the report is long enough to hold it
    pub x_high_byte: Option<usize>,
    pub button_count: u8,
    pub has_dial: bool,
    pub has_horizontal_dial: bool,
    pub button_offset: usize,
    pub dial_offset: usize,
    /// Bit index of the horizontal dial's increment bit. The decrement bit
    /// follows it.
    pub horizontal_dial_shift: u8,
    pub dial_report: Option<DialReport>,
    /// (scancode, button position) pairs for [DecoderShape::ShortcutRemote]
    pub scancodes: &'static [(u8, u8)],
    /// Added to raw pressure before the curve is applied
    pub pressure_offset: i32,
    /// Digitizer area that overrides whatever the probe reports
    pub fixed_area: Option<(u32, u32)>,
    pub init_key: Option<&'static [u8]>,
    pub probe: ProbeLayout,
    pub default_mapping: DefaultMapping,
    pub limits: PenLimits,
}

impl DeviceDescriptor {
    /// Number of bytes used by the pad button bitmask
    pub fn button_bytes(&self) -> usize {
        (self.button_count as usize).div_ceil(8).clamp(1, 3)
    }

    /// Returns the code a pad button at the given 1-based position is known
    /// by. This is the key mappings are looked up with and the code emitted
    /// when no mapping exists.
    pub fn button_alias(&self, position: u8) -> Option<u16> {
        if position == 0 {
            return None;
        }
        PAD_BUTTON_ALIASES.get(position as usize - 1).copied()
    }

    /// Aliases of every pad button this device has
    pub fn button_aliases(&self) -> &'static [u16] {
        let count = (self.button_count as usize).min(PAD_BUTTON_ALIASES.len());
        &PAD_BUTTON_ALIASES[..count]
    }

    /// Descriptor for the touch pad interface of this device, if it has one.
    /// The touch pad only moves a pointer, so everything else is cleared.
    pub fn pointer(&self) -> Option<DeviceDescriptor> {
        let interface = self.pointer_interface?;
        Some(DeviceDescriptor {
            interface,
            pointer_interface: None,
            shape: DecoderShape::Pointer,
            report_id: POINTER_REPORT_ID,
            has_pen: false,
            x_high_byte: None,
            button_count: 0,
            has_dial: false,
            has_horizontal_dial: false,
            dial_report: None,
            scancodes: &[],
            pressure_offset: 0,
            init_key: None,
            probe: ProbeLayout::None,
            default_mapping: DefaultMapping::None,
            ..*self
        })
    }

    /// Returns true if this descriptor drives a touch pad interface
    pub fn is_pointer(&self) -> bool {
        self.shape == DecoderShape::Pointer
    }

    /// Returns a copy of this descriptor with the limits parsed from the given
    /// raw string descriptor. The buffer starts with the USB descriptor header
    /// (length and type bytes).
    pub fn with_probe(&self, buf: &[u8]) -> Result<DeviceDescriptor, ProbeError> {
        let mut limits = self.limits;
        if self.probe != ProbeLayout::None && buf.len() >= 2 && buf[1] != STRING_DESCRIPTOR_TYPE {
            return Err(ProbeError::WrongType(buf[1]));
        }
        match self.probe {
            ProbeLayout::None => return Err(ProbeError::Unsupported),
            ProbeLayout::XpPen => {
                let needed = 10;
                if buf.len() < needed {
                    return Err(ProbeError::TooShort {
                        needed,
                        actual: buf.len(),
                    });
                }
                limits.max_x = read_u16(buf, 2) as u32;
                limits.max_y = read_u16(buf, 4) as u32;
                limits.max_pressure = read_u16(buf, 8) as u32;
                if buf.len() >= 12 {
                    limits.resolution = read_u16(buf, 10) as u32;
                }
            }
            ProbeLayout::Huion => {
                let needed = 10;
                if buf.len() < needed {
                    return Err(ProbeError::TooShort {
                        needed,
                        actual: buf.len(),
                    });
                }
                limits.max_x = read_u24(buf, 2);
                limits.max_y = read_u24(buf, 5);
                limits.max_pressure = read_u16(buf, 8) as u32;
            }
        }

        if let Some((width, height)) = self.fixed_area {
            limits.max_x = width;
            limits.max_y = height;
        }
        if limits.max_pressure == 0 {
            limits.max_pressure = self.limits.max_pressure;
        }
        if limits.resolution == 0 {
            limits.resolution = self.limits.resolution;
        }

        let mut descriptor = *self;
        descriptor.limits = limits;
        Ok(descriptor)
    }

    /// Returns a copy of this descriptor with only the fixed area applied.
    /// Used when probing the device failed.
    pub fn without_probe(&self) -> DeviceDescriptor {
        let mut descriptor = *self;
        if let Some((width, height)) = self.fixed_area {
            descriptor.limits.max_x = width;
            descriptor.limits.max_y = height;
        }
        descriptor
    }
}

/// Little endian u16 at the given offset. Callers check the length.
fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

/// Little endian 24-bit value at the given offset. Callers check the length.
fn read_u24(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], 0])
}
