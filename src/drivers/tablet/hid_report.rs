//! Fixed layouts of the digitizer reports. Pad reports vary in where their
//! fields live, so those are read from the offsets in the device descriptor.
use packed_struct::prelude::*;

/// Size of an XP-Pen digitizer report
pub const PEN_DATA_SIZE: usize = 10;
/// Size of a Star digitizer report, which has no tilt
pub const STAR_PEN_DATA_SIZE: usize = 8;
/// Size of a Huion digitizer report
pub const HUION_PEN_DATA_SIZE: usize = 12;
/// Size of a touch pad pointer report
pub const POINTER_DATA_SIZE: usize = 7;

/// 12 byte unified reports extend x with this byte
pub const PEN_X_HIGH_BYTE: usize = 10;

/// Report id of the touch pad on the pointer interface
pub const POINTER_REPORT_ID: u8 = 0x01;
pub const POINTER_TAP: u8 = 0x01;

// Bits of the digitizer state byte
pub const STATE_TIP: u8 = 0x01;
pub const STATE_BUTTON_1: u8 = 0x02;
pub const STATE_BUTTON_2: u8 = 0x04;
pub const STATE_ERASER: u8 = 0x08;
pub const STATE_IN_RANGE: u8 = 0x20;
pub const STATE_OUT_OF_RANGE: u8 = 0x40;

// Huion sub-message types, carried in the state byte. Frame sub-reports
// follow the layout the kernel's hid-uclogic driver uses for v2 frames.
pub const HUION_PAD: u8 = 0xe0;
pub const HUION_TOUCH_STRIP: u8 = 0xf0;
pub const HUION_DIAL: u8 = 0xf1;

// PenDataReport
//
// Unified firmware, tip down at x=100 y=200 with half pressure:
// # ReportID: 2 / State: 0xa1 | X: 100 | Y: 200 | Pressure: 8192 | Tilt X: 5 | Tilt Y: -5
// E: 000000.000000 10 02 a1 64 00 c8 00 00 20 05 fb
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "10")]
pub struct PenDataReport {
    // BYTE 0
    #[packed_field(bytes = "0")]
    pub report_id: u8,
    // BYTE 1
    #[packed_field(bytes = "1")]
    pub state: u8,
    // BYTE 2-3
    #[packed_field(bytes = "2..=3", endian = "lsb")]
    pub x: Integer<u16, packed_bits::Bits<16>>,
    // BYTE 4-5
    #[packed_field(bytes = "4..=5", endian = "lsb")]
    pub y: Integer<u16, packed_bits::Bits<16>>,
    // BYTE 6-7
    #[packed_field(bytes = "6..=7", endian = "lsb")]
    pub pressure: Integer<u16, packed_bits::Bits<16>>,
    // BYTE 8
    #[packed_field(bytes = "8")]
    pub tilt_x: u8,
    // BYTE 9
    #[packed_field(bytes = "9")]
    pub tilt_y: u8,
}

impl Default for PenDataReport {
    fn default() -> Self {
        Self {
            report_id: 0x02,
            state: Default::default(),
            x: Default::default(),
            y: Default::default(),
            pressure: Default::default(),
            tilt_x: Default::default(),
            tilt_y: Default::default(),
        }
    }
}

// HuionPenDataReport
//
// # ReportID: 8 / State: 0x81 | X: 0x012345 | Y: 200 | Pressure: 1024 | Tilt X: -3 | Tilt Y: 7
// E: 000000.000000 12 08 81 45 23 c8 00 00 04 01 00 fd 07
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "12")]
pub struct HuionPenDataReport {
    // BYTE 0
    #[packed_field(bytes = "0")]
    pub report_id: u8,
    // BYTE 1
    #[packed_field(bytes = "1")]
    pub state: u8,
    // BYTE 2-3
    #[packed_field(bytes = "2..=3", endian = "lsb")]
    pub x: Integer<u16, packed_bits::Bits<16>>,
    // BYTE 4-5
    #[packed_field(bytes = "4..=5", endian = "lsb")]
    pub y: Integer<u16, packed_bits::Bits<16>>,
    // BYTE 6-7
    #[packed_field(bytes = "6..=7", endian = "lsb")]
    pub pressure: Integer<u16, packed_bits::Bits<16>>,
    // BYTE 8
    #[packed_field(bytes = "8")]
    pub x_high: u8,
    // BYTE 9
    #[packed_field(bytes = "9")]
    pub unk_9: u8,
    // BYTE 10
    #[packed_field(bytes = "10")]
    pub tilt_x: u8,
    // BYTE 11
    #[packed_field(bytes = "11")]
    pub tilt_y: u8,
}

impl Default for HuionPenDataReport {
    fn default() -> Self {
        Self {
            report_id: 0x08,
            state: 0x80,
            x: Default::default(),
            y: Default::default(),
            pressure: Default::default(),
            x_high: Default::default(),
            unk_9: Default::default(),
            tilt_x: Default::default(),
            tilt_y: Default::default(),
        }
    }
}

// PointerReport
//
// Finger moved 3 right and 2 up while tapping, wheel one notch down:
// # ReportID: 1 / State: 0x01 | X+: 3 | X-: 0 | Y+: 0 | Y-: 2 | Wheel: -1
// E: 000000.000000 7 01 01 03 00 00 02 ff
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "7")]
pub struct PointerReport {
    // BYTE 0
    #[packed_field(bytes = "0")]
    pub report_id: u8,
    // BYTE 1
    #[packed_field(bytes = "1")]
    pub state: u8,
    // BYTE 2-3
    #[packed_field(bytes = "2")]
    pub x_positive: u8,
    #[packed_field(bytes = "3")]
    pub x_negative: u8,
    // BYTE 4-5
    #[packed_field(bytes = "4")]
    pub y_positive: u8,
    #[packed_field(bytes = "5")]
    pub y_negative: u8,
    // BYTE 6
    #[packed_field(bytes = "6")]
    pub wheel: u8,
}

impl Default for PointerReport {
    fn default() -> Self {
        Self {
            report_id: POINTER_REPORT_ID,
            state: Default::default(),
            x_positive: Default::default(),
            x_negative: Default::default(),
            y_positive: Default::default(),
            y_negative: Default::default(),
            wheel: Default::default(),
        }
    }
}
