use super::{
    descriptor::{
        DecoderShape, DefaultMapping, DeviceDescriptor, DialEncoding, DialReport, PenLimits,
        ProbeLayout,
    },
    hid_report::{HUION_PEN_DATA_SIZE, PEN_DATA_SIZE, PEN_X_HIGH_BYTE, STAR_PEN_DATA_SIZE},
};

// Vendor ID's
pub const XP_PEN_VID: u16 = 0x28bd;
pub const HUION_VID: u16 = 0x256c;

/// Switches unified XP-Pen firmware into reporting vendor data
const UNIFIED_INIT_KEY: [u8; 10] = [0x02, 0xb0, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
const STAR_INIT_KEY: [u8; 10] = [0x02, 0xb0, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];

/// AC19 keys do not map onto bits, so each scancode is looked up
const AC19_SCANCODES: [(u8, u8); 9] = [
    (0x19, 1),
    (0x0c, 2),
    (0x2c, 3),
    (0x05, 4),
    (0x28, 5),
    (0x1d, 6),
    (0x10, 7),
    (0x13, 8),
    (0x18, 9),
];

const XP_PEN_UNIFIED: DeviceDescriptor = DeviceDescriptor {
    vendor_id: XP_PEN_VID,
    product_id: 0,
    name: "Generic XP-Pen Device",
    interface: 2,
    pointer_interface: None,
    shape: DecoderShape::Unified,
    report_id: 0x02,
    pen_state_max: 0xc0,
    frame_state_min: 0xf0,
    has_pen: true,
    pen_report_len: PEN_DATA_SIZE,
    x_high_byte: Some(PEN_X_HIGH_BYTE),
    button_count: 8,
    has_dial: false,
    has_horizontal_dial: false,
    button_offset: 2,
    dial_offset: 7,
    horizontal_dial_shift: 4,
    dial_report: None,
    scancodes: &[],
    pressure_offset: 0,
    fixed_area: None,
    init_key: Some(&UNIFIED_INIT_KEY),
    probe: ProbeLayout::XpPen,
    default_mapping: DefaultMapping::XpPen,
    limits: PenLimits::DEFAULT,
};

const XP_PEN_LEGACY: DeviceDescriptor = DeviceDescriptor {
    shape: DecoderShape::Legacy,
    pen_state_max: 0xaf,
    x_high_byte: None,
    init_key: None,
    ..XP_PEN_UNIFIED
};

/// Fallback for XP-Pen products missing from [DEVICES]
const XP_PEN_GENERIC: DeviceDescriptor = DeviceDescriptor {
    button_count: 20,
    has_dial: true,
    has_horizontal_dial: true,
    ..XP_PEN_UNIFIED
};

/// All supported products
pub const DEVICES: &[DeviceDescriptor] = &[
    DeviceDescriptor {
        product_id: 0x094a,
        name: "XP-Pen Artist 12 (2nd Gen)",
        pressure_offset: -8192,
        ..XP_PEN_UNIFIED
    },
    DeviceDescriptor {
        product_id: 0x080a,
        name: "XP-Pen Artist 12 Pro",
        has_dial: true,
        ..XP_PEN_UNIFIED
    },
    DeviceDescriptor {
        product_id: 0x091f,
        name: "XP-Pen Artist 12 Pro (2nd Gen)",
        has_dial: true,
        ..XP_PEN_UNIFIED
    },
    DeviceDescriptor {
        product_id: 0x090d,
        name: "XP-Pen Artist 15.6 Pro",
        has_dial: true,
        ..XP_PEN_UNIFIED
    },
    DeviceDescriptor {
        product_id: 0x090b,
        name: "XP-Pen Artist 22E Pro",
        button_count: 16,
        ..XP_PEN_UNIFIED
    },
    DeviceDescriptor {
        product_id: 0x091b,
        name: "XP-Pen Artist 22R Pro",
        button_count: 20,
        has_dial: true,
        has_horizontal_dial: true,
        default_mapping: DefaultMapping::ArtistPro,
        ..XP_PEN_LEGACY
    },
    DeviceDescriptor {
        product_id: 0x092d,
        name: "XP-Pen Artist 24 Pro",
        button_count: 20,
        has_dial: true,
        has_horizontal_dial: true,
        default_mapping: DefaultMapping::ArtistPro,
        ..XP_PEN_LEGACY
    },
    DeviceDescriptor {
        product_id: 0x092e,
        name: "XP-Pen Artist Pro 16TP",
        button_count: 0,
        fixed_area: Some((0x10e24, 0x97dd)),
        default_mapping: DefaultMapping::None,
        ..XP_PEN_UNIFIED
    },
    DeviceDescriptor {
        product_id: 0x092c,
        name: "XP-Pen Innovator 16",
        has_dial: true,
        ..XP_PEN_UNIFIED
    },
    DeviceDescriptor {
        product_id: 0x0905,
        name: "XP-Pen Deco 01v2",
        has_dial: true,
        has_horizontal_dial: true,
        ..XP_PEN_UNIFIED
    },
    DeviceDescriptor {
        product_id: 0x0803,
        name: "XP-Pen Deco 02",
        button_count: 6,
        has_dial: true,
        dial_report: Some(DialReport {
            report_id: 0x03,
            encoding: DialEncoding::Keycode {
                increment: 0x2e,
                decrement: 0x2d,
            },
        }),
        ..XP_PEN_UNIFIED
    },
    DeviceDescriptor {
        product_id: 0x0904,
        name: "XP-Pen Deco 03",
        has_dial: true,
        dial_report: Some(DialReport {
            report_id: 0x03,
            encoding: DialEncoding::Bitmask,
        }),
        ..XP_PEN_UNIFIED
    },
    DeviceDescriptor {
        product_id: 0x0084,
        name: "XP-Pen Deco mini7",
        ..XP_PEN_UNIFIED
    },
    DeviceDescriptor {
        product_id: 0x0935,
        name: "XP-Pen Deco Large",
        pressure_offset: -8192,
        ..XP_PEN_UNIFIED
    },
    DeviceDescriptor {
        product_id: 0x0909,
        name: "XP-Pen Deco Pro Small",
        pointer_interface: Some(0),
        has_dial: true,
        has_horizontal_dial: true,
        horizontal_dial_shift: 2,
        ..XP_PEN_LEGACY
    },
    DeviceDescriptor {
        product_id: 0x090a,
        name: "XP-Pen Deco Pro Medium",
        pointer_interface: Some(0),
        has_dial: true,
        has_horizontal_dial: true,
        horizontal_dial_shift: 2,
        ..XP_PEN_LEGACY
    },
    DeviceDescriptor {
        product_id: 0x0934,
        name: "XP-Pen Deco Pro MW",
        pointer_interface: Some(0),
        x_high_byte: None,
        has_dial: true,
        has_horizontal_dial: true,
        horizontal_dial_shift: 2,
        ..XP_PEN_UNIFIED
    },
    DeviceDescriptor {
        product_id: 0x0913,
        name: "XP-Pen Star G430S",
        report_id: 0x07,
        pen_report_len: STAR_PEN_DATA_SIZE,
        button_count: 0,
        fixed_area: Some((0x7fff, 0x7fff)),
        init_key: Some(&STAR_INIT_KEY),
        default_mapping: DefaultMapping::Star,
        ..XP_PEN_LEGACY
    },
    DeviceDescriptor {
        product_id: 0x0914,
        name: "XP-Pen Star G640",
        report_id: 0x07,
        pen_report_len: STAR_PEN_DATA_SIZE,
        button_count: 0,
        fixed_area: Some((0x7fff, 0x7fff)),
        init_key: Some(&STAR_INIT_KEY),
        default_mapping: DefaultMapping::Star,
        ..XP_PEN_LEGACY
    },
    DeviceDescriptor {
        product_id: 0x0201,
        name: "XP-Pen AC19 Shortcut Remote",
        shape: DecoderShape::ShortcutRemote,
        has_pen: false,
        x_high_byte: None,
        button_count: 10,
        has_dial: true,
        scancodes: &AC19_SCANCODES,
        init_key: None,
        probe: ProbeLayout::None,
        default_mapping: DefaultMapping::ShortcutRemote,
        ..XP_PEN_UNIFIED
    },
    DeviceDescriptor {
        vendor_id: HUION_VID,
        product_id: 0x006e,
        name: "Huion Tablet",
        interface: 0,
        pointer_interface: None,
        shape: DecoderShape::Huion,
        report_id: 0x08,
        pen_state_max: 0x87,
        frame_state_min: 0xe0,
        has_pen: true,
        pen_report_len: HUION_PEN_DATA_SIZE,
        x_high_byte: None,
        button_count: 12,
        has_dial: true,
        has_horizontal_dial: false,
        button_offset: 4,
        dial_offset: 5,
        horizontal_dial_shift: 4,
        dial_report: None,
        scancodes: &[],
        pressure_offset: 0,
        fixed_area: None,
        init_key: None,
        probe: ProbeLayout::Huion,
        default_mapping: DefaultMapping::Huion,
        limits: PenLimits::DEFAULT,
    },
];

/// Returns the descriptor for the given product. Unknown XP-Pen products get
/// a generic unified descriptor since they share a common report format.
pub fn lookup(vendor_id: u16, product_id: u16) -> Option<DeviceDescriptor> {
    if let Some(descriptor) = DEVICES
        .iter()
        .find(|d| d.vendor_id == vendor_id && d.product_id == product_id)
    {
        return Some(*descriptor);
    }

    if vendor_id == XP_PEN_VID {
        log::debug!("Using generic descriptor for XP-Pen product {product_id:04x}");
        return Some(DeviceDescriptor {
            product_id,
            ..XP_PEN_GENERIC
        });
    }

    None
}

/// Returns the descriptor for the given interface of a product. Products
/// with a touch pad are driven through two interfaces.
pub fn lookup_interface(vendor_id: u16, product_id: u16, interface: i32) -> Option<DeviceDescriptor> {
    let descriptor = lookup(vendor_id, product_id)?;
    if descriptor.interface == interface {
        return Some(descriptor);
    }
    descriptor.pointer().filter(|pointer| pointer.interface == interface)
}

/// Returns true if the vendor is one we know how to drive
pub fn is_supported_vendor(vendor_id: u16) -> bool {
    vendor_id == XP_PEN_VID || vendor_id == HUION_VID
}
