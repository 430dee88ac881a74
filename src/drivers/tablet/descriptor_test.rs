use std::{error::Error, fs, path::PathBuf};

use evdev::KeyCode;

use crate::drivers::tablet::{
    descriptor::{
        DecoderShape, DefaultMapping, DeviceDescriptor, PenLimits, ProbeError, ProbeLayout,
        PAD_BUTTON_ALIASES,
    },
    devices::{is_supported_vendor, lookup, lookup_interface, DEVICES, HUION_VID, XP_PEN_VID},
    driver::{string_descriptor_value, sysfs_usb_device, usb_address},
};

fn device(vendor_id: u16, product_id: u16) -> Result<DeviceDescriptor, Box<dyn Error>> {
    Ok(lookup(vendor_id, product_id).ok_or("unknown device")?)
}

/// Raw string descriptor holding the given little endian 16-bit values
fn string_descriptor(values: &[u16]) -> Vec<u8> {
    let mut buf = vec![(values.len() * 2 + 2) as u8, 0x03];
    for value in values {
        buf.extend(value.to_le_bytes());
    }
    buf
}

#[tokio::test]
async fn test_lookup() -> Result<(), Box<dyn Error>> {
    let descriptor = device(XP_PEN_VID, 0x092d)?;
    assert_eq!(descriptor.name, "XP-Pen Artist 24 Pro");
    assert_eq!(descriptor.button_count, 20);

    // Unknown XP-Pen products share the unified format
    let generic = device(XP_PEN_VID, 0x1234)?;
    assert_eq!(generic.product_id, 0x1234);
    assert!(generic.has_dial);
    assert!(generic.has_horizontal_dial);

    assert!(lookup(HUION_VID, 0x1234).is_none());
    assert!(lookup(0x046d, 0xc52b).is_none());
    assert!(is_supported_vendor(HUION_VID));
    assert!(!is_supported_vendor(0x046d));

    // Product ids are unique per vendor
    for (i, a) in DEVICES.iter().enumerate() {
        for b in DEVICES.iter().skip(i + 1) {
            assert!(
                a.vendor_id != b.vendor_id || a.product_id != b.product_id,
                "{} and {} share an id",
                a.name,
                b.name
            );
        }
    }

    Ok(())
}

#[tokio::test]
async fn test_button_aliases() -> Result<(), Box<dyn Error>> {
    let descriptor = device(XP_PEN_VID, 0x090d)?;
    assert_eq!(descriptor.button_alias(0), None);
    assert_eq!(descriptor.button_alias(1), Some(KeyCode::BTN_0.0));
    assert_eq!(descriptor.button_alias(11), Some(KeyCode::BTN_SOUTH.0));
    assert_eq!(descriptor.button_alias(21), Some(KeyCode::BTN_SELECT.0));
    assert_eq!(descriptor.button_alias(22), None);
    assert_eq!(descriptor.button_aliases(), &PAD_BUTTON_ALIASES[..8]);
    assert_eq!(descriptor.button_bytes(), 1);

    let descriptor = device(XP_PEN_VID, 0x092e)?;
    assert!(descriptor.button_aliases().is_empty());
    assert_eq!(descriptor.button_bytes(), 1);

    Ok(())
}

#[tokio::test]
async fn test_xp_pen_probe() -> Result<(), Box<dyn Error>> {
    let descriptor = device(XP_PEN_VID, 0x090d)?;
    assert_eq!(descriptor.probe, ProbeLayout::XpPen);
    assert_eq!(descriptor.probe.string_index(), Some(0x64));
    assert_eq!(descriptor.probe.request_len(), 12);

    // width, height, unused, pressure, resolution
    let buf = string_descriptor(&[0x9a60, 0x56e0, 0x0000, 0x1fff, 0x1400]);
    assert_eq!(buf[..4], [12, 0x03, 0x60, 0x9a]);

    let probed = descriptor.with_probe(&buf)?;
    assert_eq!(
        probed.limits,
        PenLimits {
            max_x: 0x9a60,
            max_y: 0x56e0,
            max_pressure: 0x1fff,
            resolution: 0x1400,
        }
    );

    // Zero pressure and missing resolution keep the nominal values
    let buf = string_descriptor(&[0x1000, 0x0800, 0x0000, 0x0000]);
    let probed = descriptor.with_probe(&buf)?;
    assert_eq!(probed.limits.max_x, 0x1000);
    assert_eq!(probed.limits.max_pressure, PenLimits::DEFAULT.max_pressure);
    assert_eq!(probed.limits.resolution, PenLimits::DEFAULT.resolution);

    assert_eq!(
        descriptor.with_probe(&[8, 0x03, 0x00, 0x10]),
        Err(ProbeError::TooShort {
            needed: 10,
            actual: 4
        })
    );

    Ok(())
}

#[tokio::test]
async fn test_huion_probe() -> Result<(), Box<dyn Error>> {
    let descriptor = device(HUION_VID, 0x006e)?;
    assert_eq!(descriptor.probe.string_index(), Some(200));
    assert_eq!(descriptor.probe.request_len(), 32);

    // 24-bit width 0x012345, 24-bit height 0x00c8f0, 16-bit pressure 8191
    let buf = [
        12, 0x03, 0x45, 0x23, 0x01, 0xf0, 0xc8, 0x00, 0xff, 0x1f, 0x00, 0x00,
    ];
    let probed = descriptor.with_probe(&buf)?;
    assert_eq!(probed.limits.max_x, 0x012345);
    assert_eq!(probed.limits.max_y, 0x00c8f0);
    assert_eq!(probed.limits.max_pressure, 8191);

    Ok(())
}

#[tokio::test]
async fn test_fixed_area() -> Result<(), Box<dyn Error>> {
    let descriptor = device(XP_PEN_VID, 0x092e)?;
    let buf = string_descriptor(&[0x1000, 0x0800, 0x0000, 0x2000, 0x00c8]);

    let probed = descriptor.with_probe(&buf)?;
    assert_eq!(probed.limits.max_x, 0x10e24);
    assert_eq!(probed.limits.max_y, 0x97dd);
    assert_eq!(probed.limits.max_pressure, 0x2000);

    let fallback = descriptor.without_probe();
    assert_eq!(fallback.limits.max_x, 0x10e24);
    assert_eq!(fallback.limits.max_pressure, PenLimits::DEFAULT.max_pressure);

    // Remotes cannot be probed
    let remote = device(XP_PEN_VID, 0x0201)?;
    assert_eq!(remote.probe.string_index(), None);
    assert_eq!(remote.with_probe(&buf), Err(ProbeError::Unsupported));
    assert_eq!(remote.without_probe(), remote);

    Ok(())
}

#[tokio::test]
async fn test_raw_capability_descriptor() -> Result<(), Box<dyn Error>> {
    assert_eq!(string_descriptor_value(0x64), 0x0364);
    assert_eq!(string_descriptor_value(200), 0x03c8);

    // Values in the UTF-16 surrogate range are plain numbers here
    let descriptor = device(XP_PEN_VID, 0x092d)?;
    let buf = [12, 0x03, 0x00, 0xd8, 0x00, 0xdc, 0x00, 0x00, 0xff, 0xdf, 0xc8, 0x00];
    let probed = descriptor.with_probe(&buf)?;
    assert_eq!(
        probed.limits,
        PenLimits {
            max_x: 0xd800,
            max_y: 0xdc00,
            max_pressure: 0xdfff,
            resolution: 200,
        }
    );

    // Anything that is not a string descriptor is rejected
    let buf = [12, 0x01, 0x00, 0x10, 0x00, 0x08, 0x00, 0x00, 0xff, 0x1f, 0xc8, 0x00];
    assert_eq!(descriptor.with_probe(&buf), Err(ProbeError::WrongType(0x01)));

    Ok(())
}

#[tokio::test]
async fn test_usb_address() -> Result<(), Box<dyn Error>> {
    assert_eq!(
        sysfs_usb_device("/dev/hidraw3"),
        PathBuf::from("/sys/class/hidraw/hidraw3/device/../..")
    );

    let dir = std::env::temp_dir().join(format!("tabletplumber-usb-{}", std::process::id()));
    fs::create_dir_all(&dir)?;
    assert_eq!(usb_address(&dir), None);

    fs::write(dir.join("busnum"), "3\n")?;
    fs::write(dir.join("devnum"), "17\n")?;
    assert_eq!(usb_address(&dir), Some((3, 17)));

    fs::write(dir.join("devnum"), "not a number\n")?;
    assert_eq!(usb_address(&dir), None);

    fs::remove_dir_all(dir)?;
    Ok(())
}

#[tokio::test]
async fn test_report_layouts() -> Result<(), Box<dyn Error>> {
    // Only unified firmware extends x
    assert_eq!(device(XP_PEN_VID, 0x092e)?.x_high_byte, Some(10));
    assert_eq!(device(XP_PEN_VID, 0x091b)?.x_high_byte, None);
    assert_eq!(device(XP_PEN_VID, 0x092d)?.x_high_byte, None);
    assert_eq!(device(XP_PEN_VID, 0x0934)?.x_high_byte, None);

    // Star pens send no tilt
    assert_eq!(device(XP_PEN_VID, 0x0913)?.pen_report_len, 8);
    assert_eq!(device(XP_PEN_VID, 0x0914)?.pen_report_len, 8);
    assert_eq!(device(XP_PEN_VID, 0x090d)?.pen_report_len, 10);
    assert_eq!(device(HUION_VID, 0x006e)?.pen_report_len, 12);

    Ok(())
}

#[tokio::test]
async fn test_touch_pad_interface() -> Result<(), Box<dyn Error>> {
    let tablet = lookup_interface(XP_PEN_VID, 0x0934, 2).ok_or("expected pen interface")?;
    assert_eq!(tablet.shape, DecoderShape::Unified);
    assert!(!tablet.is_pointer());

    let pointer = lookup_interface(XP_PEN_VID, 0x0934, 0).ok_or("expected touch pad")?;
    assert!(pointer.is_pointer());
    assert_eq!(pointer.interface, 0);
    assert_eq!(pointer.report_id, 0x01);
    assert_eq!(pointer.name, tablet.name);
    assert!(!pointer.has_pen);
    assert_eq!(pointer.button_count, 0);
    assert!(!pointer.has_dial);
    assert_eq!(pointer.init_key, None);
    assert_eq!(pointer.probe, ProbeLayout::None);
    assert_eq!(pointer.default_mapping, DefaultMapping::None);
    assert_eq!(pointer.pointer(), None);

    // Interfaces that carry nothing we decode
    assert!(lookup_interface(XP_PEN_VID, 0x0934, 1).is_none());
    assert!(lookup_interface(XP_PEN_VID, 0x090d, 0).is_none());
    assert!(lookup_interface(HUION_VID, 0x006e, 0).is_some());
    assert!(lookup_interface(HUION_VID, 0x006e, 2).is_none());

    Ok(())
}
