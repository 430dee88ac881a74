use packed_struct::{types::SizedInteger, PackedStruct, PackingError};
use thiserror::Error;

use super::{
    descriptor::{DecoderShape, DeviceDescriptor, DialEncoding, DialReport},
    event::{
        DecodedReport, DialMotion, DigitizerSample, FrameSample, PointerSample,
        ProximityTransition, StylusButton,
    },
    hid_report::{
        HuionPenDataReport, PenDataReport, PointerReport, HUION_DIAL, HUION_PAD,
        HUION_PEN_DATA_SIZE, HUION_TOUCH_STRIP, PEN_DATA_SIZE, POINTER_DATA_SIZE, POINTER_TAP,
        STATE_BUTTON_1, STATE_BUTTON_2, STATE_ERASER, STATE_IN_RANGE, STATE_OUT_OF_RANGE,
        STATE_TIP,
    },
};

/// Huion pen sub-messages start at this state value
const HUION_PEN_STATE_MIN: u8 = 0x80;
/// AC19 state value sent by the button in the middle of the dial
const REMOTE_DIAL_BUTTON: u8 = 0x02;
/// AC19 position assigned to the dial button
const REMOTE_DIAL_BUTTON_POSITION: u8 = 10;
/// AC19 scancode that shares the dial flag without being a dial pulse
const REMOTE_DIAL_EXCLUDED: u8 = 0x1d;
const REMOTE_DIAL_DECREMENT: u8 = 0x56;
const REMOTE_DIAL_INCREMENT: u8 = 0x57;
/// Dedicated dial reports only carry movement with this sub-type
const DIAL_REPORT_MOTION: u8 = 0x01;

/// Represents all possible errors decoding a report
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Report 0x{report_id:02x} too short: needed {needed} bytes, got {actual}")]
    TooShort {
        report_id: u8,
        needed: usize,
        actual: usize,
    },
    #[error("Unable to unpack report: {0}")]
    Unpack(#[from] PackingError),
}

/// Decode one raw report into canonical samples using the layout described by
/// the given descriptor. Unknown reports decode to an empty [DecodedReport];
/// only reports that are too short to hold what they claim are errors.
pub fn decode(report: &[u8], descriptor: &DeviceDescriptor) -> Result<DecodedReport, DecodeError> {
    require(report, 2)?;
    match descriptor.shape {
        DecoderShape::Unified | DecoderShape::Legacy => decode_xp_pen(report, descriptor),
        DecoderShape::Huion => decode_huion(report, descriptor),
        DecoderShape::ShortcutRemote => decode_shortcut_remote(report, descriptor),
        DecoderShape::Pointer => decode_pointer(report, descriptor),
    }
}

fn decode_xp_pen(
    report: &[u8],
    descriptor: &DeviceDescriptor,
) -> Result<DecodedReport, DecodeError> {
    let report_id = report[0];
    if let Some(dial_report) = descriptor.dial_report.as_ref() {
        if report_id == dial_report.report_id {
            return decode_dial_report(report, dial_report);
        }
    }
    if report_id != descriptor.report_id {
        log::trace!("Ignoring unknown report id 0x{report_id:02x}");
        return Ok(DecodedReport::default());
    }

    let state = report[1];
    let mut decoded = DecodedReport::default();
    if descriptor.has_pen && state <= descriptor.pen_state_max {
        decoded.digitizer = Some(decode_xp_pen_digitizer(report, descriptor)?);
    } else if state >= descriptor.frame_state_min && has_frame(descriptor) {
        decoded.frame = Some(decode_xp_pen_frame(report, descriptor)?);
    } else {
        log::trace!("Ignoring report 0x{report_id:02x} with state 0x{state:02x}");
    }

    Ok(decoded)
}

fn decode_xp_pen_digitizer(
    report: &[u8],
    descriptor: &DeviceDescriptor,
) -> Result<DigitizerSample, DecodeError> {
    require(report, descriptor.pen_report_len)?;
    let len = descriptor.pen_report_len.min(PEN_DATA_SIZE);
    let mut buf = [0u8; PEN_DATA_SIZE];
    buf[..len].copy_from_slice(&report[..len]);
    let data = PenDataReport::unpack(&buf)?;

    let mut x = data.x.to_primitive() as u32;
    if let Some(high) = descriptor.x_high_byte.and_then(|index| report.get(index)) {
        x |= (*high as u32) << 16;
    }

    let state = data.state;
    let tip_contact = state & STATE_TIP != 0;
    let proximity = match descriptor.shape {
        DecoderShape::Unified => unified_proximity(state),
        _ => contact_proximity(tip_contact),
    };

    Ok(DigitizerSample {
        x,
        y: data.y.to_primitive() as u32,
        pressure: data.pressure.to_primitive(),
        tilt_x: data.tilt_x as i8,
        tilt_y: data.tilt_y as i8,
        tip_contact,
        stylus_button: stylus_button(state),
        proximity,
    })
}

fn decode_xp_pen_frame(
    report: &[u8],
    descriptor: &DeviceDescriptor,
) -> Result<FrameSample, DecodeError> {
    let button_end = descriptor.button_offset + descriptor.button_bytes();
    let mut needed = button_end;
    if descriptor.has_dial || descriptor.has_horizontal_dial {
        needed = needed.max(descriptor.dial_offset + 1);
    }
    require(report, needed)?;

    let button = button_position(&report[descriptor.button_offset..button_end]);
    let mut frame = FrameSample {
        button: Some(button),
        ..Default::default()
    };
    if descriptor.has_dial {
        frame.vertical = dial_pulse(report[descriptor.dial_offset], 0);
    }
    if descriptor.has_horizontal_dial {
        frame.horizontal = dial_pulse(
            report[descriptor.dial_offset],
            descriptor.horizontal_dial_shift,
        );
    }

    Ok(frame)
}

fn decode_dial_report(
    report: &[u8],
    dial_report: &DialReport,
) -> Result<DecodedReport, DecodeError> {
    require(report, 3)?;
    if report[1] != DIAL_REPORT_MOTION {
        return Ok(DecodedReport::default());
    }

    let vertical = match dial_report.encoding {
        DialEncoding::Bitmask => dial_pulse(report[2], 0),
        DialEncoding::Keycode {
            increment,
            decrement,
        } => match report[2] {
            code if code == increment => DialMotion::Step(1),
            code if code == decrement => DialMotion::Step(-1),
            _ => DialMotion::Idle,
        },
    };
    if vertical == DialMotion::Idle {
        return Ok(DecodedReport::default());
    }

    Ok(DecodedReport {
        frame: Some(FrameSample {
            button: None,
            vertical,
            horizontal: DialMotion::Idle,
        }),
        ..Default::default()
    })
}

fn decode_huion(report: &[u8], descriptor: &DeviceDescriptor) -> Result<DecodedReport, DecodeError> {
    let report_id = report[0];
    if report_id != descriptor.report_id {
        log::trace!("Ignoring unknown report id 0x{report_id:02x}");
        return Ok(DecodedReport::default());
    }

    let state = report[1];
    let mut decoded = DecodedReport::default();
    match state {
        HUION_PEN_STATE_MIN..=u8::MAX
            if descriptor.has_pen && state <= descriptor.pen_state_max =>
        {
            require(report, HUION_PEN_DATA_SIZE)?;
            let mut buf = [0u8; HUION_PEN_DATA_SIZE];
            buf.copy_from_slice(&report[..HUION_PEN_DATA_SIZE]);
            let data = HuionPenDataReport::unpack(&buf)?;

            let tip_contact = state & STATE_TIP != 0;
            let x = data.x.to_primitive() as u32 | (data.x_high as u32) << 16;
            decoded.digitizer = Some(DigitizerSample {
                x,
                y: data.y.to_primitive() as u32,
                pressure: data.pressure.to_primitive(),
                tilt_x: data.tilt_x as i8,
                tilt_y: data.tilt_y as i8,
                tip_contact,
                stylus_button: stylus_button(state),
                proximity: contact_proximity(tip_contact),
            });
        }
        HUION_PAD => {
            let button_end = descriptor.button_offset + descriptor.button_bytes();
            require(report, button_end)?;
            decoded.frame = Some(FrameSample {
                button: Some(button_position(
                    &report[descriptor.button_offset..button_end],
                )),
                ..Default::default()
            });
        }
        HUION_TOUCH_STRIP if descriptor.has_dial => {
            require(report, descriptor.dial_offset + 1)?;
            decoded.frame = Some(FrameSample {
                button: None,
                vertical: DialMotion::Absolute(report[descriptor.dial_offset]),
                horizontal: DialMotion::Idle,
            });
        }
        HUION_DIAL if descriptor.has_dial => {
            require(report, descriptor.dial_offset + 1)?;
            decoded.frame = Some(FrameSample {
                button: None,
                vertical: dial_pulse(report[descriptor.dial_offset], 0),
                horizontal: DialMotion::Idle,
            });
        }
        _ => {
            log::trace!("Ignoring Huion report with state 0x{state:02x}");
        }
    }

    Ok(decoded)
}

fn decode_shortcut_remote(
    report: &[u8],
    descriptor: &DeviceDescriptor,
) -> Result<DecodedReport, DecodeError> {
    let report_id = report[0];
    if report_id != descriptor.report_id {
        log::trace!("Ignoring unknown report id 0x{report_id:02x}");
        return Ok(DecodedReport::default());
    }
    require(report, 4)?;

    let state = report[1];
    let scancode = report[3];
    let mut button = descriptor
        .scancodes
        .iter()
        .find(|(code, _)| *code == scancode)
        .map(|(_, position)| *position)
        .unwrap_or_default();
    if state == REMOTE_DIAL_BUTTON {
        button = REMOTE_DIAL_BUTTON_POSITION;
    }

    let mut vertical = DialMotion::Idle;
    if descriptor.has_dial && state & 0x01 != 0 && scancode != REMOTE_DIAL_EXCLUDED {
        vertical = match scancode {
            REMOTE_DIAL_DECREMENT => DialMotion::Step(-1),
            REMOTE_DIAL_INCREMENT => DialMotion::Step(1),
            _ => DialMotion::Idle,
        };
    }

    Ok(DecodedReport {
        frame: Some(FrameSample {
            button: Some(button),
            vertical,
            horizontal: DialMotion::Idle,
        }),
        ..Default::default()
    })
}

fn decode_pointer(report: &[u8], descriptor: &DeviceDescriptor) -> Result<DecodedReport, DecodeError> {
    let report_id = report[0];
    if report_id != descriptor.report_id {
        log::trace!("Ignoring unknown report id 0x{report_id:02x}");
        return Ok(DecodedReport::default());
    }
    require(report, POINTER_DATA_SIZE)?;
    let mut buf = [0u8; POINTER_DATA_SIZE];
    buf.copy_from_slice(&report[..POINTER_DATA_SIZE]);
    let data = PointerReport::unpack(&buf)?;

    // Each axis moves by the difference of its two directions
    Ok(DecodedReport {
        pointer: Some(PointerSample {
            dx: data.x_positive as i32 - data.x_negative as i32,
            dy: data.y_positive as i32 - data.y_negative as i32,
            tap: data.state & POINTER_TAP != 0,
            wheel: data.wheel as i8,
        }),
        ..Default::default()
    })
}

/// Returns true if the device has anything on its pad worth decoding
fn has_frame(descriptor: &DeviceDescriptor) -> bool {
    descriptor.button_count > 0 || descriptor.has_dial || descriptor.has_horizontal_dial
}

/// Proximity as reported by firmware with dedicated range bits
fn unified_proximity(state: u8) -> ProximityTransition {
    let eraser = state & STATE_ERASER != 0;
    if state & STATE_IN_RANGE != 0 {
        if eraser {
            ProximityTransition::EraserEntered
        } else {
            ProximityTransition::Entered
        }
    } else if state & STATE_OUT_OF_RANGE != 0 {
        if eraser {
            ProximityTransition::EraserLeft
        } else {
            ProximityTransition::Left
        }
    } else {
        ProximityTransition::None
    }
}

/// Older firmware only tells us about contact, so the tool follows the tip
fn contact_proximity(tip_contact: bool) -> ProximityTransition {
    if tip_contact {
        ProximityTransition::Entered
    } else {
        ProximityTransition::Left
    }
}

fn stylus_button(state: u8) -> StylusButton {
    if state & STATE_BUTTON_1 != 0 {
        StylusButton::Primary
    } else if state & STATE_BUTTON_2 != 0 {
        StylusButton::Secondary
    } else {
        StylusButton::None
    }
}

/// Decode directional pulse bits. The increment bit wins if both are set.
pub fn dial_pulse(value: u8, shift: u8) -> DialMotion {
    if value & (0x01 << shift) != 0 {
        DialMotion::Step(1)
    } else if value & (0x02 << shift) != 0 {
        DialMotion::Step(-1)
    } else {
        DialMotion::Idle
    }
}

/// 1-based position of the lowest set bit of a little endian bitmask, or 0
pub fn button_position(bytes: &[u8]) -> u8 {
    let mask = bytes
        .iter()
        .take(4)
        .enumerate()
        .fold(0u32, |mask, (i, byte)| mask | (*byte as u32) << (8 * i));
    if mask == 0 {
        return 0;
    }
    (mask.trailing_zeros() + 1) as u8
}

fn require(report: &[u8], needed: usize) -> Result<(), DecodeError> {
    if report.len() < needed {
        return Err(DecodeError::TooShort {
            report_id: report.first().copied().unwrap_or_default(),
            needed,
            actual: report.len(),
        });
    }
    Ok(())
}
