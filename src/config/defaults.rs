//! Default mappings synthesized for devices that have none configured
use evdev::{EventType, KeyCode, RelativeAxisCode};

use crate::drivers::tablet::descriptor::{DefaultMapping, DeviceDescriptor, PAD_BUTTON_ALIASES};

use super::MappingConfig;

const CTRL: KeyCode = KeyCode::KEY_LEFTCTRL;
const ALT: KeyCode = KeyCode::KEY_LEFTALT;
const SHIFT: KeyCode = KeyCode::KEY_LEFTSHIFT;

/// Shortcuts of the common XP-Pen layout, in button order
const XP_PEN_BUTTONS: &[&[KeyCode]] = &[
    &[KeyCode::KEY_B],
    &[KeyCode::KEY_E],
    &[KeyCode::KEY_SPACE],
    &[ALT],
    &[KeyCode::KEY_V],
    &[CTRL, KeyCode::KEY_S],
    &[CTRL, KeyCode::KEY_Z],
    &[CTRL, ALT, KeyCode::KEY_N],
    &[KeyCode::KEY_V],
    &[KeyCode::KEY_L],
];

/// Shortcuts of the Artist Pro display layout, in button order
const ARTIST_PRO_BUTTONS: &[&[KeyCode]] = &[
    &[KeyCode::KEY_B],
    &[KeyCode::KEY_E],
    &[ALT],
    &[KeyCode::KEY_SPACE],
    &[CTRL, KeyCode::KEY_S],
    &[CTRL, KeyCode::KEY_Z],
    &[CTRL, ALT, KeyCode::KEY_Z],
    &[CTRL, SHIFT, KeyCode::KEY_Z],
    &[KeyCode::KEY_V],
    &[KeyCode::KEY_L],
    &[CTRL, KeyCode::KEY_0],
    &[CTRL, KeyCode::KEY_N],
    &[CTRL, SHIFT, KeyCode::KEY_N],
    &[CTRL, KeyCode::KEY_E],
    &[KeyCode::KEY_F],
    &[KeyCode::KEY_D],
    &[KeyCode::KEY_X],
    &[CTRL, KeyCode::KEY_DELETE],
    &[CTRL, KeyCode::KEY_C],
    &[CTRL, KeyCode::KEY_V],
];

/// Shortcuts of the Huion pad layout, in button order
const HUION_BUTTONS: &[&[KeyCode]] = &[
    &[CTRL, KeyCode::KEY_S],
    &[KeyCode::KEY_F5],
    &[KeyCode::KEY_B],
    &[KeyCode::KEY_E],
    &[KeyCode::KEY_RIGHTBRACE],
    &[KeyCode::KEY_LEFTBRACE],
    &[CTRL, KeyCode::KEY_EQUAL],
    &[CTRL, KeyCode::KEY_MINUS],
    &[KeyCode::KEY_SPACE],
    &[KeyCode::KEY_F6],
    &[CTRL, ALT, KeyCode::KEY_Z],
    &[CTRL, SHIFT, KeyCode::KEY_N],
];

const ZOOM_OUT: &[KeyCode] = &[CTRL, KeyCode::KEY_MINUS];
const ZOOM_IN: &[KeyCode] = &[CTRL, KeyCode::KEY_EQUAL];

/// Returns the mapping a device gets when none is configured for it
pub fn default_mapping(descriptor: &DeviceDescriptor) -> MappingConfig {
    let mut mapping = MappingConfig::default();
    let wheel = RelativeAxisCode::REL_WHEEL.0;
    let hwheel = RelativeAxisCode::REL_HWHEEL.0;

    match descriptor.default_mapping {
        DefaultMapping::None => (),
        DefaultMapping::XpPen | DefaultMapping::ShortcutRemote => {
            add_buttons(&mut mapping, descriptor, XP_PEN_BUTTONS);
            if descriptor.has_dial {
                add_dial(&mut mapping, wheel, ZOOM_OUT, ZOOM_IN);
            }
            if descriptor.has_horizontal_dial {
                add_dial(&mut mapping, hwheel, ZOOM_OUT, ZOOM_IN);
            }
        }
        DefaultMapping::ArtistPro => {
            add_buttons(&mut mapping, descriptor, ARTIST_PRO_BUTTONS);
            if descriptor.has_dial {
                add_dial(&mut mapping, wheel, ZOOM_OUT, ZOOM_IN);
            }
            if descriptor.has_horizontal_dial {
                add_dial(
                    &mut mapping,
                    hwheel,
                    &[KeyCode::KEY_LEFTBRACE],
                    &[KeyCode::KEY_RIGHTBRACE],
                );
            }
        }
        DefaultMapping::Huion => {
            add_buttons(&mut mapping, descriptor, HUION_BUTTONS);
            if descriptor.has_dial {
                add_dial(&mut mapping, wheel, ZOOM_OUT, ZOOM_IN);
            }
        }
        DefaultMapping::Star => {
            // Stylus buttons pass through unchanged until configured
            for button in [KeyCode::BTN_STYLUS, KeyCode::BTN_STYLUS2] {
                mapping.add_stylus_button(button.0, EventType::KEY.0, &[]);
            }
        }
    }

    mapping
}

fn add_buttons(mapping: &mut MappingConfig, descriptor: &DeviceDescriptor, layout: &[&[KeyCode]]) {
    let count = descriptor.button_count as usize;
    for (alias, keys) in PAD_BUTTON_ALIASES.iter().zip(layout).take(count) {
        mapping.add_button(*alias, EventType::KEY.0, &codes(keys));
    }
}

fn add_dial(mapping: &mut MappingConfig, dial: u16, decrement: &[KeyCode], increment: &[KeyCode]) {
    mapping.add_dial(dial, -1, EventType::KEY.0, &codes(decrement));
    mapping.add_dial(dial, 1, EventType::KEY.0, &codes(increment));
}

fn codes(keys: &[KeyCode]) -> Vec<u16> {
    keys.iter().map(|key| key.0).collect()
}
