use std::error::Error;

use evdev::{EventType, KeyCode, RelativeAxisCode};

use crate::{
    config::{DeviceConfig, DriverConfig, MappingConfig},
    drivers::tablet::state::Edge,
    input::{
        mapping::{DialMapping, EventTemplate, MappingSet, PadMapping},
        output_event::{EventClass, OutputEvent},
        pressure::PressureCurve,
    },
};

#[tokio::test]
async fn test_unmapped_button_uses_identity() -> Result<(), Box<dyn Error>> {
    let mapping = PadMapping::default();
    let code = KeyCode::BTN_4.0;

    let events = mapping.resolve(code, Edge::Pressed);
    assert_eq!(events, vec![OutputEvent::key(code, 1)]);
    let events = mapping.resolve(code, Edge::Released);
    assert_eq!(events, vec![OutputEvent::key(code, 0)]);

    Ok(())
}

#[tokio::test]
async fn test_mapped_button() -> Result<(), Box<dyn Error>> {
    let mut mapping = PadMapping::default();
    mapping.set(
        KeyCode::BTN_0.0,
        vec![
            EventTemplate::new(EventClass::Key, KeyCode::KEY_LEFTCTRL.0),
            EventTemplate::new(EventClass::Relative, RelativeAxisCode::REL_WHEEL.0),
            EventTemplate::new(EventClass::Key, KeyCode::KEY_Z.0),
        ],
    );

    // Press emits everything in table order
    let events = mapping.resolve(KeyCode::BTN_0.0, Edge::Pressed);
    assert_eq!(
        events,
        vec![
            OutputEvent::key(KeyCode::KEY_LEFTCTRL.0, 1),
            OutputEvent::relative(RelativeAxisCode::REL_WHEEL.0, 1),
            OutputEvent::key(KeyCode::KEY_Z.0, 1),
        ]
    );

    // Release only resets the keys
    let events = mapping.resolve(KeyCode::BTN_0.0, Edge::Released);
    assert_eq!(
        events,
        vec![
            OutputEvent::key(KeyCode::KEY_LEFTCTRL.0, 0),
            OutputEvent::key(KeyCode::KEY_Z.0, 0),
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_dial_mapping() -> Result<(), Box<dyn Error>> {
    let wheel = RelativeAxisCode::REL_WHEEL.0;
    let hwheel = RelativeAxisCode::REL_HWHEEL.0;
    let mut mapping = DialMapping::default();
    mapping.set(
        wheel,
        -1,
        vec![
            EventTemplate::new(EventClass::Key, KeyCode::KEY_LEFTCTRL.0),
            EventTemplate::new(EventClass::Key, KeyCode::KEY_MINUS.0),
        ],
    );
    mapping.set(
        wheel,
        1,
        vec![EventTemplate::new(EventClass::Relative, hwheel)],
    );

    let output = mapping.resolve(wheel, -1);
    assert_eq!(
        output.press,
        vec![
            OutputEvent::key(KeyCode::KEY_LEFTCTRL.0, 1),
            OutputEvent::key(KeyCode::KEY_MINUS.0, 1),
        ]
    );
    assert_eq!(
        output.release,
        vec![
            OutputEvent::key(KeyCode::KEY_LEFTCTRL.0, 0),
            OutputEvent::key(KeyCode::KEY_MINUS.0, 0),
        ]
    );

    // Relative outputs carry the delta and are never released
    let output = mapping.resolve(wheel, 1);
    assert_eq!(output.press, vec![OutputEvent::relative(hwheel, 1)]);
    assert!(output.release.is_empty());

    // Unmapped dials scroll their own axis
    let output = mapping.resolve(hwheel, -1);
    assert_eq!(output.press, vec![OutputEvent::relative(hwheel, -1)]);
    assert!(output.release.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_mapping_from_config() -> Result<(), Box<dyn Error>> {
    let config = DriverConfig::from_json(
        r#"{"deviceConfigurations": {"10429": {"2349": {
            "mapping": {
                "buttons": {
                    "256": { "1": [29, 31] },
                    "257": { "1": [] },
                    "bogus": { "1": [30] }
                },
                "dials": {
                    "8": { "1": { "1": [13] }, "2": { "1": [12] } }
                },
                "stylus_buttons": {
                    "331": { "1": [272] },
                    "332": { "1": [] }
                }
            },
            "pressure_curve": [[0, 0], [100, 50]]
        }}}}"#,
    )?;
    let device = config.device(0x28bd, 0x092d).ok_or("device config missing")?;
    let set = MappingSet::from_config(device);

    assert_eq!(set.pad.len(), 1);
    assert_eq!(
        set.pad.get(KeyCode::BTN_0.0),
        Some(
            [
                EventTemplate::new(EventClass::Key, 29),
                EventTemplate::new(EventClass::Key, 31),
            ]
            .as_slice()
        )
    );
    // Empty entries fall back to identity
    assert!(!set.pad.is_mapped(KeyCode::BTN_1.0));

    // Only -1 and 1 are valid directions
    assert_eq!(set.dials.len(), 1);

    assert!(set.stylus.is_mapped(KeyCode::BTN_STYLUS.0));
    assert!(!set.stylus.is_mapped(KeyCode::BTN_STYLUS2.0));
    assert_eq!(
        set.stylus.resolve(KeyCode::BTN_STYLUS2.0, Edge::Pressed),
        vec![OutputEvent::key(KeyCode::BTN_STYLUS2.0, 1)]
    );

    assert_eq!(
        set.pressure_curve,
        PressureCurve::new(vec![(0.0, 0.0), (100.0, 50.0)])
    );

    Ok(())
}

#[tokio::test]
async fn test_missing_mapping() -> Result<(), Box<dyn Error>> {
    let set = MappingSet::from_config(&DeviceConfig::default());
    assert!(set.pad.is_empty());
    assert!(set.dials.is_empty());
    assert!(set.stylus.is_empty());
    assert!(set.pressure_curve.is_identity());

    let mut mapping = MappingConfig::default();
    mapping.add_stylus_button(KeyCode::BTN_STYLUS.0, EventType::KEY.0, &[]);
    let set = MappingSet::from_config(&DeviceConfig {
        mapping: Some(mapping),
        pressure_curve: Some(vec![]),
    });
    assert!(set.stylus.is_empty());
    assert!(set.pressure_curve.is_identity());

    Ok(())
}
