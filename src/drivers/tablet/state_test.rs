use std::error::Error;

use evdev::KeyCode;

use crate::drivers::tablet::{
    event::{DialAxis, DialMotion, DigitizerSample, FrameSample, ProximityTransition, StylusButton},
    state::{Edge, Tool, TranslationState},
};

fn button(position: u8) -> FrameSample {
    FrameSample {
        button: Some(position),
        ..Default::default()
    }
}

fn pen(proximity: ProximityTransition, stylus_button: StylusButton) -> DigitizerSample {
    DigitizerSample {
        proximity,
        stylus_button,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_pad_buttons() -> Result<(), Box<dyn Error>> {
    let mut state = TranslationState::new();
    assert_eq!(state.last_pressed(), None);

    let transitions = state.update_frame(&button(3));
    assert_eq!(transitions.buttons, vec![(3, Edge::Pressed)]);
    assert!(transitions.dials.is_empty());
    assert_eq!(state.last_pressed(), Some(3));

    // Held buttons repeat in every report
    let transitions = state.update_frame(&button(3));
    assert!(transitions.buttons.is_empty());

    // Switching buttons releases the old one first
    let transitions = state.update_frame(&button(5));
    assert_eq!(
        transitions.buttons,
        vec![(3, Edge::Released), (5, Edge::Pressed)]
    );

    let transitions = state.update_frame(&button(0));
    assert_eq!(transitions.buttons, vec![(5, Edge::Released)]);
    assert_eq!(state.last_pressed(), None);

    // Phantom release
    let transitions = state.update_frame(&button(0));
    assert!(transitions.buttons.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_dial_keeps_button_held() -> Result<(), Box<dyn Error>> {
    let mut state = TranslationState::new();
    state.update_frame(&button(2));

    let transitions = state.update_frame(&FrameSample {
        button: Some(0),
        vertical: DialMotion::Step(1),
        horizontal: DialMotion::Step(-1),
    });
    assert_eq!(
        transitions.dials,
        vec![(DialAxis::Vertical, 1), (DialAxis::Horizontal, -1)]
    );
    assert!(transitions.buttons.is_empty());
    assert_eq!(state.last_pressed(), Some(2));

    // Reports without a button field never touch the held button
    let transitions = state.update_frame(&FrameSample {
        button: None,
        vertical: DialMotion::Step(-1),
        horizontal: DialMotion::Idle,
    });
    assert_eq!(transitions.dials, vec![(DialAxis::Vertical, -1)]);
    assert_eq!(state.last_pressed(), Some(2));

    Ok(())
}

#[tokio::test]
async fn test_touch_strip() -> Result<(), Box<dyn Error>> {
    let mut state = TranslationState::new();

    let steps: Vec<Option<i32>> = [0, 10, 12, 12, 9]
        .into_iter()
        .map(|position| state.update_strip(DialAxis::Vertical, position))
        .collect();
    assert_eq!(steps, vec![None, None, Some(1), None, Some(-1)]);

    // Axes keep separate baselines
    assert_eq!(state.update_strip(DialAxis::Horizontal, 4), None);
    assert_eq!(state.update_strip(DialAxis::Vertical, 11), Some(1));

    // Lifting the finger drops the baseline
    assert_eq!(state.update_strip(DialAxis::Vertical, 0), None);
    assert_eq!(state.update_strip(DialAxis::Vertical, 3), None);
    assert_eq!(state.update_strip(DialAxis::Vertical, 2), Some(-1));

    let transitions = state.update_frame(&FrameSample {
        button: None,
        vertical: DialMotion::Absolute(5),
        horizontal: DialMotion::Idle,
    });
    assert_eq!(transitions.dials, vec![(DialAxis::Vertical, 1)]);

    Ok(())
}

#[tokio::test]
async fn test_proximity() -> Result<(), Box<dyn Error>> {
    let mut state = TranslationState::new();

    let transitions = state.update_pen(&pen(ProximityTransition::Entered, StylusButton::None));
    assert_eq!(transitions.tools, vec![(Tool::Pen, true)]);
    assert!(transitions.report_pressure);
    assert!(!transitions.force_zero_pressure);
    assert!(state.pen_in_proximity());

    let transitions = state.update_pen(&pen(ProximityTransition::Entered, StylusButton::None));
    assert!(transitions.tools.is_empty());

    let transitions =
        state.update_pen(&pen(ProximityTransition::EraserEntered, StylusButton::None));
    assert_eq!(
        transitions.tools,
        vec![(Tool::Pen, false), (Tool::Eraser, true)]
    );
    assert!(!state.pen_in_proximity());
    assert!(state.eraser_in_proximity());

    let transitions = state.update_pen(&pen(ProximityTransition::Left, StylusButton::None));
    assert_eq!(transitions.tools, vec![(Tool::Eraser, false)]);
    assert!(transitions.force_zero_pressure);
    assert!(transitions.report_pressure);

    // Nothing left to remove
    let transitions = state.update_pen(&pen(ProximityTransition::Left, StylusButton::None));
    assert!(transitions.tools.is_empty());
    assert!(!transitions.force_zero_pressure);
    assert!(!transitions.report_pressure);

    // Hovering without range changes reports no pressure
    let transitions = state.update_pen(&pen(ProximityTransition::None, StylusButton::None));
    assert!(!transitions.report_pressure);
    let transitions = state.update_pen(&DigitizerSample {
        tip_contact: true,
        ..Default::default()
    });
    assert!(transitions.report_pressure);

    Ok(())
}

#[tokio::test]
async fn test_stylus_button_latch() -> Result<(), Box<dyn Error>> {
    let mut state = TranslationState::new();
    let stylus = KeyCode::BTN_STYLUS.0;
    let stylus2 = KeyCode::BTN_STYLUS2.0;

    let transitions = state.update_pen(&pen(ProximityTransition::Entered, StylusButton::Primary));
    assert_eq!(transitions.buttons, vec![(stylus, Edge::Pressed)]);
    assert_eq!(state.latched_stylus_button(), stylus);

    let transitions = state.update_pen(&pen(ProximityTransition::None, StylusButton::Primary));
    assert!(transitions.buttons.is_empty());

    let transitions = state.update_pen(&pen(ProximityTransition::None, StylusButton::Secondary));
    assert_eq!(
        transitions.buttons,
        vec![(stylus, Edge::Released), (stylus2, Edge::Pressed)]
    );

    let transitions = state.update_pen(&pen(ProximityTransition::None, StylusButton::None));
    assert_eq!(transitions.buttons, vec![(stylus2, Edge::Released)]);
    assert_eq!(state.latched_stylus_button(), 0);

    // Leaving proximity releases a held button even if the report still has it
    state.update_pen(&pen(ProximityTransition::None, StylusButton::Primary));
    let transitions = state.update_pen(&pen(ProximityTransition::Left, StylusButton::Primary));
    assert_eq!(transitions.tools, vec![(Tool::Pen, false)]);
    assert_eq!(transitions.buttons, vec![(stylus, Edge::Released)]);
    assert_eq!(state.latched_stylus_button(), 0);

    Ok(())
}

#[tokio::test]
async fn test_tool_codes() -> Result<(), Box<dyn Error>> {
    assert_eq!(Tool::Pen.code(), KeyCode::BTN_TOOL_PEN.0);
    assert_eq!(Tool::Eraser.code(), KeyCode::BTN_TOOL_RUBBER.0);
    Ok(())
}

#[tokio::test]
async fn test_tap_edges() -> Result<(), Box<dyn Error>> {
    let mut state = TranslationState::new();

    assert_eq!(state.update_tap(false), None);
    assert_eq!(state.update_tap(true), Some(Edge::Pressed));
    assert_eq!(state.update_tap(true), None);
    assert_eq!(state.update_tap(false), Some(Edge::Released));
    assert_eq!(state.update_tap(false), None);

    Ok(())
}
