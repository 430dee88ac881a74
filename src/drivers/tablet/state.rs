use evdev::KeyCode;

use super::event::{
    DialAxis, DialMotion, DigitizerSample, FrameSample, ProximityTransition, StylusButton,
};

/// Value used for "nothing latched" and "no baseline" in [TranslationState]
const NONE: i32 = -1;

/// Tools a stylus can bring into proximity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    Pen,
    Eraser,
}

impl Tool {
    /// Key code announcing this tool to userspace
    pub fn code(&self) -> u16 {
        match self {
            Tool::Pen => KeyCode::BTN_TOOL_PEN.0,
            Tool::Eraser => KeyCode::BTN_TOOL_RUBBER.0,
        }
    }
}

/// Edge of a binary input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Pressed,
    Released,
}

/// Discrete changes derived from one digitizer sample
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PenTransitions {
    /// Tools leaving and entering proximity, in emission order
    pub tools: Vec<(Tool, bool)>,
    /// Stylus button codes changing state, in emission order
    pub buttons: Vec<(u16, Edge)>,
    /// Whether pressure should be reported for this sample
    pub report_pressure: bool,
    /// The tool left proximity, so pressure must read 0
    pub force_zero_pressure: bool,
}

/// Discrete changes derived from one frame sample
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameTransitions {
    /// Single step dial rotations
    pub dials: Vec<(DialAxis, i32)>,
    /// Pad button positions changing state, in emission order
    pub buttons: Vec<(u8, Edge)>,
}

/// Mutable per-device state used to turn raw samples into edges. Created when
/// a device attaches and dropped when it detaches.
#[derive(Clone, Debug, PartialEq)]
pub struct TranslationState {
    /// Position of the pad button that is currently held, or -1
    last_pressed: i32,
    /// Last absolute touch strip reading per axis, or -1 for no baseline
    last_strip: [i32; 2],
    pen_in_proximity: bool,
    eraser_in_proximity: bool,
    /// Code of the stylus button currently held, or 0
    latched_stylus_button: u16,
    /// Touch pad tap held as the left button
    tapping: bool,
}

impl Default for TranslationState {
    fn default() -> Self {
        Self {
            last_pressed: NONE,
            last_strip: [NONE; 2],
            pen_in_proximity: false,
            eraser_in_proximity: false,
            latched_stylus_button: 0,
            tapping: false,
        }
    }
}

impl TranslationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position of the held pad button, if any
    pub fn last_pressed(&self) -> Option<u8> {
        (self.last_pressed > 0).then_some(self.last_pressed as u8)
    }

    pub fn pen_in_proximity(&self) -> bool {
        self.pen_in_proximity
    }

    pub fn eraser_in_proximity(&self) -> bool {
        self.eraser_in_proximity
    }

    /// Code of the held stylus button, or 0
    pub fn latched_stylus_button(&self) -> u16 {
        self.latched_stylus_button
    }

    /// Refine a digitizer sample into tool and stylus button transitions
    pub fn update_pen(&mut self, sample: &DigitizerSample) -> PenTransitions {
        let mut transitions = PenTransitions::default();

        let mut left = false;
        match sample.proximity {
            ProximityTransition::Entered => self.enter(Tool::Pen, &mut transitions),
            ProximityTransition::EraserEntered => self.enter(Tool::Eraser, &mut transitions),
            ProximityTransition::Left | ProximityTransition::EraserLeft => {
                left = self.leave(&mut transitions);
            }
            ProximityTransition::None => (),
        }

        // Leaving proximity releases whatever was held
        let wanted = if left {
            0
        } else {
            match sample.stylus_button {
                StylusButton::Primary => KeyCode::BTN_STYLUS.0,
                StylusButton::Secondary => KeyCode::BTN_STYLUS2.0,
                StylusButton::None => 0,
            }
        };
        if wanted != self.latched_stylus_button {
            if self.latched_stylus_button != 0 {
                transitions
                    .buttons
                    .push((self.latched_stylus_button, Edge::Released));
            }
            if wanted != 0 {
                transitions.buttons.push((wanted, Edge::Pressed));
            }
            self.latched_stylus_button = wanted;
        }

        let in_range = matches!(
            sample.proximity,
            ProximityTransition::Entered | ProximityTransition::EraserEntered
        );
        transitions.force_zero_pressure = left;
        transitions.report_pressure = left || sample.tip_contact || in_range;

        transitions
    }

    /// Bring a tool into proximity. Re-asserting the current tool does nothing.
    fn enter(&mut self, tool: Tool, transitions: &mut PenTransitions) {
        match tool {
            Tool::Pen => {
                if self.pen_in_proximity {
                    return;
                }
                if self.eraser_in_proximity {
                    self.eraser_in_proximity = false;
                    transitions.tools.push((Tool::Eraser, false));
                }
                self.pen_in_proximity = true;
                transitions.tools.push((Tool::Pen, true));
            }
            Tool::Eraser => {
                if self.eraser_in_proximity {
                    return;
                }
                if self.pen_in_proximity {
                    self.pen_in_proximity = false;
                    transitions.tools.push((Tool::Pen, false));
                }
                self.eraser_in_proximity = true;
                transitions.tools.push((Tool::Eraser, true));
            }
        }
    }

    /// Remove whatever tool is in proximity. Returns false if nothing was.
    fn leave(&mut self, transitions: &mut PenTransitions) -> bool {
        let mut left = false;
        if self.pen_in_proximity {
            self.pen_in_proximity = false;
            transitions.tools.push((Tool::Pen, false));
            left = true;
        }
        if self.eraser_in_proximity {
            self.eraser_in_proximity = false;
            transitions.tools.push((Tool::Eraser, false));
            left = true;
        }
        left
    }

    /// Turn the tap flag of a pointer report into a button edge
    pub fn update_tap(&mut self, tap: bool) -> Option<Edge> {
        if tap == self.tapping {
            return None;
        }
        self.tapping = tap;
        Some(if tap { Edge::Pressed } else { Edge::Released })
    }

    /// Refine a frame sample into dial steps and pad button edges
    pub fn update_frame(&mut self, sample: &FrameSample) -> FrameTransitions {
        let mut transitions = FrameTransitions::default();

        for (axis, motion) in [
            (DialAxis::Vertical, sample.vertical),
            (DialAxis::Horizontal, sample.horizontal),
        ] {
            let step = match motion {
                DialMotion::Idle => None,
                DialMotion::Step(delta) => Some(delta as i32),
                DialMotion::Absolute(position) => self.update_strip(axis, position),
            };
            if let Some(delta) = step {
                transitions.dials.push((axis, delta));
            }
        }

        let Some(position) = sample.button else {
            return transitions;
        };

        if position != 0 {
            if self.last_pressed == position as i32 {
                // Still held
                return transitions;
            }
            if self.last_pressed > 0 {
                transitions
                    .buttons
                    .push((self.last_pressed as u8, Edge::Released));
            }
            transitions.buttons.push((position, Edge::Pressed));
            self.last_pressed = position as i32;
        } else if transitions.dials.is_empty() {
            if self.last_pressed > 0 {
                transitions
                    .buttons
                    .push((self.last_pressed as u8, Edge::Released));
                self.last_pressed = NONE;
            } else {
                log::debug!("Got a phantom button up event");
            }
        }

        transitions
    }

    /// Diff an absolute touch strip reading against the last one. Returns the
    /// direction of movement, if there was any.
    pub fn update_strip(&mut self, axis: DialAxis, position: u8) -> Option<i32> {
        let index = match axis {
            DialAxis::Vertical => 0,
            DialAxis::Horizontal => 1,
        };
        let position = position as i32;

        // Finger lifted
        if position == 0 {
            self.last_strip[index] = NONE;
            return None;
        }

        let last = self.last_strip[index];
        self.last_strip[index] = position;
        if last == NONE {
            return None;
        }

        match position.cmp(&last) {
            std::cmp::Ordering::Greater => Some(1),
            std::cmp::Ordering::Less => Some(-1),
            std::cmp::Ordering::Equal => None,
        }
    }
}
