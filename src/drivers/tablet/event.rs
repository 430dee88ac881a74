/// Samples that can be decoded from a single tablet report
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedReport {
    pub digitizer: Option<DigitizerSample>,
    pub frame: Option<FrameSample>,
    pub pointer: Option<PointerSample>,
}

impl DecodedReport {
    /// Returns true if the report carried nothing we understand
    pub fn is_empty(&self) -> bool {
        self.digitizer.is_none() && self.frame.is_none() && self.pointer.is_none()
    }
}

/// Stylus state decoded from one digitizer report
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DigitizerSample {
    pub x: u32,
    pub y: u32,
    /// Raw pressure before any offset or curve is applied
    pub pressure: u16,
    pub tilt_x: i8,
    pub tilt_y: i8,
    pub tip_contact: bool,
    pub stylus_button: StylusButton,
    pub proximity: ProximityTransition,
}

/// Barrel buttons on the stylus. Only one is ever reported at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StylusButton {
    #[default]
    None,
    Primary,
    Secondary,
}

/// Proximity changes asserted by a digitizer report
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProximityTransition {
    #[default]
    None,
    Entered,
    Left,
    EraserEntered,
    EraserLeft,
}

/// Pad state decoded from one frame report
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameSample {
    /// 1-based position of the asserted pad button, 0 when none is asserted.
    /// [None] when the report does not carry a button field at all.
    pub button: Option<u8>,
    pub vertical: DialMotion,
    pub horizontal: DialMotion,
}

/// Movement reported by a dial or touch strip
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DialMotion {
    #[default]
    Idle,
    /// Relative pulse in the given direction (-1 or +1)
    Step(i8),
    /// Absolute touch strip position that must be diffed against the last one
    Absolute(u8),
}

/// Dial axes on a tablet pad
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DialAxis {
    Vertical,
    Horizontal,
}

/// Touch pad state decoded from one pointer report
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointerSample {
    pub dx: i32,
    pub dy: i32,
    /// A finger is tapping the pad
    pub tap: bool,
    pub wheel: i8,
}
