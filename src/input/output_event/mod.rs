use evdev::{EventType, InputEvent, SynchronizationCode};

/// Linux input event classes the translation engine can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventClass {
    Sync,
    Key,
    Relative,
    Absolute,
}

impl EventClass {
    /// Look up the class for a raw event type (e.g. EV_KEY = 1)
    pub fn from_type(event_type: u16) -> Option<Self> {
        match EventType(event_type) {
            EventType::SYNCHRONIZATION => Some(EventClass::Sync),
            EventType::KEY => Some(EventClass::Key),
            EventType::RELATIVE => Some(EventClass::Relative),
            EventType::ABSOLUTE => Some(EventClass::Absolute),
            _ => None,
        }
    }

    /// Raw event type of this class
    pub fn event_type(&self) -> EventType {
        match self {
            EventClass::Sync => EventType::SYNCHRONIZATION,
            EventClass::Key => EventType::KEY,
            EventClass::Relative => EventType::RELATIVE,
            EventClass::Absolute => EventType::ABSOLUTE,
        }
    }
}

/// A single input event to be written to a virtual device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputEvent {
    pub class: EventClass,
    pub code: u16,
    pub value: i32,
}

impl OutputEvent {
    pub fn new(class: EventClass, code: u16, value: i32) -> Self {
        Self { class, code, value }
    }

    pub fn key(code: u16, value: i32) -> Self {
        Self::new(EventClass::Key, code, value)
    }

    pub fn relative(code: u16, value: i32) -> Self {
        Self::new(EventClass::Relative, code, value)
    }

    pub fn absolute(code: u16, value: i32) -> Self {
        Self::new(EventClass::Absolute, code, value)
    }

    /// Marker ending one atomic update
    pub fn sync() -> Self {
        Self::new(EventClass::Sync, SynchronizationCode::SYN_REPORT.0, 0)
    }

    pub fn is_sync(&self) -> bool {
        self.class == EventClass::Sync
    }

    /// Convert into an evdev [InputEvent]
    pub fn as_input_event(&self) -> InputEvent {
        InputEvent::new(self.class.event_type().0, self.code, self.value)
    }
}

/// Virtual devices created for each physical tablet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetDevice {
    Pen,
    Pad,
    /// Touch pad of tablets that have one
    Pointer,
}

/// Ordered batch of events for one virtual device, always terminated by a
/// sync marker
#[derive(Debug, Clone, PartialEq)]
pub struct OutputFrame {
    pub target: TargetDevice,
    pub events: Vec<OutputEvent>,
}

impl OutputFrame {
    /// Build a frame from the given events, appending the sync marker. Returns
    /// [None] if there is nothing to send.
    pub fn new(target: TargetDevice, mut events: Vec<OutputEvent>) -> Option<Self> {
        if events.is_empty() {
            return None;
        }
        events.push(OutputEvent::sync());
        Some(Self { target, events })
    }

    /// Events without the trailing sync marker
    pub fn payload(&self) -> &[OutputEvent] {
        match self.events.split_last() {
            Some((last, rest)) if last.is_sync() => rest,
            _ => &self.events,
        }
    }
}
