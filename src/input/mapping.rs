use std::collections::{BTreeMap, HashMap};

use crate::{
    config::{DeviceConfig, EventCodes},
    drivers::tablet::state::Edge,
    input::{
        output_event::{EventClass, OutputEvent},
        pressure::PressureCurve,
    },
};

/// One output event of a mapping entry, without its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTemplate {
    pub class: EventClass,
    pub code: u16,
}

impl EventTemplate {
    pub fn new(class: EventClass, code: u16) -> Self {
        Self { class, code }
    }

    fn with_value(&self, value: i32) -> OutputEvent {
        OutputEvent::new(self.class, self.code, value)
    }
}

/// Parse the class → codes table of one mapping entry into an ordered list of
/// templates. Unknown classes are skipped.
fn parse_events(events: &EventCodes) -> Vec<EventTemplate> {
    let mut templates = Vec::new();
    for (class, codes) in events {
        let Some(class) = class.parse::<u16>().ok().and_then(EventClass::from_type) else {
            log::warn!("Ignoring mapping to unknown event class: {class}");
            continue;
        };
        if class == EventClass::Sync {
            log::warn!("Ignoring mapping to sync events");
            continue;
        }
        templates.extend(codes.iter().map(|code| EventTemplate::new(class, *code)));
    }
    templates
}

/// Button table used for pad buttons and stylus buttons. Entries are keyed by
/// the code the button is known by. Buttons without an entry emit a single
/// key event with their own code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ButtonMapping {
    entries: HashMap<u16, Vec<EventTemplate>>,
}

pub type PadMapping = ButtonMapping;
pub type StylusButtonMapping = ButtonMapping;

impl ButtonMapping {
    /// Build the table from its configuration. Entries that map to nothing are
    /// treated as unmapped.
    pub fn from_config(config: &BTreeMap<String, EventCodes>) -> Self {
        let mut entries = HashMap::new();
        for (button, events) in config {
            let Ok(button) = button.parse::<u16>() else {
                log::warn!("Ignoring mapping for invalid button code: {button}");
                continue;
            };
            let templates = parse_events(events);
            if templates.is_empty() {
                continue;
            }
            entries.insert(button, templates);
        }
        Self { entries }
    }

    /// Map a single entry, replacing any existing one
    pub fn set(&mut self, button: u16, events: Vec<EventTemplate>) {
        self.entries.insert(button, events);
    }

    pub fn get(&self, button: u16) -> Option<&[EventTemplate]> {
        self.entries.get(&button).map(|e| e.as_slice())
    }

    pub fn is_mapped(&self, button: u16) -> bool {
        self.entries.contains_key(&button)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the events for a button edge. Presses emit every configured
    /// event with value 1, releases only reset the key events.
    pub fn resolve(&self, button: u16, edge: Edge) -> Vec<OutputEvent> {
        let Some(templates) = self.entries.get(&button) else {
            let value = match edge {
                Edge::Pressed => 1,
                Edge::Released => 0,
            };
            return vec![OutputEvent::key(button, value)];
        };

        match edge {
            Edge::Pressed => templates.iter().map(|t| t.with_value(1)).collect(),
            Edge::Released => templates
                .iter()
                .filter(|t| t.class == EventClass::Key)
                .map(|t| t.with_value(0))
                .collect(),
        }
    }
}

/// Events produced by a single dial step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DialOutput {
    /// Sent first. Keys are pressed, relative axes get the raw delta.
    pub press: Vec<OutputEvent>,
    /// Sent after [DialOutput::press] to release any pressed keys
    pub release: Vec<OutputEvent>,
}

/// Dial table keyed by the dial's relative axis code and step direction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DialMapping {
    entries: HashMap<(u16, i32), Vec<EventTemplate>>,
}

impl DialMapping {
    pub fn from_config(config: &BTreeMap<String, BTreeMap<String, EventCodes>>) -> Self {
        let mut entries = HashMap::new();
        for (dial, directions) in config {
            let Ok(dial) = dial.parse::<u16>() else {
                log::warn!("Ignoring mapping for invalid dial code: {dial}");
                continue;
            };
            for (direction, events) in directions {
                let direction = match direction.parse::<i32>() {
                    Ok(direction @ (-1 | 1)) => direction,
                    _ => {
                        log::warn!("Ignoring mapping for invalid dial direction: {direction}");
                        continue;
                    }
                };
                let templates = parse_events(events);
                if templates.is_empty() {
                    continue;
                }
                entries.insert((dial, direction), templates);
            }
        }
        Self { entries }
    }

    /// Map a single direction of a dial, replacing any existing entry
    pub fn set(&mut self, dial: u16, direction: i32, events: Vec<EventTemplate>) {
        self.entries.insert((dial, direction.signum()), events);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the events for one dial step. Unmapped dials emit the raw delta
    /// on their own axis.
    pub fn resolve(&self, dial: u16, delta: i32) -> DialOutput {
        let Some(templates) = self.entries.get(&(dial, delta.signum())) else {
            return DialOutput {
                press: vec![OutputEvent::relative(dial, delta)],
                release: vec![],
            };
        };

        let press = templates
            .iter()
            .map(|t| match t.class {
                EventClass::Key => t.with_value(1),
                _ => t.with_value(delta),
            })
            .collect();
        let release = templates
            .iter()
            .filter(|t| t.class == EventClass::Key)
            .map(|t| t.with_value(0))
            .collect();

        DialOutput { press, release }
    }
}

/// Everything configurable about one device. Replaced as a whole on reload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingSet {
    pub pad: PadMapping,
    pub dials: DialMapping,
    pub stylus: StylusButtonMapping,
    pub pressure_curve: PressureCurve,
}

impl MappingSet {
    /// Build the mapping set from a device config. A missing mapping leaves
    /// every table empty, so all input passes through unchanged.
    pub fn from_config(config: &DeviceConfig) -> Self {
        let mut set = MappingSet::default();
        if let Some(mapping) = config.mapping.as_ref() {
            set.pad = PadMapping::from_config(&mapping.buttons);
            set.dials = DialMapping::from_config(&mapping.dials);
            set.stylus = StylusButtonMapping::from_config(&mapping.stylus_buttons);
        }
        if let Some(points) = config.pressure_curve.as_ref() {
            set.pressure_curve = PressureCurve::new(points.clone());
        }
        set
    }
}
