use std::{
    fmt::Display,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use evdev::{AbsoluteAxisCode, KeyCode, RelativeAxisCode};

use crate::{
    drivers::tablet::{
        decoder,
        descriptor::DeviceDescriptor,
        event::{DialAxis, DigitizerSample, FrameSample, PointerSample},
        state::{Edge, TranslationState},
    },
    input::{
        mapping::MappingSet,
        output_event::{OutputEvent, OutputFrame, TargetDevice},
        sink::{PadConfig, PenConfig, PointerConfig, SinkError, VirtualDeviceSink},
    },
};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier of one attached physical device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Allocate a new unique id
    pub fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State that only exists while a device is attached
#[derive(Debug)]
struct Attached {
    descriptor: DeviceDescriptor,
    state: TranslationState,
}

/// Translates the raw reports of one physical tablet into virtual device
/// events.
///
/// A session is created detached. [TranslationSession::on_attach] creates the
/// virtual devices and the translation state, after which every report passed
/// to [TranslationSession::on_report] yields the ordered frames to emit.
/// Reports received while detached are dropped.
#[derive(Debug)]
pub struct TranslationSession {
    id: SessionId,
    attached: Option<Attached>,
    mappings: Arc<MappingSet>,
}

impl TranslationSession {
    pub fn new(mappings: Arc<MappingSet>) -> Self {
        Self {
            id: SessionId::next(),
            attached: None,
            mappings,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    /// Translation state of the attached device
    pub fn state(&self) -> Option<&TranslationState> {
        self.attached.as_ref().map(|a| &a.state)
    }

    /// Start translating for the given device and create its virtual devices
    pub fn on_attach(
        &mut self,
        descriptor: DeviceDescriptor,
        sink: &mut dyn VirtualDeviceSink,
    ) -> Result<(), SinkError> {
        if self.attached.is_some() {
            log::warn!("Session {} is already attached. Re-attaching.", self.id);
            self.on_detach(sink);
        }

        log::info!(
            "Attaching {} ({:04x}:{:04x}) as session {}",
            descriptor.name,
            descriptor.vendor_id,
            descriptor.product_id,
            self.id
        );
        log::debug!("Using limits: {:?}", descriptor.limits);

        let result = self.create_devices(&descriptor, sink);
        if let Err(e) = result {
            // Do not leave half of the devices behind
            if let Err(e) = sink.destroy(self.id) {
                log::warn!("Failed to clean up devices for session {}: {e}", self.id);
            }
            return Err(e);
        }

        self.attached = Some(Attached {
            descriptor,
            state: TranslationState::new(),
        });

        Ok(())
    }

    fn create_devices(
        &self,
        descriptor: &DeviceDescriptor,
        sink: &mut dyn VirtualDeviceSink,
    ) -> Result<(), SinkError> {
        if descriptor.is_pointer() {
            sink.create_pointer(self.id, &PointerConfig::from_descriptor(descriptor))?;
            return Ok(());
        }
        if descriptor.has_pen {
            sink.create_pen(self.id, &PenConfig::from_descriptor(descriptor))?;
        }
        // Mapped stylus buttons are sent through the pad, so every device
        // gets one.
        sink.create_pad(self.id, &PadConfig::from_descriptor(descriptor))?;
        Ok(())
    }

    /// Stop translating and remove the virtual devices. Detaching a session
    /// that is not attached does nothing.
    pub fn on_detach(&mut self, sink: &mut dyn VirtualDeviceSink) {
        let Some(attached) = self.attached.take() else {
            log::debug!("Session {} is not attached", self.id);
            return;
        };
        log::info!("Detaching {} (session {})", attached.descriptor.name, self.id);
        if let Err(e) = sink.destroy(self.id) {
            log::warn!("Failed to destroy devices for session {}: {e}", self.id);
        }
    }

    /// Replace the mapping set used for all following reports
    pub fn reload(&mut self, mappings: Arc<MappingSet>) {
        log::debug!("Reloading mappings for session {}", self.id);
        self.mappings = mappings;
    }

    /// Translate one raw report into the frames that should be emitted, in
    /// order. Malformed reports produce nothing.
    pub fn on_report(&mut self, report: &[u8]) -> Vec<OutputFrame> {
        let Some(attached) = self.attached.as_mut() else {
            log::debug!("Dropping report for detached session {}", self.id);
            return vec![];
        };

        let decoded = match decoder::decode(report, &attached.descriptor) {
            Ok(decoded) => decoded,
            Err(e) => {
                log::debug!("Unable to decode report {report:02x?}: {e}");
                return vec![];
            }
        };
        if decoded.is_empty() {
            log::trace!("No events in report {report:02x?}");
            return vec![];
        }

        // Hold on to one mapping set for the whole report
        let mappings = self.mappings.clone();
        let mut frames = Vec::new();
        if let Some(sample) = decoded.digitizer.as_ref() {
            pen_frames(attached, &mappings, sample, &mut frames);
        }
        if let Some(sample) = decoded.frame.as_ref() {
            pad_frames(attached, &mappings, sample, &mut frames);
        }
        if let Some(sample) = decoded.pointer.as_ref() {
            pointer_frames(attached, sample, &mut frames);
        }

        frames
    }

    /// Translate a report and write the result to the sink
    pub fn deliver(&mut self, report: &[u8], sink: &mut dyn VirtualDeviceSink) {
        for frame in self.on_report(report) {
            if let Err(e) = sink.emit(self.id, &frame) {
                log::warn!("Failed to emit events for session {}: {e}", self.id);
            }
        }
    }
}

/// Build the frames for a digitizer sample. The pen frame carries tool
/// changes, unmapped stylus buttons and the axes. Mapped stylus buttons go to
/// the pad.
fn pen_frames(
    attached: &mut Attached,
    mappings: &MappingSet,
    sample: &DigitizerSample,
    frames: &mut Vec<OutputFrame>,
) {
    let transitions = attached.state.update_pen(sample);
    let descriptor = &attached.descriptor;

    let mut pen_events = Vec::new();
    let mut pad_events = Vec::new();
    for (tool, present) in transitions.tools.iter() {
        pen_events.push(OutputEvent::key(tool.code(), *present as i32));
    }
    for (code, edge) in transitions.buttons.iter() {
        let events = mappings.stylus.resolve(*code, *edge);
        if mappings.stylus.is_mapped(*code) {
            pad_events.extend(events);
        } else {
            pen_events.extend(events);
        }
    }

    pen_events.push(OutputEvent::absolute(
        AbsoluteAxisCode::ABS_X.0,
        sample.x as i32,
    ));
    pen_events.push(OutputEvent::absolute(
        AbsoluteAxisCode::ABS_Y.0,
        sample.y as i32,
    ));
    if transitions.report_pressure {
        let pressure = if transitions.force_zero_pressure {
            0
        } else {
            let raw = (sample.pressure as i32 + descriptor.pressure_offset).max(0) as u32;
            mappings
                .pressure_curve
                .apply(raw, descriptor.limits.max_pressure)
        };
        pen_events.push(OutputEvent::absolute(
            AbsoluteAxisCode::ABS_PRESSURE.0,
            pressure.min(i32::MAX as u32) as i32,
        ));
    }
    pen_events.push(OutputEvent::absolute(
        AbsoluteAxisCode::ABS_TILT_X.0,
        sample.tilt_x as i32,
    ));
    pen_events.push(OutputEvent::absolute(
        AbsoluteAxisCode::ABS_TILT_Y.0,
        sample.tilt_y as i32,
    ));

    if descriptor.has_pen {
        frames.extend(OutputFrame::new(TargetDevice::Pen, pen_events));
    }
    frames.extend(OutputFrame::new(TargetDevice::Pad, pad_events));
}

/// Build the frames for a pad sample. Each dial step is sent as its own
/// press frame followed by a release frame, before any button changes.
fn pad_frames(
    attached: &mut Attached,
    mappings: &MappingSet,
    sample: &FrameSample,
    frames: &mut Vec<OutputFrame>,
) {
    let transitions = attached.state.update_frame(sample);
    let descriptor = &attached.descriptor;

    for (axis, delta) in transitions.dials.iter() {
        let code = match axis {
            DialAxis::Vertical => RelativeAxisCode::REL_WHEEL.0,
            DialAxis::Horizontal => RelativeAxisCode::REL_HWHEEL.0,
        };
        let output = mappings.dials.resolve(code, *delta);
        frames.extend(OutputFrame::new(TargetDevice::Pad, output.press));
        frames.extend(OutputFrame::new(TargetDevice::Pad, output.release));
    }

    let mut events = Vec::new();
    for (position, edge) in transitions.buttons.iter() {
        let Some(alias) = descriptor.button_alias(*position) else {
            log::debug!("Ignoring out of range pad button {position}");
            continue;
        };
        events.extend(mappings.pad.resolve(alias, *edge));
    }
    frames.extend(OutputFrame::new(TargetDevice::Pad, events));
}

/// Build the frame for a touch pad sample. The pointer is not remapped.
fn pointer_frames(attached: &mut Attached, sample: &PointerSample, frames: &mut Vec<OutputFrame>) {
    let mut events = Vec::new();
    if sample.dx != 0 || sample.dy != 0 {
        events.push(OutputEvent::relative(RelativeAxisCode::REL_X.0, sample.dx));
        events.push(OutputEvent::relative(RelativeAxisCode::REL_Y.0, sample.dy));
    }
    // Taps click
    if let Some(edge) = attached.state.update_tap(sample.tap) {
        events.push(OutputEvent::key(
            KeyCode::BTN_LEFT.0,
            (edge == Edge::Pressed) as i32,
        ));
    }
    if sample.wheel != 0 {
        events.push(OutputEvent::relative(
            RelativeAxisCode::REL_WHEEL.0,
            sample.wheel as i32,
        ));
    }
    frames.extend(OutputFrame::new(TargetDevice::Pointer, events));
}
