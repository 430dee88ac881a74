use std::collections::HashSet;

use crate::input::{
    output_event::{OutputFrame, TargetDevice},
    session::SessionId,
};

use super::{PadConfig, PenConfig, PointerConfig, SinkError, VirtualDeviceSink};

/// Sink that keeps everything it is given, for inspecting output in tests
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub pens: Vec<(SessionId, PenConfig)>,
    pub pads: Vec<(SessionId, PadConfig)>,
    pub pointers: Vec<(SessionId, PointerConfig)>,
    pub frames: Vec<(SessionId, OutputFrame)>,
    pub destroyed: Vec<SessionId>,
    live: HashSet<(SessionId, TargetDevice)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the session currently has a device of the given type
    pub fn has_device(&self, session: SessionId, target: TargetDevice) -> bool {
        self.live.contains(&(session, target))
    }
}

impl VirtualDeviceSink for RecordingSink {
    fn create_pen(&mut self, session: SessionId, config: &PenConfig) -> Result<(), SinkError> {
        self.pens.push((session, config.clone()));
        self.live.insert((session, TargetDevice::Pen));
        Ok(())
    }

    fn create_pad(&mut self, session: SessionId, config: &PadConfig) -> Result<(), SinkError> {
        self.pads.push((session, config.clone()));
        self.live.insert((session, TargetDevice::Pad));
        Ok(())
    }

    fn create_pointer(
        &mut self,
        session: SessionId,
        config: &PointerConfig,
    ) -> Result<(), SinkError> {
        self.pointers.push((session, config.clone()));
        self.live.insert((session, TargetDevice::Pointer));
        Ok(())
    }

    fn emit(&mut self, session: SessionId, frame: &OutputFrame) -> Result<(), SinkError> {
        if !self.live.contains(&(session, frame.target)) {
            return Err(SinkError::MissingDevice(frame.target, session));
        }
        self.frames.push((session, frame.clone()));
        Ok(())
    }

    fn destroy(&mut self, session: SessionId) -> Result<(), SinkError> {
        self.live.retain(|(id, _)| *id != session);
        self.destroyed.push(session);
        Ok(())
    }
}
