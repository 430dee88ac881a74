use std::{collections::HashMap, os::fd::AsRawFd};

use evdev::{
    uinput::{VirtualDevice, VirtualDeviceBuilder},
    AbsInfo, AbsoluteAxisCode, AttributeSet, BusType, InputEvent, InputId, KeyCode, PropType,
    RelativeAxisCode, UinputAbsSetup,
};
use nix::fcntl::{FcntlArg, OFlag};

use crate::{
    drivers::tablet::descriptor::MAX_TILT,
    input::{
        output_event::{OutputFrame, TargetDevice},
        session::SessionId,
    },
};

use super::{PadConfig, PenConfig, PointerConfig, SinkError, VirtualDeviceSink};

/// Highest keyboard key exposed on the pad (KEY_MICMUTE)
const LAST_KEYBOARD_KEY: u16 = 248;

/// Sink that creates real input devices through /dev/uinput
#[derive(Default)]
pub struct UinputSink {
    devices: HashMap<(SessionId, TargetDevice), VirtualDevice>,
}

impl UinputSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the virtual pen
    fn create_pen_device(config: &PenConfig) -> Result<VirtualDevice, SinkError> {
        // Setup Key inputs
        let keys = AttributeSet::<KeyCode>::from_iter([
            KeyCode::BTN_LEFT,
            KeyCode::BTN_RIGHT,
            KeyCode::BTN_MIDDLE,
            KeyCode::BTN_SIDE,
            KeyCode::BTN_EXTRA,
            KeyCode::BTN_TOOL_PEN,
            KeyCode::BTN_TOOL_RUBBER,
            KeyCode::BTN_TOOL_BRUSH,
            KeyCode::BTN_TOOL_PENCIL,
            KeyCode::BTN_TOOL_AIRBRUSH,
            KeyCode::BTN_TOOL_MOUSE,
            KeyCode::BTN_TOOL_LENS,
            KeyCode::BTN_TOUCH,
            KeyCode::BTN_STYLUS,
            KeyCode::BTN_STYLUS2,
        ]);

        // Setup ABS inputs
        let resolution = config.resolution as i32;
        let abs_x = UinputAbsSetup::new(
            AbsoluteAxisCode::ABS_X,
            AbsInfo::new(0, 0, config.max_x as i32, 0, 0, resolution),
        );
        let abs_y = UinputAbsSetup::new(
            AbsoluteAxisCode::ABS_Y,
            AbsInfo::new(0, 0, config.max_y as i32, 0, 0, resolution),
        );
        let abs_pressure = UinputAbsSetup::new(
            AbsoluteAxisCode::ABS_PRESSURE,
            AbsInfo::new(0, 0, config.max_pressure as i32, 0, 0, 0),
        );
        let tilt_setup = AbsInfo::new(0, -MAX_TILT, MAX_TILT, 0, 0, 0);
        let abs_tilt_x = UinputAbsSetup::new(AbsoluteAxisCode::ABS_TILT_X, tilt_setup);
        let abs_tilt_y = UinputAbsSetup::new(AbsoluteAxisCode::ABS_TILT_Y, tilt_setup);

        // Setup properties
        let mut properties = AttributeSet::<PropType>::new();
        properties.insert(PropType::POINTER);

        let id = InputId::new(BusType(3), config.vendor_id, config.product_id, 1);

        // Build the device
        let device = VirtualDeviceBuilder::new()?
            .name(config.name.as_str())
            .input_id(id)
            .with_properties(&properties)?
            .with_keys(&keys)?
            .with_absolute_axis(&abs_x)?
            .with_absolute_axis(&abs_y)?
            .with_absolute_axis(&abs_pressure)?
            .with_absolute_axis(&abs_tilt_x)?
            .with_absolute_axis(&abs_tilt_y)?
            .build()?;

        set_nonblocking(&device)?;
        Ok(device)
    }

    /// Create the virtual pad. Every keyboard key is enabled so buttons can be
    /// mapped to shortcuts.
    fn create_pad_device(config: &PadConfig) -> Result<VirtualDevice, SinkError> {
        let mut keys = AttributeSet::<KeyCode>::new();
        for code in config.buttons.iter() {
            keys.insert(KeyCode::new(*code));
        }
        for code in 1..=LAST_KEYBOARD_KEY {
            keys.insert(KeyCode::new(code));
        }

        let mut axes = AttributeSet::<RelativeAxisCode>::new();
        axes.insert(RelativeAxisCode::REL_X);
        axes.insert(RelativeAxisCode::REL_Y);
        if config.has_wheel {
            axes.insert(RelativeAxisCode::REL_WHEEL);
        }
        if config.has_hwheel {
            axes.insert(RelativeAxisCode::REL_HWHEEL);
        }

        let id = InputId::new(BusType(3), config.vendor_id, config.product_id, 1);

        let device = VirtualDeviceBuilder::new()?
            .name(config.name.as_str())
            .input_id(id)
            .with_keys(&keys)?
            .with_relative_axes(&axes)?
            .build()?;

        set_nonblocking(&device)?;
        Ok(device)
    }

    /// Create the virtual pointer for a touch pad
    fn create_pointer_device(config: &PointerConfig) -> Result<VirtualDevice, SinkError> {
        let keys = AttributeSet::<KeyCode>::from_iter([KeyCode::BTN_LEFT]);
        let axes = AttributeSet::<RelativeAxisCode>::from_iter([
            RelativeAxisCode::REL_X,
            RelativeAxisCode::REL_Y,
            RelativeAxisCode::REL_WHEEL,
        ]);

        let id = InputId::new(BusType(3), config.vendor_id, config.product_id, 1);

        let device = VirtualDeviceBuilder::new()?
            .name(config.name.as_str())
            .input_id(id)
            .with_keys(&keys)?
            .with_relative_axes(&axes)?
            .build()?;

        set_nonblocking(&device)?;
        Ok(device)
    }
}

/// Set the device to do non-blocking writes
fn set_nonblocking(device: &VirtualDevice) -> Result<(), SinkError> {
    let raw_fd = device.as_raw_fd();
    nix::fcntl::fcntl(raw_fd, FcntlArg::F_SETFL(OFlag::O_NONBLOCK))?;
    Ok(())
}

impl VirtualDeviceSink for UinputSink {
    fn create_pen(&mut self, session: SessionId, config: &PenConfig) -> Result<(), SinkError> {
        log::debug!("Creating virtual pen '{}' for session {session}", config.name);
        let device = UinputSink::create_pen_device(config)?;
        self.devices.insert((session, TargetDevice::Pen), device);
        Ok(())
    }

    fn create_pad(&mut self, session: SessionId, config: &PadConfig) -> Result<(), SinkError> {
        log::debug!("Creating virtual pad '{}' for session {session}", config.name);
        let device = UinputSink::create_pad_device(config)?;
        self.devices.insert((session, TargetDevice::Pad), device);
        Ok(())
    }

    fn create_pointer(
        &mut self,
        session: SessionId,
        config: &PointerConfig,
    ) -> Result<(), SinkError> {
        log::debug!("Creating virtual pointer '{}' for session {session}", config.name);
        let device = UinputSink::create_pointer_device(config)?;
        self.devices.insert((session, TargetDevice::Pointer), device);
        Ok(())
    }

    fn emit(&mut self, session: SessionId, frame: &OutputFrame) -> Result<(), SinkError> {
        let Some(device) = self.devices.get_mut(&(session, frame.target)) else {
            return Err(SinkError::MissingDevice(frame.target, session));
        };
        let events: Vec<InputEvent> = frame
            .payload()
            .iter()
            .map(|event| event.as_input_event())
            .collect();
        log::trace!("Emitting to {:?}: {events:?}", frame.target);

        // emit() terminates the batch with SYN_REPORT
        device.emit(events.as_slice())?;
        Ok(())
    }

    fn destroy(&mut self, session: SessionId) -> Result<(), SinkError> {
        // Dropping a virtual device removes it
        for target in [TargetDevice::Pen, TargetDevice::Pad, TargetDevice::Pointer] {
            if self.devices.remove(&(session, target)).is_some() {
                log::debug!("Destroyed virtual {target:?} for session {session}");
            }
        }
        Ok(())
    }
}
