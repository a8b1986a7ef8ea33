//! Hardware abstraction seams
//!
//! One trait per external collaborator (raw axis source, key/axis event
//! sink, wrapping millisecond clock, active-layer query) with one
//! evdev-backed production implementation each. Tests substitute in-memory
//! implementations.

use crate::types::{Coordinate, Layer};
use evdev::{
    uinput::{VirtualDevice, VirtualDeviceBuilder},
    AbsInfo, AbsoluteAxisType, AttributeSet, Device, EventType, InputEvent, Key, UinputAbsSetup,
};
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;

/// Errors from the physical axis source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to open input device: {0}")]
    Open(#[source] std::io::Error),

    #[error("No input device matching \"{0}\" found")]
    NotFound(String),

    #[error("Device lacks the required absolute axes")]
    MissingAxes,

    #[error("Failed to read axis state: {0}")]
    Read(#[source] std::io::Error),
}

/// Errors from the virtual output device.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to create virtual device: {0}")]
    CreateDevice(#[source] std::io::Error),

    #[error("Failed to emit event: {0}")]
    EmitEvent(#[source] std::io::Error),
}

/// The two analog channels of the stick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StickAxis {
    X,
    Y,
}

impl StickAxis {
    fn code(self) -> AbsoluteAxisType {
        match self {
            StickAxis::X => AbsoluteAxisType::ABS_X,
            StickAxis::Y => AbsoluteAxisType::ABS_Y,
        }
    }

    fn slot(self) -> usize {
        match self {
            StickAxis::X => 0,
            StickAxis::Y => 1,
        }
    }
}

/// Raw analog channel reads, one per axis per tick.
pub trait AxisSource {
    fn read_axis(&mut self, axis: StickAxis) -> Result<i32, SourceError>;

    /// Both channels of one tick.
    fn read_pair(&mut self) -> Result<Coordinate, SourceError> {
        Ok(Coordinate::new(
            self.read_axis(StickAxis::X)?,
            self.read_axis(StickAxis::Y)?,
        ))
    }
}

/// Fire-and-forget key and analog-axis event sink. The host tracks actual
/// key state; the pipeline never queries it back.
pub trait EventSink {
    fn register_key(&mut self, key: Key) -> Result<(), SinkError>;
    fn unregister_key(&mut self, key: Key) -> Result<(), SinkError>;
    fn set_axis(&mut self, axis: StickAxis, value: i32) -> Result<(), SinkError>;
}

/// Wrapping monotonic millisecond timer. Elapsed-time comparisons against it
/// must use wrapping subtraction.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

/// Reports which high-level keymap layer is active.
pub trait LayerQuery {
    fn current_layer(&self) -> Layer;
}

/// Always-base layer provider for standalone operation.
#[derive(Debug, Default)]
pub struct BaseLayer;

impl LayerQuery for BaseLayer {
    fn current_layer(&self) -> Layer {
        Layer::Base
    }
}

/// `Instant`-backed clock; the u32 truncation wraps about every 49 days.
#[derive(Debug)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }
}

/// Physical stick read from an evdev input device's cached absolute state.
pub struct EvdevAxisSource {
    device: Device,
}

impl EvdevAxisSource {
    /// Open by explicit `/dev/input/...` path, or scan for the first device
    /// whose name contains `selector`.
    pub fn open(selector: &str) -> Result<Self, SourceError> {
        if selector.starts_with("/dev/") {
            let device = Device::open(selector).map_err(SourceError::Open)?;
            return Self::from_device(device);
        }
        for (_, device) in evdev::enumerate() {
            if device.name().is_some_and(|name| name.contains(selector)) {
                return Self::from_device(device);
            }
        }
        Err(SourceError::NotFound(selector.to_string()))
    }

    fn from_device(device: Device) -> Result<Self, SourceError> {
        let has_axes = device.supported_absolute_axes().is_some_and(|axes| {
            axes.contains(AbsoluteAxisType::ABS_X) && axes.contains(AbsoluteAxisType::ABS_Y)
        });
        if !has_axes {
            return Err(SourceError::MissingAxes);
        }
        Ok(Self { device })
    }
}

impl AxisSource for EvdevAxisSource {
    fn read_axis(&mut self, axis: StickAxis) -> Result<i32, SourceError> {
        let state = self.device.get_abs_state().map_err(SourceError::Read)?;
        Ok(state[axis.code().0 as usize].value)
    }
}

/// Virtual uinput device carrying both the emulation keys and two absolute
/// axes ranged to the profile's output span.
pub struct VirtualOutput {
    device: VirtualDevice,
    /// Last written axis values, for change suppression
    axis_values: [Option<i32>; 2],
}

impl VirtualOutput {
    /// # Arguments
    /// * `name` - Device name (shown in `evtest` and game controller settings)
    /// * `keys` - Emulation keys the device may emit
    /// * `out_min`/`out_max` - Absolute axis range
    pub fn new(name: &str, keys: &[Key], out_min: i32, out_max: i32) -> Result<Self, SinkError> {
        let mut builder = VirtualDeviceBuilder::new()
            .map_err(SinkError::CreateDevice)?
            .name(name);

        let mut key_set = AttributeSet::<Key>::new();
        for &key in keys {
            key_set.insert(key);
        }
        builder = builder
            .with_keys(&key_set)
            .map_err(SinkError::CreateDevice)?;

        for axis in [StickAxis::X, StickAxis::Y] {
            let setup = UinputAbsSetup::new(
                axis.code(),
                AbsInfo::new(0, out_min, out_max, 0, 0, 1),
            );
            builder = builder
                .with_absolute_axis(&setup)
                .map_err(SinkError::CreateDevice)?;
        }

        let device = builder.build().map_err(SinkError::CreateDevice)?;
        Ok(Self {
            device,
            axis_values: [None; 2],
        })
    }

    /// Get the device path (e.g. /dev/input/eventX).
    pub fn device_path(&mut self) -> Option<PathBuf> {
        self.device
            .enumerate_dev_nodes_blocking()
            .ok()?
            .next()?
            .ok()
    }
}

impl EventSink for VirtualOutput {
    fn register_key(&mut self, key: Key) -> Result<(), SinkError> {
        let event = InputEvent::new_now(EventType::KEY, key.code(), 1);
        self.device.emit(&[event]).map_err(SinkError::EmitEvent)
    }

    fn unregister_key(&mut self, key: Key) -> Result<(), SinkError> {
        let event = InputEvent::new_now(EventType::KEY, key.code(), 0);
        self.device.emit(&[event]).map_err(SinkError::EmitEvent)
    }

    fn set_axis(&mut self, axis: StickAxis, value: i32) -> Result<(), SinkError> {
        // Only emit if changed
        if self.axis_values[axis.slot()] == Some(value) {
            return Ok(());
        }
        self.axis_values[axis.slot()] = Some(value);

        let event = InputEvent::new_now(EventType::ABSOLUTE, axis.code().0, value);
        self.device.emit(&[event]).map_err(SinkError::EmitEvent)
    }
}
