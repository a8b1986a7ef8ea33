//! Mode dispatch and digital key emulation
//!
//! Interprets a final pipeline coordinate according to the active mode:
//! analog passthrough, or edge-triggered key emulation (WASD / arrow keys)
//! with per-axis hysteresis around the actuation point.

use crate::direction::Direction;
use crate::hal::{EventSink, SinkError, StickAxis};
use crate::profile::StickProfile;
use crate::types::{Coordinate, Layer};
use evdev::Key;
use tracing::debug;

/// How stick values are interpreted, cycled by user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StickMode {
    /// Forward x/y unchanged as analog axes
    #[default]
    Analog,
    /// Emulate W/A/S/D
    Wasd,
    /// Emulate arrow keys
    Arrows,
}

impl StickMode {
    pub const COUNT: u8 = 3;

    pub const fn index(self) -> u8 {
        match self {
            StickMode::Analog => 0,
            StickMode::Wasd => 1,
            StickMode::Arrows => 2,
        }
    }

    /// `None` for an out-of-range persisted value.
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(StickMode::Analog),
            1 => Some(StickMode::Wasd),
            2 => Some(StickMode::Arrows),
            _ => None,
        }
    }

    /// Next mode in the cycle.
    pub const fn stepped(self) -> Self {
        match self {
            StickMode::Analog => StickMode::Wasd,
            StickMode::Wasd => StickMode::Arrows,
            StickMode::Arrows => StickMode::Analog,
        }
    }
}

/// Keys for one 4-way emulation set.
#[derive(Debug, Clone, Copy)]
struct KeySet {
    up: Key,
    left: Key,
    down: Key,
    right: Key,
}

const WASD_KEYS: KeySet = KeySet {
    up: Key::KEY_W,
    left: Key::KEY_A,
    down: Key::KEY_S,
    right: Key::KEY_D,
};

const ARROW_KEYS: KeySet = KeySet {
    up: Key::KEY_UP,
    left: Key::KEY_LEFT,
    down: Key::KEY_DOWN,
    right: Key::KEY_RIGHT,
};

/// Every key the dispatcher may emit; the virtual output device registers
/// these up front.
pub const fn emulation_keys() -> [Key; 8] {
    [
        Key::KEY_W,
        Key::KEY_A,
        Key::KEY_S,
        Key::KEY_D,
        Key::KEY_UP,
        Key::KEY_LEFT,
        Key::KEY_DOWN,
        Key::KEY_RIGHT,
    ]
}

/// Tri-state of one axis against the actuation point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum AxisLevel {
    Negative,
    #[default]
    Neutral,
    Positive,
}

fn axis_level(value: i32, actuation_point: i32) -> AxisLevel {
    if value > actuation_point {
        AxisLevel::Positive
    } else if value < -actuation_point {
        AxisLevel::Negative
    } else {
        AxisLevel::Neutral
    }
}

/// Hysteresis memory for one axis: the level last acted on and the key
/// currently held for it.
#[derive(Debug, Default)]
struct AxisChannel {
    level: AxisLevel,
    held: Option<Key>,
}

impl AxisChannel {
    /// Edge-triggered key handling: on a level change, release whatever was
    /// held, then press the key for the new nonzero level. A direct
    /// positive-to-negative flip therefore releases before pressing, so no
    /// key is ever left stuck or double-registered.
    fn update<S: EventSink>(
        &mut self,
        current: AxisLevel,
        pos_key: Key,
        neg_key: Key,
        sink: &mut S,
    ) -> Result<(), SinkError> {
        if current == self.level {
            return Ok(());
        }
        if let Some(key) = self.held.take() {
            debug!(?key, "releasing");
            sink.unregister_key(key)?;
        }
        match current {
            AxisLevel::Positive => {
                debug!(key = ?pos_key, "pressing");
                sink.register_key(pos_key)?;
                self.held = Some(pos_key);
            }
            AxisLevel::Negative => {
                debug!(key = ?neg_key, "pressing");
                sink.register_key(neg_key)?;
                self.held = Some(neg_key);
            }
            AxisLevel::Neutral => {}
        }
        self.level = current;
        Ok(())
    }

    fn release<S: EventSink>(&mut self, sink: &mut S) -> Result<(), SinkError> {
        if let Some(key) = self.held.take() {
            sink.unregister_key(key)?;
        }
        self.level = AxisLevel::Neutral;
        Ok(())
    }
}

/// Per-tick mode dispatcher. Holds the hysteresis state explicitly so the
/// component is independently testable.
#[derive(Debug, Default)]
pub struct ModeDispatcher {
    x: AxisChannel,
    y: AxisChannel,
}

impl ModeDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit the outputs implied by `coord` under `mode`. Analog mode is
    /// idempotent and called every tick; key modes only act on level edges.
    pub fn dispatch<S: EventSink>(
        &mut self,
        coord: Coordinate,
        mode: StickMode,
        profile: &StickProfile,
        sink: &mut S,
    ) -> Result<(), SinkError> {
        match mode {
            StickMode::Analog => {
                sink.set_axis(StickAxis::X, coord.x)?;
                sink.set_axis(StickAxis::Y, coord.y)
            }
            StickMode::Wasd => self.handle_keys(coord, WASD_KEYS, profile, sink),
            StickMode::Arrows => self.handle_keys(coord, ARROW_KEYS, profile, sink),
        }
    }

    fn handle_keys<S: EventSink>(
        &mut self,
        coord: Coordinate,
        keys: KeySet,
        profile: &StickProfile,
        sink: &mut S,
    ) -> Result<(), SinkError> {
        let y_level = axis_level(coord.y, profile.actuation_point);
        let x_level = axis_level(coord.x, profile.actuation_point);
        self.y.update(y_level, keys.up, keys.down, sink)?;
        self.x.update(x_level, keys.right, keys.left, sink)
    }

    /// Release held keys and return both axes to neutral. Run on every mode
    /// step so no output survives the switch.
    pub fn reset<S: EventSink>(&mut self, sink: &mut S) -> Result<(), SinkError> {
        self.x.release(sink)?;
        self.y.release(sink)?;
        sink.set_axis(StickAxis::X, 0)?;
        sink.set_axis(StickAxis::Y, 0)
    }
}

/// Receiver for direction gestures on layers above `Base`, where the stick
/// acts as a four-way control pad instead of driving keys or axes.
pub trait ControlPad {
    fn on_direction(&mut self, layer: Layer, direction: Direction);
}

/// Default control pad that only logs the gesture.
#[derive(Debug, Default)]
pub struct LogControlPad;

impl ControlPad for LogControlPad {
    fn on_direction(&mut self, layer: Layer, direction: Direction) {
        debug!(?layer, ?direction, "control pad gesture");
    }
}
