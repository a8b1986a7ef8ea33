//! Mounting-orientation correction
//!
//! The stick module can be soldered in any quarter-turn orientation. The
//! persisted `up_orientation` names which electrical direction faces
//! physically up; rotating every normalized sample by it makes the output
//! match the user's physical frame.
//!
//! Convention: stepping by +1 is one physical clockwise quarter turn of the
//! "up" reference. The enum is therefore ordered clockwise, and each variant
//! carries the counterclockwise angle its correction adds to a measured
//! angle.

use crate::types::Coordinate;

/// Which electrical direction of the stick faces physically up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Up,
    Right,
    Down,
    Left,
}

impl Orientation {
    pub const COUNT: i32 = 4;

    pub const fn index(self) -> u8 {
        match self {
            Orientation::Up => 0,
            Orientation::Right => 1,
            Orientation::Down => 2,
            Orientation::Left => 3,
        }
    }

    /// `None` for an out-of-range persisted value.
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Orientation::Up),
            1 => Some(Orientation::Right),
            2 => Some(Orientation::Down),
            3 => Some(Orientation::Left),
            _ => None,
        }
    }

    /// Advance by `step` quarter turns (clockwise for positive steps).
    pub fn stepped(self, step: i32) -> Self {
        let index = (self.index() as i32 + step).rem_euclid(Self::COUNT);
        // rem_euclid keeps the value in 0..4
        Self::from_index(index as u8).unwrap_or_default()
    }

    /// Counterclockwise degrees the correction adds to a measured angle.
    pub const fn angle_offset(self) -> u16 {
        match self {
            Orientation::Up => 0,
            Orientation::Right => 90,
            Orientation::Down => 180,
            Orientation::Left => 270,
        }
    }

    /// Rotate a coordinate into the physical frame.
    pub const fn rotate(self, coord: Coordinate) -> Coordinate {
        let Coordinate { x, y } = coord;
        match self {
            Orientation::Up => Coordinate::new(x, y),
            Orientation::Left => Coordinate::new(y, -x),
            Orientation::Down => Coordinate::new(-x, -y),
            Orientation::Right => Coordinate::new(-y, x),
        }
    }
}
