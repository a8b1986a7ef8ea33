//! Angle and direction classification
//!
//! Converts a normalized coordinate into a continuous angle and a discrete
//! 4-way direction. Two interchangeable strategies exist: `Trig` (atan2,
//! precise) and `Lite` (integer octant decomposition plus a ratio lookup,
//! for builds that cannot afford floating point). Both agree within one
//! 22.5° bucket everywhere.

use crate::orientation::Orientation;
use crate::types::Coordinate;
use serde::{Deserialize, Serialize};

/// Discrete 4-way stick direction, clockwise order matching [`Orientation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const fn index(self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }

    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Direction::Up),
            1 => Some(Direction::Right),
            2 => Some(Direction::Down),
            3 => Some(Direction::Left),
            _ => None,
        }
    }

    /// Direction as the user sees it once the mounting correction is
    /// applied. Each orientation step adds 90° counterclockwise, which is
    /// one step backwards in clockwise enum order.
    pub fn installed(self, orientation: Orientation) -> Self {
        let index = (self.index() as i32 - orientation.index() as i32).rem_euclid(4);
        Self::from_index(index as u8).unwrap_or(self)
    }
}

/// Angle plus the 4-way direction it falls in, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Degrees in [0, 360)
    pub angle: u16,
    /// `None` in the diagonal zones between cardinal sectors
    pub direction: Option<Direction>,
}

/// Classification strategy, chosen once from the daemon settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// atan2-based, precise to the degree
    #[default]
    Trig,
    /// Integer-only 16-bucket lookup
    Lite,
}

impl ClassifierKind {
    /// Angle of `coord` in degrees [0, 360) in the electrical frame.
    /// `None` at the exact center (no deflection, no angle).
    pub fn angle(self, coord: Coordinate) -> Option<u16> {
        if coord.is_neutral() {
            return None;
        }
        Some(match self {
            ClassifierKind::Trig => angle_trig(coord),
            ClassifierKind::Lite => angle_lite(coord),
        })
    }

    /// Full classification of `coord`. With `installed` the reported frame
    /// is rotated by the mounting orientation; the raw electrical frame is
    /// what diagnostics want.
    pub fn classify(
        self,
        coord: Coordinate,
        orientation: Orientation,
        installed: bool,
    ) -> Option<Classification> {
        let mut angle = self.angle(coord)?;
        if installed {
            angle = (angle + orientation.angle_offset()) % 360;
        }
        Some(Classification {
            angle,
            direction: direction_for_angle(angle),
        })
    }
}

/// 4-way direction for an angle: 45°-wide half-open sectors (lower bound
/// inclusive) centered on the cardinals. Diagonal zones have no direction.
pub fn direction_for_angle(angle: u16) -> Option<Direction> {
    match angle % 360 {
        0..=22 | 338..=359 => Some(Direction::Right),
        68..=112 => Some(Direction::Up),
        158..=202 => Some(Direction::Left),
        248..=292 => Some(Direction::Down),
        _ => None,
    }
}

fn angle_trig(coord: Coordinate) -> u16 {
    let degrees = (coord.y as f64).atan2(coord.x as f64).to_degrees();
    (degrees.rem_euclid(360.0).round() as u16) % 360
}

/// Quantized bucket centers of the lookup-table classifier, 22.5° apart.
const BUCKET_ANGLES: [u16; 16] = [
    0, 23, 45, 68, 90, 113, 135, 158, 180, 203, 225, 248, 270, 293, 315, 338,
];

/// Minor/major ratio thresholds (scaled by 256) splitting each 45° octant
/// into three zones: 106 ≈ 256·tan(22.5°), 181 ≈ 256·tan(35.3°).
const RATIO_LOW: i32 = 106;
const RATIO_HIGH: i32 = 181;

fn angle_lite(coord: Coordinate) -> u16 {
    let ax = coord.x.abs();
    let ay = coord.y.abs();
    let (major, minor) = if ay > ax { (ay, ax) } else { (ax, ay) };

    let ratio = minor * 256 / major;
    let fine: usize = if ratio > RATIO_HIGH {
        2
    } else if ratio > RATIO_LOW {
        1
    } else {
        0
    };

    // Octants in ascending angle order. In odd octants the ratio runs
    // against the angle (the minor axis shrinks toward the next cardinal),
    // so the fine index is mirrored there to keep buckets ascending.
    let sector: usize = match (coord.x >= 0, coord.y >= 0, ay > ax) {
        (true, true, false) => 0,
        (true, true, true) => 1,
        (false, true, true) => 2,
        (false, true, false) => 3,
        (false, false, false) => 4,
        (false, false, true) => 5,
        (true, false, true) => 6,
        (true, false, false) => 7,
    };
    let bucket = if sector % 2 == 0 {
        (sector * 2 + fine) % 16
    } else {
        (sector * 2 + 2 - fine) % 16
    };

    BUCKET_ANGLES[bucket]
}
