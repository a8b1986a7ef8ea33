//! Static stick profiles
//!
//! A profile describes one class of physical sensor: raw ADC range, output
//! range, nominal deadzones and polling cadence. It is selected once at
//! startup and never mutated at runtime.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parameters for one class of analog stick hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickProfile {
    /// Deflection magnitude (in output units) beyond which key emulation triggers
    #[serde(default = "default_actuation_point")]
    pub actuation_point: i32,
    /// Nominal inner deadzone radius in raw units; calibration may widen it
    #[serde(default = "default_deadzone_inner")]
    pub deadzone_inner: i32,
    /// Rim margin in raw units; deflection past it saturates at full scale
    #[serde(default = "default_deadzone_outer")]
    pub deadzone_outer: i32,
    #[serde(default = "default_out_min")]
    pub out_min: i32,
    #[serde(default = "default_out_max")]
    pub out_max: i32,
    #[serde(default = "default_raw_min")]
    pub raw_min: i32,
    #[serde(default = "default_raw_max")]
    pub raw_max: i32,
    /// Minimum milliseconds between pipeline ticks
    #[serde(default = "default_stick_timer_ms")]
    pub stick_timer_ms: u32,
}

fn default_actuation_point() -> i32 {
    40
}
fn default_deadzone_inner() -> i32 {
    60
}
fn default_deadzone_outer() -> i32 {
    60
}
fn default_out_min() -> i32 {
    -127
}
fn default_out_max() -> i32 {
    127
}
fn default_raw_min() -> i32 {
    0
}
fn default_raw_max() -> i32 {
    1023
}
fn default_stick_timer_ms() -> u32 {
    5
}

impl StickProfile {
    /// Standard profile for thumbsticks with 10-bit potentiometers per axis
    /// and a symmetrical 8-bit output range.
    pub const fn sym_10bit_8bit() -> Self {
        Self {
            actuation_point: 40,
            deadzone_inner: 60,
            deadzone_outer: 60,
            out_min: -127,
            out_max: 127,
            raw_min: 0,
            raw_max: 1023,
            stick_timer_ms: 5,
        }
    }

    /// Center of the raw range a perfectly built sensor would rest at.
    pub const fn ideal_center(&self) -> i32 {
        (self.raw_min + self.raw_max) / 2
    }

    /// Inter-tick (and inter-calibration-sample) delay.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.stick_timer_ms as u64)
    }
}

impl Default for StickProfile {
    fn default() -> Self {
        Self::sym_10bit_8bit()
    }
}
