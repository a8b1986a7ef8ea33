//! Deadzone filtering and range scaling
//!
//! Maps a raw sample pair to a centered, deadzone-filtered coordinate scaled
//! to the profile's output range. Two variants exist: the default fixed-point
//! path (integer multiply/shift, joint radial deadzone) and a floating-point
//! projection path (per-axis deadzone, rim saturation).

use crate::calibration::{Calibration, FIXED_POINT_SCALE};
use crate::profile::StickProfile;
use crate::types::Coordinate;
use serde::{Deserialize, Serialize};

/// Scaling strategy, chosen once from the daemon settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalingKind {
    /// Integer-only multiply/divide with a radial deadzone
    #[default]
    Fixed,
    /// Floating-point range projection with per-axis deadzones
    Projected,
}

/// Normalize a raw sample against the calibration and profile.
pub fn normalize(
    raw: Coordinate,
    calib: &Calibration,
    profile: &StickProfile,
    kind: ScalingKind,
) -> Coordinate {
    match kind {
        ScalingKind::Fixed => normalize_fixed(raw, calib, profile),
        ScalingKind::Projected => normalize_projected(raw, calib, profile),
    }
}

/// Fixed-point path: squared-distance radial deadzone (both axes zeroed
/// together), then scale by `scale_factor / 1024` truncating toward zero.
fn normalize_fixed(raw: Coordinate, calib: &Calibration, profile: &StickProfile) -> Coordinate {
    let x = raw.x - calib.x_neutral;
    let y = raw.y - calib.y_neutral;

    // Compare squared distance against the squared radius to avoid sqrt.
    let distance_sq = x as i64 * x as i64 + y as i64 * y as i64;
    let inner = calib.deadzone_inner as i64;

    let (x, y) = if distance_sq < inner * inner {
        (0, 0)
    } else {
        (
            (x as i64 * calib.scale_factor / FIXED_POINT_SCALE) as i32,
            (y as i64 * calib.scale_factor / FIXED_POINT_SCALE) as i32,
        )
    };

    Coordinate {
        x: x.clamp(profile.out_min, profile.out_max),
        y: y.clamp(profile.out_min, profile.out_max),
    }
}

/// Projection path: each axis independently thresholded at the inner
/// deadzone, then its remaining travel projected onto `[0, out_max]`.
/// Deflection past the rim margin (`deadzone_outer`) saturates early.
fn normalize_projected(raw: Coordinate, calib: &Calibration, profile: &StickProfile) -> Coordinate {
    let center = profile.ideal_center();
    let usable = (profile.raw_max - center - calib.deadzone_outer).max(calib.deadzone_inner + 1);

    let scale_axis = |offset: i32| -> i32 {
        let magnitude = offset.abs();
        if magnitude < calib.deadzone_inner {
            return 0;
        }
        let scaled = project(
            magnitude as f32,
            calib.deadzone_inner as f32,
            usable as f32,
            0.0,
            profile.out_max as f32,
        );
        // ceil keeps any deflection beyond the deadzone nonzero
        let value = scaled.ceil() as i32 * offset.signum();
        value.clamp(profile.out_min, profile.out_max)
    };

    Coordinate {
        x: scale_axis(raw.x - calib.x_neutral),
        y: scale_axis(raw.y - calib.y_neutral),
    }
}

/// Linear projection of `val` from `[rmin, rmax]` onto `[tmin, tmax]`,
/// clamped to the target range. A degenerate source range yields the target
/// minimum rather than dividing by near-zero.
pub fn project(val: f32, rmin: f32, rmax: f32, tmin: f32, tmax: f32) -> f32 {
    if (rmax - rmin).abs() <= f32::EPSILON {
        return tmin;
    }
    let normalized = (val - rmin) / (rmax - rmin);
    (tmin + normalized * (tmax - tmin)).clamp(tmin, tmax)
}
