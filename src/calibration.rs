//! Startup calibration
//!
//! Samples the stick at rest to find its neutral center, widen the inner
//! deadzone to cover observed center drift, and derive the fixed-point scale
//! factor that maps the sensor's real deflection range onto the full output
//! range.

use crate::hal::{AxisSource, SourceError};
use crate::profile::StickProfile;

/// Samples taken while the stick is assumed to be at rest.
pub const SAMPLE_COUNT: u32 = 100;

/// Implied divisor of [`Calibration::scale_factor`].
pub const FIXED_POINT_SCALE: i64 = 1024;

/// Measured per-unit calibration data, owned by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    pub x_neutral: i32,
    pub y_neutral: i32,
    /// Inner deadzone radius in raw units; never below the profile's nominal value
    pub deadzone_inner: i32,
    /// Rim margin in raw units, carried from the profile
    pub deadzone_outer: i32,
    /// Fixed-point multiplier mapping raw deflection to output units
    pub scale_factor: i64,
}

impl Calibration {
    /// Calibration for an ideally built sensor, used when no measured data
    /// is available (tests, dry runs).
    pub fn ideal(profile: &StickProfile) -> Self {
        let center = profile.ideal_center();
        let span = (profile.raw_max - center).max(1) as i64;
        Self {
            x_neutral: center,
            y_neutral: center,
            deadzone_inner: profile.deadzone_inner,
            deadzone_outer: profile.deadzone_outer,
            scale_factor: FIXED_POINT_SCALE * profile.out_max as i64 / span,
        }
    }
}

/// Take [`SAMPLE_COUNT`] rest samples at the profile's polling cadence and
/// compute the calibration. Must complete before the pipeline runs; this is
/// the only point where execution deliberately stalls.
///
/// The result is advisory: a stick held deflected during calibration yields
/// a skewed neutral and scale, which the clamp stage still bounds.
pub async fn calibrate<S: AxisSource>(
    source: &mut S,
    profile: &StickProfile,
) -> Result<Calibration, SourceError> {
    let ideal = profile.ideal_center();
    let mut total_x: i64 = 0;
    let mut total_y: i64 = 0;
    let mut max_rest = i32::MIN;

    for _ in 0..SAMPLE_COUNT {
        let sample = source.read_pair()?;
        total_x += sample.x as i64;
        total_y += sample.y as i64;
        max_rest = max_rest.max(sample.x).max(sample.y);
        tokio::time::sleep(profile.poll_interval()).await;
    }

    let x_neutral = (total_x / SAMPLE_COUNT as i64) as i32;
    let y_neutral = (total_y / SAMPLE_COUNT as i64) as i32;

    // Scale so the remaining travel above the rest position reaches out_max.
    // The divisor is kept >= 1 so the computation stays total.
    let span = (profile.raw_max - max_rest).max(1) as i64;
    let scale_factor = FIXED_POINT_SCALE * profile.out_max as i64 / span;

    // The deadzone must always cover observed center drift.
    let x_drift = (x_neutral - ideal).abs();
    let y_drift = (y_neutral - ideal).abs();
    let deadzone_inner = x_drift.max(y_drift).max(profile.deadzone_inner);

    Ok(Calibration {
        x_neutral,
        y_neutral,
        deadzone_inner,
        deadzone_outer: profile.deadzone_outer,
        scale_factor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Coordinate;

    /// Source that replays a fixed sample forever.
    struct FixedSource(Coordinate);

    impl AxisSource for FixedSource {
        fn read_axis(&mut self, axis: crate::hal::StickAxis) -> Result<i32, SourceError> {
            Ok(match axis {
                crate::hal::StickAxis::X => self.0.x,
                crate::hal::StickAxis::Y => self.0.y,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn centered_rest_yields_profile_deadzone() {
        let profile = StickProfile::sym_10bit_8bit();
        let mut source = FixedSource(Coordinate::new(512, 512));
        let calib = calibrate(&mut source, &profile).await.unwrap();

        assert_eq!(calib.x_neutral, 512);
        assert_eq!(calib.y_neutral, 512);
        // drift of 1 from the ideal center 511 is below the nominal deadzone
        assert_eq!(calib.deadzone_inner, profile.deadzone_inner);
        // 1024 * 127 / (1023 - 512)
        assert_eq!(calib.scale_factor, 254);
    }

    #[tokio::test(start_paused = true)]
    async fn large_drift_widens_deadzone() {
        let profile = StickProfile::sym_10bit_8bit();
        let mut source = FixedSource(Coordinate::new(600, 511));
        let calib = calibrate(&mut source, &profile).await.unwrap();

        assert_eq!(calib.x_neutral, 600);
        assert_eq!(calib.deadzone_inner, 89); // |600 - 511| > nominal 60
    }

    #[tokio::test(start_paused = true)]
    async fn rest_at_raw_max_stays_total() {
        let profile = StickProfile::sym_10bit_8bit();
        let mut source = FixedSource(Coordinate::new(1023, 1023));
        let calib = calibrate(&mut source, &profile).await.unwrap();

        // divisor clamps to 1; the scale is huge but defined
        assert_eq!(calib.scale_factor, 1024 * 127);
    }

    #[test]
    fn ideal_calibration_matches_profile() {
        let profile = StickProfile::sym_10bit_8bit();
        let calib = Calibration::ideal(&profile);
        assert_eq!(calib.x_neutral, 511);
        assert_eq!(calib.deadzone_inner, 60);
        assert_eq!(calib.scale_factor, 1024 * 127 / 512);
    }
}
