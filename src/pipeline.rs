//! Per-tick pipeline control flow
//!
//! Wires the stages together: sample, normalize, rotate, then either mode
//! dispatch (base layer) or direction gestures (higher layers). One
//! invocation per host scan tick, rate-gated internally by a wrap-tolerant
//! millisecond limiter.

use crate::calibration::Calibration;
use crate::config::{BlockStore, ConfigStore, StickConfig, StoreError};
use crate::direction::{ClassifierKind, Direction};
use crate::dispatch::{ControlPad, ModeDispatcher, StickMode};
use crate::hal::{AxisSource, EventSink, LayerQuery, SinkError, SourceError};
use crate::normalize::{normalize, ScalingKind};
use crate::orientation::Orientation;
use crate::profile::StickProfile;
use crate::types::{Coordinate, Layer};
use thiserror::Error;

/// Errors surfaced by a pipeline tick or mutation.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Wrap-tolerant millisecond tick gate.
#[derive(Debug, Default)]
pub struct TickLimiter {
    last_ms: u32,
    primed: bool,
}

impl TickLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when at least `interval_ms` elapsed since the last accepted
    /// tick. Unsigned wrapping subtraction tolerates timer wraparound.
    pub fn ready(&mut self, now_ms: u32, interval_ms: u32) -> bool {
        if self.primed && now_ms.wrapping_sub(self.last_ms) < interval_ms {
            return false;
        }
        self.last_ms = now_ms;
        self.primed = true;
        true
    }
}

/// The assembled input pipeline. Owns the calibration, the persisted
/// configuration handle and the dispatcher's hysteresis state; borrows the
/// hardware seams on each call so they stay independently owned by the host
/// loop.
pub struct StickPipeline<S: BlockStore> {
    profile: StickProfile,
    calibration: Calibration,
    config: ConfigStore<S>,
    dispatcher: ModeDispatcher,
    limiter: TickLimiter,
    scaling: ScalingKind,
    classifier: ClassifierKind,
}

impl<S: BlockStore> StickPipeline<S> {
    pub fn new(
        profile: StickProfile,
        calibration: Calibration,
        config: ConfigStore<S>,
        scaling: ScalingKind,
        classifier: ClassifierKind,
    ) -> Self {
        Self {
            profile,
            calibration,
            config,
            dispatcher: ModeDispatcher::new(),
            limiter: TickLimiter::new(),
            scaling,
            classifier,
        }
    }

    /// One host scan hook invocation. Returns without touching the hardware
    /// when the tick interval has not elapsed yet.
    pub fn poll<A, E, L, C>(
        &mut self,
        now_ms: u32,
        source: &mut A,
        sink: &mut E,
        layers: &L,
        pad: &mut C,
    ) -> Result<(), PipelineError>
    where
        A: AxisSource,
        E: EventSink,
        L: LayerQuery,
        C: ControlPad,
    {
        if !self.limiter.ready(now_ms, self.profile.stick_timer_ms) {
            return Ok(());
        }

        let raw = source.read_pair()?;
        let layer = layers.current_layer();

        if layer == Layer::Base {
            let coord = self.normalized(raw);
            let coord = self.config.config().up_orientation.rotate(coord);
            self.dispatcher
                .dispatch(coord, self.config.config().mode, &self.profile, sink)?;
        } else if let Some(direction) = self.direction(raw, true) {
            // higher layers repurpose the stick as a four-way control pad
            pad.on_direction(layer, direction);
        }

        Ok(())
    }

    /// Normalized (centered, deadzone-filtered, scaled) coordinate for a raw
    /// sample, in the electrical frame.
    pub fn normalized(&self, raw: Coordinate) -> Coordinate {
        normalize(raw, &self.calibration, &self.profile, self.scaling)
    }

    /// Direction of a raw sample, `None` when inside the deadzone or in a
    /// diagonal zone. `installed` selects the mounting-corrected frame; the
    /// electrical frame serves diagnostics.
    pub fn direction(&self, raw: Coordinate, installed: bool) -> Option<Direction> {
        let coord = self.normalized(raw);
        self.classifier
            .classify(coord, self.config.config().up_orientation, installed)?
            .direction
    }

    /// Angle of a raw sample in degrees, `None` inside the deadzone.
    pub fn angle(&self, raw: Coordinate, installed: bool) -> Option<u16> {
        let coord = self.normalized(raw);
        Some(
            self.classifier
                .classify(coord, self.config.config().up_orientation, installed)?
                .angle,
        )
    }

    /// Cycle the stick mode, resetting all in-flight output first so no
    /// axis deflection or held key survives the switch. Persists before
    /// returning.
    pub fn step_mode<E: EventSink>(&mut self, sink: &mut E) -> Result<StickMode, PipelineError> {
        self.dispatcher.reset(sink)?;
        Ok(self.config.step_mode()?)
    }

    /// Advance the mounting orientation by `step` quarter turns; persists
    /// before returning.
    pub fn step_orientation(&mut self, step: i32) -> Result<Orientation, PipelineError> {
        Ok(self.config.step_orientation(step)?)
    }

    pub fn config(&self) -> StickConfig {
        self.config.config()
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn profile(&self) -> &StickProfile {
        &self.profile
    }
}
