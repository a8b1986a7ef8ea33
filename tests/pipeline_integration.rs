//! Integration tests for the assembled stick pipeline.
//!
//! These exercise the full sample-to-output flow using the public building
//! blocks with in-memory hardware seams, without requiring a physical stick
//! or uinput access.

use evdev::Key;
use thumbstick_mapper::calibration::{self, Calibration};
use thumbstick_mapper::config::{ConfigStore, MemoryBlockStore, StickConfig};
use thumbstick_mapper::direction::{ClassifierKind, Direction};
use thumbstick_mapper::dispatch::ControlPad;
use thumbstick_mapper::hal::{AxisSource, EventSink, LayerQuery, SinkError, SourceError, StickAxis};
use thumbstick_mapper::normalize::ScalingKind;
use thumbstick_mapper::orientation::Orientation;
use thumbstick_mapper::pipeline::StickPipeline;
use thumbstick_mapper::profile::StickProfile;
use thumbstick_mapper::types::{Coordinate, Layer};
use thumbstick_mapper::StickMode;

// ── in-memory hardware seams ──

/// Source returning a settable fixed sample.
struct FixedSource(Coordinate);

impl AxisSource for FixedSource {
    fn read_axis(&mut self, axis: StickAxis) -> Result<i32, SourceError> {
        Ok(match axis {
            StickAxis::X => self.0.x,
            StickAxis::Y => self.0.y,
        })
    }
}

/// Sink recording every key edge and axis write.
#[derive(Default)]
struct RecordingSink {
    keys: Vec<(Key, bool)>,
    axes: Vec<(StickAxis, i32)>,
}

impl RecordingSink {
    fn last_axes(&self) -> (i32, i32) {
        let mut x = 0;
        let mut y = 0;
        for &(axis, value) in &self.axes {
            match axis {
                StickAxis::X => x = value,
                StickAxis::Y => y = value,
            }
        }
        (x, y)
    }
}

impl EventSink for RecordingSink {
    fn register_key(&mut self, key: Key) -> Result<(), SinkError> {
        self.keys.push((key, true));
        Ok(())
    }

    fn unregister_key(&mut self, key: Key) -> Result<(), SinkError> {
        self.keys.push((key, false));
        Ok(())
    }

    fn set_axis(&mut self, axis: StickAxis, value: i32) -> Result<(), SinkError> {
        self.axes.push((axis, value));
        Ok(())
    }
}

struct FixedLayer(Layer);

impl LayerQuery for FixedLayer {
    fn current_layer(&self) -> Layer {
        self.0
    }
}

#[derive(Default)]
struct RecordingPad(Vec<(Layer, Direction)>);

impl ControlPad for RecordingPad {
    fn on_direction(&mut self, layer: Layer, direction: Direction) {
        self.0.push((layer, direction));
    }
}

// ── helpers ──

fn profile() -> StickProfile {
    StickProfile::sym_10bit_8bit()
}

fn calibration() -> Calibration {
    Calibration {
        x_neutral: 512,
        y_neutral: 512,
        deadzone_inner: 60,
        deadzone_outer: 60,
        scale_factor: 254,
    }
}

fn pipeline_with(config: StickConfig) -> StickPipeline<MemoryBlockStore> {
    let store = MemoryBlockStore::with_block(config.to_block());
    let config = ConfigStore::load(store).unwrap();
    StickPipeline::new(
        profile(),
        calibration(),
        config,
        ScalingKind::Fixed,
        ClassifierKind::Trig,
    )
}

/// Drive one gated tick; `now` must advance past the profile interval
/// between calls.
fn tick(
    pipeline: &mut StickPipeline<MemoryBlockStore>,
    now: u32,
    raw: Coordinate,
    sink: &mut RecordingSink,
) {
    let mut source = FixedSource(raw);
    pipeline
        .poll(now, &mut source, sink, &FixedLayer(Layer::Base), &mut RecordingPad::default())
        .unwrap();
}

// ── scenarios ──

#[test]
fn neutral_raw_dispatches_neutral_analog_axes() {
    let mut pipeline = pipeline_with(StickConfig::default());
    let mut sink = RecordingSink::default();
    tick(&mut pipeline, 0, Coordinate::new(512, 512), &mut sink);
    assert_eq!(sink.last_axes(), (0, 0));
    assert!(sink.keys.is_empty());
}

#[test]
fn full_deflection_clamps_and_registers_wasd_key() {
    let mut pipeline = pipeline_with(StickConfig {
        mode: StickMode::Wasd,
        up_orientation: Orientation::Up,
    });
    let mut sink = RecordingSink::default();

    tick(&mut pipeline, 0, Coordinate::new(1023, 512), &mut sink);
    // positive x beyond the actuation point: 'D' pressed, nothing on y
    assert_eq!(sink.keys, vec![(Key::KEY_D, true)]);

    // repeated identical input does not re-register
    tick(&mut pipeline, 10, Coordinate::new(1023, 512), &mut sink);
    assert_eq!(sink.keys.len(), 1);

    // returning to rest releases exactly once
    tick(&mut pipeline, 20, Coordinate::new(512, 512), &mut sink);
    assert_eq!(sink.keys, vec![(Key::KEY_D, true), (Key::KEY_D, false)]);
}

#[test]
fn analog_output_stays_in_range_at_full_deflection() {
    let mut pipeline = pipeline_with(StickConfig::default());
    let mut sink = RecordingSink::default();
    tick(&mut pipeline, 0, Coordinate::new(1023, 512), &mut sink);
    let (x, y) = sink.last_axes();
    assert!(x >= 126 && x <= 127, "got {x}");
    assert_eq!(y, 0);
}

#[test]
fn left_orientation_rotates_analog_output() {
    let mut pipeline = pipeline_with(StickConfig {
        mode: StickMode::Analog,
        up_orientation: Orientation::Left,
    });
    let mut sink = RecordingSink::default();
    // +x electrical deflection; LEFT maps (x, y) -> (y, -x)
    tick(&mut pipeline, 0, Coordinate::new(1023, 512), &mut sink);
    let (x, y) = sink.last_axes();
    assert_eq!(x, 0);
    assert!(y <= -126, "got {y}");
}

#[test]
fn rate_limiter_gates_ticks_within_interval() {
    let mut pipeline = pipeline_with(StickConfig::default());
    let mut sink = RecordingSink::default();
    tick(&mut pipeline, 0, Coordinate::new(1023, 512), &mut sink);
    let writes = sink.axes.len();
    // 3ms later, inside the 5ms profile interval: nothing runs
    tick(&mut pipeline, 3, Coordinate::new(512, 512), &mut sink);
    assert_eq!(sink.axes.len(), writes);
}

#[test]
fn mode_step_resets_in_flight_output_and_cycles() {
    let mut pipeline = pipeline_with(StickConfig {
        mode: StickMode::Wasd,
        up_orientation: Orientation::Up,
    });
    let mut sink = RecordingSink::default();

    // hold a deflection so a key is registered
    tick(&mut pipeline, 0, Coordinate::new(1023, 512), &mut sink);
    assert_eq!(sink.keys, vec![(Key::KEY_D, true)]);

    let mode = pipeline.step_mode(&mut sink).unwrap();
    assert_eq!(mode, StickMode::Arrows);
    // the held key was released and the axes returned to neutral
    assert_eq!(sink.keys, vec![(Key::KEY_D, true), (Key::KEY_D, false)]);
    assert_eq!(sink.last_axes(), (0, 0));

    // two more steps complete the cycle
    pipeline.step_mode(&mut sink).unwrap();
    let mode = pipeline.step_mode(&mut sink).unwrap();
    assert_eq!(mode, StickMode::Wasd);
}

#[test]
fn invalid_stored_block_resets_to_defaults_and_persists() {
    let store = MemoryBlockStore::with_block([0xFF, 7, 9, 0]);
    let config = ConfigStore::load(store).unwrap();
    assert_eq!(config.config(), StickConfig::default());
}

#[test]
fn higher_layer_routes_direction_to_control_pad() {
    let mut pipeline = pipeline_with(StickConfig {
        mode: StickMode::Analog,
        up_orientation: Orientation::Right,
    });
    let mut sink = RecordingSink::default();
    let mut pad = RecordingPad::default();
    // electrical +x deflection; with RIGHT mounted up the user pushed up
    let mut source = FixedSource(Coordinate::new(1023, 512));
    pipeline
        .poll(0, &mut source, &mut sink, &FixedLayer(Layer::Lower), &mut pad)
        .unwrap();
    assert_eq!(pad.0, vec![(Layer::Lower, Direction::Up)]);
    // no keys or axes were driven while the layer was held
    assert!(sink.keys.is_empty());
    assert!(sink.axes.is_empty());
}

#[test]
fn deadzone_deflection_yields_no_pad_gesture() {
    let mut pipeline = pipeline_with(StickConfig::default());
    let mut sink = RecordingSink::default();
    let mut pad = RecordingPad::default();
    let mut source = FixedSource(Coordinate::new(530, 530));
    pipeline
        .poll(0, &mut source, &mut sink, &FixedLayer(Layer::Raise), &mut pad)
        .unwrap();
    assert!(pad.0.is_empty());
}

#[test]
fn diagnostics_report_raw_and_installed_frames() {
    let pipeline = pipeline_with(StickConfig {
        mode: StickMode::Analog,
        up_orientation: Orientation::Right,
    });
    let raw = Coordinate::new(1023, 512); // electrical Right
    assert_eq!(pipeline.direction(raw, false), Some(Direction::Right));
    assert_eq!(pipeline.direction(raw, true), Some(Direction::Up));
    assert_eq!(pipeline.angle(raw, false), Some(0));
    assert_eq!(pipeline.angle(raw, true), Some(90));
}

#[tokio::test(start_paused = true)]
async fn calibration_seeds_a_working_pipeline() {
    let profile = profile();
    // a stick resting slightly off the ideal center
    let mut source = FixedSource(Coordinate::new(520, 505));
    let calib = calibration::calibrate(&mut source, &profile).await.unwrap();
    assert_eq!(calib.x_neutral, 520);
    assert_eq!(calib.y_neutral, 505);

    let config = ConfigStore::load(MemoryBlockStore::default()).unwrap();
    let mut pipeline = StickPipeline::new(
        profile,
        calib,
        config,
        ScalingKind::Fixed,
        ClassifierKind::Lite,
    );

    // at its measured rest position the stick is neutral
    let mut sink = RecordingSink::default();
    let mut at_rest = FixedSource(Coordinate::new(520, 505));
    pipeline
        .poll(0, &mut at_rest, &mut sink, &FixedLayer(Layer::Base), &mut RecordingPad::default())
        .unwrap();
    assert_eq!(sink.last_axes(), (0, 0));
}
