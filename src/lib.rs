//! Analog thumbstick input pipeline for keyboard-mounted stick modules
//!
//! Turns noisy raw 2-axis samples into stable output: startup calibration,
//! deadzone filtering and range scaling, mounting-orientation correction,
//! angle/direction classification, and mode dispatch onto a virtual
//! joystick or emulated movement keys.

pub mod calibration;
pub mod config;
pub mod direction;
pub mod dispatch;
pub mod hal;
pub mod normalize;
pub mod orientation;
pub mod pipeline;
pub mod profile;
pub mod types;

pub use calibration::{calibrate, Calibration};
pub use config::{
    BlockStore, ConfigStore, FileBlockStore, MapperSettings, MemoryBlockStore, StickConfig,
    StoreError, CONFIG_BLOCK_LEN,
};
pub use direction::{Classification, ClassifierKind, Direction};
pub use dispatch::{emulation_keys, ControlPad, LogControlPad, ModeDispatcher, StickMode};
pub use hal::{
    AxisSource, BaseLayer, Clock, EvdevAxisSource, EventSink, LayerQuery, MonotonicClock,
    SinkError, SourceError, StickAxis, VirtualOutput,
};
pub use normalize::{normalize, project, ScalingKind};
pub use orientation::Orientation;
pub use pipeline::{PipelineError, StickPipeline, TickLimiter};
pub use profile::StickProfile;
pub use types::{Coordinate, Layer};
