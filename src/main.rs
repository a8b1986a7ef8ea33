//! Thumbstick mapper daemon
//!
//! Main entry point: calibrates the stick at startup, then runs the
//! pipeline once per tick, emitting to a virtual uinput device. SIGUSR1
//! cycles the stick mode, SIGUSR2 steps the mounting orientation.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

use thumbstick_mapper::calibration;
use thumbstick_mapper::config::{ConfigStore, FileBlockStore, MapperSettings};
use thumbstick_mapper::dispatch::{emulation_keys, LogControlPad};
use thumbstick_mapper::hal::{BaseLayer, Clock, EvdevAxisSource, MonotonicClock, VirtualOutput};
use thumbstick_mapper::pipeline::StickPipeline;

#[derive(Parser)]
#[command(name = "thumbstick-mapper")]
#[command(about = "Analog thumbstick to virtual joystick/key mapper for keyboard-mounted sticks")]
struct Cli {
    /// Settings file path (default: ~/.config/thumbstick-mapper/settings.toml)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the mapper daemon (default)
    Run,
    /// Cycle the persisted stick mode
    StepMode,
    /// Step the persisted mounting orientation by quarter turns
    StepOrientation {
        #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
        step: i32,
    },
    /// Print the persisted configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let settings_path = cli.settings.unwrap_or_else(MapperSettings::default_path);
    info!("Loading settings from {:?}", settings_path);
    let settings = MapperSettings::load(&settings_path)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(settings).await,
        Command::StepMode => {
            let mut config = ConfigStore::load(FileBlockStore::default())?;
            let mode = config.step_mode()?;
            println!("stick mode is now {mode:?}");
            Ok(())
        }
        Command::StepOrientation { step } => {
            let mut config = ConfigStore::load(FileBlockStore::default())?;
            let orientation = config.step_orientation(step)?;
            println!("up orientation is now {orientation:?}");
            Ok(())
        }
        Command::Show => {
            let config = ConfigStore::load(FileBlockStore::default())?;
            let current = config.config();
            println!("mode:           {:?}", current.mode);
            println!("up orientation: {:?}", current.up_orientation);
            Ok(())
        }
    }
}

async fn run(settings: MapperSettings) -> Result<()> {
    let profile = settings.profile;

    let mut source = EvdevAxisSource::open(&settings.input_device)?;
    let mut output = VirtualOutput::new(
        &settings.device_name,
        &emulation_keys(),
        profile.out_min,
        profile.out_max,
    )?;
    info!("Created virtual device: {}", settings.device_name);
    if let Some(path) = output.device_path() {
        info!("Device path: {}", path.display());
    }

    let config = ConfigStore::load(FileBlockStore::default())?;
    info!(
        "Configuration: mode {:?}, up orientation {:?}",
        config.config().mode,
        config.config().up_orientation
    );

    info!(
        "Calibrating, keep the stick at rest ({} samples)...",
        calibration::SAMPLE_COUNT
    );
    let calib = calibration::calibrate(&mut source, &profile).await?;
    info!(
        "Calibrated: neutral ({}, {}), inner deadzone {}, scale factor {}",
        calib.x_neutral, calib.y_neutral, calib.deadzone_inner, calib.scale_factor
    );

    let mut pipeline = StickPipeline::new(
        profile,
        calib,
        config,
        settings.scaling,
        settings.classifier,
    );

    let clock = MonotonicClock::new();
    let layers = BaseLayer;
    let mut pad = LogControlPad;

    let mut tick = tokio::time::interval(profile.poll_interval());
    let mut step_mode_signal = signal(SignalKind::user_defined1())?;
    let mut step_orientation_signal = signal(SignalKind::user_defined2())?;

    info!("Entering main loop. SIGUSR1 cycles mode, SIGUSR2 steps orientation, Ctrl+C exits.");

    loop {
        tokio::select! {
            _ = tick.tick() => {
                if let Err(e) = pipeline.poll(clock.now_ms(), &mut source, &mut output, &layers, &mut pad) {
                    warn!("Pipeline tick failed: {}", e);
                }
            }
            _ = step_mode_signal.recv() => {
                let mode = pipeline.step_mode(&mut output)?;
                info!("Stick mode now {:?}", mode);
            }
            _ = step_orientation_signal.recv() => {
                let orientation = pipeline.step_orientation(1)?;
                info!("Up orientation now {:?}", orientation);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}
