//! Persisted stick configuration and daemon settings
//!
//! Two kinds of configuration live here. `StickConfig` is the small
//! user-mutated state (mode, mounting orientation) persisted as a fixed-size
//! binary block through an EEPROM-style [`BlockStore`]; every mutation writes
//! back synchronously and an invalid or never-written block resets to
//! defaults. `MapperSettings` is the daemon-level TOML file (device names,
//! variant selection, profile).

use crate::direction::ClassifierKind;
use crate::dispatch::StickMode;
use crate::normalize::ScalingKind;
use crate::orientation::Orientation;
use crate::profile::StickProfile;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Size of the persisted configuration block.
pub const CONFIG_BLOCK_LEN: usize = 4;

/// Leading magic byte. An all-zero (never written) block can never carry it.
const BLOCK_MAGIC: u8 = 0x5A;

// Encoded layout: magic, mode, orientation, one reserved byte.
const _: () = assert!(CONFIG_BLOCK_LEN == 4);

/// Errors from the persistent block store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to load config block: {0}")]
    Load(#[source] std::io::Error),

    #[error("Failed to save config block: {0}")]
    Save(#[source] std::io::Error),
}

/// Fixed-size persistent blob service. The fixed-array API makes a size
/// mismatch between the in-memory structure and the stored block a compile
/// error rather than a runtime one.
pub trait BlockStore {
    fn load_block(&mut self) -> Result<[u8; CONFIG_BLOCK_LEN], StoreError>;
    fn save_block(&mut self, block: &[u8; CONFIG_BLOCK_LEN]) -> Result<(), StoreError>;
}

/// User-mutated stick state, persisted across boots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StickConfig {
    pub mode: StickMode,
    pub up_orientation: Orientation,
}

impl StickConfig {
    pub fn to_block(self) -> [u8; CONFIG_BLOCK_LEN] {
        [
            BLOCK_MAGIC,
            self.mode.index(),
            self.up_orientation.index(),
            0,
        ]
    }

    /// `None` for a never-written or out-of-range block; the caller resets
    /// to defaults and re-persists.
    pub fn from_block(block: &[u8; CONFIG_BLOCK_LEN]) -> Option<Self> {
        if block[0] != BLOCK_MAGIC {
            return None;
        }
        Some(Self {
            mode: StickMode::from_index(block[1])?,
            up_orientation: Orientation::from_index(block[2])?,
        })
    }
}

/// Owns the live configuration and the store behind it. Every mutation
/// persists before returning, so the stored state is never stale and never
/// invalid.
pub struct ConfigStore<S: BlockStore> {
    store: S,
    current: StickConfig,
}

impl<S: BlockStore> ConfigStore<S> {
    /// Load the stored configuration, falling back to defaults (and
    /// persisting them immediately) when the block is unset or invalid.
    pub fn load(mut store: S) -> Result<Self, StoreError> {
        let block = store.load_block()?;
        let current = match StickConfig::from_block(&block) {
            Some(config) => config,
            None => {
                let defaults = StickConfig::default();
                store.save_block(&defaults.to_block())?;
                tracing::info!("stored stick configuration unset or invalid, reset to defaults");
                defaults
            }
        };
        Ok(Self { store, current })
    }

    pub fn config(&self) -> StickConfig {
        self.current
    }

    pub fn set_mode(&mut self, mode: StickMode) -> Result<(), StoreError> {
        self.current.mode = mode;
        self.persist()
    }

    pub fn set_up_orientation(&mut self, orientation: Orientation) -> Result<(), StoreError> {
        self.current.up_orientation = orientation;
        self.persist()
    }

    /// Cycle to the next mode and persist.
    pub fn step_mode(&mut self) -> Result<StickMode, StoreError> {
        self.set_mode(self.current.mode.stepped())?;
        Ok(self.current.mode)
    }

    /// Advance the mounting orientation by `step` quarter turns and persist.
    pub fn step_orientation(&mut self, step: i32) -> Result<Orientation, StoreError> {
        self.set_up_orientation(self.current.up_orientation.stepped(step))?;
        Ok(self.current.up_orientation)
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        self.store.save_block(&self.current.to_block())
    }
}

/// File-backed block store under the user config directory. A missing file
/// loads as the all-zero "never written" block.
pub struct FileBlockStore {
    path: PathBuf,
}

impl FileBlockStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Default location of the stored block.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("thumbstick-mapper")
            .join("stick.bin")
    }
}

impl Default for FileBlockStore {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

impl BlockStore for FileBlockStore {
    fn load_block(&mut self) -> Result<[u8; CONFIG_BLOCK_LEN], StoreError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => {
                let mut block = [0u8; CONFIG_BLOCK_LEN];
                if bytes.len() == CONFIG_BLOCK_LEN {
                    block.copy_from_slice(&bytes);
                }
                // wrong-size content stays all-zero and validates as unset
                Ok(block)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok([0u8; CONFIG_BLOCK_LEN]),
            Err(e) => Err(StoreError::Load(e)),
        }
    }

    fn save_block(&mut self, block: &[u8; CONFIG_BLOCK_LEN]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(StoreError::Save)?;
        }
        std::fs::write(&self.path, block).map_err(StoreError::Save)
    }
}

/// In-memory block store for tests and host-embedded use.
#[derive(Debug, Default)]
pub struct MemoryBlockStore {
    block: [u8; CONFIG_BLOCK_LEN],
}

impl MemoryBlockStore {
    pub fn with_block(block: [u8; CONFIG_BLOCK_LEN]) -> Self {
        Self { block }
    }

    pub fn block(&self) -> [u8; CONFIG_BLOCK_LEN] {
        self.block
    }
}

impl BlockStore for MemoryBlockStore {
    fn load_block(&mut self) -> Result<[u8; CONFIG_BLOCK_LEN], StoreError> {
        Ok(self.block)
    }

    fn save_block(&mut self, block: &[u8; CONFIG_BLOCK_LEN]) -> Result<(), StoreError> {
        self.block = *block;
        Ok(())
    }
}

/// Daemon settings (TOML file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapperSettings {
    /// Name for the virtual output device
    #[serde(default = "default_device_name")]
    pub device_name: String,
    /// Path or name substring of the physical stick device
    #[serde(default = "default_input_device")]
    pub input_device: String,
    /// Angle classification strategy
    #[serde(default)]
    pub classifier: ClassifierKind,
    /// Normalizer scaling strategy
    #[serde(default)]
    pub scaling: ScalingKind,
    /// Physical sensor class parameters
    #[serde(default)]
    pub profile: StickProfile,
}

fn default_device_name() -> String {
    "Thumbstick Mapper".to_string()
}

fn default_input_device() -> String {
    "Thumbstick".to_string()
}

impl Default for MapperSettings {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            input_device: default_input_device(),
            classifier: ClassifierKind::default(),
            scaling: ScalingKind::default(),
            profile: StickProfile::default(),
        }
    }
}

impl MapperSettings {
    /// Get the default settings file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("thumbstick-mapper")
            .join("settings.toml")
    }

    /// Load settings from a file, or return defaults if not found.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let settings: MapperSettings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Self::default())
        }
    }

    /// Save settings to a file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
