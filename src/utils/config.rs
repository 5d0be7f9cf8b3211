//! Configuration management for ledplayer
//!
//! This module handles loading and managing application configuration
//! from config files and environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::media::DisplayOptions;
use crate::utils::error::{IntoPlayerError, PlayerError, Result};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LED matrix configuration
    pub matrix: MatrixConfig,

    /// Playback configuration
    pub playback: PlaybackConfig,

    /// Storage locations
    pub storage: StorageConfig,

    /// Hardware quick media buttons
    pub quick_media: QuickMediaConfig,

    /// General application settings
    pub general: GeneralConfig,
}

/// LED matrix configuration
///
/// Mirrors the options handed to the native panel driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    /// Rows per panel
    pub rows: u32,

    /// Columns per panel
    pub cols: u32,

    /// Number of daisy-chained panels
    pub chain_length: u32,

    /// Number of parallel chains
    pub parallel: u32,

    /// GPIO mapping name (regular, adafruit-hat, ...)
    pub hardware_mapping: String,

    /// GPIO slowdown factor for faster boards
    pub gpio_slowdown: u32,

    /// PWM bits (1 - 11)
    pub pwm_bits: u8,

    /// Global brightness percentage
    pub brightness: u8,
}

/// Playback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Hold time for frames that carry no delay (still images)
    pub image_hold_ms: u64,

    /// How long a shutdown clear waits for the canvas
    pub clear_timeout_ms: u64,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory for playlists, quick media and backing files
    pub data_dir: PathBuf,
}

/// Quick media configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickMediaConfig {
    /// Number of hardware buttons
    pub slots: usize,
}

/// General application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            rows: 32,
            cols: 64,
            chain_length: 1,
            parallel: 1,
            hardware_mapping: "regular".to_string(),
            gpio_slowdown: 1,
            pwm_bits: 11,
            brightness: 100,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            image_hold_ms: 5000,
            clear_timeout_ms: 500,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .map(|p| p.join("ledplayer"))
                .unwrap_or_else(|| PathBuf::from("./ledplayer-data")),
        }
    }
}

impl Default for QuickMediaConfig {
    fn default() -> Self {
        Self { slots: 4 }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl MatrixConfig {
    /// Display options captured into entries created under this configuration
    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            rows: self.rows,
            cols: self.cols,
            chain_length: self.chain_length,
            parallel: self.parallel,
            hardware_mapping: self.hardware_mapping.clone(),
        }
    }
}

impl PlaybackConfig {
    pub fn image_hold(&self) -> Duration {
        Duration::from_millis(self.image_hold_ms)
    }

    pub fn clear_timeout(&self) -> Duration {
        Duration::from_millis(self.clear_timeout_ms)
    }
}

impl Config {
    /// Load configuration
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. `path` if given, otherwise the user config file
    ///    (~/.config/ledplayer/config.toml on Linux)
    /// 3. Environment variables (LEDPLAYER_* prefix)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::user_config_path() {
                Some(user_path) if user_path.exists() => Self::from_file(&user_path)?,
                _ => Self::default(),
            },
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to the user config file
    pub fn save(&self) -> Result<()> {
        let path = Self::user_config_path()
            .ok_or_else(|| PlayerError::Config("Cannot determine user config path".to_string()))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).config_err("Failed to create config directory")?;
        }

        let toml = toml::to_string_pretty(self).config_err("Failed to serialize config")?;
        std::fs::write(path, toml).config_err("Failed to write config file")?;

        Ok(())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).config_err("Failed to read config file")?;
        toml::from_str(&contents).config_err("Failed to parse config file")
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(dir) = std::env::var("LEDPLAYER_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }

        if let Ok(brightness) = std::env::var("LEDPLAYER_BRIGHTNESS") {
            self.matrix.brightness = brightness.parse()
                .map_err(|_| PlayerError::Config("Invalid LEDPLAYER_BRIGHTNESS".to_string()))?;
        }

        if let Ok(slots) = std::env::var("LEDPLAYER_QUICK_SLOTS") {
            self.quick_media.slots = slots.parse()
                .map_err(|_| PlayerError::Config("Invalid LEDPLAYER_QUICK_SLOTS".to_string()))?;
        }

        if let Ok(log_level) = std::env::var("LEDPLAYER_LOG_LEVEL") {
            self.general.log_level = log_level;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.matrix.rows == 0 || self.matrix.cols == 0 {
            return Err(PlayerError::Config("Panel dimensions must be non-zero".to_string()));
        }

        if self.matrix.chain_length == 0 || self.matrix.parallel == 0 {
            return Err(PlayerError::Config("Chain length and parallel must be at least 1".to_string()));
        }

        if !(1..=11).contains(&self.matrix.pwm_bits) {
            return Err(PlayerError::Config("PWM bits must be between 1 and 11".to_string()));
        }

        if self.matrix.brightness > 100 {
            return Err(PlayerError::Config("Brightness must be between 0 and 100".to_string()));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.general.log_level.as_str()) {
            return Err(PlayerError::Config(format!(
                "Invalid log level '{}', must be one of: {:?}",
                self.general.log_level,
                valid_log_levels
            )));
        }

        Ok(())
    }

    /// Get user config file path
    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ledplayer").join("config.toml"))
    }
}
