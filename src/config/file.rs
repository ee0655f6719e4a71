//! TOML configuration file loading
//!
//! Supports `~/.config/servomouth/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;
use crate::motion::ActuatorDriver;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Envelope and timing configuration
    #[serde(default)]
    pub animation: AnimationFileConfig,

    /// Arm gesture configuration
    #[serde(default)]
    pub gesture: GestureFileConfig,

    /// Servo limits and driver
    #[serde(default)]
    pub servos: ServosFileConfig,

    /// Audio output configuration
    #[serde(default)]
    pub audio: AudioFileConfig,
}

/// Envelope and timing configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnimationFileConfig {
    /// Seconds per envelope window (e.g. 0.01)
    pub update_interval: Option<f64>,

    /// Mouth angle at full loudness, in degrees
    pub max_angle: Option<f32>,

    /// Seconds to wait after playback starts before animating
    pub pre_roll: Option<f64>,

    /// Seconds to wait after the last window
    pub trailing: Option<f64>,

    /// Drive the arm servos with idle gestures
    pub gestures: Option<bool>,
}

/// Arm gesture configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GestureFileConfig {
    /// Lowest gesture target, in degrees
    pub min_angle: Option<f32>,

    /// Highest gesture target, in degrees
    pub max_angle: Option<f32>,

    /// Shortest hold between targets, in seconds
    pub min_cooldown: Option<f64>,

    /// Longest hold between targets, in seconds
    pub max_cooldown: Option<f64>,

    /// Largest per-tick change, in degrees
    pub max_step: Option<f32>,

    /// Seed for reproducible gestures
    pub seed: Option<u64>,
}

/// Servo configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServosFileConfig {
    /// Actuator backend ("noop" or "log")
    pub driver: Option<ActuatorDriver>,

    /// Mouth servo limits
    #[serde(default)]
    pub mouth: LimitsFileConfig,

    /// Arm servo limits
    #[serde(default)]
    pub arm: LimitsFileConfig,
}

/// Mechanical limits of a servo
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsFileConfig {
    pub min_angle: Option<f32>,
    pub max_angle: Option<f32>,
}

/// Audio output configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AudioFileConfig {
    /// Play through the default output device
    pub enabled: Option<bool>,
}

/// Load the TOML config file from the standard path
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> ConfigFile {
    let Some(path) = config_file_path() else {
        return ConfigFile::default();
    };

    if !path.exists() {
        return ConfigFile::default();
    }

    match read_config_file(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            ConfigFile::default()
        }
    }
}

/// Read a config file the user pointed at explicitly
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Return the config file path: `~/.config/servomouth/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("servomouth").join("config.toml"))
}
