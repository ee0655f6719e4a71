//! Configuration management for servomouth
//!
//! Values resolve env > TOML file > default.

pub mod file;

use std::path::Path;
use std::time::Duration;

use crate::motion::{ActuatorDriver, AngleRange, GestureSettings, Rig};
use crate::{Error, Result};

/// Resolved configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Envelope and timing
    pub animation: AnimationConfig,

    /// Arm gestures
    pub gesture: GestureConfig,

    /// Servo limits and driver
    pub servos: ServoConfig,

    /// Audio output
    pub audio: AudioConfig,
}

/// Envelope and timing configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationConfig {
    /// Length of one envelope window
    pub update_interval: Duration,

    /// Mouth angle at full loudness, in degrees
    pub max_angle: f32,

    /// Wait after playback starts before the clock is anchored
    pub pre_roll: Duration,

    /// Wait after the last window so the audio tail plays out
    pub trailing: Duration,

    /// Drive arm servos with idle gestures
    pub gestures: bool,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_millis(10),
            max_angle: 60.0,
            pre_roll: Duration::from_millis(750),
            trailing: Duration::from_millis(250),
            gestures: true,
        }
    }
}

/// Arm gesture configuration
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GestureConfig {
    /// Target range, cooldowns, and step
    pub settings: GestureSettings,

    /// Seed for reproducible gestures; entropy when unset
    pub seed: Option<u64>,
}

/// Servo configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoConfig {
    /// Actuator backend
    pub driver: ActuatorDriver,

    /// Mouth servo limits
    pub mouth: AngleRange,

    /// Arm servo limits
    pub arm: AngleRange,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            driver: ActuatorDriver::Noop,
            mouth: AngleRange::default(),
            arm: AngleRange::default(),
        }
    }
}

impl ServoConfig {
    /// Build the rig these settings describe
    #[must_use]
    pub fn build_rig(&self) -> Rig {
        Rig::with_driver(self.driver, self.mouth, self.arm)
    }
}

/// Audio output configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioConfig {
    /// Play through the default output device
    pub enabled: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load configuration from the environment and a config file
    ///
    /// With `path` set the file must exist and parse; otherwise the standard
    /// path is tried and skipped if absent.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit file cannot be read or the result is invalid
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let fc = match path {
            Some(path) => file::read_config_file(path)?,
            None => file::load_config_file(),
        };

        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Merge a parsed file with an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a duration is negative or the merged config is invalid
    pub fn from_sources(
        fc: file::ConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let defaults = Self::default();
        let env_parse = |key: &str| env(key).and_then(|v| v.trim().parse::<f64>().ok());
        let env_flag = |key: &str| env(key).map(|v| v == "1" || v.eq_ignore_ascii_case("true"));

        // Animation (env > toml > default)
        #[allow(clippy::cast_possible_truncation)]
        let max_angle = env_parse("SERVOMOUTH_MAX_ANGLE")
            .map(|v| v as f32)
            .or(fc.animation.max_angle)
            .unwrap_or(defaults.animation.max_angle);
        let animation = AnimationConfig {
            update_interval: env_parse("SERVOMOUTH_UPDATE_INTERVAL")
                .or(fc.animation.update_interval)
                .map(|s| seconds("animation.update_interval", s))
                .transpose()?
                .unwrap_or(defaults.animation.update_interval),
            max_angle,
            pre_roll: fc
                .animation
                .pre_roll
                .map(|s| seconds("animation.pre_roll", s))
                .transpose()?
                .unwrap_or(defaults.animation.pre_roll),
            trailing: fc
                .animation
                .trailing
                .map(|s| seconds("animation.trailing", s))
                .transpose()?
                .unwrap_or(defaults.animation.trailing),
            gestures: env_flag("SERVOMOUTH_GESTURES")
                .or(fc.animation.gestures)
                .unwrap_or(defaults.animation.gestures),
        };

        // Gestures (env seed > toml > default)
        let base = defaults.gesture.settings;
        let gesture = GestureConfig {
            settings: GestureSettings {
                range: AngleRange::new(
                    fc.gesture.min_angle.unwrap_or(base.range.min),
                    fc.gesture.max_angle.unwrap_or(base.range.max),
                ),
                min_cooldown: fc
                    .gesture
                    .min_cooldown
                    .map(|s| seconds("gesture.min_cooldown", s))
                    .transpose()?
                    .unwrap_or(base.min_cooldown),
                max_cooldown: fc
                    .gesture
                    .max_cooldown
                    .map(|s| seconds("gesture.max_cooldown", s))
                    .transpose()?
                    .unwrap_or(base.max_cooldown),
                max_step: fc.gesture.max_step.unwrap_or(base.max_step),
            },
            seed: env("SERVOMOUTH_SEED")
                .and_then(|s| s.trim().parse().ok())
                .or(fc.gesture.seed),
        };

        // Servos (env driver > toml > default)
        let servos = ServoConfig {
            driver: env("SERVOMOUTH_DRIVER")
                .and_then(|s| ActuatorDriver::from_name(&s))
                .or(fc.servos.driver)
                .unwrap_or(defaults.servos.driver),
            mouth: AngleRange::new(
                fc.servos.mouth.min_angle.unwrap_or(defaults.servos.mouth.min),
                fc.servos.mouth.max_angle.unwrap_or(defaults.servos.mouth.max),
            ),
            arm: AngleRange::new(
                fc.servos.arm.min_angle.unwrap_or(defaults.servos.arm.min),
                fc.servos.arm.max_angle.unwrap_or(defaults.servos.arm.max),
            ),
        };

        let audio = AudioConfig {
            enabled: env_flag("SERVOMOUTH_AUDIO")
                .or(fc.audio.enabled)
                .unwrap_or(defaults.audio.enabled),
        };

        let config = Self {
            animation,
            gesture,
            servos,
            audio,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check ranges and amounts that would make animation meaningless
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` describing the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.animation.update_interval.is_zero() {
            return Err(Error::Config("update interval must be positive".to_string()));
        }
        if !(self.animation.max_angle.is_finite() && self.animation.max_angle >= 0.0) {
            return Err(Error::Config(format!(
                "max angle must be a non-negative number, got {}",
                self.animation.max_angle
            )));
        }
        self.servos.mouth.validate("mouth servo")?;
        self.servos.arm.validate("arm servo")?;
        self.gesture.settings.validate()
    }
}

/// Convert a seconds value from config into a duration
fn seconds(field: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|e| Error::Config(format!("{field}: invalid duration {value}: {e}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::file::ConfigFile;
    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_sources() {
        let config = Config::from_sources(ConfigFile::default(), env_of(&[])).unwrap();

        assert_eq!(config.animation.update_interval, Duration::from_millis(10));
        assert!((config.animation.max_angle - 60.0).abs() < f32::EPSILON);
        assert_eq!(config.animation.pre_roll, Duration::from_millis(750));
        assert_eq!(config.animation.trailing, Duration::from_millis(250));
        assert!(config.animation.gestures);
        assert_eq!(config.servos.driver, ActuatorDriver::Noop);
        assert!(config.audio.enabled);
    }

    #[test]
    fn env_overrides_file() {
        let fc: ConfigFile = toml::from_str(
            "[animation]\nmax_angle = 30.0\nupdate_interval = 0.05\n[servos]\ndriver = \"noop\"\n",
        )
        .unwrap();
        let config = Config::from_sources(
            fc,
            env_of(&[
                ("SERVOMOUTH_MAX_ANGLE", "45"),
                ("SERVOMOUTH_DRIVER", "log"),
                ("SERVOMOUTH_SEED", "12"),
                ("SERVOMOUTH_AUDIO", "false"),
            ]),
        )
        .unwrap();

        assert!((config.animation.max_angle - 45.0).abs() < f32::EPSILON);
        assert_eq!(config.animation.update_interval, Duration::from_millis(50));
        assert_eq!(config.servos.driver, ActuatorDriver::Log);
        assert_eq!(config.gesture.seed, Some(12));
        assert!(!config.audio.enabled);
    }

    #[test]
    fn unparsable_env_is_ignored() {
        let config = Config::from_sources(
            ConfigFile::default(),
            env_of(&[("SERVOMOUTH_MAX_ANGLE", "wide"), ("SERVOMOUTH_DRIVER", "pwm")]),
        )
        .unwrap();

        assert!((config.animation.max_angle - 60.0).abs() < f32::EPSILON);
        assert_eq!(config.servos.driver, ActuatorDriver::Noop);
    }

    #[test]
    fn negative_duration_is_rejected() {
        let fc: ConfigFile = toml::from_str("[animation]\npre_roll = -1.0\n").unwrap();
        assert!(matches!(
            Config::from_sources(fc, env_of(&[])),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn inverted_gesture_range_is_rejected() {
        let fc: ConfigFile = toml::from_str("[gesture]\nmin_angle = 80.0\nmax_angle = 10.0\n").unwrap();
        assert!(Config::from_sources(fc, env_of(&[])).is_err());
    }

    #[test]
    fn rig_follows_servo_config() {
        let config = Config::default();
        let rig = config.servos.build_rig();
        assert_eq!(rig.mouth.name(), "mouth");
        assert_eq!(rig.arms.len(), 2);
        assert_eq!(rig.arms[1].name(), "arm-2");
    }
}
