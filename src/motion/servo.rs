//! Actuator interface and per-servo state

use std::fmt;

use serde::Deserialize;

use crate::{Error, Result};

/// Inclusive angle range in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleRange {
    /// Lowest allowed angle
    pub min: f32,
    /// Highest allowed angle
    pub max: f32,
}

impl AngleRange {
    /// Create a range
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clamp an angle into the range
    #[must_use]
    pub fn clamp(&self, degrees: f32) -> f32 {
        degrees.clamp(self.min, self.max)
    }

    /// Whether the angle lies inside the range
    #[must_use]
    pub fn contains(&self, degrees: f32) -> bool {
        (self.min..=self.max).contains(&degrees)
    }

    /// Reject non-finite or inverted ranges
    ///
    /// # Errors
    ///
    /// Returns error naming `what` if the range is unusable
    pub fn validate(&self, what: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(Error::Config(format!(
                "{what}: invalid angle range [{}, {}]",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

impl Default for AngleRange {
    fn default() -> Self {
        Self::new(0.0, 180.0)
    }
}

/// Anything that accepts an angle command
///
/// Writes are expected to be fast and non-blocking.
pub trait Actuator: Send {
    /// Command the actuator to an angle in degrees
    ///
    /// # Errors
    ///
    /// Returns error if the command could not be delivered
    fn set_angle(&mut self, degrees: f32) -> Result<()>;
}

/// Discards every command; stands in when no hardware is attached
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopActuator;

impl Actuator for NoopActuator {
    fn set_angle(&mut self, _degrees: f32) -> Result<()> {
        Ok(())
    }
}

/// Reports every command through `tracing`
#[derive(Debug, Clone)]
pub struct LogActuator {
    name: String,
}

impl LogActuator {
    /// Create a logger for the named servo
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Actuator for LogActuator {
    fn set_angle(&mut self, degrees: f32) -> Result<()> {
        tracing::debug!(servo = %self.name, "servo -> {degrees:.1}°");
        Ok(())
    }
}

/// Which actuator implementation backs the rig
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActuatorDriver {
    /// Silently accept commands
    #[default]
    Noop,
    /// Log commands
    Log,
}

impl ActuatorDriver {
    /// Parse a driver name (case-insensitive)
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "noop" | "none" => Some(Self::Noop),
            "log" => Some(Self::Log),
            _ => None,
        }
    }

    /// Build an actuator for the named servo
    #[must_use]
    pub fn build(self, name: &str) -> Box<dyn Actuator> {
        match self {
            Self::Noop => Box::new(NoopActuator),
            Self::Log => Box::new(LogActuator::new(name)),
        }
    }
}

/// One servo: its limits, last accepted angle, and the actuator behind it
pub struct Servo {
    name: String,
    limits: AngleRange,
    angle: f32,
    actuator: Box<dyn Actuator>,
}

impl fmt::Debug for Servo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Servo")
            .field("name", &self.name)
            .field("limits", &self.limits)
            .field("angle", &self.angle)
            .finish_non_exhaustive()
    }
}

impl Servo {
    /// Wrap an actuator; the servo is assumed to rest at its minimum angle
    #[must_use]
    pub fn new(name: impl Into<String>, limits: AngleRange, actuator: Box<dyn Actuator>) -> Self {
        Self {
            name: name.into(),
            angle: limits.min,
            limits,
            actuator,
        }
    }

    /// Command a new angle, clamped to the servo's limits
    ///
    /// Failures are logged and swallowed; the stored angle only changes when
    /// the actuator accepts the command. Returns whether it did.
    pub fn set_angle(&mut self, degrees: f32) -> bool {
        let clamped = self.limits.clamp(degrees);
        match self.actuator.set_angle(clamped) {
            Ok(()) => {
                self.angle = clamped;
                true
            }
            Err(e) => {
                tracing::warn!(servo = %self.name, angle = clamped, error = %e, "servo write failed");
                false
            }
        }
    }

    /// Return to the rest (minimum) angle
    pub fn rest(&mut self) -> bool {
        self.set_angle(self.limits.min)
    }

    /// Last accepted angle
    #[must_use]
    pub const fn angle(&self) -> f32 {
        self.angle
    }

    /// Servo name, used in logs
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mechanical limits
    #[must_use]
    pub const fn limits(&self) -> AngleRange {
        self.limits
    }
}
