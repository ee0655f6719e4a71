//! Error types for servomouth

use thiserror::Error;

/// Result type alias for servomouth operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while animating a rig
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (bad interval, inverted ranges, malformed clip)
    #[error("configuration error: {0}")]
    Config(String),

    /// A single actuator write failed
    #[error("actuator error: {0}")]
    Actuator(String),

    /// Audio output could not be started
    #[error("playback failed to start: {0}")]
    PlaybackStart(String),

    /// Audio device or stream error after playback started
    #[error("audio error: {0}")]
    Audio(String),

    /// Playback and animation were stopped on request
    #[error("interrupted")]
    Interrupted,

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// WAV parsing error
    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
