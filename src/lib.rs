//! servomouth - audio-reactive servo animation
//!
//! Plays a clip while a "mouth" servo follows its loudness envelope and two
//! "arm" servos wander through random, rate-limited gestures.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   windows   ┌──────────────────┐  angles  ┌──────────┐
//! │   Envelope   │────────────▶│     Speaker      │─────────▶│   Rig    │
//! │ (windowed RMS)│            │ clock + gestures │          │ (servos) │
//! └──────▲───────┘             └────────┬─────────┘          └──────────┘
//!        │                              │ spawn / join
//!   AudioClip ─────────────────▶ playback task (AudioOutput)
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod interrupt;
pub mod motion;
pub mod speaker;

pub use audio::{AudioClip, AudioOutput, CpalOutput, Envelope, EnvelopeWindow, SilentOutput};
pub use config::Config;
pub use error::{Error, Result};
pub use interrupt::{Interrupt, StopSignal};
pub use motion::{Actuator, ActuatorDriver, AngleRange, GestureGenerator, Rig, Servo};
pub use speaker::Speaker;
