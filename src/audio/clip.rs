//! In-memory PCM clips

use std::time::Duration;

use crate::{Error, Result};

/// An immutable block of interleaved PCM samples
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioClip {
    /// Create a clip from interleaved samples
    ///
    /// # Errors
    ///
    /// Returns error if the sample rate or channel count is zero, or the
    /// sample count does not divide into whole frames
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::Config("sample rate must be positive".to_string()));
        }
        if channels == 0 {
            return Err(Error::Config("channel count must be positive".to_string()));
        }
        if samples.len() % usize::from(channels) != 0 {
            return Err(Error::Config(format!(
                "{} samples do not divide into {channels}-channel frames",
                samples.len()
            )));
        }

        Ok(Self {
            samples,
            sample_rate,
            channels,
        })
    }

    /// Create a single-channel clip
    ///
    /// # Errors
    ///
    /// Returns error if the sample rate is zero
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::new(samples, sample_rate, 1)
    }

    /// Interleaved samples
    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels
    #[must_use]
    pub const fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of frames (samples per channel)
    #[must_use]
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }

    /// Whether the clip holds no frames
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playing time of the clip
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate))
    }

    /// Downmix to one channel by averaging each frame
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_mono(&self) -> Vec<f32> {
        if self.channels == 1 {
            return self.samples.clone();
        }

        let channels = usize::from(self.channels);
        self.samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    }

    /// Mono samples scaled so the loudest sample has magnitude 1.0
    ///
    /// A silent clip stays all zero. Non-finite samples are treated as silence.
    #[must_use]
    pub fn normalized_mono(&self) -> Vec<f32> {
        let mut mono = self.to_mono();
        for sample in mono.iter_mut().filter(|s| !s.is_finite()) {
            *sample = 0.0;
        }
        let peak = mono.iter().fold(0.0_f32, |peak, s| peak.max(s.abs()));

        if peak > 0.0 && peak.is_finite() {
            for sample in &mut mono {
                *sample /= peak;
            }
        }

        mono
    }
}
