//! Windowed RMS loudness envelope
//!
//! The clip is downmixed, peak-normalized, and cut into fixed-length windows.
//! Loudness is computed lazily as the iterator advances.

use std::time::Duration;

use super::AudioClip;
use crate::{Error, Result};

/// One window of the loudness envelope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeWindow {
    /// Position in the window sequence
    pub index: usize,
    /// First frame covered by the window
    pub sample_offset: usize,
    /// Number of frames in the window
    pub len: usize,
    /// RMS of the normalized samples, in `[0, 1]`
    pub loudness: f32,
}

impl EnvelopeWindow {
    /// Frame offset just past this window
    #[must_use]
    pub const fn end_offset(&self) -> usize {
        self.sample_offset + self.len
    }

    /// Map loudness onto `[0, max_angle]`
    #[must_use]
    pub fn angle(&self, max_angle: f32) -> f32 {
        self.loudness * max_angle
    }
}

/// Number of frames per window for an update interval
///
/// # Errors
///
/// Returns error if the interval is not a positive finite number or rounds to
/// an empty window at this sample rate
pub fn window_len(update_interval: Duration, sample_rate: u32) -> Result<usize> {
    let secs = update_interval.as_secs_f64();
    if !secs.is_normal() {
        return Err(Error::Config(format!(
            "update interval must be positive, got {update_interval:?}"
        )));
    }

    let frames = (secs * f64::from(sample_rate)).round();
    if frames < 1.0 {
        return Err(Error::Config(format!(
            "update interval {update_interval:?} is shorter than one sample at {sample_rate} Hz"
        )));
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(frames as usize)
}

/// Lazy, single-pass sequence of envelope windows
#[derive(Debug)]
pub struct Envelope {
    samples: Vec<f32>,
    sample_rate: u32,
    window_len: usize,
    offset: usize,
    index: usize,
}

impl Envelope {
    /// Prepare the envelope of a clip
    ///
    /// # Errors
    ///
    /// Returns error if the window length resolves to zero
    pub fn new(clip: &AudioClip, update_interval: Duration) -> Result<Self> {
        // A window longer than the clip covers the whole clip
        let window_len =
            window_len(update_interval, clip.sample_rate())?.min(clip.frames().max(1));

        tracing::trace!(
            frames = clip.frames(),
            window_len,
            sample_rate = clip.sample_rate(),
            "envelope prepared"
        );

        Ok(Self {
            samples: clip.normalized_mono(),
            sample_rate: clip.sample_rate(),
            window_len,
            offset: 0,
            index: 0,
        })
    }

    /// Frames per full window
    #[must_use]
    pub const fn window_len(&self) -> usize {
        self.window_len
    }

    /// Sample rate the offsets are expressed in
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Total frames covered by the envelope
    #[must_use]
    pub fn total_frames(&self) -> usize {
        self.samples.len()
    }
}

impl Iterator for Envelope {
    type Item = EnvelopeWindow;

    fn next(&mut self) -> Option<Self::Item> {
        let end = self.offset.saturating_add(self.window_len).min(self.samples.len());
        if end <= self.offset {
            return None;
        }

        let window = EnvelopeWindow {
            index: self.index,
            sample_offset: self.offset,
            len: end - self.offset,
            loudness: rms(&self.samples[self.offset..end]),
        };

        self.offset = end;
        self.index += 1;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.samples.len() - self.offset).div_ceil(self.window_len);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Envelope {}

/// Root-mean-square of a block of samples, clamped to `[0, 1]`
#[allow(clippy::cast_precision_loss)]
fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt().clamp(0.0, 1.0)
}
