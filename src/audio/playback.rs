//! Audio output for the playback task
//!
//! Outputs are blocking: `play` returns once the whole clip has been rendered,
//! the stop signal fires, or the device fails. The start handshake lets the
//! control loop refuse to animate when no audio will be heard.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, StreamConfig};
use tokio::sync::oneshot;

use super::AudioClip;
use crate::interrupt::StopSignal;
use crate::{Error, Result};

/// How often a blocking output checks for completion or stop
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Extra time allowed past the clip length before giving up on the device
const PLAYBACK_GRACE: Duration = Duration::from_millis(500);

/// Tail kept alive after the last sample so the device buffer drains
const DRAIN_DELAY: Duration = Duration::from_millis(100);

/// Something that can render a clip audibly
pub trait AudioOutput: Send + Sync {
    /// Play the clip to completion
    ///
    /// Implementations call [`PlaybackStarted::notify`] once audio is flowing.
    /// Returning before notifying counts as a start failure.
    ///
    /// # Errors
    ///
    /// Returns error if the device cannot be opened or the stream fails
    fn play(&self, clip: &AudioClip, started: PlaybackStarted, stop: &StopSignal) -> Result<()>;
}

/// One-shot notification that playback is under way
#[derive(Debug)]
pub struct PlaybackStarted(oneshot::Sender<()>);

impl PlaybackStarted {
    /// Pair a notifier with the receiver the control loop awaits
    #[must_use]
    pub fn channel() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self(tx), rx)
    }

    /// Signal that audio is flowing
    pub fn notify(self) {
        // Receiver gone means the caller stopped waiting
        let _ = self.0.send(());
    }
}

/// Plays to the default output device
pub struct CpalOutput {
    device_name: String,
}

impl CpalOutput {
    /// Check that an output device exists
    ///
    /// # Errors
    ///
    /// Returns error if no output device is available
    pub fn new() -> Result<Self> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;
        let device_name = device.name().unwrap_or_default();

        tracing::debug!(device = %device_name, "audio output initialized");

        Ok(Self { device_name })
    }

    /// Name of the device found at construction
    #[must_use]
    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl AudioOutput for CpalOutput {
    fn play(&self, clip: &AudioClip, started: PlaybackStarted, stop: &StopSignal) -> Result<()> {
        if clip.is_empty() {
            started.notify();
            return Ok(());
        }

        let device = cpal::default_host()
            .default_output_device()
            .ok_or_else(|| Error::PlaybackStart("no output device".to_string()))?;
        let config = output_config(&device, clip.sample_rate())?;
        let channels = usize::from(config.channels);

        let samples: Arc<[f32]> = clip.to_mono().into();
        let position = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let stream = {
            let samples = Arc::clone(&samples);
            let position = Arc::clone(&position);
            let finished = Arc::clone(&finished);
            device
                .build_output_stream(
                    &config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        let mut pos = position.load(Ordering::Relaxed);
                        for frame in data.chunks_mut(channels) {
                            let sample = samples.get(pos).copied().unwrap_or(0.0);
                            frame.fill(sample);
                            if pos < samples.len() {
                                pos += 1;
                            }
                        }
                        position.store(pos, Ordering::Relaxed);
                        if pos >= samples.len() {
                            finished.store(true, Ordering::Release);
                        }
                    },
                    |err| {
                        tracing::error!(error = %err, "audio playback error");
                    },
                    None,
                )
                .map_err(|e| Error::PlaybackStart(e.to_string()))?
        };

        stream
            .play()
            .map_err(|e| Error::PlaybackStart(e.to_string()))?;
        started.notify();

        tracing::debug!(
            device = %self.device_name,
            sample_rate = clip.sample_rate(),
            channels,
            frames = samples.len(),
            "playback started"
        );

        let timeout = clip.duration() + PLAYBACK_GRACE;
        let begun = Instant::now();

        while !finished.load(Ordering::Acquire) {
            if stop.is_stopped() {
                tracing::debug!(position = position.load(Ordering::Relaxed), "playback stopped early");
                drop(stream);
                return Ok(());
            }
            if begun.elapsed() > timeout {
                tracing::warn!(?timeout, "playback did not finish in time");
                break;
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        std::thread::sleep(DRAIN_DELAY);
        drop(stream);
        tracing::debug!(frames = samples.len(), "playback complete");

        Ok(())
    }
}

/// Pick a mono (or failing that, stereo) config at the clip's rate
fn output_config(device: &Device, sample_rate: u32) -> Result<StreamConfig> {
    let rate = SampleRate(sample_rate);
    let supports = |channels: u16| {
        device.supported_output_configs().ok()?.find(|c| {
            c.channels() == channels && c.min_sample_rate() <= rate && c.max_sample_rate() >= rate
        })
    };

    let supported = supports(1).or_else(|| supports(2)).ok_or_else(|| {
        Error::PlaybackStart(format!("no output config supports {sample_rate} Hz"))
    })?;

    Ok(supported.with_sample_rate(rate).config())
}

/// Output that renders nothing but takes as long as the clip
///
/// Used on machines without audio so animation timing stays identical.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentOutput;

impl AudioOutput for SilentOutput {
    fn play(&self, clip: &AudioClip, started: PlaybackStarted, stop: &StopSignal) -> Result<()> {
        started.notify();

        let deadline = Instant::now() + clip.duration();
        loop {
            if stop.is_stopped() {
                return Ok(());
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(());
            }
            std::thread::sleep(remaining.min(POLL_INTERVAL));
        }
    }
}
