//! Speech animation: plays a clip while the rig follows it
//!
//! Each `speak` call runs two units of work. The clip is rendered on a
//! blocking worker by an [`AudioOutput`]; the calling task walks the loudness
//! envelope, moves the servos, and sleeps to deadlines anchored on a single
//! start instant. The worker is always joined before the call returns.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::audio::{AudioClip, AudioOutput, Envelope, PlaybackStarted};
use crate::config::{AnimationConfig, Config, GestureConfig};
use crate::interrupt::{Interrupt, StopSignal};
use crate::motion::{GestureGenerator, PlaybackClock, Rig, gesture_rng};
use crate::{Error, Result};

/// Drives a rig in time with audio playback
pub struct Speaker {
    rig: Rig,
    output: Arc<dyn AudioOutput>,
    animation: AnimationConfig,
    gesture: GestureConfig,
    interrupt: Interrupt,
}

impl Speaker {
    /// Create a speaker over an explicit rig and output
    #[must_use]
    pub fn new(
        rig: Rig,
        output: Arc<dyn AudioOutput>,
        animation: AnimationConfig,
        gesture: GestureConfig,
    ) -> Self {
        Self {
            rig,
            output,
            animation,
            gesture,
            interrupt: Interrupt::new(),
        }
    }

    /// Create a speaker with the rig described by `config`
    #[must_use]
    pub fn from_config(config: &Config, output: Arc<dyn AudioOutput>) -> Self {
        Self::new(
            config.servos.build_rig(),
            output,
            config.animation,
            config.gesture,
        )
    }

    /// Handle that stops the current call early
    ///
    /// A triggered interrupt stays triggered until [`Interrupt::reset`].
    #[must_use]
    pub fn interrupt(&self) -> Interrupt {
        self.interrupt.clone()
    }

    /// The servos being driven
    #[must_use]
    pub const fn rig(&self) -> &Rig {
        &self.rig
    }

    /// Mutable access to the servos between calls
    pub const fn rig_mut(&mut self) -> &mut Rig {
        &mut self.rig
    }

    /// Animation settings in effect
    #[must_use]
    pub const fn animation(&self) -> &AnimationConfig {
        &self.animation
    }

    /// Play a clip and animate with the configured interval and mouth range
    ///
    /// # Errors
    ///
    /// See [`Speaker::speak_with`]
    pub async fn speak(&mut self, clip: Arc<AudioClip>) -> Result<()> {
        let AnimationConfig {
            update_interval,
            max_angle,
            ..
        } = self.animation;
        self.speak_with(clip, update_interval, max_angle).await
    }

    /// Play a clip and animate the rig until both are done
    ///
    /// # Errors
    ///
    /// - `Error::Config` if `update_interval` is shorter than one sample;
    ///   nothing is played
    /// - `Error::PlaybackStart` if the output cannot start; no servo moves
    /// - `Error::Interrupted` if the interrupt fires mid-call
    /// - `Error::Audio` if playback fails after starting
    pub async fn speak_with(
        &mut self,
        clip: Arc<AudioClip>,
        update_interval: Duration,
        max_angle: f32,
    ) -> Result<()> {
        let envelope = Envelope::new(&clip, update_interval)?;

        if self.interrupt.is_triggered() {
            return Err(Error::Interrupted);
        }

        let signal = self.interrupt.signal();
        let (started, started_rx) = PlaybackStarted::channel();
        let playback = {
            let output = Arc::clone(&self.output);
            let clip = Arc::clone(&clip);
            let signal = signal.clone();
            tokio::task::spawn_blocking(move || output.play(&clip, started, &signal))
        };

        if started_rx.await.is_err() {
            let err = match playback.await {
                Ok(Err(e @ Error::PlaybackStart(_))) => e,
                Ok(Err(e)) => Error::PlaybackStart(e.to_string()),
                Ok(Ok(())) => Error::PlaybackStart("output returned before starting".to_string()),
                Err(e) => Error::PlaybackStart(format!("playback task failed: {e}")),
            };
            tracing::error!(error = %err, "not animating without audio");
            return Err(err);
        }

        tracing::debug!(
            duration_ms = clip.duration().as_millis(),
            sample_rate = clip.sample_rate(),
            "playback started"
        );

        let animated = self.animate(envelope, max_angle, signal).await;
        self.rig.mouth.rest();
        let played = join_playback(playback).await;

        match (animated, played) {
            (Err(e), _) | (Ok(()), Err(e)) => Err(e),
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    /// Walk the envelope, moving the servos on each window's deadline
    async fn animate(
        &mut self,
        envelope: Envelope,
        max_angle: f32,
        mut stop: StopSignal,
    ) -> Result<()> {
        if !self.animation.pre_roll.is_zero() {
            pause(self.animation.pre_roll, &mut stop).await?;
        }

        let clock = PlaybackClock::start_now(envelope.sample_rate());
        let mut gestures: Vec<GestureGenerator> = if self.animation.gestures {
            (0..self.rig.arms.len())
                .map(|i| {
                    GestureGenerator::new(
                        self.gesture.settings,
                        clock.start(),
                        gesture_rng(self.gesture.seed, i),
                    )
                })
                .collect()
        } else {
            Vec::new()
        };

        let windows = envelope.len();
        tracing::debug!(
            windows,
            window_len = envelope.window_len(),
            max_angle,
            gestures = gestures.len(),
            "animation started"
        );

        let mut late = 0_usize;
        let mut worst_lateness = Duration::ZERO;

        for window in envelope {
            let now = Instant::now();
            for (arm, gesture) in self.rig.arms.iter_mut().zip(&mut gestures) {
                let angle = gesture.tick(now, arm.angle());
                arm.set_angle(angle);
            }

            let angle = window.angle(max_angle);
            self.rig.mouth.set_angle(angle);
            tracing::trace!(
                window = window.index,
                loudness = window.loudness,
                angle,
                "window applied"
            );

            let now = Instant::now();
            let delay = clock.delay_until(window.end_offset(), now);
            if delay.is_zero() {
                late += 1;
                worst_lateness = worst_lateness.max(clock.lateness(window.end_offset(), now));
                if stop.is_stopped() {
                    return Err(Error::Interrupted);
                }
            } else {
                pause(delay, &mut stop).await?;
            }
        }

        tracing::debug!(
            windows,
            late,
            worst_lateness_ms = worst_lateness.as_millis(),
            elapsed_ms = clock.start().elapsed().as_millis(),
            "animation finished"
        );

        pause(self.animation.trailing, &mut stop).await
    }
}

/// Sleep unless the stop signal fires first
async fn pause(duration: Duration, stop: &mut StopSignal) -> Result<()> {
    tokio::select! {
        () = tokio::time::sleep(duration) => Ok(()),
        () = stop.stopped() => {
            tracing::debug!("animation interrupted");
            Err(Error::Interrupted)
        }
    }
}

async fn join_playback(playback: JoinHandle<Result<()>>) -> Result<()> {
    playback
        .await
        .map_err(|e| Error::Audio(format!("playback task failed: {e}")))?
}
