//! Shared test utilities

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use servomouth::audio::{AudioClip, AudioOutput, PlaybackStarted, SilentOutput};
use servomouth::config::{AnimationConfig, GestureConfig};
use servomouth::motion::{Actuator, AngleRange, Rig, Servo};
use servomouth::{Error, Result, Speaker, StopSignal};

/// Generate a mono sine clip
pub fn sine_clip(frequency: f32, duration_secs: f32, amplitude: f32, sample_rate: u32) -> AudioClip {
    let num_samples = (sample_rate as f32 * duration_secs) as usize;
    let samples = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect();
    AudioClip::from_mono(samples, sample_rate).unwrap()
}

/// Generate a mono clip holding one constant value
pub fn dc_clip(value: f32, num_samples: usize, sample_rate: u32) -> AudioClip {
    AudioClip::from_mono(vec![value; num_samples], sample_rate).unwrap()
}

/// Actuator that remembers every accepted angle
#[derive(Clone, Default)]
pub struct RecordingActuator {
    writes: Arc<Mutex<Vec<f32>>>,
    /// Fail every n-th write (1-based); 0 never fails
    fail_every: usize,
    /// Time each write blocks for
    delay: Duration,
    attempts: Arc<AtomicUsize>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_every(n: usize) -> Self {
        Self {
            fail_every: n,
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn writes(&self) -> Vec<f32> {
        self.writes.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Actuator for RecordingActuator {
    fn set_angle(&mut self, degrees: f32) -> Result<()> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_every > 0 && attempt % self.fail_every == 0 {
            return Err(Error::Actuator(format!("write {attempt} dropped")));
        }
        self.writes.lock().unwrap().push(degrees);
        Ok(())
    }
}

/// A mouth and two arms, each recording its writes
pub struct RecordedRig {
    pub mouth: RecordingActuator,
    pub arms: [RecordingActuator; 2],
}

impl RecordedRig {
    pub fn new() -> Self {
        Self::with_mouth(RecordingActuator::new())
    }

    pub fn with_mouth(mouth: RecordingActuator) -> Self {
        Self {
            mouth,
            arms: [RecordingActuator::new(), RecordingActuator::new()],
        }
    }

    pub fn rig(&self) -> Rig {
        let servo = |name: &str, actuator: &RecordingActuator| {
            Servo::new(name, AngleRange::default(), Box::new(actuator.clone()))
        };
        Rig::new(
            servo("mouth", &self.mouth),
            vec![servo("arm-1", &self.arms[0]), servo("arm-2", &self.arms[1])],
        )
    }
}

/// Silent output that counts how often it was asked to play
#[derive(Clone, Default)]
pub struct CountingOutput {
    plays: Arc<AtomicUsize>,
}

impl CountingOutput {
    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }
}

impl AudioOutput for CountingOutput {
    fn play(&self, clip: &AudioClip, started: PlaybackStarted, stop: &StopSignal) -> Result<()> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        SilentOutput.play(clip, started, stop)
    }
}

/// Output whose device can never be opened
pub struct BrokenOutput;

impl AudioOutput for BrokenOutput {
    fn play(&self, _clip: &AudioClip, _started: PlaybackStarted, _stop: &StopSignal) -> Result<()> {
        Err(Error::PlaybackStart("no output device".to_string()))
    }
}

/// Animation settings without pre-roll
pub fn animation(update_interval: Duration, max_angle: f32) -> AnimationConfig {
    AnimationConfig {
        update_interval,
        max_angle,
        pre_roll: Duration::ZERO,
        ..AnimationConfig::default()
    }
}

/// Speaker over a recorded rig with seeded gestures
pub fn speaker(
    recorded: &RecordedRig,
    output: Arc<dyn AudioOutput>,
    animation: AnimationConfig,
) -> Speaker {
    let gesture = GestureConfig {
        seed: Some(1),
        ..GestureConfig::default()
    };
    Speaker::new(recorded.rig(), output, animation, gesture)
}
