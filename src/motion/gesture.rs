//! Randomized idle gestures for the arm servos
//!
//! Each generator picks a random target inside its sub-range, holds it for a
//! random cooldown, then picks another. The angle it reports walks toward the
//! target by at most `max_step` per tick. Retargeting is polled on every tick
//! rather than driven by its own timer.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;

use super::AngleRange;
use crate::{Error, Result};

/// Shape of the gestures a generator produces
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSettings {
    /// Targets are drawn uniformly from this range
    pub range: AngleRange,
    /// Shortest hold before retargeting
    pub min_cooldown: Duration,
    /// Longest hold before retargeting
    pub max_cooldown: Duration,
    /// Largest angle change per tick, in degrees
    pub max_step: f32,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            range: AngleRange::new(0.0, 90.0),
            min_cooldown: Duration::from_secs(2),
            max_cooldown: Duration::from_secs(5),
            max_step: 1.0,
        }
    }
}

impl GestureSettings {
    /// Reject settings that cannot produce gestures
    ///
    /// # Errors
    ///
    /// Returns error for an invalid range, inverted or zero cooldowns, or a
    /// non-positive step
    pub fn validate(&self) -> Result<()> {
        self.range.validate("gesture")?;
        if self.min_cooldown.is_zero() || self.min_cooldown > self.max_cooldown {
            return Err(Error::Config(format!(
                "gesture cooldown must satisfy 0 < min <= max, got {:?}..{:?}",
                self.min_cooldown, self.max_cooldown
            )));
        }
        if !(self.max_step.is_finite() && self.max_step > 0.0) {
            return Err(Error::Config(format!(
                "gesture step must be positive, got {}",
                self.max_step
            )));
        }
        Ok(())
    }
}

/// Random stream for generator `index`
///
/// With a seed each generator gets its own derived seed; without one each is
/// seeded from OS entropy.
#[must_use]
pub fn gesture_rng(seed: Option<u64>, index: usize) -> StdRng {
    seed.map_or_else(StdRng::from_entropy, |seed| {
        StdRng::seed_from_u64(seed.wrapping_add(index as u64))
    })
}

/// Retargeting state for one arm
#[derive(Debug)]
pub struct GestureGenerator {
    settings: GestureSettings,
    target: f32,
    next_retarget: Instant,
    retargets: usize,
    rng: StdRng,
}

impl GestureGenerator {
    /// Start a generator at `start` with an initial target and cooldown
    #[must_use]
    pub fn new(settings: GestureSettings, start: Instant, mut rng: StdRng) -> Self {
        let target = draw_angle(&mut rng, settings.range);
        let next_retarget = start + draw_cooldown(&mut rng, &settings);

        Self {
            settings,
            target,
            next_retarget,
            retargets: 0,
            rng,
        }
    }

    /// Advance one tick and return the next angle for the arm
    ///
    /// `current` is the arm's present angle.
    pub fn tick(&mut self, now: Instant, current: f32) -> f32 {
        if now >= self.next_retarget {
            self.target = draw_angle(&mut self.rng, self.settings.range);
            // Additive so tick granularity never shortens the mean cooldown
            self.next_retarget += draw_cooldown(&mut self.rng, &self.settings);
            self.retargets += 1;
            tracing::trace!(target = self.target, retargets = self.retargets, "gesture retarget");
        }

        let step = self.settings.max_step;
        current + (self.target - current).clamp(-step, step)
    }

    /// Angle currently being approached
    #[must_use]
    pub const fn target(&self) -> f32 {
        self.target
    }

    /// When the next retarget is due
    #[must_use]
    pub const fn next_retarget(&self) -> Instant {
        self.next_retarget
    }

    /// Retargets so far (the initial target is not counted)
    #[must_use]
    pub const fn retargets(&self) -> usize {
        self.retargets
    }
}

fn draw_angle(rng: &mut StdRng, range: AngleRange) -> f32 {
    if range.min >= range.max {
        return range.min;
    }
    rng.gen_range(range.min..=range.max)
}

fn draw_cooldown(rng: &mut StdRng, settings: &GestureSettings) -> Duration {
    let min = settings.min_cooldown.as_secs_f64();
    let max = settings.max_cooldown.as_secs_f64();
    if min >= max {
        return settings.min_cooldown;
    }
    Duration::from_secs_f64(rng.gen_range(min..=max))
}
