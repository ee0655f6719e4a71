//! Wall-clock anchor for window deadlines
//!
//! Every deadline is measured from the same start instant, so per-window
//! jitter and sleep rounding never accumulate.

use std::time::Duration;

use tokio::time::Instant;

/// Maps frame offsets in a clip to instants on the wall clock
#[derive(Debug, Clone, Copy)]
pub struct PlaybackClock {
    start: Instant,
    sample_rate: u32,
}

impl PlaybackClock {
    /// Anchor the clock at `start`
    #[must_use]
    pub const fn new(start: Instant, sample_rate: u32) -> Self {
        Self { start, sample_rate }
    }

    /// Anchor the clock at the current instant
    #[must_use]
    pub fn start_now(sample_rate: u32) -> Self {
        Self::new(Instant::now(), sample_rate)
    }

    /// Instant the clock was anchored at
    #[must_use]
    pub const fn start(&self) -> Instant {
        self.start
    }

    /// Offset of a frame from the start of the clip
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn offset_duration(&self, sample_offset: usize) -> Duration {
        Duration::from_secs_f64(sample_offset as f64 / f64::from(self.sample_rate))
    }

    /// When the frame at `sample_offset` should be heard
    #[must_use]
    pub fn ideal_time(&self, sample_offset: usize) -> Instant {
        self.start + self.offset_duration(sample_offset)
    }

    /// How long to wait from `now` until the frame is due; zero when late
    #[must_use]
    pub fn delay_until(&self, sample_offset: usize, now: Instant) -> Duration {
        self.ideal_time(sample_offset).saturating_duration_since(now)
    }

    /// How far past its deadline `now` is; zero when early
    #[must_use]
    pub fn lateness(&self, sample_offset: usize, now: Instant) -> Duration {
        now.saturating_duration_since(self.ideal_time(sample_offset))
    }
}
