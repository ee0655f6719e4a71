//! Audio clips, loudness envelopes, and playback
//!
//! Clips arrive as PCM; nothing here decodes compressed formats or resamples.

mod clip;
mod envelope;
mod playback;
mod wav;

pub use clip::AudioClip;
pub use envelope::{Envelope, EnvelopeWindow, window_len};
pub use playback::{AudioOutput, CpalOutput, PlaybackStarted, SilentOutput};
pub use wav::{read_wav, wav_bytes_to_clip};
