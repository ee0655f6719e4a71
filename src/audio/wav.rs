//! WAV clip loading

use std::io::Read;
use std::path::Path;

use hound::{SampleFormat, WavReader};

use super::AudioClip;
use crate::{Error, Result};

/// Load a PCM WAV file into a clip
///
/// # Errors
///
/// Returns error if the file cannot be opened or is not PCM WAV
pub fn read_wav(path: impl AsRef<Path>) -> Result<AudioClip> {
    let path = path.as_ref();
    let reader = WavReader::open(path)?;
    let clip = clip_from_reader(reader)?;

    tracing::debug!(
        path = %path.display(),
        sample_rate = clip.sample_rate(),
        channels = clip.channels(),
        duration_ms = clip.duration().as_millis(),
        "loaded clip"
    );

    Ok(clip)
}

/// Decode WAV bytes already in memory
///
/// # Errors
///
/// Returns error if the bytes are not PCM WAV
pub fn wav_bytes_to_clip(bytes: &[u8]) -> Result<AudioClip> {
    clip_from_reader(WavReader::new(std::io::Cursor::new(bytes))?)
}

#[allow(clippy::cast_precision_loss)]
fn clip_from_reader<R: Read>(reader: WavReader<R>) -> Result<AudioClip> {
    let spec = reader.spec();

    let samples = match spec.sample_format {
        SampleFormat::Float => reader.into_samples::<f32>().collect::<hound::Result<Vec<_>>>()?,
        SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(Error::Audio(format!(
                    "unsupported bit depth: {}",
                    spec.bits_per_sample
                )));
            }
            // Scale to [-1, 1]; the envelope renormalizes anyway
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<hound::Result<Vec<_>>>()?
        }
    };

    AudioClip::new(samples, spec.sample_rate, spec.channels)
}
