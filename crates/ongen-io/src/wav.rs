//! WAV and raw PCM files.

use crate::Result;
use hound::{SampleFormat, WavReader, WavWriter};
use std::path::Path;

/// WAV file metadata read from the header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavInfo {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
}

/// Write interleaved 16-bit samples as a PCM WAV file.
///
/// `samples.len()` should be a multiple of `channels`.
pub fn write_wav<P: AsRef<Path>>(
    path: P,
    samples: &[i16],
    channels: u16,
    sample_rate: u32,
) -> Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path.as_ref(), spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    tracing::debug!(
        path = %path.as_ref().display(),
        samples = samples.len(),
        channels,
        sample_rate,
        "wrote wav"
    );
    Ok(())
}

/// Write PCM bytes exactly as given, with no header.
pub fn write_raw<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<()> {
    std::fs::write(path.as_ref(), bytes)?;
    tracing::debug!(path = %path.as_ref().display(), bytes = bytes.len(), "wrote raw pcm");
    Ok(())
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let num_frames = u64::from(reader.len()) / u64::from(spec.channels.max(1));
    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs: num_frames as f64 / f64::from(spec.sample_rate),
    })
}

/// Read the interleaved samples of a 16-bit PCM WAV file.
pub fn read_wav_i16<P: AsRef<Path>>(path: P) -> Result<(Vec<i16>, WavInfo)> {
    let path = path.as_ref();
    let info = read_wav_info(path)?;
    let reader = WavReader::open(path)?;
    let samples = reader
        .into_samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((samples, info))
}
