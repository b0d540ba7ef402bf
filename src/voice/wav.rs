//! WAV encoding and inspection

use std::io::Cursor;
use std::time::Duration;

use crate::{Error, Result};

/// Sample rate used for generated speech fixtures and terminal recordings
pub const SAMPLE_RATE: u32 = 16000;

/// Shape and level of a decoded WAV clip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavSummary {
    pub sample_rate: u32,
    pub channels: u16,
    /// Samples across all channels
    pub samples: usize,
    /// Peak absolute amplitude, normalized to [0.0, 1.0]
    pub peak: f32,
}

impl WavSummary {
    /// Playback length of the clip
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 || self.channels == 0 {
            return Duration::ZERO;
        }
        let frames = self.samples / usize::from(self.channels);
        Duration::from_secs_f64(frames as f64 / f64::from(self.sample_rate))
    }

    /// No sample rose above the quantization floor
    #[must_use]
    pub fn is_silent(&self) -> bool {
        self.peak < 1.0 / 32768.0
    }
}

/// Convert f32 samples to mono 16-bit WAV bytes
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;

        for &sample in samples {
            // Convert f32 [-1.0, 1.0] to i16
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer.write_sample(sample_i16)?;
        }

        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

/// Decode a WAV clip and measure its length and peak level
///
/// # Errors
///
/// Returns `Error::Wav` if the bytes are not a readable WAV file
pub fn inspect_wav(bytes: &[u8]) -> Result<WavSummary> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    let (samples, peak) = match spec.sample_format {
        hound::SampleFormat::Float => {
            let mut count = 0usize;
            let mut peak = 0.0f32;
            for sample in reader.samples::<f32>() {
                peak = peak.max(sample?.abs());
                count += 1;
            }
            (count, peak.min(1.0))
        }
        hound::SampleFormat::Int => {
            #[allow(clippy::cast_precision_loss)]
            let full_scale = (1i64 << spec.bits_per_sample.saturating_sub(1)) as f64;
            let mut count = 0usize;
            let mut peak = 0i64;
            for sample in reader.samples::<i32>() {
                peak = peak.max(i64::from(sample?).abs());
                count += 1;
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
            let normalized = (peak as f64 / full_scale).min(1.0) as f32;
            (count, normalized)
        }
    };

    Ok(WavSummary {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        samples,
        peak,
    })
}

/// Reject audio that cannot contain speech before it is uploaded
///
/// # Errors
///
/// Returns `Error::Transcription` for empty bytes, undecodable WAV data,
/// clips with no samples, and silent clips
pub fn ensure_speech(bytes: &[u8]) -> Result<WavSummary> {
    if bytes.is_empty() {
        return Err(Error::Transcription("no audio received".to_string()));
    }

    let summary = inspect_wav(bytes)
        .map_err(|e| Error::Transcription(format!("audio is not a valid WAV file: {e}")))?;

    if summary.samples == 0 {
        return Err(Error::Transcription("recording contains no samples".to_string()));
    }
    if summary.is_silent() {
        return Err(Error::Transcription(
            "recording is silent; check the microphone".to_string(),
        ));
    }

    tracing::debug!(
        sample_rate = summary.sample_rate,
        channels = summary.channels,
        duration_ms = summary.duration().as_millis(),
        peak = summary.peak,
        "audio accepted for transcription"
    );
    Ok(summary)
}
