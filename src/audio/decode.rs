use std::path::Path;

use crate::foundation::error::{LyricDanceError, LyricDanceResult};

/// Sample rate used for offline analysis.
pub const ANALYSIS_SAMPLE_RATE: u32 = 22_050;

#[derive(Clone, Debug, PartialEq)]
/// Decoded mono PCM.
pub struct MonoPcm {
    /// Samples per second.
    pub sample_rate: u32,
    /// Samples in `[-1, 1]`.
    pub samples: Vec<f32>,
}

impl MonoPcm {
    /// Length in seconds; `0` for an empty or rate-less buffer.
    pub fn duration_sec(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.samples.len() as f64 / f64::from(self.sample_rate)
        }
    }
}

/// Decode the audio track of `path` to mono `f32` at `sample_rate` with the system `ffmpeg`.
#[cfg(feature = "media-ffmpeg")]
#[tracing::instrument]
pub fn decode_mono_f32(path: &Path, sample_rate: u32) -> LyricDanceResult<MonoPcm> {
    if sample_rate == 0 {
        return Err(LyricDanceError::validation("decode sample_rate must be > 0"));
    }
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "1",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| LyricDanceError::analysis(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        return Err(LyricDanceError::analysis(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    let samples = pcm_from_f32le(&out.stdout)?;
    tracing::debug!(samples = samples.len(), "decoded audio");
    Ok(MonoPcm {
        sample_rate,
        samples,
    })
}

/// Without the `media-ffmpeg` feature decoding always fails.
#[cfg(not(feature = "media-ffmpeg"))]
pub fn decode_mono_f32(_path: &Path, _sample_rate: u32) -> LyricDanceResult<MonoPcm> {
    Err(LyricDanceError::analysis(
        "audio decode requires the 'media-ffmpeg' feature",
    ))
}

/// Little-endian `f32` bytes to samples.
pub fn pcm_from_f32le(bytes: &[u8]) -> LyricDanceResult<Vec<f32>> {
    if !bytes.len().is_multiple_of(4) {
        return Err(LyricDanceError::analysis(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
#[path = "../../tests/unit/audio/decode.rs"]
mod tests;
