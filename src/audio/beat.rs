use std::sync::Arc;

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::audio::signature::SongSignature;
use crate::foundation::math::clamp01;

/// Smoothing kept from the previous tick.
pub const BEAT_SMOOTHING: f64 = 0.7;

const PULSE_DECAY_SEC: f64 = 0.12;

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Detected tempo and beat timestamps.
pub struct BeatGrid {
    /// Tempo in beats per minute.
    pub bpm: f64,
    /// Beat times in seconds, ascending.
    pub beats: Vec<f64>,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f64,
}

impl BeatGrid {
    /// Beat pulse at `t`: `1` on a beat, decaying exponentially until the next one.
    ///
    /// Uses the beat list when present, otherwise a metronome at `bpm`; `0` with neither.
    pub fn pulse_at(&self, t: f64) -> f64 {
        let since = if self.beats.is_empty() {
            if self.bpm <= 0.0 || t < 0.0 {
                return 0.0;
            }
            t.rem_euclid(60.0 / self.bpm)
        } else {
            let idx = self.beats.partition_point(|&b| b <= t);
            let Some(i) = idx.checked_sub(1) else {
                return 0.0;
            };
            t - self.beats[i]
        };
        (-since / PULSE_DECAY_SEC).exp()
    }
}

/// Beat intensity at `t` seconds when no live analyser is running.
///
/// The grid pulse (scaled by detector confidence) rides on the signature's energy curve; either
/// source alone is used as is, and with neither the result is `0`.
pub fn offline_beat_intensity(
    grid: Option<&BeatGrid>,
    signature: Option<&SongSignature>,
    t: f64,
) -> f64 {
    let pulse = grid
        .filter(|g| !g.beats.is_empty() || g.bpm > 0.0)
        .map(|g| {
            let confidence = if g.confidence > 0.0 { clamp01(g.confidence) } else { 1.0 };
            g.pulse_at(t) * confidence
        });
    let energy = signature
        .filter(|s| s.duration_sec > 0.0 && !s.energy_curve.is_empty())
        .map(|s| s.energy_at(t / s.duration_sec));
    let v = match (pulse, energy) {
        (Some(p), Some(e)) => p * (0.5 + 0.5 * e),
        (Some(p), None) => p,
        (None, Some(e)) => e,
        (None, None) => 0.0,
    };
    clamp01(v)
}

/// Byte-scaled spectrum source, as exposed by a browser-style analyser node.
pub trait FrequencyAnalyser {
    /// Fill `out` with the current magnitude spectrum, one byte per bin (`0..=255`).
    fn byte_frequency_data(&mut self, out: &mut Vec<u8>);
}

/// Smoothed bass intensity sampled once per display tick.
#[derive(Debug, Default)]
pub struct LiveBeatEstimator {
    intensity: f64,
    bins: Vec<u8>,
}

impl LiveBeatEstimator {
    /// Fresh estimator at zero intensity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current smoothed intensity in `[0, 1]`.
    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    /// Sample `analyser` and update the estimate.
    ///
    /// Averages bins 1 through 4 and blends with `0.7 * previous + 0.3 * bass`. Drops straight to
    /// zero when paused or when no analyser is attached.
    pub fn tick(&mut self, analyser: Option<&mut dyn FrequencyAnalyser>, playing: bool) -> f64 {
        let Some(analyser) = analyser.filter(|_| playing) else {
            self.intensity = 0.0;
            return 0.0;
        };
        analyser.byte_frequency_data(&mut self.bins);
        let bass = self.bins.get(1..self.bins.len().min(5)).unwrap_or(&[]);
        let avg = if bass.is_empty() {
            0.0
        } else {
            bass.iter().map(|&b| f64::from(b)).sum::<f64>() / bass.len() as f64 / 255.0
        };
        self.intensity = clamp01(self.intensity * BEAT_SMOOTHING + avg * (1.0 - BEAT_SMOOTHING));
        self.intensity
    }
}

/// [`FrequencyAnalyser`] over decoded PCM, positioned with [`PcmAnalyser::seek`].
///
/// Windows the `fft_size` samples ending at the play head (Blackman) and maps magnitudes from
/// `[-100, -30]` dB onto bytes.
pub struct PcmAnalyser {
    samples: Arc<[f32]>,
    sample_rate: u32,
    head: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
}

impl PcmAnalyser {
    /// Default transform length.
    pub const DEFAULT_FFT_SIZE: usize = 2048;
    const MIN_DB: f32 = -100.0;
    const MAX_DB: f32 = -30.0;

    /// Analyser over `samples` with a transform of `fft_size` (at least 8).
    pub fn new(samples: Arc<[f32]>, sample_rate: u32, fft_size: usize) -> Self {
        let n = fft_size.max(8);
        let fft = FftPlanner::new().plan_fft_forward(n);
        let window = (0..n)
            .map(|i| {
                let x = 2.0 * std::f32::consts::PI * i as f32 / n as f32;
                0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
            })
            .collect();
        Self {
            samples,
            sample_rate,
            head: 0,
            fft,
            window,
            buffer: vec![Complex::new(0.0, 0.0); n],
        }
    }

    /// Move the play head to `t` seconds.
    pub fn seek(&mut self, t: f64) {
        let pos = (t.max(0.0) * f64::from(self.sample_rate)).round() as usize;
        self.head = pos.min(self.samples.len());
    }
}

impl FrequencyAnalyser for PcmAnalyser {
    fn byte_frequency_data(&mut self, out: &mut Vec<u8>) {
        let n = self.buffer.len();
        let start = self.head as isize - n as isize;
        for (i, (slot, w)) in self.buffer.iter_mut().zip(&self.window).enumerate() {
            let idx = start + i as isize;
            let s = usize::try_from(idx)
                .ok()
                .and_then(|j| self.samples.get(j))
                .copied()
                .unwrap_or(0.0);
            *slot = Complex::new(s * w, 0.0);
        }
        self.fft.process(&mut self.buffer);

        out.clear();
        out.extend(self.buffer[..n / 2].iter().map(|c| {
            let mag = c.norm() / n as f32;
            if mag <= 0.0 {
                return 0;
            }
            let db = 20.0 * mag.log10();
            let scaled = (db - Self::MIN_DB) / (Self::MAX_DB - Self::MIN_DB) * 255.0;
            scaled.clamp(0.0, 255.0) as u8
        }));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/beat.rs"]
mod tests;
