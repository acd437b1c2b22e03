use std::{sync::mpsc, thread};

use num_complex::Complex;
use rustfft::FftPlanner;

use crate::{
    audio::beat::BeatGrid,
    compose::layout::LyricLine,
    foundation::{
        error::{LyricDanceError, LyricDanceResult},
        math::clamp01,
    },
};

/// Version stamped on every computed signature.
pub const ANALYSIS_VERSION: u32 = 1;

/// Empirical scale mapping normalized interval variance onto `[0, 1]`.
pub const BEAT_VARIANCE_SCALE: f64 = 0.12;

/// Env var capping the number of frames fed to the spectral centroid.
pub const SPECTRAL_FRAMES_ENV: &str = "LYRIC_DANCE_SPECTRAL_FRAMES";

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Framing and output options for [`compute_signature`].
pub struct SignatureOpts {
    /// Samples per analysis frame.
    pub frame_size: usize,
    /// Samples between frame starts.
    pub hop_size: usize,
    /// Upper bound on frames transformed for the centroid; evenly subsampled beyond it.
    pub max_spectral_frames: Option<usize>,
    /// Points in the output energy curve.
    pub energy_curve_points: usize,
}

impl Default for SignatureOpts {
    fn default() -> Self {
        Self {
            frame_size: 256,
            hop_size: 128,
            max_spectral_frames: None,
            energy_curve_points: 64,
        }
    }
}

impl SignatureOpts {
    /// Defaults with the spectral frame cap read from [`SPECTRAL_FRAMES_ENV`] when set.
    pub fn from_env() -> Self {
        let max_spectral_frames = std::env::var(SPECTRAL_FRAMES_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n > 0);
        Self {
            max_spectral_frames,
            ..Self::default()
        }
    }

    fn validate(&self) -> LyricDanceResult<()> {
        if self.frame_size < 2 {
            return Err(LyricDanceError::validation("signature frame_size must be >= 2"));
        }
        if self.hop_size == 0 {
            return Err(LyricDanceError::validation("signature hop_size must be > 0"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
/// Everything the signature pass consumes.
pub struct SignatureInput {
    /// Mono samples.
    pub mono: Vec<f32>,
    /// Samples per second.
    pub sample_rate: u32,
    /// Detected beats, when available.
    pub beat_grid: Option<BeatGrid>,
    /// Lyric lines, when available.
    pub lyrics: Option<Vec<LyricLine>>,
    /// Song length; derived from the sample count when absent.
    pub duration_sec: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Compact rhythmic and spectral descriptors of a track.
pub struct SongSignature {
    /// Tempo from the beat grid, `0` without one.
    pub bpm: f64,
    /// Song length in seconds.
    pub duration_sec: f64,
    /// `1 - beat_interval_variance`.
    pub tempo_stability: f64,
    /// Normalized beat interval variance in `[0, 1]`.
    pub beat_interval_variance: f64,
    /// Mean frame RMS.
    pub rms_mean: f64,
    /// Variance of frame RMS.
    pub rms_variance: f64,
    /// Mean zero-crossing rate per sample.
    pub zero_crossing_rate: f64,
    /// Mean spectral centroid in Hz.
    pub spectral_centroid_hz: f64,
    /// Words per second, when lyrics and a duration are known.
    pub lyric_density: Option<f64>,
    /// Frame RMS downsampled and scaled to `[0, 1]`.
    pub energy_curve: Vec<f32>,
    /// Always [`ANALYSIS_VERSION`].
    pub analysis_version: u32,
}

impl SongSignature {
    /// Energy at normalized song position `progress`, linearly interpolated.
    pub fn energy_at(&self, progress: f64) -> f64 {
        match self.energy_curve.as_slice() {
            [] => 0.0,
            [only] => f64::from(*only),
            curve => {
                let x = clamp01(progress) * (curve.len() - 1) as f64;
                let i = (x.floor() as usize).min(curve.len() - 2);
                let f = x - i as f64;
                f64::from(curve[i]) * (1.0 - f) + f64::from(curve[i + 1]) * f
            }
        }
    }
}

/// Spread of consecutive beat intervals relative to their mean, scaled into `[0, 1]`.
///
/// `0` for fewer than 3 beats or fewer than 2 positive intervals.
pub fn compute_beat_interval_variance(beats: &[f64]) -> f64 {
    if beats.len() < 3 {
        return 0.0;
    }
    let deltas: Vec<f64> = beats
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| *d > 0.0)
        .collect();
    if deltas.len() < 2 {
        return 0.0;
    }
    let n = deltas.len() as f64;
    let mean = deltas.iter().sum::<f64>() / n;
    let var = deltas.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
    clamp01(var / (mean * mean) / BEAT_VARIANCE_SCALE)
}

/// Words per second; `None` unless both lyrics and a positive duration are known.
pub fn lyric_density(lyrics: Option<&[LyricLine]>, duration_sec: f64) -> Option<f64> {
    let lines = lyrics.filter(|l| !l.is_empty())?;
    if duration_sec.is_nan() || duration_sec <= 0.0 {
        return None;
    }
    let words: usize = lines.iter().map(|l| l.text.split_whitespace().count()).sum();
    Some(words as f64 / duration_sec)
}

fn frame_starts(len: usize, opts: &SignatureOpts) -> Vec<usize> {
    if len <= opts.frame_size {
        return vec![0];
    }
    (0..=len - opts.frame_size).step_by(opts.hop_size).collect()
}

fn frame_rms(frame: &[f32]) -> f64 {
    let sum: f64 = frame.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    (sum / frame.len().max(1) as f64).sqrt()
}

fn frame_zcr(frame: &[f32]) -> f64 {
    if frame.len() < 2 {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f64 / (frame.len() - 1) as f64
}

fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var)
}

/// Mean magnitude-weighted frequency over the non-negative half of each frame's spectrum.
fn spectral_centroid_hz(mono: &[f32], starts: &[usize], sample_rate: u32, opts: &SignatureOpts) -> f64 {
    let n = opts.frame_size;
    let fft = FftPlanner::<f32>::new().plan_fft_forward(n);
    let mut buf = vec![Complex::new(0.0f32, 0.0); n];

    let picked: Vec<usize> = match opts.max_spectral_frames {
        Some(cap) if starts.len() > cap => (0..cap).map(|i| starts[i * starts.len() / cap]).collect(),
        _ => starts.to_vec(),
    };

    let bin_hz = f64::from(sample_rate) / n as f64;
    let mut total = 0.0;
    let mut counted = 0usize;
    for start in picked {
        for (i, slot) in buf.iter_mut().enumerate() {
            let s = mono.get(start + i).copied().unwrap_or(0.0);
            *slot = Complex::new(s, 0.0);
        }
        fft.process(&mut buf);
        let (mut weighted, mut mass) = (0.0f64, 0.0f64);
        for (k, c) in buf[..=n / 2].iter().enumerate() {
            let m = f64::from(c.norm());
            weighted += k as f64 * bin_hz * m;
            mass += m;
        }
        if mass > 0.0 {
            total += weighted / mass;
            counted += 1;
        }
    }
    if counted == 0 { 0.0 } else { total / counted as f64 }
}

fn energy_curve(rms: &[f64], points: usize) -> Vec<f32> {
    let points = points.min(rms.len());
    if points == 0 {
        return Vec::new();
    }
    let buckets: Vec<f64> = (0..points)
        .map(|i| {
            let a = i * rms.len() / points;
            let b = ((i + 1) * rms.len() / points).max(a + 1);
            rms[a..b].iter().sum::<f64>() / (b - a) as f64
        })
        .collect();
    let peak = buckets.iter().copied().fold(0.0, f64::max);
    buckets
        .into_iter()
        .map(|v| if peak > 0.0 { (v / peak) as f32 } else { 0.0 })
        .collect()
}

/// Compute the signature of a decoded track.
///
/// An empty signal or a zero sample rate is an analysis error.
#[tracing::instrument(skip(input), fields(samples = input.mono.len(), sample_rate = input.sample_rate))]
pub fn compute_signature(input: &SignatureInput, opts: &SignatureOpts) -> LyricDanceResult<SongSignature> {
    opts.validate()?;
    if input.mono.is_empty() {
        return Err(LyricDanceError::analysis("cannot analyse an empty signal"));
    }
    if input.sample_rate == 0 {
        return Err(LyricDanceError::analysis("sample_rate must be > 0"));
    }

    let mono = input.mono.as_slice();
    let starts = frame_starts(mono.len(), opts);
    let (rms, zcr): (Vec<f64>, Vec<f64>) = starts
        .iter()
        .map(|&s| {
            let frame = &mono[s..(s + opts.frame_size).min(mono.len())];
            (frame_rms(frame), frame_zcr(frame))
        })
        .unzip();
    let (rms_mean, rms_variance) = mean_and_variance(&rms);
    let (zero_crossing_rate, _) = mean_and_variance(&zcr);
    let spectral_centroid_hz = spectral_centroid_hz(mono, &starts, input.sample_rate, opts);

    let duration_sec = input
        .duration_sec
        .filter(|d| *d > 0.0)
        .unwrap_or(mono.len() as f64 / f64::from(input.sample_rate));
    let (bpm, beat_interval_variance) = input
        .beat_grid
        .as_ref()
        .map_or((0.0, 0.0), |g| (g.bpm, compute_beat_interval_variance(&g.beats)));

    Ok(SongSignature {
        bpm,
        duration_sec,
        tempo_stability: clamp01(1.0 - beat_interval_variance),
        beat_interval_variance,
        rms_mean,
        rms_variance,
        zero_crossing_rate,
        spectral_centroid_hz,
        lyric_density: lyric_density(input.lyrics.as_deref(), duration_sec),
        energy_curve: energy_curve(&rms, opts.energy_curve_points),
        analysis_version: ANALYSIS_VERSION,
    })
}

/// Handle to a signature pass running on its own thread.
pub struct SignatureJob {
    rx: mpsc::Receiver<LyricDanceResult<SongSignature>>,
    handle: thread::JoinHandle<()>,
}

impl SignatureJob {
    /// Non-blocking poll; `None` while the pass is still running.
    pub fn try_result(&self) -> Option<LyricDanceResult<SongSignature>> {
        self.rx.try_recv().ok()
    }

    /// Block until the pass finishes.
    pub fn wait(self) -> LyricDanceResult<SongSignature> {
        let out = self
            .rx
            .recv()
            .map_err(|_| LyricDanceError::analysis("signature worker exited without a result"));
        self.handle
            .join()
            .map_err(|_| LyricDanceError::analysis("signature worker panicked"))?;
        out?
    }
}

/// Run [`compute_signature`] on a dedicated thread. The input is moved in and the result (with
/// its energy curve) moved back out; nothing is shared.
pub fn spawn_signature_worker(input: SignatureInput, opts: SignatureOpts) -> LyricDanceResult<SignatureJob> {
    let (tx, rx) = mpsc::sync_channel(1);
    let handle = thread::Builder::new()
        .name("lyric-dance-signature".to_owned())
        .spawn(move || {
            let _ = tx.send(compute_signature(&input, &opts));
        })
        .map_err(|e| LyricDanceError::analysis(format!("failed to spawn signature worker: {e}")))?;
    Ok(SignatureJob { rx, handle })
}

#[cfg(test)]
#[path = "../../tests/unit/audio/signature.rs"]
mod tests;
