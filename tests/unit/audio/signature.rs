use super::*;

fn sine(freq: f32, sample_rate: u32, seconds: f32, amp: f32) -> Vec<f32> {
    let n = (sample_rate as f32 * seconds) as usize;
    (0..n)
        .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin() * amp)
        .collect()
}

fn line(text: &str) -> LyricLine {
    LyricLine {
        start: 0.0,
        end: 1.0,
        text: text.to_owned(),
    }
}

#[test]
fn regular_beats_have_zero_variance() {
    assert_eq!(compute_beat_interval_variance(&[0.0, 0.5, 1.0, 1.5, 2.0]), 0.0);
}

#[test]
fn one_doubled_interval_is_bounded_and_positive() {
    let v = compute_beat_interval_variance(&[0.0, 0.5, 1.0, 2.0, 2.5]);
    assert!(v > 0.0 && v <= 1.0);
    let mild = compute_beat_interval_variance(&[0.0, 0.5, 1.0, 1.5, 2.0, 2.55, 3.05, 3.55]);
    assert!(mild > 0.0 && mild < 1.0);
}

#[test]
fn too_few_beats_or_intervals_give_zero() {
    assert_eq!(compute_beat_interval_variance(&[]), 0.0);
    assert_eq!(compute_beat_interval_variance(&[0.0, 1.0]), 0.0);
    assert_eq!(compute_beat_interval_variance(&[1.0, 1.0, 1.0, 2.0]), 0.0);
}

#[test]
fn lyric_density_needs_both_inputs() {
    let lines = [line("one two three"), line("four")];
    assert_eq!(lyric_density(Some(&lines[..]), 2.0), Some(2.0));
    assert_eq!(lyric_density(None, 2.0), None);
    assert_eq!(lyric_density(Some(&[][..]), 2.0), None);
    assert_eq!(lyric_density(Some(&lines[..]), 0.0), None);
}

#[test]
fn empty_signal_and_zero_rate_are_analysis_errors() {
    let opts = SignatureOpts::default();
    let empty = SignatureInput {
        sample_rate: 8000,
        ..SignatureInput::default()
    };
    assert!(matches!(
        compute_signature(&empty, &opts),
        Err(LyricDanceError::Analysis(_))
    ));
    let no_rate = SignatureInput {
        mono: vec![0.1; 512],
        ..SignatureInput::default()
    };
    assert!(matches!(
        compute_signature(&no_rate, &opts),
        Err(LyricDanceError::Analysis(_))
    ));
}

#[test]
fn sine_signature_matches_its_tone() {
    let sr = 8000;
    let input = SignatureInput {
        mono: sine(1000.0, sr, 1.0, 0.5),
        sample_rate: sr,
        beat_grid: Some(BeatGrid {
            bpm: 120.0,
            beats: vec![0.0, 0.5, 1.0, 1.5],
            confidence: 1.0,
        }),
        lyrics: Some(vec![line("la la la la")]),
        duration_sec: None,
    };
    let sig = compute_signature(&input, &SignatureOpts::default()).unwrap();
    assert_eq!(sig.analysis_version, 1);
    assert_eq!(sig.bpm, 120.0);
    assert!((sig.duration_sec - 1.0).abs() < 1e-9);
    assert_eq!(sig.tempo_stability, 1.0);
    // RMS of a sine is amp / sqrt(2).
    assert!((sig.rms_mean - 0.5 / 2f64.sqrt()).abs() < 0.01);
    assert!(sig.rms_variance < 1e-4);
    // Two crossings per cycle.
    assert!((sig.zero_crossing_rate - 2.0 * 1000.0 / 8000.0).abs() < 0.01);
    assert!((sig.spectral_centroid_hz - 1000.0).abs() < 150.0);
    assert_eq!(sig.lyric_density, Some(4.0));
    // 61 frames of 256 at hop 128, fewer than the 64 requested points.
    assert_eq!(sig.energy_curve.len(), 61);
    assert!(sig.energy_curve.iter().all(|v| (0.0..=1.0).contains(v)));
}

#[test]
fn spectral_cap_keeps_the_centroid_close() {
    let sr = 8000;
    let input = SignatureInput {
        mono: sine(500.0, sr, 1.0, 0.5),
        sample_rate: sr,
        ..SignatureInput::default()
    };
    let full = compute_signature(&input, &SignatureOpts::default()).unwrap();
    let capped = compute_signature(
        &input,
        &SignatureOpts {
            max_spectral_frames: Some(4),
            ..SignatureOpts::default()
        },
    )
    .unwrap();
    assert!((full.spectral_centroid_hz - capped.spectral_centroid_hz).abs() < 50.0);
    assert_eq!(full.rms_mean, capped.rms_mean);
}

#[test]
fn short_signal_is_one_frame() {
    let input = SignatureInput {
        mono: vec![0.5, -0.5, 0.5, -0.5],
        sample_rate: 4,
        ..SignatureInput::default()
    };
    let sig = compute_signature(&input, &SignatureOpts::default()).unwrap();
    assert!((sig.rms_mean - 0.5).abs() < 1e-9);
    assert_eq!(sig.zero_crossing_rate, 1.0);
    assert_eq!(sig.energy_curve, vec![1.0]);
}

#[test]
fn energy_rises_with_a_crescendo() {
    let sr = 8000;
    let mono: Vec<f32> = sine(440.0, sr, 2.0, 1.0)
        .into_iter()
        .enumerate()
        .map(|(i, s)| s * i as f32 / (2 * sr) as f32)
        .collect();
    let input = SignatureInput {
        mono,
        sample_rate: sr,
        ..SignatureInput::default()
    };
    let sig = compute_signature(&input, &SignatureOpts::default()).unwrap();
    assert!(sig.energy_at(0.05) < sig.energy_at(0.5));
    assert!(sig.energy_at(0.5) < sig.energy_at(1.0));
    assert!((sig.energy_at(1.0) - 1.0).abs() < 0.05);
}

#[test]
fn worker_returns_the_same_signature() {
    let input = SignatureInput {
        mono: sine(300.0, 8000, 0.5, 0.3),
        sample_rate: 8000,
        ..SignatureInput::default()
    };
    let direct = compute_signature(&input, &SignatureOpts::default()).unwrap();
    let job = spawn_signature_worker(input, SignatureOpts::default()).unwrap();
    assert_eq!(job.wait().unwrap(), direct);
}

#[test]
fn worker_reports_errors_as_values() {
    let job = spawn_signature_worker(SignatureInput::default(), SignatureOpts::default()).unwrap();
    assert!(matches!(job.wait(), Err(LyricDanceError::Analysis(_))));
}
