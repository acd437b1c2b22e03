use super::*;

#[test]
fn f32le_bytes_decode_in_order() {
    let mut bytes = Vec::new();
    for v in [0.5f32, -1.0, 0.25] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    assert_eq!(pcm_from_f32le(&bytes).unwrap(), vec![0.5, -1.0, 0.25]);
    assert!(pcm_from_f32le(&[]).unwrap().is_empty());
}

#[test]
fn misaligned_bytes_are_an_analysis_error() {
    let err = pcm_from_f32le(&[0, 0, 0]).unwrap_err();
    assert!(matches!(err, LyricDanceError::Analysis(_)));
}

#[test]
fn duration_handles_zero_rate() {
    let pcm = MonoPcm {
        sample_rate: 4,
        samples: vec![0.0; 10],
    };
    assert!((pcm.duration_sec() - 2.5).abs() < 1e-12);
    let empty = MonoPcm {
        sample_rate: 0,
        samples: vec![0.0; 10],
    };
    assert_eq!(empty.duration_sec(), 0.0);
}
