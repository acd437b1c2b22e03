use super::*;

fn frame(v: u8) -> FrameRGBA {
    FrameRGBA {
        width: 2,
        height: 1,
        data: vec![v, v, v, 255, 0, 0, 0, 0],
        premultiplied: true,
    }
}

fn cfg() -> SinkConfig {
    SinkConfig {
        canvas: Canvas::new(2, 1).unwrap(),
        fps: Fps::default(),
        audio_path: None,
    }
}

#[test]
fn in_memory_sink_records_in_order() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(0), &frame(1)).unwrap();
    sink.push_frame(FrameIndex(2), &frame(2)).unwrap();
    assert!(sink.push_frame(FrameIndex(2), &frame(3)).is_err());
    sink.end().unwrap();
    assert!(sink.is_ended());
    assert_eq!(sink.config(), Some(&cfg()));
    let idx: Vec<u64> = sink.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(idx, vec![0, 2]);
}

#[test]
fn channel_sink_hands_frames_to_the_receiver() {
    let (mut sink, rx) = ChannelSink::new();
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(5), &frame(9)).unwrap();
    let (idx, got) = rx.recv().unwrap();
    assert_eq!(idx, FrameIndex(5));
    assert_eq!(got, frame(9));
    assert!(sink.push_frame(FrameIndex(4), &frame(9)).is_err());
    drop(rx);
    assert!(matches!(
        sink.push_frame(FrameIndex(6), &frame(9)),
        Err(LyricDanceError::Render(_))
    ));
}

#[test]
fn flatten_fills_transparency_with_background() {
    let src = frame(40).data;
    let mut dst = vec![0; src.len()];
    flatten_premul_over_bg(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![40, 40, 40, 255, 10, 20, 30, 255]);
    assert!(flatten_premul_over_bg(&mut [0; 4], &src, [0; 4]).is_err());
}

#[test]
fn size_mismatch_is_a_validation_error() {
    let canvas = Canvas::new(4, 4).unwrap();
    assert!(matches!(
        check_size(canvas, &frame(0)),
        Err(LyricDanceError::Validation(_))
    ));
    assert!(check_size(Canvas::new(2, 1).unwrap(), &frame(0)).is_ok());
}

#[test]
fn png_sequence_writes_numbered_files() {
    let dir = std::env::temp_dir().join(format!("ld_png_seq_{}", std::process::id()));
    let mut sink = PngSequenceSink::new(&dir, [0, 0, 0, 255]);
    assert!(sink.push_frame(FrameIndex(0), &frame(1)).is_err());
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(3), &frame(200)).unwrap();
    sink.end().unwrap();
    let path = sink.frame_path(FrameIndex(3));
    assert!(path.ends_with("frame_000003.png"));
    let img = image::open(&path).unwrap().to_rgba8();
    assert_eq!(img.get_pixel(0, 0).0, [200, 200, 200, 255]);
    assert_eq!(img.get_pixel(1, 0).0, [0, 0, 0, 255]);
    let _ = std::fs::remove_dir_all(&dir);
}
