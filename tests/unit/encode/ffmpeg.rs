use super::*;
use crate::foundation::core::{Canvas, Fps};

fn cfg(width: u32, height: u32) -> SinkConfig {
    SinkConfig {
        canvas: Canvas::new(width, height).unwrap(),
        fps: Fps::default(),
        audio_path: None,
    }
}

#[test]
fn odd_sizes_are_rejected_before_spawning() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(std::env::temp_dir().join("ld_odd.mp4")));
    assert!(matches!(
        sink.begin(cfg(641, 360)),
        Err(LyricDanceError::Validation(_))
    ));
}

#[test]
fn frames_before_begin_are_errors() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("unused.mp4"));
    let frame = FrameRGBA {
        width: 2,
        height: 2,
        data: vec![0; 16],
        premultiplied: true,
    };
    assert!(sink.push_frame(FrameIndex(0), &frame).is_err());
    assert!(sink.end().is_err());
}

#[test]
fn audio_is_mapped_from_the_second_input() {
    let sink = FfmpegSink::new(FfmpegSinkOpts::new("out.mp4"));
    let mut c = cfg(640, 360);
    c.audio_path = Some(PathBuf::from("song.mp3"));
    let args: Vec<String> = sink
        .command(&c)
        .get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    let pos = |s: &str| args.iter().position(|a| a == s).unwrap();
    assert!(pos("pipe:0") < pos("song.mp3"));
    assert!(args.iter().any(|a| a == "1:a:0"));
    assert_eq!(args.last().map(String::as_str), Some("out.mp4"));

    let silent: Vec<String> = sink
        .command(&cfg(640, 360))
        .get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    assert!(silent.iter().any(|a| a == "-an"));
    assert!(silent.iter().any(|a| a == "30/1"));
}

#[test]
fn parent_dirs_are_created() {
    let dir = std::env::temp_dir().join(format!("ld_parent_{}", std::process::id()));
    let out = dir.join("nested").join("out.mp4");
    ensure_parent_dir(&out).unwrap();
    assert!(out.parent().unwrap().is_dir());
    let _ = std::fs::remove_dir_all(&dir);
    ensure_parent_dir(Path::new("bare.mp4")).unwrap();
}
