use super::*;
use crate::encode::sink::InMemorySink;
use serde_json::json;

fn opts() -> RenderOpts {
    RenderOpts {
        width: 32,
        height: 18,
        fps: Fps::new(10, 1).unwrap(),
        ..RenderOpts::default()
    }
}

fn session() -> SongSession {
    let direction = CinematicDirection::load(&json!({
        "sceneTone": "light",
        "atmosphere": "burn",
        "emotionalArc": "slow-burn"
    }))
    .unwrap();
    let lines = vec![
        LyricLine {
            start: 0.2,
            end: 1.0,
            text: "ash in the air".to_owned(),
        },
        LyricLine {
            start: 1.1,
            end: 1.9,
            text: "we burn".to_owned(),
        },
    ];
    SongSession::new(direction, lines, 2.0, &opts())
        .unwrap()
        .with_beat_grid(BeatGrid {
            bpm: 120.0,
            beats: vec![0.0, 0.5, 1.0, 1.5],
            confidence: 0.9,
        })
}

fn export(opts: &ExportOpts) -> (RenderStats, InMemorySink) {
    let mut sink = InMemorySink::new();
    let stats = export_song(&session(), opts, &mut sink).unwrap();
    (stats, sink)
}

struct FailingSink;

impl FrameSink for FailingSink {
    fn begin(&mut self, _cfg: SinkConfig) -> LyricDanceResult<()> {
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, _frame: &FrameRGBA) -> LyricDanceResult<()> {
        if idx.0 >= 3 {
            return Err(LyricDanceError::render("disk full"));
        }
        Ok(())
    }

    fn end(&mut self) -> LyricDanceResult<()> {
        Ok(())
    }
}

#[test]
fn render_opts_map_to_compose_knobs() {
    let o = RenderOpts {
        clear_rgba: [10, 20, 30, 0],
        grade_pass: false,
        ..opts()
    };
    assert_eq!(
        o.compose_opts(),
        ComposeOpts {
            clear: Rgb::new(10, 20, 30),
            grade_pass: false
        }
    );
    assert!(o.render_settings().unwrap().font_bytes.is_none());
    assert!(RenderOpts { width: 0, ..opts() }.canvas().is_err());
}

#[test]
fn missing_font_file_is_an_error() {
    let o = RenderOpts {
        font_path: Some(PathBuf::from("/definitely/not/here.ttf")),
        ..opts()
    };
    assert!(matches!(o.render_settings(), Err(LyricDanceError::Render(_))));
}

#[test]
fn session_rejects_non_positive_durations() {
    let dir = CinematicDirection::default();
    assert!(SongSession::new(dir.clone(), Vec::new(), 0.0, &opts()).is_err());
    assert!(SongSession::new(dir, Vec::new(), f64::NAN, &opts()).is_err());
}

#[test]
fn frame_times_and_beats_follow_the_session() {
    let s = session();
    assert_eq!(s.total_frames(), 20);
    assert_eq!(s.time_of(FrameIndex(5)), 0.5);
    assert!((s.beat_at(0.5) - 0.9).abs() < 1e-12);
    assert!(s.beat_at(0.7) < s.beat_at(0.5));
    assert_eq!(s.plan_at(FrameIndex(4)), s.plan_at(FrameIndex(4)));
}

#[test]
fn sequential_export_delivers_every_frame_in_order() {
    let (stats, sink) = export(&ExportOpts {
        parallel: false,
        ..ExportOpts::default()
    });
    assert_eq!(
        stats,
        RenderStats {
            frames_total: 20,
            frames_rendered: 20
        }
    );
    assert!(sink.is_ended());
    let idx: Vec<u64> = sink.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(idx, (0..20).collect::<Vec<_>>());
    let cfg = sink.config().unwrap();
    assert_eq!(cfg.canvas, Canvas::new(32, 18).unwrap());
    assert_eq!(cfg.audio_path, None);
}

#[test]
fn parallel_export_matches_sequential() {
    let (_, seq) = export(&ExportOpts {
        parallel: false,
        ..ExportOpts::default()
    });
    let (stats, par) = export(&ExportOpts {
        parallel: true,
        threads: Some(3),
        chunk_size: 7,
        channel_capacity: 1,
        ..ExportOpts::default()
    });
    assert_eq!(stats.frames_rendered, 20);
    assert_eq!(seq.frames(), par.frames());
}

#[test]
fn partial_ranges_are_clamped_to_the_song() {
    let (stats, sink) = export(&ExportOpts {
        range: Some(FrameRange::new(FrameIndex(15), FrameIndex(40)).unwrap()),
        ..ExportOpts::default()
    });
    assert_eq!(stats.frames_total, 5);
    assert_eq!(sink.frames().first().map(|(i, _)| i.0), Some(15));

    let mut sink = InMemorySink::new();
    let past_end = ExportOpts {
        range: Some(FrameRange::new(FrameIndex(25), FrameIndex(30)).unwrap()),
        ..ExportOpts::default()
    };
    assert!(matches!(
        export_song(&session(), &past_end, &mut sink),
        Err(LyricDanceError::Validation(_))
    ));
}

#[test]
fn single_frame_matches_the_exported_one() {
    let s = session();
    let (_, sink) = export(&ExportOpts::default());
    let frame = s.render_frame(FrameIndex(12)).unwrap();
    assert_eq!(&frame, &sink.frames()[12].1);
    assert!(s.render_frame(FrameIndex(20)).is_err());
}

#[test]
fn sink_errors_stop_the_export() {
    for parallel in [false, true] {
        let opts = ExportOpts {
            parallel,
            ..ExportOpts::default()
        };
        let err = export_song(&session(), &opts, &mut FailingSink).unwrap_err();
        assert!(err.to_string().contains("disk full") || err.to_string().contains("sink thread"));
    }
}

#[test]
fn zero_threads_is_rejected() {
    let opts = ExportOpts {
        threads: Some(0),
        ..ExportOpts::default()
    };
    assert!(export_song(&session(), &opts, &mut InMemorySink::new()).is_err());
}
