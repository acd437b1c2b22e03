use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, mpsc};

use rayon::prelude::*;

use crate::{
    audio::{
        beat::{BeatGrid, offline_beat_intensity},
        signature::SongSignature,
    },
    compose::layout::LyricLine,
    direction::model::CinematicDirection,
    encode::sink::{FrameSink, SinkConfig},
    foundation::{
        core::{Canvas, Fps, FrameIndex, FrameRange, Rgb},
        error::{LyricDanceError, LyricDanceResult},
    },
    render::{
        backend::{DrawBackend, FrameRGBA, RenderSettings},
        compose::{ComposeOpts, SceneContext, compose_frame},
        cpu::CpuBackend,
        plan::FramePlan,
    },
};

/// Environment variable naming the default lyric font file.
pub const FONT_ENV: &str = "LYRIC_DANCE_FONT";

const MAX_REORDER_BUFFER_BYTES: u64 = 128 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Output surface and look.
pub struct RenderOpts {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Frame rate.
    pub fps: Fps,
    /// Font for lyric text; text is skipped without one.
    pub font_path: Option<PathBuf>,
    /// Opaque clear color under the background (alpha ignored).
    pub clear_rgba: [u8; 4],
    /// Apply the mood grade pass.
    pub grade_pass: bool,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: Fps::default(),
            font_path: None,
            clear_rgba: [0, 0, 0, 255],
            grade_pass: true,
        }
    }
}

impl RenderOpts {
    /// Defaults with `font_path` taken from [`FONT_ENV`] when set.
    pub fn from_env() -> Self {
        Self {
            font_path: std::env::var_os(FONT_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            ..Self::default()
        }
    }

    /// Validated canvas.
    pub fn canvas(&self) -> LyricDanceResult<Canvas> {
        Canvas::new(self.width, self.height)
    }

    /// Backend settings, reading the font file when one is configured.
    pub fn render_settings(&self) -> LyricDanceResult<RenderSettings> {
        match self.font_path.as_deref() {
            Some(path) => RenderSettings::with_font_file(path),
            None => Ok(RenderSettings::default()),
        }
    }

    /// Composition knobs.
    pub fn compose_opts(&self) -> ComposeOpts {
        let [r, g, b, _] = self.clear_rgba;
        ComposeOpts {
            clear: Rgb::new(r, g, b),
            grade_pass: self.grade_pass,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
/// How a range export runs.
pub struct ExportOpts {
    /// Frames to render; the whole song when `None`.
    pub range: Option<FrameRange>,
    /// Render frames on a rayon pool.
    pub parallel: bool,
    /// Pool size; rayon's default when `None`.
    pub threads: Option<usize>,
    /// Frames handed to the pool at a time.
    pub chunk_size: usize,
    /// Bounded channel capacity between renderers and the sink thread.
    pub channel_capacity: usize,
}

impl Default for ExportOpts {
    fn default() -> Self {
        Self {
            range: None,
            parallel: true,
            threads: None,
            chunk_size: 64,
            channel_capacity: 4,
        }
    }
}

/// Counts from a range export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frames in the requested range.
    pub frames_total: u64,
    /// Frames rendered and delivered.
    pub frames_rendered: u64,
}

/// One song ready for offline rendering: the precomputed scene plus its beat sources.
#[derive(Clone, Debug)]
pub struct SongSession {
    scene: SceneContext,
    beat_grid: Option<BeatGrid>,
    signature: Option<Arc<SongSignature>>,
    settings: RenderSettings,
    compose: ComposeOpts,
    fps: Fps,
    audio_path: Option<PathBuf>,
}

impl SongSession {
    /// Precompute the scene for `direction` and `lines` at the size in `opts`.
    pub fn new(
        direction: CinematicDirection,
        lines: Vec<LyricLine>,
        duration_sec: f64,
        opts: &RenderOpts,
    ) -> LyricDanceResult<Self> {
        if duration_sec.is_nan() || duration_sec <= 0.0 {
            return Err(LyricDanceError::validation("song duration must be positive"));
        }
        let canvas = opts.canvas()?;
        Ok(Self {
            scene: SceneContext::new(canvas, direction, lines, duration_sec),
            beat_grid: None,
            signature: None,
            settings: opts.render_settings()?,
            compose: opts.compose_opts(),
            fps: opts.fps,
            audio_path: None,
        })
    }

    /// Use `grid` for beat pulses.
    pub fn with_beat_grid(mut self, grid: BeatGrid) -> Self {
        self.beat_grid = Some(grid);
        self
    }

    /// Use `signature`'s energy curve for beat intensity.
    pub fn with_signature(mut self, signature: Arc<SongSignature>) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Mux the song at `path` under exported video.
    pub fn with_audio(mut self, path: impl Into<PathBuf>) -> Self {
        self.audio_path = Some(path.into());
        self
    }

    /// The precomputed scene.
    pub fn scene(&self) -> &SceneContext {
        &self.scene
    }

    /// Frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Frames covering the whole song.
    pub fn total_frames(&self) -> u64 {
        self.fps.frames_for_secs(self.scene.duration_sec())
    }

    /// Song time of `idx`.
    pub fn time_of(&self, idx: FrameIndex) -> f64 {
        self.fps.frame_time_secs(idx)
    }

    /// Offline beat intensity at `t` seconds.
    pub fn beat_at(&self, t: f64) -> f64 {
        offline_beat_intensity(self.beat_grid.as_ref(), self.signature.as_deref(), t)
    }

    /// Draw plan for frame `idx`.
    pub fn plan_at(&self, idx: FrameIndex) -> FramePlan {
        let t = self.time_of(idx);
        compose_frame(&self.scene, t, self.beat_at(t), &self.compose)
    }

    /// Render a single frame on a fresh CPU backend.
    pub fn render_frame(&self, idx: FrameIndex) -> LyricDanceResult<FrameRGBA> {
        let total = self.total_frames();
        if idx.0 >= total {
            return Err(LyricDanceError::validation(format!(
                "frame {} is past the end of the song ({total} frames)",
                idx.0
            )));
        }
        CpuBackend::new(self.settings.clone())?.render_plan(&self.plan_at(idx))
    }
}

#[derive(Debug)]
struct FrameMsg {
    idx: FrameIndex,
    frame: FrameRGBA,
}

/// Render `opts.range` of `session` into `sink`.
///
/// The sink sees frames in strictly increasing order even when the pool finishes them out of
/// order; a reorder buffer on the sink thread holds early arrivals.
#[tracing::instrument(skip(session, opts, sink))]
pub fn export_song(
    session: &SongSession,
    opts: &ExportOpts,
    sink: &mut dyn FrameSink,
) -> LyricDanceResult<RenderStats> {
    let total = session.total_frames();
    let range = opts
        .range
        .unwrap_or(FrameRange {
            start: FrameIndex(0),
            end: FrameIndex(total),
        })
        .clamp_to(total);
    if range.is_empty() {
        return Err(LyricDanceError::validation(
            "export range is empty or past the end of the song",
        ));
    }

    let canvas = session.scene.canvas();
    let cfg = SinkConfig {
        canvas,
        fps: session.fps,
        audio_path: session.audio_path.clone(),
    };
    let max_chunk_by_mem = (MAX_REORDER_BUFFER_BYTES / (canvas.byte_len() as u64).max(1)).max(1);
    let chunk_size = (opts.chunk_size.max(1) as u64)
        .min(max_chunk_by_mem)
        .min(range.len_frames());
    let pool = if opts.parallel {
        Some(build_thread_pool(opts.threads)?)
    } else {
        None
    };
    tracing::debug!(
        frames = range.len_frames(),
        chunk_size,
        parallel = opts.parallel,
        "export started"
    );

    std::thread::scope(|scope| -> LyricDanceResult<RenderStats> {
        let (tx, rx) = mpsc::sync_channel::<FrameMsg>(opts.channel_capacity.max(1));
        let sink_ref: &mut dyn FrameSink = sink;

        let enc = scope.spawn(move || -> LyricDanceResult<()> {
            sink_ref.begin(cfg)?;
            let mut next = range.start.0;
            let mut pending = HashMap::<u64, FrameRGBA>::new();
            while next < range.end.0 {
                if let Some(frame) = pending.remove(&next) {
                    sink_ref.push_frame(FrameIndex(next), &frame)?;
                    next += 1;
                    continue;
                }
                let msg = rx
                    .recv()
                    .map_err(|_| LyricDanceError::render("frame producer stopped early"))?;
                pending.insert(msg.idx.0, msg.frame);
            }
            sink_ref.end()
        });

        let mut stats = RenderStats {
            frames_total: range.len_frames(),
            frames_rendered: 0,
        };
        let send = |idx: FrameIndex, frame: FrameRGBA| {
            tx.send(FrameMsg { idx, frame })
                .map_err(|_| LyricDanceError::render("sink thread is not accepting frames"))
        };

        let produced = (|| -> LyricDanceResult<()> {
            let mut chunk_start = range.start.0;
            match pool.as_ref() {
                Some(pool) => {
                    while chunk_start < range.end.0 {
                        let chunk_end = (chunk_start + chunk_size).min(range.end.0);
                        pool.install(|| {
                            (chunk_start..chunk_end)
                                .into_par_iter()
                                .map_init(
                                    || CpuBackend::new(session.settings.clone()),
                                    |backend, f| -> LyricDanceResult<(FrameIndex, FrameRGBA)> {
                                        let backend = backend.as_mut().map_err(|e| {
                                            LyricDanceError::render(e.to_string())
                                        })?;
                                        let idx = FrameIndex(f);
                                        Ok((idx, backend.render_plan(&session.plan_at(idx))?))
                                    },
                                )
                                .try_for_each(|r| {
                                    let (idx, frame) = r?;
                                    send(idx, frame)
                                })
                        })?;
                        stats.frames_rendered += chunk_end - chunk_start;
                        chunk_start = chunk_end;
                    }
                }
                None => {
                    let mut backend = CpuBackend::new(session.settings.clone())?;
                    for f in range.start.0..range.end.0 {
                        let idx = FrameIndex(f);
                        let frame = backend.render_plan(&session.plan_at(idx))?;
                        send(idx, frame)?;
                        stats.frames_rendered += 1;
                    }
                }
            }
            Ok(())
        })();

        drop(tx);
        let encoded = enc
            .join()
            .map_err(|_| LyricDanceError::render("sink thread panicked"))?;
        produced?;
        encoded?;
        tracing::debug!(frames = stats.frames_rendered, "export finished");
        Ok(stats)
    })
}

fn build_thread_pool(threads: Option<usize>) -> LyricDanceResult<rayon::ThreadPool> {
    if threads == Some(0) {
        return Err(LyricDanceError::validation(
            "export 'threads' must be >= 1 when set",
        ));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| LyricDanceError::render(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/session/export.rs"]
mod tests;
