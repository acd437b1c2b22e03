use std::path::PathBuf;
use std::sync::mpsc;

use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{LyricDanceError, LyricDanceResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::backend::FrameRGBA;

/// Handed to a [`FrameSink`] before the first frame.
#[derive(Clone, Debug, PartialEq)]
pub struct SinkConfig {
    /// Frame size.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
    /// Song file to mux under the video, for sinks that encode audio.
    pub audio_path: Option<PathBuf>,
}

/// Consumer of rendered frames.
///
/// `push_frame` is called with strictly increasing indices between one `begin` and one `end`.
pub trait FrameSink: Send {
    /// Called once before any frame.
    fn begin(&mut self, cfg: SinkConfig) -> LyricDanceResult<()>;
    /// Accept one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> LyricDanceResult<()>;
    /// Called once after the last frame.
    fn end(&mut self) -> LyricDanceResult<()>;
}

/// Keeps every frame in memory. Meant for tests and previews.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    ended: bool,
}

impl InMemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Config captured by `begin`.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    /// Captured frames in push order.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    /// Whether `end` was called.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> LyricDanceResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> LyricDanceResult<()> {
        check_order(self.frames.last().map(|(i, _)| *i), idx)?;
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> LyricDanceResult<()> {
        self.ended = true;
        Ok(())
    }
}

/// Forwards frames to another thread over a channel.
///
/// The render worker presents through one of these; the receiving side owns the pixels from then on.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<(FrameIndex, FrameRGBA)>,
    last: Option<FrameIndex>,
}

impl ChannelSink {
    /// Sink plus the receiving end.
    pub fn new() -> (Self, mpsc::Receiver<(FrameIndex, FrameRGBA)>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx, last: None }, rx)
    }
}

impl FrameSink for ChannelSink {
    fn begin(&mut self, _cfg: SinkConfig) -> LyricDanceResult<()> {
        self.last = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> LyricDanceResult<()> {
        check_order(self.last, idx)?;
        self.last = Some(idx);
        self.tx
            .send((idx, frame.clone()))
            .map_err(|_| LyricDanceError::render("frame receiver dropped"))
    }

    fn end(&mut self) -> LyricDanceResult<()> {
        Ok(())
    }
}

/// Writes `frame_000000.png`, `frame_000001.png`, ... into a directory.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    bg_rgba: [u8; 4],
    scratch: Vec<u8>,
    canvas: Option<Canvas>,
    last: Option<FrameIndex>,
}

impl PngSequenceSink {
    /// Sink writing into `dir`, flattening alpha over `bg_rgba`.
    pub fn new(dir: impl Into<PathBuf>, bg_rgba: [u8; 4]) -> Self {
        Self {
            dir: dir.into(),
            bg_rgba,
            scratch: Vec::new(),
            canvas: None,
            last: None,
        }
    }

    /// Path of frame `idx`.
    pub fn frame_path(&self, idx: FrameIndex) -> PathBuf {
        self.dir.join(format!("frame_{:06}.png", idx.0))
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> LyricDanceResult<()> {
        use anyhow::Context as _;
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create frame directory '{}'", self.dir.display()))?;
        self.scratch = vec![0; cfg.canvas.byte_len()];
        self.canvas = Some(cfg.canvas);
        self.last = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> LyricDanceResult<()> {
        let canvas = self
            .canvas
            .ok_or_else(|| LyricDanceError::render("png sink not started"))?;
        check_order(self.last, idx)?;
        check_size(canvas, frame)?;
        self.last = Some(idx);
        flatten_premul_over_bg(&mut self.scratch, &frame.data, self.bg_rgba)?;
        let path = self.frame_path(idx);
        image::save_buffer_with_format(
            &path,
            &self.scratch,
            frame.width,
            frame.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .map_err(|e| LyricDanceError::render(format!("write png '{}': {e}", path.display())))
    }

    fn end(&mut self) -> LyricDanceResult<()> {
        self.canvas = None;
        Ok(())
    }
}

pub(crate) fn check_order(last: Option<FrameIndex>, idx: FrameIndex) -> LyricDanceResult<()> {
    match last {
        Some(prev) if idx <= prev => Err(LyricDanceError::render(format!(
            "out-of-order frame {} after {}",
            idx.0, prev.0
        ))),
        _ => Ok(()),
    }
}

pub(crate) fn check_size(canvas: Canvas, frame: &FrameRGBA) -> LyricDanceResult<()> {
    if frame.width != canvas.width || frame.height != canvas.height {
        return Err(LyricDanceError::validation(format!(
            "frame size mismatch: got {}x{}, expected {}x{}",
            frame.width, frame.height, canvas.width, canvas.height
        )));
    }
    if frame.data.len() != canvas.byte_len() {
        return Err(LyricDanceError::validation(
            "frame data length does not match width*height*4",
        ));
    }
    Ok(())
}

/// Composite premultiplied RGBA8 over an opaque background; output alpha is always 255.
pub(crate) fn flatten_premul_over_bg(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> LyricDanceResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(LyricDanceError::validation(
            "flatten expects equal-length rgba8 buffers",
        ));
    }
    let bg = [bg_rgba[0], bg_rgba[1], bg_rgba[2]].map(u16::from);
    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let inv = 255 - u16::from(s[3]);
        for c in 0..3 {
            d[c] = (u16::from(s[c]) + mul_div255_u16(bg[c], inv)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
