use std::{path::Path, sync::Arc};

use crate::{
    foundation::{
        core::{Canvas, Rect, Rgb},
        error::{LyricDanceError, LyricDanceResult},
    },
    render::plan::{BlendMode, DrawOp, FramePlan, GradePass, GradientOp, TextOp},
};

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha**; the flag makes that explicit at API boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.data.get(i..i + 4)?.try_into().ok()
    }
}

/// Executes the ops of a [`FramePlan`] in order.
///
/// A backend owns its drawing surface between [`begin_frame`](Self::begin_frame) and
/// [`finish_frame`](Self::finish_frame). Most callers go through [`DrawBackend::render_plan`].
pub trait DrawBackend {
    /// Start a frame cleared to an opaque `clear` color.
    fn begin_frame(&mut self, canvas: Canvas, clear: Rgb) -> LyricDanceResult<()>;
    /// Solid rectangle fill.
    fn fill(&mut self, rect: Rect, color: Rgb, alpha: f64, blend: BlendMode) -> LyricDanceResult<()>;
    /// Gradient fill.
    fn gradient(&mut self, op: &GradientOp) -> LyricDanceResult<()>;
    /// Full-frame grade over everything drawn so far.
    fn grade(&mut self, pass: &GradePass) -> LyricDanceResult<()>;
    /// Text run.
    fn text(&mut self, op: &TextOp) -> LyricDanceResult<()>;
    /// Finish and read back the frame.
    fn finish_frame(&mut self) -> LyricDanceResult<FrameRGBA>;

    /// Execute `plan` and read back the frame.
    fn render_plan(&mut self, plan: &FramePlan) -> LyricDanceResult<FrameRGBA> {
        execute_plan(self, plan)
    }
}

/// Run every op of `plan` on `backend`.
pub fn execute_plan<B: DrawBackend + ?Sized>(
    backend: &mut B,
    plan: &FramePlan,
) -> LyricDanceResult<FrameRGBA> {
    backend.begin_frame(plan.canvas, plan.clear)?;
    for op in &plan.ops {
        match op {
            DrawOp::Fill {
                rect,
                color,
                alpha,
                blend,
            } => backend.fill(*rect, *color, *alpha, *blend)?,
            DrawOp::Gradient(g) => backend.gradient(g)?,
            DrawOp::Grade(g) => backend.grade(g)?,
            DrawOp::Text(t) => backend.text(t)?,
        }
    }
    backend.finish_frame()
}

/// Available backend kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// CPU raster backend powered by `vello_cpu`.
    #[default]
    Cpu,
}

/// Backend-agnostic settings.
#[derive(Clone, Debug, Default)]
pub struct RenderSettings {
    /// Font used for lyric text. Without one, text ops are skipped.
    pub font_bytes: Option<Arc<Vec<u8>>>,
}

impl RenderSettings {
    /// Settings with the font at `path` loaded.
    pub fn with_font_file(path: &Path) -> LyricDanceResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            LyricDanceError::render(format!("failed to read font '{}': {e}", path.display()))
        })?;
        Ok(Self {
            font_bytes: Some(Arc::new(bytes)),
        })
    }
}

/// Create a rendering backend implementation.
pub fn create_backend(
    kind: BackendKind,
    settings: &RenderSettings,
) -> LyricDanceResult<Box<dyn DrawBackend>> {
    match kind {
        BackendKind::Cpu => Ok(Box::new(crate::render::cpu::CpuBackend::new(
            settings.clone(),
        )?)),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;
