use smallvec::SmallVec;

use crate::{
    foundation::core::{Affine, Canvas, Point, Rect, Rgb, Vec2},
    grade::mood::{GradeFilter, GrainSpec, VignetteSpec},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// How a draw op combines with what is already on the frame.
pub enum BlendMode {
    /// Source-over.
    #[default]
    Normal,
    /// Additive light (`src + dst`, saturating).
    Additive,
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// One color stop of a gradient.
pub struct GradientStop {
    /// Position along the gradient in `[0, 1]`.
    pub offset: f64,
    /// Stop color.
    pub color: Rgb,
    /// Stop alpha in `[0, 1]`.
    pub alpha: f64,
}

impl GradientStop {
    /// Convenience constructor.
    pub fn new(offset: f64, color: Rgb, alpha: f64) -> Self {
        Self {
            offset,
            color,
            alpha,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// Gradient geometry.
pub enum GradientShape {
    /// Along the segment `start -> end`.
    Linear {
        /// Offset 0.
        start: Point,
        /// Offset 1.
        end: Point,
    },
    /// Outward from `center`; offset 1 at `radius`.
    Radial {
        /// Offset 0.
        center: Point,
        /// Distance of offset 1.
        radius: f64,
    },
}

#[derive(Clone, Debug, PartialEq)]
/// Gradient fill of a rectangle.
pub struct GradientOp {
    /// Area covered.
    pub rect: Rect,
    /// Geometry.
    pub shape: GradientShape,
    /// Stops, sorted by offset.
    pub stops: SmallVec<[GradientStop; 4]>,
    /// Compositing mode.
    pub blend: BlendMode,
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// Drop shadow under a text op.
pub struct ShadowSpec {
    /// Shadow displacement in pixels.
    pub offset: Vec2,
    /// Softness in pixels.
    pub blur_px: f64,
    /// Shadow color.
    pub color: Rgb,
    /// Shadow alpha in `[0, 1]`.
    pub alpha: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// Halo around a text op.
pub struct GlowSpec {
    /// Halo radius in pixels.
    pub radius_px: f64,
    /// Halo strength in `[0, 1]`.
    pub strength: f64,
    /// Halo color.
    pub color: Rgb,
}

#[derive(Clone, Debug, PartialEq)]
/// One run of text, laid out as a single line.
pub struct TextOp {
    /// Text to draw.
    pub text: String,
    /// Top-left of the text box before `transform`.
    pub origin: Point,
    /// Box width; the glyph run is centered inside it.
    pub width: f64,
    /// Font size in pixels.
    pub font_size: f64,
    /// Fill color.
    pub color: Rgb,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// Canvas-space transform applied after placing the box at `origin`.
    pub transform: Affine,
    /// Optional drop shadow.
    pub shadow: Option<ShadowSpec>,
    /// Optional glow.
    pub glow: Option<GlowSpec>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// Full-frame grade: color filter, blur, grain and vignette.
pub struct GradePass {
    /// Filter chain.
    pub filter: GradeFilter,
    /// Grain recipe.
    pub grain: GrainSpec,
    /// Vignette recipe.
    pub vignette: VignetteSpec,
    /// Seed for deterministic grain.
    pub seed: u64,
}

#[derive(Clone, Debug, PartialEq)]
/// One draw operation in a [`FramePlan`].
pub enum DrawOp {
    /// Solid fill of a rectangle.
    Fill {
        /// Area covered.
        rect: Rect,
        /// Fill color.
        color: Rgb,
        /// Fill alpha in `[0, 1]`.
        alpha: f64,
        /// Compositing mode.
        blend: BlendMode,
    },
    /// Gradient fill.
    Gradient(GradientOp),
    /// Full-frame grade over everything drawn so far.
    Grade(GradePass),
    /// Text run.
    Text(TextOp),
}

impl DrawOp {
    /// Short stable name, used for logs and tests.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fill { .. } => "fill",
            Self::Gradient(_) => "gradient",
            Self::Grade(_) => "grade",
            Self::Text(_) => "text",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Backend-agnostic draw list for one frame.
///
/// Ops execute in order over a frame cleared to `clear`. Background, tint and lighting ops come
/// first, then the grade, then text.
pub struct FramePlan {
    /// Target canvas.
    pub canvas: Canvas,
    /// Opaque clear color.
    pub clear: Rgb,
    /// Ordered ops.
    pub ops: Vec<DrawOp>,
}

impl FramePlan {
    /// Empty plan.
    pub fn new(canvas: Canvas, clear: Rgb) -> Self {
        Self {
            canvas,
            clear,
            ops: Vec::new(),
        }
    }

    /// Append an op.
    pub fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    /// Append a full-canvas solid fill.
    pub fn fill_canvas(&mut self, color: Rgb, alpha: f64, blend: BlendMode) {
        self.ops.push(DrawOp::Fill {
            rect: self.canvas.rect(),
            color,
            alpha,
            blend,
        });
    }

    /// Op kinds in order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.ops.iter().map(DrawOp::kind).collect()
    }

    /// Iterate the text ops.
    pub fn text_ops(&self) -> impl Iterator<Item = &TextOp> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text(t) => Some(t),
            _ => None,
        })
    }
}
