use crate::{
    compose::layout::LINE_HEIGHT,
    foundation::{
        core::{Affine, Canvas, Point, Rect, Rgb, Vec2},
        error::{LyricDanceError, LyricDanceResult},
        math::{Fnv1a64, clamp01, mul_div255_u8},
    },
    grade::mood::{GradeFilter, GrainSpec, VignetteSpec},
    render::{
        backend::{DrawBackend, FrameRGBA, RenderSettings},
        plan::{BlendMode, GradePass, GradientOp, GradientShape, GradientStop, TextOp},
        text::{TextBrushRgba8, TextLayoutEngine},
    },
};

/// CPU raster backend.
///
/// Fills, gradients and the grade pass run per pixel on a premultiplied RGBA8 buffer; glyphs are
/// rasterized with `vello_cpu` into a scratch pixmap and composited region by region.
pub struct CpuBackend {
    text: Option<TextLayoutEngine>,
    ctx: Option<vello_cpu::RenderContext>,
    scratch: Option<vello_cpu::Pixmap>,
    frame: Option<CpuFrame>,
    tmp: Vec<u8>,
    warned_no_font: bool,
}

struct CpuFrame {
    canvas: Canvas,
    data: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PixelRegion {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl PixelRegion {
    fn of(rect: Rect, canvas: Canvas) -> Self {
        let clamp = |v: f64, max: u32| v.round().clamp(0.0, f64::from(max)) as u32;
        Self {
            x0: clamp(rect.x0.min(rect.x1), canvas.width),
            y0: clamp(rect.y0.min(rect.y1), canvas.height),
            x1: clamp(rect.x0.max(rect.x1), canvas.width),
            y1: clamp(rect.y0.max(rect.y1), canvas.height),
        }
    }

    fn width(self) -> u32 {
        self.x1 - self.x0
    }

    fn height(self) -> u32 {
        self.y1 - self.y0
    }

    fn is_empty(self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }
}

impl CpuBackend {
    /// Construct a backend; registers the font from `settings` when present.
    pub fn new(settings: RenderSettings) -> LyricDanceResult<Self> {
        let text = settings
            .font_bytes
            .map(TextLayoutEngine::new)
            .transpose()?;
        Ok(Self {
            text,
            ctx: None,
            scratch: None,
            frame: None,
            tmp: Vec::new(),
            warned_no_font: false,
        })
    }

    fn frame_mut(&mut self) -> LyricDanceResult<&mut CpuFrame> {
        self.frame
            .as_mut()
            .ok_or_else(|| LyricDanceError::render("draw call outside begin_frame/finish_frame"))
    }

    /// Rasterize `layout` under `transform` in a flat color into the scratch pixmap.
    fn rasterize_glyphs(
        &mut self,
        canvas: Canvas,
        layout: &parley::Layout<TextBrushRgba8>,
        font: &vello_cpu::peniko::FontData,
        transform: Affine,
        color: Rgb,
    ) -> LyricDanceResult<()> {
        let (width, height) = canvas_u16(canvas)?;
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        ctx.set_transform(affine_to_cpu(transform));
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, 255,
        ));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        ctx.flush();

        let mut scratch = match self.scratch.take() {
            Some(p) if p.width() == width && p.height() == height => p,
            _ => vello_cpu::Pixmap::new(width, height),
        };
        scratch.data_as_u8_slice_mut().fill(0);
        ctx.render_to_pixmap(&mut scratch);
        self.scratch = Some(scratch);
        self.ctx = Some(ctx);
        Ok(())
    }

    /// Composite `region` of the scratch pixmap onto the frame, optionally blurred first.
    fn composite_scratch(&mut self, region: PixelRegion, blur_px: f64, opacity: f64) -> LyricDanceResult<()> {
        if region.is_empty() {
            return Ok(());
        }
        let scratch = self
            .scratch
            .as_ref()
            .ok_or_else(|| LyricDanceError::render("scratch pixmap missing"))?;
        let src = scratch.data_as_u8_slice();
        let frame = self
            .frame
            .as_mut()
            .ok_or_else(|| LyricDanceError::render("draw call outside begin_frame/finish_frame"))?;
        let stride = frame.canvas.width as usize * 4;

        let (rw, rh) = (region.width(), region.height());
        let mut buf = Vec::with_capacity(rw as usize * rh as usize * 4);
        for y in region.y0..region.y1 {
            let row = y as usize * stride;
            buf.extend_from_slice(&src[row + region.x0 as usize * 4..row + region.x1 as usize * 4]);
        }
        if blur_px > 0.0 {
            let radius = (blur_px * 3.0).ceil().max(1.0) as u32;
            let kernel = gaussian_kernel_q16(radius, blur_px as f32)?;
            self.tmp.resize(buf.len(), 0);
            horizontal_blur_q16(&buf, &mut self.tmp, rw, rh, &kernel);
            vertical_blur_q16(&self.tmp, &mut buf, rw, rh, &kernel);
        }

        let op = opacity_u16(opacity);
        for (ry, y) in (region.y0..region.y1).enumerate() {
            let row = y as usize * stride + region.x0 as usize * 4;
            let dst = &mut frame.data[row..row + rw as usize * 4];
            let src = &buf[ry * rw as usize * 4..(ry + 1) * rw as usize * 4];
            for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                premul_over_px(d, [s[0], s[1], s[2], s[3]], op);
            }
        }
        Ok(())
    }
}

impl DrawBackend for CpuBackend {
    fn begin_frame(&mut self, canvas: Canvas, clear: Rgb) -> LyricDanceResult<()> {
        canvas_u16(canvas)?;
        let mut frame = match self.frame.take() {
            Some(f) if f.canvas == canvas => f,
            _ => CpuFrame {
                canvas,
                data: vec![0; canvas.byte_len()],
            },
        };
        let px = [clear.r, clear.g, clear.b, 255];
        for d in frame.data.chunks_exact_mut(4) {
            d.copy_from_slice(&px);
        }
        self.frame = Some(frame);
        Ok(())
    }

    fn fill(&mut self, rect: Rect, color: Rgb, alpha: f64, blend: BlendMode) -> LyricDanceResult<()> {
        let frame = self.frame_mut()?;
        let src = premul_px(color, alpha);
        if src[3] == 0 {
            return Ok(());
        }
        let region = PixelRegion::of(rect, frame.canvas);
        let stride = frame.canvas.width as usize * 4;
        for y in region.y0..region.y1 {
            let row = y as usize * stride;
            let span = &mut frame.data[row + region.x0 as usize * 4..row + region.x1 as usize * 4];
            for d in span.chunks_exact_mut(4) {
                blend_px(d, src, blend);
            }
        }
        Ok(())
    }

    fn gradient(&mut self, op: &GradientOp) -> LyricDanceResult<()> {
        let frame = self.frame_mut()?;
        if op.stops.is_empty() {
            return Ok(());
        }
        let region = PixelRegion::of(op.rect, frame.canvas);
        let stride = frame.canvas.width as usize * 4;
        for y in region.y0..region.y1 {
            for x in region.x0..region.x1 {
                let p = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let t = gradient_param(op.shape, p);
                let (color, alpha) = sample_stops(&op.stops, t);
                let src = premul_px(color, alpha);
                let i = y as usize * stride + x as usize * 4;
                blend_px(&mut frame.data[i..i + 4], src, op.blend);
            }
        }
        Ok(())
    }

    fn grade(&mut self, pass: &GradePass) -> LyricDanceResult<()> {
        let Self { frame, tmp, .. } = self;
        let frame = frame
            .as_mut()
            .ok_or_else(|| LyricDanceError::render("draw call outside begin_frame/finish_frame"))?;
        let (w, h) = (frame.canvas.width, frame.canvas.height);

        let m = grade_matrix(&pass.filter);
        if m != IDENTITY_MATRIX {
            tmp.clear();
            tmp.extend_from_slice(&frame.data);
            color_matrix_rgba8_premul(tmp.as_slice(), &mut frame.data, m);
        }
        if let Some(px) = pass.filter.blur_px
            && px > 0.0
        {
            let radius = (px * 3.0).ceil().max(1.0) as u32;
            let kernel = gaussian_kernel_q16(radius, px as f32)?;
            tmp.resize(frame.data.len(), 0);
            horizontal_blur_q16(&frame.data, tmp.as_mut_slice(), w, h, &kernel);
            vertical_blur_q16(tmp.as_slice(), &mut frame.data, w, h, &kernel);
        }
        if pass.grain.amount > 0.0 {
            apply_grain(&mut frame.data, w, h, pass.grain, pass.seed);
        }
        if pass.vignette.strength > 0.0 {
            apply_vignette(&mut frame.data, w, h, pass.vignette);
        }
        Ok(())
    }

    fn text(&mut self, op: &TextOp) -> LyricDanceResult<()> {
        let canvas = self.frame_mut()?.canvas;
        if op.text.trim().is_empty() || op.opacity <= 0.0 {
            return Ok(());
        }
        if self.text.is_none() {
            if !self.warned_no_font {
                tracing::warn!("no font configured; lyric text is not drawn");
                self.warned_no_font = true;
            }
            return Ok(());
        }
        let Some(engine) = self.text.as_mut() else {
            return Ok(());
        };

        let brush = TextBrushRgba8 {
            r: op.color.r,
            g: op.color.g,
            b: op.color.b,
            a: 255,
        };
        let layout = engine.layout_line(&op.text, op.font_size as f32, brush)?;
        let font = engine.font().clone();

        let (lw, lh) = (f64::from(layout.width()), f64::from(layout.height()));
        let inset = Vec2::new(
            (op.width - lw) / 2.0,
            (op.font_size * LINE_HEIGHT - lh) / 2.0,
        );
        let placed = op.transform * Affine::translate(op.origin.to_vec2() + inset);
        let bounds = placed.transform_rect_bbox(Rect::new(0.0, 0.0, lw, lh));

        if let Some(glow) = op.glow
            && glow.strength > 0.0
        {
            self.rasterize_glyphs(canvas, &layout, &font, placed, glow.color)?;
            let pad = glow.radius_px * 3.0 + 1.0;
            let region = PixelRegion::of(bounds.inflate(pad, pad), canvas);
            self.composite_scratch(region, glow.radius_px, glow.strength * op.opacity)?;
        }
        if let Some(shadow) = op.shadow
            && shadow.alpha > 0.0
        {
            let shifted = Affine::translate(shadow.offset) * placed;
            self.rasterize_glyphs(canvas, &layout, &font, shifted, shadow.color)?;
            let pad = shadow.blur_px * 3.0 + 1.0;
            let region = PixelRegion::of((bounds + shadow.offset).inflate(pad, pad), canvas);
            self.composite_scratch(region, shadow.blur_px, shadow.alpha * op.opacity)?;
        }

        self.rasterize_glyphs(canvas, &layout, &font, placed, op.color)?;
        let region = PixelRegion::of(bounds.inflate(1.0, 1.0), canvas);
        self.composite_scratch(region, 0.0, op.opacity)
    }

    fn finish_frame(&mut self) -> LyricDanceResult<FrameRGBA> {
        let frame = self
            .frame
            .take()
            .ok_or_else(|| LyricDanceError::render("finish_frame without begin_frame"))?;
        Ok(FrameRGBA {
            width: frame.canvas.width,
            height: frame.canvas.height,
            data: frame.data,
            premultiplied: true,
        })
    }
}

fn canvas_u16(canvas: Canvas) -> LyricDanceResult<(u16, u16)> {
    let w: u16 = canvas
        .width
        .try_into()
        .map_err(|_| LyricDanceError::render("canvas width exceeds u16"))?;
    let h: u16 = canvas
        .height
        .try_into()
        .map_err(|_| LyricDanceError::render("canvas height exceeds u16"))?;
    Ok((w, h))
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn opacity_u16(opacity: f64) -> u16 {
    (clamp01(opacity) * 255.0).round() as u16
}

fn premul_px(color: Rgb, alpha: f64) -> [u8; 4] {
    let p = color.to_rgba8_premul(clamp01(alpha));
    [p.r, p.g, p.b, p.a]
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

fn premul_over_px(d: &mut [u8], s: [u8; 4], op: u16) {
    if op == 0 {
        return;
    }
    let sa = mul_div255_u8(u16::from(s[3]), op);
    if sa == 0 {
        return;
    }
    let inv = 255u16 - u16::from(sa);
    d[3] = add_sat_u8(sa, mul_div255_u8(u16::from(d[3]), inv));
    for c in 0..3 {
        let sc = mul_div255_u8(u16::from(s[c]), op);
        let dc = mul_div255_u8(u16::from(d[c]), inv);
        d[c] = add_sat_u8(sc, dc);
    }
}

fn blend_px(d: &mut [u8], s: [u8; 4], blend: BlendMode) {
    match blend {
        BlendMode::Normal => premul_over_px(d, s, 255),
        BlendMode::Additive => {
            for c in 0..4 {
                d[c] = add_sat_u8(d[c], s[c]);
            }
        }
    }
}

fn gradient_param(shape: GradientShape, p: Point) -> f64 {
    match shape {
        GradientShape::Linear { start, end } => {
            let v = end - start;
            let len2 = v.hypot2();
            if len2 <= f64::EPSILON {
                0.0
            } else {
                clamp01((p - start).dot(v) / len2)
            }
        }
        GradientShape::Radial { center, radius } => {
            if radius <= f64::EPSILON {
                1.0
            } else {
                clamp01((p - center).hypot() / radius)
            }
        }
    }
}

fn sample_stops(stops: &[GradientStop], t: f64) -> (Rgb, f64) {
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return (Rgb::BLACK, 0.0);
    };
    if t <= first.offset {
        return (first.color, first.alpha);
    }
    if t >= last.offset {
        return (last.color, last.alpha);
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t >= a.offset && t <= b.offset {
            let span = b.offset - a.offset;
            let local = if span <= f64::EPSILON { 0.0 } else { (t - a.offset) / span };
            return (
                a.color.mix(b.color, local),
                a.alpha + (b.alpha - a.alpha) * local,
            );
        }
    }
    (last.color, last.alpha)
}

const IDENTITY_MATRIX: [f32; 20] = [
    1.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, 0.0,
];

/// 4x5 matrix acting on rgb only, alpha passed through.
fn rgb_matrix(m: [f32; 9], offset: f32) -> [f32; 20] {
    [
        m[0], m[1], m[2], 0.0, offset, //
        m[3], m[4], m[5], 0.0, offset, //
        m[6], m[7], m[8], 0.0, offset, //
        0.0, 0.0, 0.0, 1.0, 0.0,
    ]
}

/// Matrix applying `first`, then `then`.
fn concat(first: [f32; 20], then: [f32; 20]) -> [f32; 20] {
    let mut out = [0.0f32; 20];
    for r in 0..4 {
        for c in 0..5 {
            let mut acc: f32 = (0..4).map(|k| then[r * 5 + k] * first[k * 5 + c]).sum();
            if c == 4 {
                acc += then[r * 5 + 4];
            }
            out[r * 5 + c] = acc;
        }
    }
    out
}

/// The color part of `filter` as one matrix, in CSS order.
fn grade_matrix(filter: &GradeFilter) -> [f32; 20] {
    let mut m = IDENTITY_MATRIX;
    let b = filter.brightness as f32;
    if b != 1.0 {
        m = concat(m, rgb_matrix([b, 0.0, 0.0, 0.0, b, 0.0, 0.0, 0.0, b], 0.0));
    }
    let s = filter.saturate as f32;
    if s != 1.0 {
        m = concat(
            m,
            rgb_matrix(
                [
                    0.213 + 0.787 * s,
                    0.715 - 0.715 * s,
                    0.072 - 0.072 * s,
                    0.213 - 0.213 * s,
                    0.715 + 0.285 * s,
                    0.072 - 0.072 * s,
                    0.213 - 0.213 * s,
                    0.715 - 0.715 * s,
                    0.072 + 0.928 * s,
                ],
                0.0,
            ),
        );
    }
    let c = filter.contrast as f32;
    if c != 1.0 {
        m = concat(
            m,
            rgb_matrix([c, 0.0, 0.0, 0.0, c, 0.0, 0.0, 0.0, c], 0.5 - 0.5 * c),
        );
    }
    if let Some(amount) = filter.sepia {
        let k = 1.0 - clamp01(amount) as f32;
        m = concat(
            m,
            rgb_matrix(
                [
                    0.393 + 0.607 * k,
                    0.769 - 0.769 * k,
                    0.189 - 0.189 * k,
                    0.349 - 0.349 * k,
                    0.686 + 0.314 * k,
                    0.168 - 0.168 * k,
                    0.272 - 0.272 * k,
                    0.534 - 0.534 * k,
                    0.131 + 0.869 * k,
                ],
                0.0,
            ),
        );
    }
    if let Some(deg) = filter.hue_rotate_deg
        && deg != 0
    {
        let (sin, cos) = (deg as f32).to_radians().sin_cos();
        m = concat(
            m,
            rgb_matrix(
                [
                    0.213 + cos * 0.787 - sin * 0.213,
                    0.715 - cos * 0.715 - sin * 0.715,
                    0.072 - cos * 0.072 + sin * 0.928,
                    0.213 - cos * 0.213 + sin * 0.143,
                    0.715 + cos * 0.285 + sin * 0.140,
                    0.072 - cos * 0.072 - sin * 0.283,
                    0.213 - cos * 0.213 - sin * 0.787,
                    0.715 - cos * 0.715 + sin * 0.715,
                    0.072 + cos * 0.928 + sin * 0.072,
                ],
                0.0,
            ),
        );
    }
    m
}

fn color_matrix_rgba8_premul(src: &[u8], dst: &mut [u8], m: [f32; 20]) {
    debug_assert_eq!(src.len(), dst.len());
    for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        let pa = s[3] as f32 / 255.0;
        let inv_a = if pa > 0.0 { 1.0 / pa } else { 0.0 };
        let r = s[0] as f32 / 255.0 * inv_a;
        let g = s[1] as f32 / 255.0 * inv_a;
        let b = s[2] as f32 / 255.0 * inv_a;

        let row = |i: usize| {
            (m[i] * r + m[i + 1] * g + m[i + 2] * b + m[i + 3] * pa + m[i + 4]).clamp(0.0, 1.0)
        };
        let (out_r, out_g, out_b, out_a) = (row(0), row(5), row(10), row(15));

        d[0] = (out_r * out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        d[1] = (out_g * out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        d[2] = (out_b * out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        d[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> LyricDanceResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(LyricDanceError::render("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| (-f64::from(i * i) / denom).exp())
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(LyricDanceError::render("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

fn horizontal_blur_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_blur_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

fn hash_u32(seed: u64, x: u32, y: u32) -> u32 {
    let mut h = Fnv1a64::new(seed ^ Fnv1a64::OFFSET_BASIS);
    h.write_u64(u64::from(x));
    h.write_u64(u64::from(y));
    (h.finish() & 0xFFFF_FFFF) as u32
}

/// Deterministic luminance noise in cells of `size_px`, keyed by `seed`.
fn apply_grain(data: &mut [u8], width: u32, height: u32, grain: GrainSpec, seed: u64) {
    let cell = grain.size_px.max(1.0);
    let amp = clamp01(grain.amount) * 127.5;
    for y in 0..height {
        let cy = (f64::from(y) / cell) as u32;
        for x in 0..width {
            let cx = (f64::from(x) / cell) as u32;
            let noise = f64::from(hash_u32(seed, cx, cy)) / f64::from(u32::MAX) * 2.0 - 1.0;
            let delta = noise * amp;
            let i = ((y as usize) * (width as usize) + x as usize) * 4;
            let a = f64::from(data[i + 3]);
            for c in 0..3 {
                data[i + c] = (f64::from(data[i + c]) + delta).round().clamp(0.0, a) as u8;
            }
        }
    }
}

/// Darken toward the corners: untouched inside `inner_radius`, `1 - strength` at the corners.
fn apply_vignette(data: &mut [u8], width: u32, height: u32, v: VignetteSpec) {
    let (cx, cy) = (f64::from(width) / 2.0, f64::from(height) / 2.0);
    let max_d = cx.hypot(cy).max(f64::EPSILON);
    let inner = clamp01(v.inner_radius);
    let strength = clamp01(v.strength);
    for y in 0..height {
        for x in 0..width {
            let d = (f64::from(x) + 0.5 - cx).hypot(f64::from(y) + 0.5 - cy) / max_d;
            let t = if inner >= 1.0 {
                0.0
            } else {
                let u = clamp01((d - inner) / (1.0 - inner));
                u * u * (3.0 - 2.0 * u)
            };
            let factor = 1.0 - strength * t;
            if factor >= 1.0 {
                continue;
            }
            let i = ((y as usize) * (width as usize) + x as usize) * 4;
            for c in 0..3 {
                data[i + c] = (f64::from(data[i + c]) * factor).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
