use super::*;
use crate::{
    foundation::core::{Affine, Point},
    grade::mood::{GradeFilter, GrainSpec, VignetteSpec},
};

#[derive(Default)]
struct MockBackend {
    calls: Vec<&'static str>,
    canvas: Option<Canvas>,
}

impl DrawBackend for MockBackend {
    fn begin_frame(&mut self, canvas: Canvas, _clear: Rgb) -> LyricDanceResult<()> {
        self.calls.push("begin");
        self.canvas = Some(canvas);
        Ok(())
    }

    fn fill(&mut self, _rect: Rect, _color: Rgb, _alpha: f64, _blend: BlendMode) -> LyricDanceResult<()> {
        self.calls.push("fill");
        Ok(())
    }

    fn gradient(&mut self, _op: &GradientOp) -> LyricDanceResult<()> {
        self.calls.push("gradient");
        Ok(())
    }

    fn grade(&mut self, _pass: &GradePass) -> LyricDanceResult<()> {
        self.calls.push("grade");
        Ok(())
    }

    fn text(&mut self, op: &TextOp) -> LyricDanceResult<()> {
        if op.text.is_empty() {
            return Err(LyricDanceError::render("empty text"));
        }
        self.calls.push("text");
        Ok(())
    }

    fn finish_frame(&mut self) -> LyricDanceResult<FrameRGBA> {
        self.calls.push("finish");
        let canvas = self
            .canvas
            .ok_or_else(|| LyricDanceError::render("no frame"))?;
        Ok(FrameRGBA {
            width: canvas.width,
            height: canvas.height,
            data: vec![0; canvas.byte_len()],
            premultiplied: true,
        })
    }
}

fn text_op(text: &str) -> TextOp {
    TextOp {
        text: text.to_owned(),
        origin: Point::ZERO,
        width: 24.0,
        font_size: 12.0,
        color: Rgb::WHITE,
        opacity: 1.0,
        transform: Affine::IDENTITY,
        shadow: None,
        glow: None,
    }
}

fn plan() -> FramePlan {
    let mut plan = FramePlan::new(Canvas::new(4, 3).unwrap(), Rgb::BLACK);
    plan.fill_canvas(Rgb::WHITE, 0.5, BlendMode::Normal);
    plan.push(DrawOp::Grade(GradePass {
        filter: GradeFilter::IDENTITY,
        grain: GrainSpec::default(),
        vignette: VignetteSpec::default(),
        seed: 0,
    }));
    plan.push(DrawOp::Text(text_op("hi")));
    plan
}

#[test]
fn execute_plan_calls_in_plan_order() {
    let mut backend = MockBackend::default();
    let out = backend.render_plan(&plan()).unwrap();
    assert_eq!(out.width, 4);
    assert_eq!(out.height, 3);
    assert!(out.premultiplied);
    assert_eq!(
        backend.calls,
        ["begin", "fill", "grade", "text", "finish"]
    );
}

#[test]
fn execute_plan_stops_at_first_error() {
    let mut p = plan();
    p.push(DrawOp::Text(text_op("")));
    p.fill_canvas(Rgb::BLACK, 1.0, BlendMode::Normal);
    let mut backend = MockBackend::default();
    let err = execute_plan(&mut backend, &p).unwrap_err();
    assert!(err.to_string().starts_with("render error:"));
    assert_eq!(backend.calls.last(), Some(&"text"));
}

#[test]
fn pixel_lookup_is_bounds_checked() {
    let frame = FrameRGBA {
        width: 2,
        height: 1,
        data: vec![1, 2, 3, 4, 5, 6, 7, 8],
        premultiplied: true,
    };
    assert_eq!(frame.pixel(1, 0), Some([5, 6, 7, 8]));
    assert_eq!(frame.pixel(2, 0), None);
    assert_eq!(frame.pixel(0, 1), None);
}

#[test]
fn missing_font_file_is_a_render_error() {
    let err = RenderSettings::with_font_file(Path::new("/definitely/not/here.ttf")).unwrap_err();
    assert!(matches!(err, LyricDanceError::Render(_)));
}
