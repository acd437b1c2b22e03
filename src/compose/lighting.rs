//! Scene lighting: the time-varying background system, light overlays and text shadows.

use std::f64::consts::PI;

use smallvec::smallvec;

use crate::{
    foundation::{
        core::{Point, Rgb},
        math::clamp01,
    },
    render::plan::{
        BlendMode, DrawOp, FramePlan, GradientOp, GradientShape, GradientStop, ShadowSpec,
    },
    state::frame::FrameRenderState,
};

/// Background id for `base` at `progress`.
///
/// `burn`, `rain`/`breath` and `frost`/`winter` step through their own phases; any other base is
/// returned unchanged.
pub fn background_system_for_time(base: &str, progress: f64) -> &str {
    let p = clamp01(progress);
    match base {
        "burn" => match p {
            p if p < 0.15 => "haze",
            p if p < 0.55 => "burn",
            p if p < 0.75 => "haze",
            _ => "ember",
        },
        "rain" | "breath" => match p {
            p if p < 0.2 => "mist",
            p if p < 0.5 => "rain",
            p if p < 0.8 => "downpour",
            _ => "mist",
        },
        "frost" | "winter" => match p {
            p if p < 0.3 => "frost",
            p if p < 0.7 => "blizzard",
            _ => "frost",
        },
        other => other,
    }
}

/// Intensity arc of fire-lit scenes: dim at both ends, brightest mid-song.
pub fn fire_arc(progress: f64) -> f64 {
    0.35 + 0.65 * (PI * clamp01(progress)).sin()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Weather phase of cold-lit scenes.
pub enum ColdPhase {
    /// Flat grey light.
    Overcast,
    /// Darker, with white flashes on strong beats.
    Storm,
    /// Warmth returns toward the end.
    Clearing,
}

/// Cold-world phase at `progress`.
pub fn cold_phase(progress: f64) -> ColdPhase {
    match clamp01(progress) {
        p if p < 0.35 => ColdPhase::Overcast,
        p if p < 0.6 => ColdPhase::Storm,
        _ => ColdPhase::Clearing,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Light-source keyword as a variant.
pub enum LightSource {
    /// Warm, high key light.
    Golden,
    /// Fire from the left edge.
    FlickeringLeft,
    /// Grey sky.
    ColdOvercast,
    /// Blue, soft.
    Moonlight,
    /// Bright, cold sky.
    WinterDaylight,
    /// Barely lit.
    DeadOfNight,
    /// Unknown keyword: no overlay.
    None,
}

impl LightSource {
    /// Parse a keyword; unknown keywords resolve to [`LightSource::None`].
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.trim().to_ascii_lowercase().as_str() {
            "golden" => Self::Golden,
            "flickering left" | "left" => Self::FlickeringLeft,
            "cold overcast" => Self::ColdOvercast,
            "moonlight" => Self::Moonlight,
            "winter daylight" => Self::WinterDaylight,
            "dead of night" => Self::DeadOfNight,
            _ => Self::None,
        }
    }

    fn is_cold(self) -> bool {
        matches!(self, Self::ColdOvercast | Self::WinterDaylight)
    }

    fn strategy(self) -> LightStrategy {
        match self {
            Self::Golden => golden,
            Self::FlickeringLeft => flickering_left,
            Self::ColdOvercast => cold_overcast,
            Self::Moonlight => moonlight,
            Self::WinterDaylight => winter_daylight,
            Self::DeadOfNight => dead_of_night,
            Self::None => unlit,
        }
    }
}

type LightStrategy = fn(&mut FramePlan, LightInput);

#[derive(Clone, Copy, Debug)]
struct LightInput {
    progress: f64,
    beat: f64,
}

/// Paint the additive light overlay for `light_source`.
pub fn draw_lighting(plan: &mut FramePlan, light_source: &str, progress: f64, beat_intensity: f64) {
    let light = LightSource::from_keyword(light_source);
    let input = LightInput {
        progress: clamp01(progress),
        beat: clamp01(beat_intensity),
    };
    (light.strategy())(plan, input);

    if light.is_cold() {
        match cold_phase(input.progress) {
            ColdPhase::Storm if input.beat > 0.8 => {
                plan.fill_canvas(Rgb::WHITE, 0.25 * input.beat, BlendMode::Additive);
            }
            ColdPhase::Clearing => {
                let lift = 0.12 * clamp01((input.progress - 0.6) / 0.4);
                if lift > 0.0 {
                    plan.fill_canvas(Rgb::new(255, 210, 150), lift, BlendMode::Additive);
                }
            }
            _ => {}
        }
    }
}

fn radial(plan: &mut FramePlan, fx: f64, fy: f64, radius_scale: f64, color: Rgb, alpha: f64) {
    let canvas = plan.canvas;
    let (w, h) = (f64::from(canvas.width), f64::from(canvas.height));
    plan.push(DrawOp::Gradient(GradientOp {
        rect: canvas.rect(),
        shape: GradientShape::Radial {
            center: Point::new(w * fx, h * fy),
            radius: w.max(h) * radius_scale,
        },
        stops: smallvec![
            GradientStop::new(0.0, color, clamp01(alpha)),
            GradientStop::new(1.0, color, 0.0),
        ],
        blend: BlendMode::Additive,
    }));
}

fn vertical(plan: &mut FramePlan, color: Rgb, top_alpha: f64, bottom_alpha: f64, blend: BlendMode) {
    let canvas = plan.canvas;
    plan.push(DrawOp::Gradient(GradientOp {
        rect: canvas.rect(),
        shape: GradientShape::Linear {
            start: Point::ZERO,
            end: Point::new(0.0, f64::from(canvas.height)),
        },
        stops: smallvec![
            GradientStop::new(0.0, color, clamp01(top_alpha)),
            GradientStop::new(1.0, color, clamp01(bottom_alpha)),
        ],
        blend,
    }));
}

fn unlit(_: &mut FramePlan, _: LightInput) {}

fn golden(plan: &mut FramePlan, i: LightInput) {
    let alpha = 0.22 * fire_arc(i.progress) + 0.04 * i.beat;
    radial(plan, 0.75, 0.2, 0.9, Rgb::new(255, 200, 120), alpha);
}

fn flickering_left(plan: &mut FramePlan, i: LightInput) {
    let alpha = fire_arc(i.progress) * (0.22 + 0.12 * i.beat);
    radial(plan, 0.0, 0.6, 0.8, Rgb::new(255, 140, 50), alpha);
}

fn cold_overcast(plan: &mut FramePlan, i: LightInput) {
    let top = match cold_phase(i.progress) {
        ColdPhase::Overcast => 0.10,
        ColdPhase::Storm => 0.06,
        ColdPhase::Clearing => 0.14,
    };
    vertical(plan, Rgb::new(200, 215, 235), top, 0.0, BlendMode::Additive);
}

fn moonlight(plan: &mut FramePlan, i: LightInput) {
    radial(plan, 0.2, 0.1, 0.8, Rgb::new(180, 200, 255), 0.14 + 0.04 * i.beat);
}

fn winter_daylight(plan: &mut FramePlan, i: LightInput) {
    vertical(
        plan,
        Rgb::new(235, 240, 255),
        0.16 + 0.03 * i.beat,
        0.02,
        BlendMode::Additive,
    );
}

fn dead_of_night(plan: &mut FramePlan, i: LightInput) {
    radial(plan, 0.5, 0.5, 0.4, Rgb::new(60, 70, 110), 0.08 + 0.05 * i.beat);
}

#[derive(Clone, Debug, PartialEq)]
/// Text shadow for a light source.
pub struct TextShadow {
    /// Horizontal offset in pixels.
    pub offset_x: f64,
    /// Vertical offset in pixels.
    pub offset_y: f64,
    /// Blur in pixels.
    pub blur: f64,
    /// `#rrggbbaa` color.
    pub color: String,
}

impl TextShadow {
    /// Draw-op form of this shadow.
    pub fn to_spec(&self) -> ShadowSpec {
        let alpha = self
            .color
            .strip_prefix('#')
            .filter(|hex| hex.len() == 8 && hex.is_ascii())
            .and_then(|hex| u8::from_str_radix(&hex[6..8], 16).ok())
            .map_or(1.0, |a| f64::from(a) / 255.0);
        ShadowSpec {
            offset: (self.offset_x, self.offset_y).into(),
            blur_px: self.blur,
            color: Rgb::parse_hex(&self.color).unwrap_or(Rgb::BLACK),
            alpha,
        }
    }
}

/// Shadow under lyric text. Beats push the flickering-light shadow further right; the color is
/// always the first palette entry at `aa` alpha.
pub fn get_text_shadow(light_source: &str, palette: &[String], beat_intensity: f64) -> TextShadow {
    let beat = clamp01(beat_intensity);
    let (offset_x, offset_y, blur) = match LightSource::from_keyword(light_source) {
        LightSource::Golden => (2.0, 3.0, 8.0),
        LightSource::FlickeringLeft => (4.0 + 3.0 * beat, 2.0, 10.0),
        LightSource::ColdOvercast => (0.0, 2.0, 12.0),
        LightSource::Moonlight => (3.0, 4.0, 6.0),
        LightSource::WinterDaylight => (0.0, 1.0, 14.0),
        LightSource::DeadOfNight => (0.0, 0.0, 18.0),
        LightSource::None => (0.0, 2.0, 8.0),
    };
    let color = palette
        .first()
        .and_then(|c| Rgb::parse_hex(c))
        .map_or_else(|| "#000000aa".to_owned(), |c| format!("{}aa", c.to_hex()));
    TextShadow {
        offset_x,
        offset_y,
        blur,
        color,
    }
}

/// Paint the background for the time-varying `system` id (see [`background_system_for_time`]).
pub fn draw_background(plan: &mut FramePlan, system: &str, state: &FrameRenderState, beat: f64) {
    let base = state.palette_rgb(0);
    let intensity = clamp01(state.background_intensity);
    let beat = clamp01(beat);

    vertical(plan, base, 1.0, 1.0, BlendMode::Normal);
    vertical(plan, Rgb::BLACK, 0.0, 0.45, BlendMode::Normal);

    match system {
        "burn" | "ember" => {
            let heat = if system == "burn" { 0.35 } else { 0.2 };
            radial(
                plan,
                0.5,
                1.1,
                0.7,
                Rgb::new(255, 90, 30),
                heat * intensity + 0.08 * beat,
            );
        }
        "haze" | "mist" | "breath" => {
            plan.fill_canvas(state.palette_rgb(1), 0.12 * intensity, BlendMode::Normal);
        }
        "rain" | "downpour" => {
            let a = if system == "rain" { 0.15 } else { 0.25 };
            vertical(plan, Rgb::new(90, 110, 140), a * intensity, 0.0, BlendMode::Normal);
        }
        "frost" | "blizzard" => {
            let a = if system == "frost" { 0.12 } else { 0.22 };
            vertical(plan, Rgb::new(220, 235, 255), 0.0, a * intensity, BlendMode::Additive);
        }
        "void" => {
            let canvas = plan.canvas;
            let (w, h) = (f64::from(canvas.width), f64::from(canvas.height));
            plan.push(DrawOp::Gradient(GradientOp {
                rect: canvas.rect(),
                shape: GradientShape::Radial {
                    center: canvas.center(),
                    radius: (w * w + h * h).sqrt() / 2.0,
                },
                stops: smallvec![
                    GradientStop::new(0.4, Rgb::BLACK, 0.0),
                    GradientStop::new(1.0, Rgb::BLACK, 0.5),
                ],
                blend: BlendMode::Normal,
            }));
        }
        _ => {}
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/lighting.rs"]
mod tests;
