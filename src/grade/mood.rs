use std::fmt;

use crate::foundation::math::{clamp01, lerp};

/// Keyword used when a mood is missing or unknown.
pub const DEFAULT_MOOD: &str = "intimate";

/// Hard ceiling for the brightness term of a [`GradeFilter`].
pub const MAX_FILTER_BRIGHTNESS: f64 = 0.90;

/// Blur below this radius (px) is dropped from the filter.
const MIN_BLUR_PX: f64 = 0.2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// Blur flavor.
pub enum BlurKind {
    /// No blur.
    #[default]
    None,
    /// Light diffusion.
    Soft,
    /// Heavy defocus.
    Heavy,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Blur recipe.
pub struct BlurSpec {
    /// Flavor.
    pub kind: BlurKind,
    /// Base radius in pixels.
    pub radius_px: f64,
    /// Whether focus racks with the beat.
    pub rack_focus: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Film grain recipe.
pub struct GrainSpec {
    /// Noise amplitude in `[0, 1]`.
    pub amount: f64,
    /// Grain cell size in pixels.
    pub size_px: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Vignette recipe.
pub struct VignetteSpec {
    /// Edge darkening in `[0, 1]`.
    pub strength: f64,
    /// Fraction of the radius that stays untouched.
    pub inner_radius: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// Overall motion character.
pub enum MotionIntent {
    /// Almost no motion.
    Still,
    /// Slow drift.
    #[default]
    Drift,
    /// Beat-locked pulse.
    Pulse,
    /// Big swells.
    Surge,
    /// Nervous jitter.
    Shake,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// Lyric layout mode.
pub enum LayoutMode {
    /// One centered line.
    #[default]
    Centered,
    /// Lines stacked vertically.
    Stacked,
    /// Words scattered across the canvas.
    Scattered,
    /// Wide single line with generous tracking.
    Wide,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Immutable color/blur/grain/vignette/motion recipe for one mood.
pub struct MoodGrade {
    /// Base brightness.
    pub brightness: f64,
    /// Saturation multiplier.
    pub saturation: f64,
    /// Contrast multiplier.
    pub contrast: f64,
    /// Warm (>0) or cool (<0) bias in `[-1, 1]`.
    pub temperature: f64,
    /// Blur recipe.
    pub blur: BlurSpec,
    /// Grain recipe.
    pub grain: GrainSpec,
    /// Vignette recipe.
    pub vignette: VignetteSpec,
    /// Motion character.
    pub motion_intent: MotionIntent,
    /// How much beat intensity adds to brightness.
    pub beat_brightness_gain: f64,
    /// Lyric layout.
    pub layout_mode: LayoutMode,
}

impl Default for MoodGrade {
    fn default() -> Self {
        *get_mood_grade(None)
    }
}

#[allow(clippy::too_many_arguments)]
const fn grade(
    brightness: f64,
    saturation: f64,
    contrast: f64,
    temperature: f64,
    blur: (BlurKind, f64, bool),
    grain: f64,
    vignette: f64,
    motion_intent: MotionIntent,
    beat_brightness_gain: f64,
    layout_mode: LayoutMode,
) -> MoodGrade {
    MoodGrade {
        brightness,
        saturation,
        contrast,
        temperature,
        blur: BlurSpec {
            kind: blur.0,
            radius_px: blur.1,
            rack_focus: blur.2,
        },
        grain: GrainSpec {
            amount: grain,
            size_px: 1.5,
        },
        vignette: VignetteSpec {
            strength: vignette,
            inner_radius: 0.55,
        },
        motion_intent,
        beat_brightness_gain,
        layout_mode,
    }
}

use BlurKind as B;
use LayoutMode as L;
use MotionIntent as M;

#[rustfmt::skip]
static MOOD_GRADES: [(&str, MoodGrade); 14] = [
    ("intimate", grade(0.62, 0.90, 1.00, 0.10, (B::Soft, 0.6, false), 0.08, 0.45, M::Drift, 0.08, L::Centered)),
    ("anthemic", grade(0.78, 1.20, 1.15, 0.05, (B::None, 0.0, false), 0.04, 0.25, M::Surge, 0.15, L::Wide)),
    ("dreamy", grade(0.72, 0.80, 0.90, 0.08, (B::Soft, 1.6, true), 0.06, 0.50, M::Drift, 0.06, L::Scattered)),
    ("aggressive", grade(0.60, 1.30, 1.35, -0.02, (B::None, 0.0, false), 0.18, 0.55, M::Shake, 0.20, L::Stacked)),
    ("melancholy", grade(0.50, 0.60, 0.95, -0.12, (B::Soft, 0.8, false), 0.10, 0.60, M::Still, 0.05, L::Centered)),
    ("euphoric", grade(0.82, 1.35, 1.10, 0.12, (B::None, 0.0, false), 0.03, 0.20, M::Pulse, 0.18, L::Scattered)),
    ("eerie", grade(0.45, 0.50, 1.20, -0.20, (B::Heavy, 1.2, false), 0.16, 0.70, M::Drift, 0.10, L::Scattered)),
    ("vulnerable", grade(0.58, 0.75, 0.90, 0.04, (B::Soft, 1.0, false), 0.07, 0.50, M::Still, 0.05, L::Centered)),
    ("triumphant", grade(0.80, 1.25, 1.20, 0.15, (B::None, 0.0, false), 0.03, 0.30, M::Surge, 0.16, L::Wide)),
    ("nostalgic", grade(0.66, 0.70, 0.95, 0.22, (B::Soft, 0.8, false), 0.14, 0.45, M::Drift, 0.07, L::Centered)),
    ("defiant", grade(0.64, 1.15, 1.30, 0.00, (B::None, 0.0, false), 0.12, 0.50, M::Shake, 0.17, L::Stacked)),
    ("hopeful", grade(0.74, 1.05, 1.00, 0.10, (B::Soft, 0.4, false), 0.05, 0.30, M::Pulse, 0.10, L::Centered)),
    ("raw", grade(0.56, 0.85, 1.25, -0.05, (B::None, 0.0, false), 0.22, 0.55, M::Shake, 0.14, L::Stacked)),
    ("hypnotic", grade(0.60, 1.10, 1.05, -0.08, (B::Heavy, 0.9, true), 0.06, 0.60, M::Pulse, 0.12, L::Centered)),
];

/// Every recognized mood keyword, in table order.
pub fn mood_keywords() -> impl Iterator<Item = &'static str> {
    MOOD_GRADES.iter().map(|(name, _)| *name)
}

/// Resolve a mood keyword (case-insensitive). Unknown or missing keywords return the
/// `intimate` grade; the returned reference is the same static entry in both cases.
pub fn get_mood_grade(mood: Option<&str>) -> &'static MoodGrade {
    fn lookup(name: &str) -> Option<&'static MoodGrade> {
        MOOD_GRADES
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, g)| g)
    }

    mood.map(|m| m.trim().to_ascii_lowercase())
        .and_then(|m| lookup(&m))
        .or_else(|| lookup(DEFAULT_MOOD))
        .unwrap_or(&MOOD_GRADES[0].1)
}

/// Resolved CSS-style filter chain for one frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct GradeFilter {
    /// `brightness(..)`, never above [`MAX_FILTER_BRIGHTNESS`].
    pub brightness: f64,
    /// `saturate(..)`.
    pub saturate: f64,
    /// `contrast(..)`.
    pub contrast: f64,
    /// `sepia(..)` for warm grades.
    pub sepia: Option<f64>,
    /// `hue-rotate(..deg)` for cool grades.
    pub hue_rotate_deg: Option<i32>,
    /// `blur(..px)` when the effective radius is visible.
    pub blur_px: Option<f64>,
}

impl GradeFilter {
    /// Filter that leaves pixels untouched.
    pub const IDENTITY: Self = Self {
        brightness: 1.0,
        saturate: 1.0,
        contrast: 1.0,
        sepia: None,
        hue_rotate_deg: None,
        blur_px: None,
    };
}

impl fmt::Display for GradeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "brightness({:.3}) saturate({:.3}) contrast({:.3})",
            self.brightness, self.saturate, self.contrast
        )?;
        if let Some(s) = self.sepia {
            write!(f, " sepia({s:.3})")?;
        }
        if let Some(deg) = self.hue_rotate_deg {
            write!(f, " hue-rotate({deg}deg)")?;
        }
        if let Some(px) = self.blur_px {
            write!(f, " blur({px:.2}px)")?;
        }
        Ok(())
    }
}

/// Blur radius after beat modulation: beats pull focus in by up to half.
pub fn effective_blur_px(grade: &MoodGrade, beat_mod: f64) -> f64 {
    if grade.blur.kind == BlurKind::None {
        return 0.0;
    }
    grade.blur.radius_px.max(0.0) * (1.0 - 0.5 * clamp01(beat_mod))
}

/// Build the filter for a grade at the given intensity and beat modulation (both `[0, 1]`).
pub fn build_grade_filter(grade: &MoodGrade, intensity_mod: f64, beat_mod: f64) -> GradeFilter {
    let intensity_mod = clamp01(intensity_mod);
    let beat_mod = clamp01(beat_mod);

    let brightness = (grade.brightness
        + intensity_mod * 0.15
        + beat_mod * grade.beat_brightness_gain)
        .min(MAX_FILTER_BRIGHTNESS);
    let saturate = grade.saturation * (1.0 + intensity_mod * 0.1);
    let contrast = grade.contrast * (1.0 + beat_mod * 0.05);

    let sepia = (grade.temperature > 0.05).then(|| grade.temperature * 0.3);
    // Halves round toward +inf, matching CSS engines.
    let hue_rotate_deg = (grade.temperature < -0.05)
        .then(|| (grade.temperature * 30.0 + 0.5).floor() as i32);

    let blur = effective_blur_px(grade, beat_mod);
    let blur_px = (blur > MIN_BLUR_PX).then_some(blur);

    GradeFilter {
        brightness,
        saturate,
        contrast,
        sepia,
        hue_rotate_deg,
        blur_px,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// Whether lyrics should be drawn light-on-dark or dark-on-light.
pub enum TextMode {
    /// Light text.
    Light,
    /// Dark text.
    Dark,
}

/// `Dark` when the graded background is bright enough to need dark text.
pub fn text_mode(grade: &MoodGrade, intensity_mod: f64) -> TextMode {
    if grade.brightness + clamp01(intensity_mod) * 0.15 > 0.52 {
        TextMode::Dark
    } else {
        TextMode::Light
    }
}

/// Interpolate between two grades. Numeric fields are linear in `t`; enumerated fields
/// snap to `a` while `t < 0.5` and to `b` from `t == 0.5` on.
pub fn lerp_grade(a: &MoodGrade, b: &MoodGrade, t: f64) -> MoodGrade {
    let snap = t >= 0.5;
    let pick = |x, y| if snap { y } else { x };
    let l = |x, y| lerp(x, y, t);
    MoodGrade {
        brightness: l(a.brightness, b.brightness),
        saturation: l(a.saturation, b.saturation),
        contrast: l(a.contrast, b.contrast),
        temperature: l(a.temperature, b.temperature),
        blur: BlurSpec {
            kind: if snap { b.blur.kind } else { a.blur.kind },
            radius_px: l(a.blur.radius_px, b.blur.radius_px),
            rack_focus: pick(a.blur.rack_focus, b.blur.rack_focus),
        },
        grain: GrainSpec {
            amount: l(a.grain.amount, b.grain.amount),
            size_px: l(a.grain.size_px, b.grain.size_px),
        },
        vignette: VignetteSpec {
            strength: l(a.vignette.strength, b.vignette.strength),
            inner_radius: l(a.vignette.inner_radius, b.vignette.inner_radius),
        },
        motion_intent: if snap { b.motion_intent } else { a.motion_intent },
        beat_brightness_gain: l(a.beat_brightness_gain, b.beat_brightness_gain),
        layout_mode: if snap { b.layout_mode } else { a.layout_mode },
    }
}

#[cfg(test)]
#[path = "../../tests/unit/grade/mood.rs"]
mod tests;
