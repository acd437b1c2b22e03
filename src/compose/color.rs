//! Word-level color decisions. Everything here is stateless and cheap enough to run per frame.

use std::borrow::Cow;

use crate::{
    foundation::core::{Rgb, Vec2},
    render::plan::{BlendMode, FramePlan},
};

/// Modifier tags that switch a line into alternating palette colors.
pub const STRONG_MODIFIERS: [&str; 8] = [
    "SLAM", "SHATTER", "ERUPT", "SURGE", "BLAZE", "PULSE", "STROBE", "IGNITE",
];

/// Beat intensity at or below which [`apply_beat_flash`] does nothing.
pub const BEAT_FLASH_THRESHOLD: f64 = 0.7;

const WHITE_HEX: &str = "#ffffff";
const COOL_TINT: Rgb = Rgb::new(70, 110, 200);
const WARM_TINT: Rgb = Rgb::new(255, 170, 60);
const MIN_TINT_ALPHA: f64 = 0.005;

/// Whether `tag` is one of [`STRONG_MODIFIERS`] (case-insensitive).
pub fn is_strong_modifier(tag: &str) -> bool {
    STRONG_MODIFIERS
        .iter()
        .any(|m| m.eq_ignore_ascii_case(tag.trim()))
}

/// Perceived brightness of a hex color in `[0, 1]`; malformed hex counts as black.
pub fn perceived_brightness(hex: &str) -> f64 {
    Rgb::parse_hex(hex)
        .map(Rgb::perceived_brightness)
        .unwrap_or(0.0)
}

/// One color per whitespace-separated word of `text`.
///
/// The last word takes the accent (`palette[2]`, white if absent); the first word of a hook
/// line is white; on a strong-modifier line words alternate `palette[0]` / `palette[2]` by
/// index; everything else takes `base_line_color`.
pub fn resolve_word_colors(
    text: &str,
    base_line_color: &str,
    palette: &[String],
    is_hook_line: bool,
    active_mod: Option<&str>,
) -> Vec<String> {
    let count = text.split_whitespace().count();
    let accent = palette.get(2).map(String::as_str).unwrap_or(WHITE_HEX);
    let strong = active_mod.is_some_and(is_strong_modifier);

    (0..count)
        .map(|i| {
            if i + 1 == count {
                accent.to_owned()
            } else if i == 0 && is_hook_line {
                WHITE_HEX.to_owned()
            } else if strong {
                let pick = if i % 2 == 0 { 0 } else { 2 };
                palette
                    .get(pick)
                    .map(String::as_str)
                    .unwrap_or(WHITE_HEX)
                    .to_owned()
            } else {
                base_line_color.to_owned()
            }
        })
        .collect()
}

/// Break up runs of bright lines: when both recent brightness samples exceed 0.75, the
/// candidate is replaced by the palette mid-tone.
pub fn apply_contrast_rhythm<'a>(
    candidate: &'a str,
    recent_brightness: [f64; 2],
    palette: &'a [String],
) -> Cow<'a, str> {
    let [a, b] = recent_brightness;
    match palette.get(1) {
        Some(mid) if a > 0.75 && b > 0.75 => Cow::Borrowed(mid.as_str()),
        _ => Cow::Borrowed(candidate),
    }
}

/// Two-sample brightness history for [`apply_contrast_rhythm`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RecentBrightness([f64; 2]);

impl RecentBrightness {
    /// Record the brightness of the color just used.
    pub fn push(&mut self, hex: &str) {
        self.0 = [self.0[1], perceived_brightness(hex)];
    }

    /// The two most recent samples, oldest first.
    pub fn samples(self) -> [f64; 2] {
        self.0
    }
}

/// Mix every color toward white by `beat_intensity * 0.3` on strong beats.
///
/// Returns the input untouched (borrowed) when `beat_intensity <= 0.7`. Malformed colors pass
/// through unchanged.
pub fn apply_beat_flash(colors: &[String], beat_intensity: f64) -> Cow<'_, [String]> {
    if beat_intensity.is_nan() || beat_intensity <= BEAT_FLASH_THRESHOLD {
        return Cow::Borrowed(colors);
    }
    let amount = beat_intensity.min(1.0) * 0.3;
    Cow::Owned(
        colors
            .iter()
            .map(|c| match Rgb::parse_hex(c) {
                Some(rgb) => rgb.mix(Rgb::WHITE, amount).to_hex(),
                None => c.clone(),
            })
            .collect(),
    )
}

/// Alpha of the cool (early) and warm (late) washes at `progress`.
pub fn temperature_tint_alphas(progress: f64) -> (f64, f64) {
    let cool = ((0.5 - progress) * 0.14).max(0.0);
    let warm = ((progress - 0.5) * 0.14).max(0.0);
    (cool, warm)
}

/// Paint the full-canvas temperature wash. Must run after the background and before text.
pub fn draw_temperature_tint(plan: &mut FramePlan, progress: f64) {
    let (cool, warm) = temperature_tint_alphas(progress);
    if cool > MIN_TINT_ALPHA {
        plan.fill_canvas(COOL_TINT, cool, BlendMode::Normal);
    }
    if warm > MIN_TINT_ALPHA {
        plan.fill_canvas(WARM_TINT, warm, BlendMode::Normal);
    }
}

/// Red/blue split copies for a glitch look: `(offset, color)` pairs drawn under the word.
pub fn channel_split_copies(split_px: f64) -> [(Vec2, Rgb); 2] {
    [
        (Vec2::new(-split_px, 0.0), Rgb::new(255, 40, 60)),
        (Vec2::new(split_px, 0.0), Rgb::new(40, 120, 255)),
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/compose/color.rs"]
mod tests;
