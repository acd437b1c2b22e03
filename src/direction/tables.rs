//! Keyword lookup tables used when synthesizing the canonical direction.
//!
//! Every lookup is total: unknown or missing keywords resolve to a documented default.

use crate::direction::model::{
    BeatResponse, EndingStyle, MotionProfile, MotionWeight, StageName, TensionStage,
    TextTransform, TypographyProfile,
};

/// Climax ratio used when no emotional arc is authored.
pub const DEFAULT_CLIMAX_RATIO: f64 = 0.6;
/// Background system used when the atmosphere keyword is missing or unknown.
pub const DEFAULT_BACKGROUND_SYSTEM: &str = "void";
/// Light source used when the background system has no dedicated light.
pub const DEFAULT_LIGHT_SOURCE: &str = "golden";

/// Default chapters when no sections are authored: `(title, start, end, intensity)`.
pub(crate) const DEFAULT_CHAPTERS: [(&str, f64, f64, f64); 3] = [
    ("Opening", 0.0, 0.33, 0.4),
    ("Middle", 0.33, 0.66, 0.7),
    ("Climax", 0.66, 1.0, 1.0),
];

fn key(s: Option<&str>) -> String {
    s.map(|s| s.trim().to_ascii_lowercase()).unwrap_or_default()
}

// (keyword, heat, beat response, weight, chaos)
const MOTION: &[(&str, f64, BeatResponse, MotionWeight, f64)] = &[
    ("weighted", 0.6, BeatResponse::Slam, MotionWeight::Heavy, 0.2),
    ("fluid", 0.4, BeatResponse::Pulse, MotionWeight::Normal, 0.1),
    ("elastic", 0.5, BeatResponse::Pulse, MotionWeight::Light, 0.3),
    ("drift", 0.2, BeatResponse::Breath, MotionWeight::Featherlight, 0.05),
    ("glitch", 0.8, BeatResponse::Slam, MotionWeight::Normal, 0.8),
];

/// Motion keyword to physics; unknown keywords behave like `fluid`.
pub fn motion_profile(motion: Option<&str>) -> MotionProfile {
    let k = key(motion);
    let row = MOTION
        .iter()
        .find(|(name, ..)| *name == k)
        .unwrap_or(&MOTION[1]);
    MotionProfile {
        heat: row.1,
        beat_response: row.2,
        weight: row.3,
        chaos: row.4,
    }
}

// Substring matches, checked in order.
const ATMOSPHERE: &[(&str, &str)] = &[
    ("fire", "burn"),
    ("burn", "burn"),
    ("ember", "burn"),
    ("storm", "rain"),
    ("rain", "rain"),
    ("frost", "frost"),
    ("snow", "frost"),
    ("winter", "frost"),
    ("ice", "frost"),
    ("breath", "breath"),
    ("mist", "breath"),
    ("haze", "haze"),
    ("fog", "haze"),
    ("smoke", "haze"),
    ("void", "void"),
    ("dark", "void"),
];

/// Atmosphere keyword to background system id.
pub fn background_system(atmosphere: Option<&str>) -> &'static str {
    let k = key(atmosphere);
    if k.is_empty() {
        return DEFAULT_BACKGROUND_SYSTEM;
    }
    ATMOSPHERE
        .iter()
        .find(|(needle, _)| k.contains(needle))
        .map(|(_, id)| *id)
        .unwrap_or(DEFAULT_BACKGROUND_SYSTEM)
}

/// Light source keyword that fits a background system.
pub fn light_source_for(background_system: &str) -> &'static str {
    match background_system {
        "burn" => "flickering left",
        "rain" | "breath" => "cold overcast",
        "frost" => "winter daylight",
        "void" => "dead of night",
        "haze" => "moonlight",
        _ => DEFAULT_LIGHT_SOURCE,
    }
}

/// Typography keyword to font profile; `clean-modern` is the default.
pub fn typography_profile(typography: Option<&str>) -> TypographyProfile {
    let (family, weight, transform, personality) = match key(typography).as_str() {
        "bold-impact" => ("Oswald", 700, TextTransform::Uppercase, "loud"),
        "elegant-serif" => ("Playfair Display", 500, TextTransform::None, "graceful"),
        "raw-condensed" => ("Barlow Condensed", 600, TextTransform::Uppercase, "raw"),
        "whisper-soft" => ("Nunito", 300, TextTransform::Lowercase, "gentle"),
        "tech-mono" => ("JetBrains Mono", 400, TextTransform::None, "precise"),
        _ => ("Montserrat", 600, TextTransform::None, "steady"),
    };
    TypographyProfile {
        font_family: family.to_owned(),
        font_weight: weight,
        text_transform: transform,
        personality: personality.to_owned(),
    }
}

/// Scene tone to `[primary, mid, accent]`; unknown tones use `dark`.
pub fn palette_for_tone(scene_tone: Option<&str>) -> [&'static str; 3] {
    match key(scene_tone).as_str() {
        "light" => ["#f4efe6", "#b9a88f", "#3a2f28"],
        "mixed-dawn" => ["#2b1d3a", "#c97b63", "#ffd28a"],
        "mixed-dusk" => ["#f2b880", "#6b4a7a", "#1c1433"],
        "mixed-pulse" => ["#0d0d14", "#7a2cff", "#00e5ff"],
        _ => ["#0a0a0f", "#3a3a4a", "#e8e0d0"],
    }
}

/// Contrast mode for a scene tone.
pub fn contrast_mode_for_tone(scene_tone: Option<&str>) -> &'static str {
    match key(scene_tone).as_str() {
        "light" => "soft",
        "mixed-pulse" => "neon",
        _ => "brutal",
    }
}

const PARTICLE_SYSTEMS: &[&str] = &[
    "fire", "rain", "snow", "aurora", "smoke", "storm", "dust", "static", "glitch", "petals",
];

/// Texture keyword to particle system id (`none` when unknown).
pub fn particle_system(texture: Option<&str>) -> &'static str {
    let k = key(texture);
    PARTICLE_SYSTEMS
        .iter()
        .copied()
        .find(|p| *p == k)
        .unwrap_or("none")
}

// (stage, start, end, motion, particles, light, cut speed)
type StageRow = (StageName, f64, f64, f64, f64, f64, f64);

const SLOW_BURN: &[StageRow] = &[
    (StageName::Setup, 0.0, 0.3, 0.2, 0.1, 0.3, 0.2),
    (StageName::Build, 0.3, 0.6, 0.5, 0.4, 0.5, 0.5),
    (StageName::Peak, 0.6, 0.85, 0.9, 0.9, 0.9, 0.9),
    (StageName::Release, 0.85, 1.0, 0.3, 0.2, 0.4, 0.2),
];
const SURGE: &[StageRow] = &[
    (StageName::Build, 0.0, 0.35, 0.6, 0.5, 0.6, 0.6),
    (StageName::Peak, 0.35, 0.75, 1.0, 1.0, 1.0, 1.0),
    (StageName::Release, 0.75, 1.0, 0.4, 0.3, 0.5, 0.3),
];
const COLLAPSE: &[StageRow] = &[
    (StageName::Peak, 0.0, 0.25, 1.0, 0.9, 1.0, 0.9),
    (StageName::Release, 0.25, 1.0, 0.25, 0.15, 0.3, 0.15),
];
const DAWN: &[StageRow] = &[
    (StageName::Setup, 0.0, 0.4, 0.15, 0.1, 0.2, 0.1),
    (StageName::Build, 0.4, 0.75, 0.45, 0.4, 0.6, 0.4),
    (StageName::Release, 0.75, 1.0, 0.6, 0.5, 0.9, 0.3),
];
const FLATLINE: &[StageRow] = &[(StageName::Setup, 0.0, 1.0, 0.3, 0.2, 0.4, 0.2)];
const ERUPTION: &[StageRow] = &[
    (StageName::Setup, 0.0, 0.2, 0.3, 0.2, 0.3, 0.3),
    (StageName::Build, 0.2, 0.45, 0.6, 0.6, 0.6, 0.6),
    (StageName::Peak, 0.45, 0.8, 1.0, 1.0, 1.0, 1.0),
    (StageName::Release, 0.8, 1.0, 0.5, 0.4, 0.5, 0.4),
];

/// Known emotional arcs.
pub const ARC_NAMES: [&str; 6] = [
    "slow-burn",
    "surge",
    "collapse",
    "dawn",
    "flatline",
    "eruption",
];

/// Tension template for an emotional arc; unknown or missing arcs use `slow-burn`.
pub fn tension_curve(arc: Option<&str>) -> Vec<TensionStage> {
    let rows = match key(arc).as_str() {
        "surge" => SURGE,
        "collapse" => COLLAPSE,
        "dawn" => DAWN,
        "flatline" => FLATLINE,
        "eruption" => ERUPTION,
        _ => SLOW_BURN,
    };
    rows.iter()
        .map(|&(stage, start, end, motion, particles, light, cut)| TensionStage {
            stage,
            start_ratio: start,
            end_ratio: end,
            motion_intensity: motion,
            particle_density: particles,
            light_brightness: light,
            cut_speed: cut,
        })
        .collect()
}

/// Climax ratio: `0.6` without an arc, `0.15` for `collapse`, `0.65` otherwise.
pub fn climax_ratio(arc: Option<&str>) -> f64 {
    match key(arc).as_str() {
        "" => DEFAULT_CLIMAX_RATIO,
        "collapse" => 0.15,
        _ => 0.65,
    }
}

/// Ending treatment per arc: `(style, fade seconds)`.
pub fn ending_for_arc(arc: Option<&str>) -> (EndingStyle, f64) {
    match key(arc).as_str() {
        "slow-burn" => (EndingStyle::Linger, 2.5),
        "surge" => (EndingStyle::Snap, 0.6),
        "collapse" => (EndingStyle::Dissolve, 3.0),
        "eruption" => (EndingStyle::Snap, 0.8),
        "flatline" => (EndingStyle::Fade, 1.5),
        _ => (EndingStyle::Fade, 2.0),
    }
}

const KINETIC_HINTS: &[(&str, &str)] = &[
    ("fall", "FALLING"),
    ("drop", "FALLING"),
    ("sink", "SINKING"),
    ("run", "RUNNING"),
    ("rush", "RUNNING"),
    ("race", "RUNNING"),
    ("float", "FLOATING"),
    ("drift", "DRIFTING"),
    ("submerg", "SUBMERGING"),
    ("drown", "SUBMERGING"),
    ("envelop", "ENVELOPING"),
    ("wrap", "ENVELOPING"),
    ("shake", "SHAKING"),
    ("trembl", "SHAKING"),
    ("shiver", "SHAKING"),
    ("glitch", "SHAKING"),
    ("rise", "RISING"),
    ("soar", "RISING"),
    ("lift", "RISING"),
    ("hide", "HIDING"),
    ("vanish", "HIDING"),
    ("static", "STATIC"),
    ("still", "STATIC"),
    ("freeze", "STATIC"),
];

/// Infer a kinetic class tag from a directive's behavior, then entry keyword.
pub fn infer_kinetic_class(behavior: Option<&str>, entry: Option<&str>) -> Option<&'static str> {
    [behavior, entry].into_iter().find_map(|tag| {
        let k = key(tag);
        if k.is_empty() {
            return None;
        }
        KINETIC_HINTS
            .iter()
            .find(|(needle, _)| k.contains(needle))
            .map(|(_, class)| *class)
    })
}

const ELEMENTAL_HINTS: &[(&str, &str)] = &[
    ("fire", "FIRE"),
    ("flame", "FIRE"),
    ("burn", "FIRE"),
    ("water", "WATER"),
    ("rain", "WATER"),
    ("ocean", "WATER"),
    ("tear", "WATER"),
    ("ice", "ICE"),
    ("frost", "ICE"),
    ("snow", "ICE"),
    ("cold", "ICE"),
    ("smoke", "SMOKE"),
    ("fog", "SMOKE"),
    ("mist", "SMOKE"),
    ("spark", "ELECTRIC"),
    ("lightning", "ELECTRIC"),
    ("electric", "ELECTRIC"),
    ("light", "LIGHT"),
    ("sun", "LIGHT"),
    ("glow", "LIGHT"),
];

/// Infer an elemental class tag from a visual metaphor.
pub fn infer_elemental_class(visual_metaphor: Option<&str>) -> Option<&'static str> {
    let k = key(visual_metaphor);
    if k.is_empty() {
        return None;
    }
    ELEMENTAL_HINTS
        .iter()
        .find(|(needle, _)| k.contains(needle))
        .map(|(_, class)| *class)
}

#[cfg(test)]
#[path = "../../tests/unit/direction/tables.rs"]
mod tests;
