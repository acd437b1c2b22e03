use serde_json::{Map, Value};

use crate::{
    direction::{
        model::{
            CinematicDirection, Chapter, MotionWeight, StageName, TensionStage,
            TypographyProfile,
        },
        tables,
    },
    foundation::{
        core::Rgb,
        math::{clamp01, lerp},
    },
    grade::mood::{DEFAULT_MOOD, LayoutMode, MoodGrade, get_mood_grade, lerp_grade},
};

/// Half-width (in normalized time) of the window over which grades cross-fade at a chapter
/// boundary.
pub const GRADE_BLEND_WINDOW: f64 = 0.04;

/// Legacy optional fields a persisted manifest may carry; each is a field of [`FrameRenderState`]
/// and is copied when present and non-null.
pub const LEGACY_FIELDS: [&str; 14] = [
    "world",
    "coreEmotion",
    "backgroundSystem",
    "lightSource",
    "palette",
    "contrastMode",
    "backgroundIntensity",
    "letterPersonality",
    "decay",
    "stackBehavior",
    "lyricEntrance",
    "lyricExit",
    "typographyProfile",
    "particleConfig",
];

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Particle emitter parameters.
pub struct ParticleConfig {
    /// Particle system id (`none` disables particles).
    pub system: String,
    /// Density in `[0, 1]`.
    pub density: f64,
    /// Speed multiplier.
    pub speed: f64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            system: "none".to_owned(),
            density: 0.1,
            speed: 0.9,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Dense visual state for one instant. Every field always carries a value.
pub struct FrameRenderState {
    /// World label.
    pub world: String,
    /// Mood keyword driving the grade.
    pub core_emotion: String,
    /// Base background system id (before time-varying phases).
    pub background_system: String,
    /// Light source keyword.
    pub light_source: String,
    /// `[primary, mid, accent]` hex colors.
    pub palette: [String; 3],
    /// Contrast mode tag.
    pub contrast_mode: String,
    /// Background intensity in `[0, 1]`.
    pub background_intensity: f64,
    /// Letter personality tag.
    pub letter_personality: String,
    /// Per-frame trail decay in `[0, 1]`.
    pub decay: f64,
    /// How lines stack on screen.
    pub stack_behavior: String,
    /// Lyric entrance tag.
    pub lyric_entrance: String,
    /// Lyric exit tag.
    pub lyric_exit: String,
    /// Font profile.
    pub typography_profile: TypographyProfile,
    /// Particle emitter.
    pub particle_config: ParticleConfig,
    /// Mood keyword of the active grade.
    pub mood: String,
    /// Resolved (possibly blended) grade.
    pub grade: MoodGrade,
    /// Active chapter index.
    pub chapter_index: usize,
    /// Active tension stage.
    pub tension_stage: StageName,
    /// Overall intensity in `[0, 1]`.
    pub intensity: f64,
    /// Normalized song position in `[0, 1]`.
    pub progress: f64,
}

impl Default for FrameRenderState {
    fn default() -> Self {
        let palette = tables::palette_for_tone(None).map(str::to_owned);
        Self {
            world: tables::DEFAULT_BACKGROUND_SYSTEM.to_owned(),
            core_emotion: DEFAULT_MOOD.to_owned(),
            background_system: tables::DEFAULT_BACKGROUND_SYSTEM.to_owned(),
            light_source: tables::light_source_for(tables::DEFAULT_BACKGROUND_SYSTEM).to_owned(),
            palette,
            contrast_mode: tables::contrast_mode_for_tone(None).to_owned(),
            background_intensity: 0.4,
            letter_personality: TypographyProfile::default().personality,
            decay: decay_for(MotionWeight::Normal),
            stack_behavior: stack_behavior_for(LayoutMode::Centered).to_owned(),
            lyric_entrance: entrance_for(StageName::Setup).to_owned(),
            lyric_exit: exit_for(StageName::Setup).to_owned(),
            typography_profile: TypographyProfile::default(),
            particle_config: ParticleConfig::default(),
            mood: DEFAULT_MOOD.to_owned(),
            grade: *get_mood_grade(None),
            chapter_index: 0,
            tension_stage: StageName::Setup,
            intensity: 0.3,
            progress: 0.0,
        }
    }
}

impl FrameRenderState {
    /// Palette entry parsed as a color, falling back to white for malformed hex.
    pub fn palette_rgb(&self, i: usize) -> Rgb {
        self.palette
            .get(i)
            .and_then(|s| Rgb::parse_hex(s))
            .unwrap_or(Rgb::WHITE)
    }
}

/// A point on the song timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimePosition {
    /// Normalized progress in `[0, 1]`.
    Progress(f64),
    /// Elapsed seconds out of a total duration.
    Elapsed {
        /// Seconds since the start.
        elapsed_sec: f64,
        /// Total song length in seconds.
        duration_sec: f64,
    },
}

impl TimePosition {
    /// Normalized progress, clamped to `[0, 1]`; non-positive durations map to 0.
    pub fn progress(self) -> f64 {
        match self {
            Self::Progress(p) => clamp01(p),
            Self::Elapsed {
                elapsed_sec,
                duration_sec,
            } => {
                if duration_sec > 0.0 {
                    clamp01(elapsed_sec / duration_sec)
                } else {
                    0.0
                }
            }
        }
    }
}

fn decay_for(weight: MotionWeight) -> f64 {
    match weight {
        MotionWeight::Featherlight => 0.92,
        MotionWeight::Light => 0.85,
        MotionWeight::Normal => 0.75,
        MotionWeight::Heavy => 0.6,
    }
}

fn stack_behavior_for(layout: LayoutMode) -> &'static str {
    match layout {
        LayoutMode::Centered => "centered",
        LayoutMode::Stacked => "stack",
        LayoutMode::Scattered => "scatter",
        LayoutMode::Wide => "wide",
    }
}

fn entrance_for(stage: StageName) -> &'static str {
    match stage {
        StageName::Setup => "fade",
        StageName::Build => "rise",
        StageName::Peak => "slam",
        StageName::Release => "dissolve",
    }
}

fn exit_for(stage: StageName) -> &'static str {
    match stage {
        StageName::Setup | StageName::Build => "fade",
        StageName::Peak => "shatter",
        StageName::Release => "drift",
    }
}

fn chapter_grade(ch: &Chapter) -> &'static MoodGrade {
    get_mood_grade(ch.mood.as_deref())
}

/// Grade at `p`, cross-fading across the chapter boundary nearest to `p` when inside the
/// blend window.
fn blended_grade(chapters: &[Chapter], idx: usize, p: f64) -> MoodGrade {
    let current = chapter_grade(&chapters[idx]);
    let ch = &chapters[idx];
    let blend = |a: &MoodGrade, b: &MoodGrade, boundary: f64| {
        // Exactly 0.5 at the boundary, so enumerated fields switch with the chapter.
        let t = 0.5 + (p - boundary) / (2.0 * GRADE_BLEND_WINDOW);
        lerp_grade(a, b, clamp01(t))
    };
    if let Some(next) = chapters.get(idx + 1)
        && p >= ch.end_ratio - GRADE_BLEND_WINDOW
    {
        return blend(current, chapter_grade(next), ch.end_ratio);
    }
    if idx > 0 && p < ch.start_ratio + GRADE_BLEND_WINDOW {
        return blend(chapter_grade(&chapters[idx - 1]), current, ch.start_ratio);
    }
    *current
}

/// Derive the full render state for `dir` at `pos`.
///
/// Pure and total: fields the direction does not specify fall back to [`FrameRenderState`]
/// defaults, and identical inputs always produce identical output.
pub fn derive_frame_state(dir: &CinematicDirection, pos: TimePosition) -> FrameRenderState {
    let p = pos.progress();
    let defaults = FrameRenderState::default();

    let fallback_curve;
    let curve: &[TensionStage] = if dir.tension_curve.is_empty() {
        fallback_curve = tables::tension_curve(dir.emotional_arc.as_deref());
        &fallback_curve
    } else {
        &dir.tension_curve
    };
    let stage = curve
        .iter()
        .find(|s| p >= s.start_ratio && p < s.end_ratio)
        .or(curve.last())
        .cloned()
        .unwrap_or_default();

    let chapter = dir.chapter_at(p);
    let world = dir.visual_world.clone().unwrap_or_default();

    let (mood, grade, chapter_intensity) = match chapter {
        Some((idx, ch)) => (
            ch.mood
                .as_deref()
                .map(|m| m.trim().to_ascii_lowercase())
                .filter(|m| crate::grade::mood::mood_keywords().any(|k| k == m.as_str()))
                .unwrap_or_else(|| DEFAULT_MOOD.to_owned()),
            blended_grade(&dir.chapters, idx, p),
            ch.emotional_intensity,
        ),
        None => (DEFAULT_MOOD.to_owned(), defaults.grade, 0.5),
    };
    let ch = chapter.map(|(_, c)| c);

    let background_system = ch
        .and_then(|c| c.atmosphere.as_deref())
        .map(|a| tables::background_system(Some(a)).to_owned())
        .or_else(|| world.background_system.clone())
        .or_else(|| {
            dir.atmosphere
                .as_deref()
                .map(|a| tables::background_system(Some(a)).to_owned())
        })
        .unwrap_or(defaults.background_system);

    let light_source = world
        .light_source
        .clone()
        .unwrap_or_else(|| tables::light_source_for(&background_system).to_owned());

    let palette = match world.palette.as_slice() {
        [a, b, c, ..] => [a.clone(), b.clone(), c.clone()],
        _ => tables::palette_for_tone(dir.scene_tone.as_deref()).map(str::to_owned),
    };

    let typography_profile = ch
        .and_then(|c| c.typography.as_deref())
        .map(|t| tables::typography_profile(Some(t)))
        .or(world.typography_profile)
        .unwrap_or_else(|| tables::typography_profile(dir.typography.as_deref()));

    let motion = ch
        .and_then(|c| c.motion.as_deref())
        .map(|m| tables::motion_profile(Some(m)))
        .or(world.physics_profile)
        .unwrap_or_else(|| tables::motion_profile(dir.motion.as_deref()));

    let particle_system = ch
        .and_then(|c| c.texture.as_deref())
        .map(|t| tables::particle_system(Some(t)).to_owned())
        .or(world.particle_system)
        .unwrap_or_else(|| tables::particle_system(dir.texture.as_deref()).to_owned());

    let climax_ratio = dir.climax_ratio();
    let climax_bump = (1.0 - (p - climax_ratio).abs() / 0.08).max(0.0);
    let intensity = clamp01(
        0.5 * clamp01(chapter_intensity) + 0.5 * clamp01(stage.motion_intensity)
            + 0.15 * climax_bump,
    );
    let max_density = dir
        .climax
        .as_ref()
        .map(|c| c.max_particle_density)
        .unwrap_or(1.0);
    let density = clamp01(stage.particle_density + 0.2 * climax_bump).min(max_density);

    FrameRenderState {
        world: dir
            .atmosphere
            .clone()
            .unwrap_or_else(|| background_system.clone()),
        core_emotion: mood.clone(),
        light_source,
        palette,
        contrast_mode: tables::contrast_mode_for_tone(dir.scene_tone.as_deref()).to_owned(),
        background_intensity: clamp01(lerp(0.25, 1.0, stage.light_brightness)),
        letter_personality: typography_profile.personality.clone(),
        decay: decay_for(motion.weight),
        stack_behavior: stack_behavior_for(grade.layout_mode).to_owned(),
        lyric_entrance: entrance_for(stage.stage).to_owned(),
        lyric_exit: exit_for(stage.stage).to_owned(),
        typography_profile,
        particle_config: ParticleConfig {
            system: particle_system,
            density,
            speed: 0.5 + motion.heat,
        },
        background_system,
        mood,
        grade,
        chapter_index: chapter.map(|(i, _)| i).unwrap_or(0),
        tension_stage: stage.stage,
        intensity,
        progress: p,
    }
}

/// State of an empty direction at the start of the song; the base every merge starts from.
pub fn zero_time_state() -> FrameRenderState {
    derive_frame_state(&CinematicDirection::default(), TimePosition::Progress(0.0))
}

/// Result of a tolerant merge: always a complete state, plus what was ignored and why.
#[derive(Clone, Debug, PartialEq)]
pub struct ManifestMerge {
    /// Fully populated state.
    pub state: FrameRenderState,
    /// Human-readable notes about ignored or rejected fields.
    pub warnings: Vec<String>,
}

/// Merge a possibly malformed persisted state onto [`zero_time_state`].
///
/// Only keys of the state's own field set (which covers [`LEGACY_FIELDS`]) are considered; nulls are
/// skipped, and a value whose type does not fit its field is rejected with a warning while the
/// default stays in place. Never fails.
pub fn safe_manifest(raw: &Value) -> ManifestMerge {
    let mut warnings = Vec::new();
    let base = zero_time_state();
    let Some(obj) = raw.as_object() else {
        warnings.push("manifest is not an object; using defaults".to_owned());
        return ManifestMerge {
            state: base,
            warnings,
        };
    };

    let mut accepted = match serde_json::to_value(&base) {
        Ok(Value::Object(m)) => m,
        _ => Map::new(),
    };

    for (key, value) in obj {
        if !accepted.contains_key(key) {
            warnings.push(format!("ignored unknown field \"{key}\""));
            continue;
        }
        if value.is_null() {
            continue;
        }
        let mut candidate = accepted.clone();
        candidate.insert(key.clone(), value.clone());
        match serde_json::from_value::<FrameRenderState>(Value::Object(candidate.clone())) {
            Ok(_) => accepted = candidate,
            Err(e) => warnings.push(format!("rejected field \"{key}\": {e}")),
        }
    }

    let fallback = base.palette.clone();
    let mut state: FrameRenderState =
        serde_json::from_value(Value::Object(accepted)).unwrap_or(base);

    for (i, entry) in state.palette.iter_mut().enumerate() {
        if Rgb::parse_hex(entry).is_none() {
            warnings.push(format!("palette[{i}] \"{entry}\" is not a hex color"));
            *entry = fallback[i].clone();
        }
    }
    state.progress = clamp01(state.progress);
    state.intensity = clamp01(state.intensity);
    state.background_intensity = clamp01(state.background_intensity);

    if !warnings.is_empty() {
        tracing::warn!(count = warnings.len(), "frame state manifest merged with warnings");
    }
    ManifestMerge { state, warnings }
}

/// Build the initial state for a persisted record.
///
/// Prefers a persisted `frame_state` object; otherwise derives from `cinematic_direction` at
/// zero time, carrying `palette`, `lightSource` and `backgroundSystem` forward from the raw
/// direction's `visualWorld` block when present.
pub fn build_from_direction(record: &Value) -> ManifestMerge {
    if let Some(persisted) = record.get("frame_state").filter(|v| v.is_object()) {
        return safe_manifest(persisted);
    }

    let mut warnings = Vec::new();
    let raw_dir = record.get("cinematic_direction").filter(|v| !v.is_null());
    let mut state = match raw_dir.map(CinematicDirection::load) {
        Some(Ok(dir)) => derive_frame_state(&dir, TimePosition::Progress(0.0)),
        Some(Err(e)) => {
            warnings.push(format!("cinematic_direction unusable: {e}"));
            zero_time_state()
        }
        None => zero_time_state(),
    };

    if let Some(world) = raw_dir
        .and_then(|d| d.get("visualWorld"))
        .and_then(Value::as_object)
    {
        if let Some(palette) = world.get("palette").and_then(Value::as_array) {
            let hex: Vec<&str> = palette
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| Rgb::parse_hex(s).is_some())
                .collect();
            match hex.as_slice() {
                [a, b, c, ..] => state.palette = [a, b, c].map(|s| (*s).to_owned()),
                _ => warnings.push("visualWorld.palette needs three hex colors".to_owned()),
            }
        }
        if let Some(light) = world.get("lightSource").and_then(Value::as_str) {
            state.light_source = light.to_owned();
        }
        if let Some(bg) = world.get("backgroundSystem").and_then(Value::as_str) {
            state.background_system = bg.to_owned();
        }
    }

    ManifestMerge { state, warnings }
}

#[cfg(test)]
#[path = "../../tests/unit/state/frame.rs"]
mod tests;
