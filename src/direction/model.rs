use std::collections::BTreeMap;

/// Normalized lookup key for a word: lowercased with every non-alphanumeric character removed.
///
/// `"Fire!"`, `"FIRE"` and `"fi-re"` all map to `"fire"`.
pub fn normalize_word_key(word: &str) -> String {
    // Lowercase first: some folds expand into combining marks that must be filtered too.
    word.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// The authored visual program for one song, in canonical form.
///
/// Both views are always populated after [`CinematicDirection::load`]: the authored fields
/// (`scene_tone` .. `storyboard`) and the synthesized legacy view (`chapters` .. `ending`).
pub struct CinematicDirection {
    /// Overall tonal keyword (`dark`, `light`, `mixed-dawn`, ...).
    pub scene_tone: Option<String>,
    /// Atmosphere keyword (`burn`, `rain`, `haze`, ...).
    pub atmosphere: Option<String>,
    /// Motion keyword (`weighted`, `fluid`, `elastic`, `drift`, `glitch`).
    pub motion: Option<String>,
    /// Typography keyword (`bold-impact`, `clean-modern`, ...).
    pub typography: Option<String>,
    /// Texture keyword, used as the particle system id.
    pub texture: Option<String>,
    /// Emotional arc keyword selecting a tension template.
    pub emotional_arc: Option<String>,
    /// Authored sections, with ratios filled in by normalization.
    pub sections: Vec<Section>,
    /// Word directives keyed by [`normalize_word_key`].
    #[serde(deserialize_with = "de_word_directives")]
    pub word_directives: BTreeMap<String, WordDirective>,
    /// Per-line treatments.
    pub storyboard: Vec<StoryboardEntry>,

    /// Legacy chapter partition of `[0, 1]`.
    pub chapters: Vec<Chapter>,
    /// Legacy tension stages.
    pub tension_curve: Vec<TensionStage>,
    /// Legacy world block (palette, background, light, typography, physics).
    pub visual_world: Option<VisualWorld>,
    /// Legacy climax marker.
    pub climax: Option<Climax>,
    /// Legacy ending treatment.
    pub ending: Option<Ending>,
}

impl CinematicDirection {
    /// Look up a word directive; case and punctuation never affect matching.
    pub fn word_directive(&self, word: &str) -> Option<&WordDirective> {
        let key = normalize_word_key(word);
        if key.is_empty() {
            return None;
        }
        self.word_directives.get(&key)
    }

    /// Storyboard treatment for a lyric line, if one was authored.
    pub fn storyboard_for_line(&self, line_index: usize) -> Option<&StoryboardEntry> {
        self.storyboard.iter().find(|s| s.line_index == line_index)
    }

    /// Chapter containing `progress`, falling back to the last chapter.
    pub fn chapter_at(&self, progress: f64) -> Option<(usize, &Chapter)> {
        let idx = self
            .chapters
            .iter()
            .position(|c| progress >= c.start_ratio && progress < c.end_ratio)
            .unwrap_or(self.chapters.len().checked_sub(1)?);
        Some((idx, &self.chapters[idx]))
    }

    /// Tension stage containing `progress`, falling back to the last stage.
    pub fn tension_stage_at(&self, progress: f64) -> Option<&TensionStage> {
        self.tension_curve
            .iter()
            .find(|s| progress >= s.start_ratio && progress < s.end_ratio)
            .or_else(|| self.tension_curve.last())
    }

    /// Climax position in `[0, 1]`.
    pub fn climax_ratio(&self) -> f64 {
        self.climax
            .as_ref()
            .map(|c| c.timestamp_ratio)
            .unwrap_or(crate::direction::tables::DEFAULT_CLIMAX_RATIO)
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// One authored section of the song.
pub struct Section {
    /// Authoring order.
    pub section_index: usize,
    /// Free-form description, used as the chapter title.
    pub description: String,
    /// Mood keyword override.
    pub mood: Option<String>,
    /// Motion keyword override.
    pub motion: Option<String>,
    /// Texture keyword override.
    pub texture: Option<String>,
    /// Typography keyword override.
    pub typography: Option<String>,
    /// Atmosphere keyword override.
    pub atmosphere: Option<String>,
    /// Authored start time, informational only.
    pub start_sec: Option<f64>,
    /// Authored end time, informational only.
    pub end_sec: Option<f64>,
    /// Start of the section in normalized song time.
    pub start_ratio: f64,
    /// End of the section in normalized song time.
    pub end_ratio: f64,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Per-word animation intent.
pub struct WordDirective {
    /// The word as authored.
    pub word: String,
    /// Emphasis on an integer scale (0 = none).
    pub emphasis_level: i32,
    /// Entry tag.
    pub entry: Option<String>,
    /// Behavior tag while on screen.
    pub behavior: Option<String>,
    /// Exit tag.
    pub exit: Option<String>,
    /// Trail tag.
    pub trail: Option<String>,
    /// Whether translucent ghost copies follow the word.
    pub ghost_trail: bool,
    /// Direction the ghost copies drift toward.
    pub ghost_direction: Option<String>,
    /// Whether letters appear one by one.
    pub letter_sequence: bool,
    /// Free-form metaphor, used to infer the elemental class.
    pub visual_metaphor: Option<String>,
    /// Legacy kinetic class tag (`FALLING`, `SHAKING`, ...).
    pub kinetic_class: Option<String>,
    /// Legacy elemental class tag (`FIRE`, `WATER`, ...).
    pub elemental_class: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Treatment for one lyric line.
pub struct StoryboardEntry {
    /// Index into the lyric lines.
    pub line_index: usize,
    /// Word to feature on this line.
    pub hero_word: Option<String>,
    /// Entry style tag.
    pub entry_style: Option<String>,
    /// Exit style tag.
    pub exit_style: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Legacy chapter: a contiguous slice of normalized song time.
pub struct Chapter {
    /// Display title.
    pub title: String,
    /// Inclusive start ratio.
    pub start_ratio: f64,
    /// Exclusive end ratio (the last chapter ends at exactly 1).
    pub end_ratio: f64,
    /// Chapter intensity in `[0, 1]`.
    pub emotional_intensity: f64,
    /// Mood keyword for this chapter.
    pub mood: Option<String>,
    /// Motion keyword override.
    pub motion: Option<String>,
    /// Texture keyword override.
    pub texture: Option<String>,
    /// Typography keyword override.
    pub typography: Option<String>,
    /// Atmosphere keyword override.
    pub atmosphere: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Named phase of escalating intensity.
pub enum StageName {
    /// Establishing phase.
    #[default]
    Setup,
    /// Rising phase.
    Build,
    /// Climactic phase.
    Peak,
    /// Falling phase.
    Release,
}

impl StageName {
    /// Stable display name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "Setup",
            Self::Build => "Build",
            Self::Peak => "Peak",
            Self::Release => "Release",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// One stage of the tension curve.
pub struct TensionStage {
    /// Stage name.
    pub stage: StageName,
    /// Inclusive start ratio.
    pub start_ratio: f64,
    /// Exclusive end ratio.
    pub end_ratio: f64,
    /// Motion intensity in `[0, 1]`.
    pub motion_intensity: f64,
    /// Particle density in `[0, 1]`.
    pub particle_density: f64,
    /// Light brightness in `[0, 1]`.
    pub light_brightness: f64,
    /// Cut speed in `[0, 1]`.
    pub cut_speed: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// How strongly motion reacts to beats.
pub enum BeatResponse {
    /// Soft scale pulse.
    #[default]
    Pulse,
    /// Hard hit.
    Slam,
    /// Slow swell.
    Breath,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// Perceived mass of moving text.
pub enum MotionWeight {
    /// Barely any mass.
    Featherlight,
    /// Light.
    Light,
    /// Neutral.
    #[default]
    Normal,
    /// Heavy.
    Heavy,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Physical feel derived from the motion keyword.
pub struct MotionProfile {
    /// Heat in `[0, 1]`.
    pub heat: f64,
    /// Beat reaction style.
    pub beat_response: BeatResponse,
    /// Mass.
    pub weight: MotionWeight,
    /// Chaos in `[0, 1]`.
    pub chaos: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// Case transform applied to lyric text.
pub enum TextTransform {
    /// As authored.
    #[default]
    None,
    /// ALL CAPS.
    Uppercase,
    /// all lowercase.
    Lowercase,
}

impl TextTransform {
    /// Apply the transform to `text`.
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::None => text.to_owned(),
            Self::Uppercase => text.to_uppercase(),
            Self::Lowercase => text.to_lowercase(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Font choice and letter personality for lyric text.
pub struct TypographyProfile {
    /// Font family name.
    pub font_family: String,
    /// CSS-style weight.
    pub font_weight: u16,
    /// Case transform.
    pub text_transform: TextTransform,
    /// Personality tag driving letter behavior.
    pub personality: String,
}

impl Default for TypographyProfile {
    fn default() -> Self {
        crate::direction::tables::typography_profile(None)
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Legacy world block.
pub struct VisualWorld {
    /// `[primary, mid, accent]` hex colors.
    pub palette: Vec<String>,
    /// Background system id.
    pub background_system: Option<String>,
    /// Light source keyword.
    pub light_source: Option<String>,
    /// Particle system id.
    pub particle_system: Option<String>,
    /// Typography profile.
    pub typography_profile: Option<TypographyProfile>,
    /// Motion physics.
    pub physics_profile: Option<MotionProfile>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Legacy climax marker.
pub struct Climax {
    /// Climax position in normalized song time.
    pub timestamp_ratio: f64,
    /// Particle density cap at the climax.
    pub max_particle_density: f64,
    /// Light intensity cap at the climax.
    pub max_light_intensity: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// How the video ends.
pub enum EndingStyle {
    /// Hold the last frame.
    Linger,
    /// Fade to black.
    #[default]
    Fade,
    /// Hard cut.
    Snap,
    /// Break apart into particles.
    Dissolve,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Legacy ending treatment.
pub struct Ending {
    /// Style.
    pub style: EndingStyle,
    /// Duration of the closing fade in seconds.
    pub fade_duration_sec: f64,
}

/// Accepts either the authored array form or the keyed map form, keyed by [`normalize_word_key`].
/// First occurrence wins; empty keys are dropped.
fn de_word_directives<'de, D>(deserializer: D) -> Result<BTreeMap<String, WordDirective>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Form {
        List(Vec<WordDirective>),
        Map(BTreeMap<String, WordDirective>),
    }

    let pairs: Vec<(String, WordDirective)> = match <Option<Form> as serde::Deserialize>::deserialize(
        deserializer,
    )? {
        None => Vec::new(),
        Some(Form::List(list)) => list.into_iter().map(|d| (d.word.clone(), d)).collect(),
        Some(Form::Map(map)) => map.into_iter().collect(),
    };

    let mut out = BTreeMap::new();
    for (word, d) in pairs {
        let key = normalize_word_key(&word);
        if !key.is_empty() {
            out.entry(key).or_insert(d);
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/direction/model.rs"]
mod tests;
