use std::borrow::Cow;

use serde_json::{Map, Value, json};

use crate::{
    direction::{
        model::{CinematicDirection, normalize_word_key},
        tables,
    },
    foundation::error::{LyricDanceError, LyricDanceResult},
};

/// Which authoring schema a raw direction object follows.
///
/// The normalizer is the only place that branches on this; everything downstream sees
/// [`CinematicDirection`].
#[derive(Clone, Copy, Debug)]
pub enum DirectionSchema<'a> {
    /// Already canonical: `chapters[0].startRatio` is present.
    Canonical(&'a Map<String, Value>),
    /// Authoring schema (`sections`, array-form `wordDirectives`, flat `storyboard`).
    Authored(&'a Map<String, Value>),
}

/// Classify a raw value. Returns `None` for anything that is not a JSON object.
pub fn detect_schema(raw: &Value) -> Option<DirectionSchema<'_>> {
    let obj = raw.as_object()?;
    let canonical = obj
        .get("chapters")
        .and_then(Value::as_array)
        .and_then(|chapters| chapters.first())
        .and_then(|first| first.get("startRatio"))
        .is_some_and(|v| !v.is_null());
    Some(if canonical {
        DirectionSchema::Canonical(obj)
    } else {
        DirectionSchema::Authored(obj)
    })
}

/// Adapt any supported direction schema into the canonical shape.
///
/// Canonical input is returned borrowed and untouched. Authored input gets the legacy view
/// (`chapters`, `tensionCurve`, `visualWorld`, `climax`, `ending`) synthesized next to its own
/// fields, with `wordDirectives` re-keyed by normalized word. Non-objects yield `None`.
#[tracing::instrument(skip(raw))]
pub fn normalize_direction(raw: &Value) -> Option<Cow<'_, Value>> {
    match detect_schema(raw)? {
        DirectionSchema::Canonical(_) => Some(Cow::Borrowed(raw)),
        DirectionSchema::Authored(obj) => Some(Cow::Owned(Value::Object(synthesize(obj)))),
    }
}

impl CinematicDirection {
    /// Normalize and deserialize a raw direction document.
    pub fn load(raw: &Value) -> LyricDanceResult<Self> {
        let normalized = normalize_direction(raw).ok_or_else(|| {
            LyricDanceError::validation("cinematic direction must be a JSON object")
        })?;
        let mut dir: CinematicDirection = serde_json::from_value(normalized.into_owned())?;
        dir.chapters
            .sort_by(|a, b| a.start_ratio.total_cmp(&b.start_ratio));
        dir.tension_curve
            .sort_by(|a, b| a.start_ratio.total_cmp(&b.start_ratio));
        if dir.tension_curve.is_empty() {
            dir.tension_curve = tables::tension_curve(dir.emotional_arc.as_deref());
        }
        Ok(dir)
    }

    /// Parse JSON text, then [`CinematicDirection::load`].
    pub fn from_json_str(s: &str) -> LyricDanceResult<Self> {
        let raw: Value = serde_json::from_str(s)?;
        Self::load(&raw)
    }
}

fn text<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn synthesize(obj: &Map<String, Value>) -> Map<String, Value> {
    let mut out = obj.clone();

    let arc = text(obj, "emotionalArc");
    let tension = tables::tension_curve(arc);

    let (sections, chapters) = partition_sections(obj, &tension);
    if !sections.is_empty() {
        out.insert("sections".to_owned(), Value::Array(sections));
    }
    out.insert("chapters".to_owned(), Value::Array(chapters));
    out.insert("tensionCurve".to_owned(), json!(tension));

    let background = tables::background_system(text(obj, "atmosphere"));
    out.insert(
        "visualWorld".to_owned(),
        json!({
            "palette": tables::palette_for_tone(text(obj, "sceneTone")),
            "backgroundSystem": background,
            "lightSource": tables::light_source_for(background),
            "particleSystem": tables::particle_system(text(obj, "texture")),
            "typographyProfile": tables::typography_profile(text(obj, "typography")),
            "physicsProfile": tables::motion_profile(text(obj, "motion")),
        }),
    );

    out.insert(
        "climax".to_owned(),
        json!({
            "timestampRatio": tables::climax_ratio(arc),
            "maxParticleDensity": 1.0,
            "maxLightIntensity": 1.0,
        }),
    );

    let (style, fade) = tables::ending_for_arc(arc);
    out.insert(
        "ending".to_owned(),
        json!({ "style": style, "fadeDurationSec": fade }),
    );

    if let Some(directives) = obj.get("wordDirectives") {
        out.insert(
            "wordDirectives".to_owned(),
            Value::Object(key_word_directives(directives)),
        );
    }

    out
}

/// Evenly partition `[0, 1]` across the authored sections, or fall back to the three default
/// chapters. Returns `(sections with ratios, chapters)`.
fn partition_sections(
    obj: &Map<String, Value>,
    tension: &[crate::direction::model::TensionStage],
) -> (Vec<Value>, Vec<Value>) {
    let mut sections: Vec<Value> = obj
        .get("sections")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter(|s| s.is_object()).cloned().collect())
        .unwrap_or_default();

    if sections.is_empty() {
        let chapters = tables::DEFAULT_CHAPTERS
            .iter()
            .map(|&(title, start, end, intensity)| {
                json!({
                    "title": title,
                    "startRatio": start,
                    "endRatio": end,
                    "emotionalIntensity": intensity,
                })
            })
            .collect();
        return (sections, chapters);
    }

    // Authored order unless explicit indices say otherwise.
    sections.sort_by_key(|s| s.get("sectionIndex").and_then(Value::as_u64).unwrap_or(u64::MAX));

    let n = sections.len();
    let mut chapters = Vec::with_capacity(n);
    for (i, section) in sections.iter_mut().enumerate() {
        let start = i as f64 / n as f64;
        let end = if i + 1 == n { 1.0 } else { (i + 1) as f64 / n as f64 };
        let mid = (start + end) / 2.0;
        let intensity = tension
            .iter()
            .find(|s| mid >= s.start_ratio && mid < s.end_ratio)
            .or(tension.last())
            .map(|s| s.motion_intensity)
            .unwrap_or(0.5)
            .clamp(0.1, 1.0);

        let Some(sec) = section.as_object_mut() else {
            continue;
        };
        sec.insert("startRatio".to_owned(), json!(start));
        sec.insert("endRatio".to_owned(), json!(end));

        let title = text(sec, "description")
            .map(str::to_owned)
            .unwrap_or_else(|| format!("Section {}", i + 1));
        let mut chapter = json!({
            "title": title,
            "startRatio": start,
            "endRatio": end,
            "emotionalIntensity": intensity,
        });
        if let Some(ch) = chapter.as_object_mut() {
            for field in ["mood", "motion", "texture", "typography", "atmosphere"] {
                if let Some(v) = text(sec, field) {
                    ch.insert(field.to_owned(), json!(v));
                }
            }
        }
        chapters.push(chapter);
    }
    (sections, chapters)
}

/// Array or map form to a map keyed by normalized word, with inferred legacy classes.
fn key_word_directives(raw: &Value) -> Map<String, Value> {
    let entries: Vec<(String, &Value)> = match raw {
        Value::Array(list) => list
            .iter()
            .filter_map(|d| Some((d.get("word")?.as_str()?.to_owned(), d)))
            .collect(),
        Value::Object(map) => map.iter().map(|(k, d)| (k.clone(), d)).collect(),
        _ => Vec::new(),
    };

    let mut out = Map::new();
    for (word, directive) in entries {
        let Some(d) = directive.as_object() else {
            continue;
        };
        let key = normalize_word_key(&word);
        if key.is_empty() || out.contains_key(&key) {
            continue;
        }
        let mut d = d.clone();
        d.entry("word").or_insert_with(|| json!(word));
        if text(&d, "kineticClass").is_none()
            && let Some(class) =
                tables::infer_kinetic_class(text(&d, "behavior"), text(&d, "entry"))
        {
            d.insert("kineticClass".to_owned(), json!(class));
        }
        if text(&d, "elementalClass").is_none()
            && let Some(class) = tables::infer_elemental_class(text(&d, "visualMetaphor"))
        {
            d.insert("elementalClass".to_owned(), json!(class));
        }
        out.insert(key, Value::Object(d));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/direction/normalize.rs"]
mod tests;
