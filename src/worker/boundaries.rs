use std::collections::HashMap;

use crate::{
    compose::kinetic::KineticClass,
    direction::model::{CinematicDirection, StageName, normalize_word_key},
};

#[derive(Clone, Copy, Debug, PartialEq)]
/// A chapter in absolute song time.
pub struct ChapterBoundary {
    /// Index into the direction's chapters.
    pub index: usize,
    /// Start in milliseconds.
    pub start_ms: f64,
    /// End in milliseconds.
    pub end_ms: f64,
    /// Chapter intensity in `[0, 1]`.
    pub intensity: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// A tension stage in absolute song time.
pub struct StageBoundary {
    /// Stage name.
    pub stage: StageName,
    /// Start in milliseconds.
    pub start_ms: f64,
    /// End in milliseconds.
    pub end_ms: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
/// Chapter and tension-stage boundaries, sorted by start.
pub struct Boundaries {
    /// Chapters.
    pub chapters: Vec<ChapterBoundary>,
    /// Tension stages.
    pub stages: Vec<StageBoundary>,
}

impl Boundaries {
    /// Scale every ratio of `dir` by `duration_sec`.
    pub fn compute(dir: &CinematicDirection, duration_sec: f64) -> Self {
        let total_ms = duration_sec.max(0.0) * 1000.0;
        let mut chapters: Vec<ChapterBoundary> = dir
            .chapters
            .iter()
            .enumerate()
            .map(|(index, c)| ChapterBoundary {
                index,
                start_ms: c.start_ratio * total_ms,
                end_ms: c.end_ratio * total_ms,
                intensity: c.emotional_intensity,
            })
            .collect();
        chapters.sort_by(|a, b| a.start_ms.total_cmp(&b.start_ms));

        let mut stages: Vec<StageBoundary> = dir
            .tension_curve
            .iter()
            .map(|s| StageBoundary {
                stage: s.stage,
                start_ms: s.start_ratio * total_ms,
                end_ms: s.end_ratio * total_ms,
            })
            .collect();
        stages.sort_by(|a, b| a.start_ms.total_cmp(&b.start_ms));

        Self { chapters, stages }
    }

    /// Tension stage at `t_ms`, falling back to the last stage.
    pub fn stage_at(&self, t_ms: f64) -> Option<&StageBoundary> {
        let idx = self.stages.partition_point(|s| s.start_ms <= t_ms);
        idx.checked_sub(1)
            .and_then(|i| self.stages.get(i))
            .filter(|s| t_ms < s.end_ms)
            .or(self.stages.last())
    }
}

/// Chapter whose span contains `t_ms`.
///
/// Spans are half-open except the last, which also owns its end; a time covered by no span
/// resolves to the last chapter. `chapters` must be sorted and non-overlapping.
pub fn get_current_chapter(chapters: &[ChapterBoundary], t_ms: f64) -> Option<&ChapterBoundary> {
    let last = chapters.last()?;
    let idx = chapters.partition_point(|c| c.start_ms <= t_ms);
    let hit = idx.checked_sub(1).filter(|&i| {
        let c = &chapters[i];
        t_ms < c.end_ms || (i + 1 == chapters.len() && t_ms <= c.end_ms)
    });
    Some(hit.map_or(last, |i| &chapters[i]))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Per-word treatment resolved once at init.
pub struct WordTreatment {
    /// Motion class.
    pub kinetic: KineticClass,
    /// Emphasis level, `0` for normal.
    pub emphasis_level: i32,
    /// Whether the word leaves ghost copies behind.
    pub ghost_trail: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
/// Word directives keyed by lowercase-alphanumeric word.
pub struct WordLookup(HashMap<String, WordTreatment>);

impl WordLookup {
    /// Resolve every directive of `dir`.
    pub fn build(dir: &CinematicDirection) -> Self {
        let map = dir
            .word_directives
            .iter()
            .map(|(key, d)| {
                let treatment = WordTreatment {
                    kinetic: KineticClass::from_tag(d.kinetic_class.as_deref()),
                    emphasis_level: d.emphasis_level,
                    ghost_trail: d.ghost_trail,
                };
                (key.clone(), treatment)
            })
            .collect();
        Self(map)
    }

    /// Treatment for `word`; unknown words get the default (no motion, no emphasis).
    pub fn get(&self, word: &str) -> WordTreatment {
        self.0
            .get(&normalize_word_key(word))
            .copied()
            .unwrap_or_default()
    }

    /// Number of directives.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no directives.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/worker/boundaries.rs"]
mod tests;
