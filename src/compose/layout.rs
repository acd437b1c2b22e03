//! Lyric line lookup, repeat tracking and word placement.
//!
//! Word widths come from an approximate advance (`0.56em` per character) so frame plans stay
//! independent of font loading; the CPU backend centers each glyph run inside its box.

use std::collections::HashMap;

use crate::{
    direction::model::normalize_word_key,
    foundation::{
        core::{Canvas, Point},
        math::keyed_rng,
    },
    grade::mood::LayoutMode,
};

/// Average glyph advance as a fraction of the font size.
pub const APPROX_ADVANCE_EM: f64 = 0.56;
/// Line height as a multiple of the largest font size in the row.
pub const LINE_HEIGHT: f64 = 1.25;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// A time-aligned lyric line.
pub struct LyricLine {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Line text.
    pub text: String,
}

/// The line sounding at `time`: `start <= time < end`. `lines` must be sorted by `start`.
pub fn active_line(lines: &[LyricLine], time: f64) -> Option<(usize, &LyricLine)> {
    let idx = lines.partition_point(|l| l.start <= time).checked_sub(1)?;
    let line = &lines[idx];
    (time < line.end).then_some((idx, line))
}

fn line_key(text: &str) -> String {
    text.split_whitespace()
        .map(normalize_word_key)
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Per line: whether its normalized text occurs at least twice in the song.
pub fn hook_lines(lines: &[LyricLine]) -> Vec<bool> {
    let keys: Vec<String> = lines.iter().map(|l| line_key(&l.text)).collect();
    let mut counts = HashMap::<&str, usize>::new();
    for k in keys.iter().filter(|k| !k.is_empty()) {
        *counts.entry(k.as_str()).or_default() += 1;
    }
    keys.iter()
        .map(|k| counts.get(k.as_str()).is_some_and(|&n| n >= 2))
        .collect()
}

/// Per line, per word: how many times the word appeared earlier in the song.
pub fn word_appearances(lines: &[LyricLine]) -> Vec<Vec<u32>> {
    let mut seen = HashMap::<String, u32>::new();
    lines
        .iter()
        .map(|line| {
            line.text
                .split_whitespace()
                .map(|w| {
                    let n = seen.entry(normalize_word_key(w)).or_default();
                    let before = *n;
                    *n += 1;
                    before
                })
                .collect()
        })
        .collect()
}

/// Base lyric font size for a canvas.
pub fn base_font_size(canvas: Canvas) -> f64 {
    f64::from(canvas.width.min(canvas.height)) * 0.075
}

/// Font size for a word with the given emphasis level (0 = normal, capped at 4).
pub fn emphasis_font_size(base: f64, emphasis_level: i32) -> f64 {
    base * (1.0 + 0.15 * f64::from(emphasis_level.clamp(0, 4)))
}

/// Approximate advance width of `word`.
pub fn measure_word(word: &str, font_size: f64) -> f64 {
    word.chars().count() as f64 * APPROX_ADVANCE_EM * font_size
}

#[derive(Clone, Debug, PartialEq)]
/// A placed word.
pub struct WordBox {
    /// Index of the word within its line.
    pub index: usize,
    /// Word text.
    pub text: String,
    /// Top-left corner.
    pub origin: Point,
    /// Advance width.
    pub width: f64,
    /// Font size.
    pub font_size: f64,
}

impl WordBox {
    /// Center of the box.
    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.width / 2.0,
            self.origin.y + self.font_size * LINE_HEIGHT / 2.0,
        )
    }
}

/// Place `words` (`(text, font_size)`) on `canvas` according to `mode`.
///
/// `seed` keys the scattered layout so a line lands in the same spots on every frame.
pub fn layout_words(words: &[(&str, f64)], canvas: Canvas, mode: LayoutMode, seed: u64) -> Vec<WordBox> {
    let w = f64::from(canvas.width);
    let h = f64::from(canvas.height);
    let boxes = words.iter().enumerate().map(|(index, &(text, font_size))| WordBox {
        index,
        text: text.to_owned(),
        origin: Point::ZERO,
        width: measure_word(text, font_size),
        font_size,
    });
    let mut boxes: Vec<WordBox> = boxes.collect();

    match mode {
        LayoutMode::Centered => flow(&mut boxes, w, h, 0.85 * w, 0.28),
        LayoutMode::Wide => flow(&mut boxes, w, h, 0.95 * w, 0.6),
        LayoutMode::Stacked => flow(&mut boxes, w, h, 0.0, 0.28),
        LayoutMode::Scattered => {
            for b in &mut boxes {
                let mut rng = keyed_rng(&[seed, b.index as u64]);
                let bh = b.font_size * LINE_HEIGHT;
                let x_span = (0.8 * w - b.width).max(0.0);
                let y_span = (0.7 * h - bh).max(0.0);
                b.origin = Point::new(
                    0.1 * w + rng.next_f64_01() * x_span,
                    0.15 * h + rng.next_f64_01() * y_span,
                );
            }
        }
    }
    boxes
}

/// Greedy row wrap at `max_row_width` (0 = one word per row), rows centered on the canvas.
fn flow(boxes: &mut [WordBox], w: f64, h: f64, max_row_width: f64, gap_em: f64) {
    let mut rows: Vec<(usize, usize)> = Vec::new();
    let mut start = 0;
    let mut row_width = 0.0;
    for (i, b) in boxes.iter().enumerate() {
        let gap = if i > start { b.font_size * gap_em } else { 0.0 };
        if i > start && row_width + gap + b.width > max_row_width {
            rows.push((start, i));
            start = i;
            row_width = b.width;
        } else {
            row_width += gap + b.width;
        }
    }
    if start < boxes.len() {
        rows.push((start, boxes.len()));
    }

    let row_height = |row: &[WordBox]| {
        row.iter().map(|b| b.font_size).fold(0.0, f64::max) * LINE_HEIGHT
    };
    let total_height: f64 = rows.iter().map(|&(a, b)| row_height(&boxes[a..b])).sum();
    let mut y = (h - total_height) / 2.0;
    for (a, b) in rows {
        let row = &mut boxes[a..b];
        let rh = row_height(row);
        let width: f64 = row.iter().map(|b| b.width).sum::<f64>()
            + row.iter().skip(1).map(|b| b.font_size * gap_em).sum::<f64>();
        let mut x = (w - width) / 2.0;
        for (k, b) in row.iter_mut().enumerate() {
            if k > 0 {
                x += b.font_size * gap_em;
            }
            b.origin = Point::new(x, y + (rh - b.font_size * LINE_HEIGHT) / 2.0);
            x += b.width;
        }
        y += rh;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/layout.rs"]
mod tests;
