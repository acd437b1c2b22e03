use crate::{
    compose::{
        color::{
            RecentBrightness, apply_beat_flash, apply_contrast_rhythm, channel_split_copies,
            draw_temperature_tint, resolve_word_colors,
        },
        kinetic::{Ghost, KineticInput, apply_kinetic},
        layout::{
            LyricLine, active_line, base_font_size, emphasis_font_size, hook_lines, layout_words,
            word_appearances,
        },
        lighting::{background_system_for_time, draw_background, draw_lighting, get_text_shadow},
    },
    direction::model::{CinematicDirection, EndingStyle, normalize_word_key},
    foundation::{
        core::{Affine, Canvas, Rgb},
        math::{Fnv1a64, clamp01},
    },
    grade::mood::{MotionIntent, TextMode, build_grade_filter, text_mode},
    render::plan::{BlendMode, DrawOp, FramePlan, GlowSpec, GradePass, TextOp},
    state::frame::{FrameRenderState, TimePosition, derive_frame_state},
    worker::boundaries::{Boundaries, WordLookup},
};

/// Seconds a line takes to fade in and out at its edges.
pub const LINE_FADE_SEC: f64 = 0.15;

const LIGHT_TEXT: &str = "#f5f5f5";
const DARK_TEXT: &str = "#141414";
const GHOST_SPACING_EM: f64 = 0.35;

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Knobs for [`compose_frame`].
pub struct ComposeOpts {
    /// Opaque clear color under the background.
    pub clear: Rgb,
    /// Whether to emit the full-frame grade pass.
    pub grade_pass: bool,
}

impl Default for ComposeOpts {
    fn default() -> Self {
        Self {
            clear: Rgb::BLACK,
            grade_pass: true,
        }
    }
}

/// Everything precomputed once per song so composing a frame stays a pure function of
/// `(time, beat)`.
#[derive(Clone, Debug)]
pub struct SceneContext {
    canvas: Canvas,
    direction: CinematicDirection,
    lines: Vec<LyricLine>,
    duration_sec: f64,
    boundaries: Boundaries,
    words: WordLookup,
    hooks: Vec<bool>,
    appearances: Vec<Vec<u32>>,
    line_colors: Vec<String>,
}

impl SceneContext {
    /// Precompute boundaries, word treatments, hooks, repeat counts and per-line base colors.
    ///
    /// `lines` are sorted by start time.
    pub fn new(
        canvas: Canvas,
        direction: CinematicDirection,
        mut lines: Vec<LyricLine>,
        duration_sec: f64,
    ) -> Self {
        lines.sort_by(|a, b| a.start.total_cmp(&b.start));
        let duration_sec = duration_sec.max(0.0);
        let boundaries = Boundaries::compute(&direction, duration_sec);
        let words = WordLookup::build(&direction);
        let hooks = hook_lines(&lines);
        let appearances = word_appearances(&lines);
        let line_colors = line_base_colors(&direction, &lines, duration_sec);
        Self {
            canvas,
            direction,
            lines,
            duration_sec,
            boundaries,
            words,
            hooks,
            appearances,
            line_colors,
        }
    }

    /// Target canvas.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Change the target canvas; layout adapts on the next frame.
    pub fn set_canvas(&mut self, canvas: Canvas) {
        self.canvas = canvas;
    }

    /// The normalized direction.
    pub fn direction(&self) -> &CinematicDirection {
        &self.direction
    }

    /// Lyric lines, sorted by start.
    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    /// Song length in seconds.
    pub fn duration_sec(&self) -> f64 {
        self.duration_sec
    }

    /// Chapter and stage boundaries in milliseconds.
    pub fn boundaries(&self) -> &Boundaries {
        &self.boundaries
    }

    /// Resolved word treatments.
    pub fn words(&self) -> &WordLookup {
        &self.words
    }

    /// Frame state at `time` seconds.
    pub fn state_at(&self, time: f64) -> FrameRenderState {
        derive_frame_state(
            &self.direction,
            TimePosition::Elapsed {
                elapsed_sec: time,
                duration_sec: self.duration_sec,
            },
        )
    }
}

/// Base color per line: light or dark text for the line's grade, broken up by the contrast
/// rhythm so bright lines never run three in a row.
fn line_base_colors(dir: &CinematicDirection, lines: &[LyricLine], duration_sec: f64) -> Vec<String> {
    let mut recent = RecentBrightness::default();
    lines
        .iter()
        .map(|line| {
            let state = derive_frame_state(
                dir,
                TimePosition::Elapsed {
                    elapsed_sec: line.start,
                    duration_sec,
                },
            );
            let candidate = match text_mode(&state.grade, state.intensity) {
                TextMode::Light => LIGHT_TEXT,
                TextMode::Dark => DARK_TEXT,
            };
            let chosen = apply_contrast_rhythm(candidate, recent.samples(), &state.palette).into_owned();
            recent.push(&chosen);
            chosen
        })
        .collect()
}

fn speed_multiplier(intent: MotionIntent) -> f64 {
    match intent {
        MotionIntent::Still => 0.4,
        MotionIntent::Drift => 0.8,
        MotionIntent::Pulse => 1.0,
        MotionIntent::Surge => 1.2,
        MotionIntent::Shake => 1.4,
    }
}

fn grain_seed(time: f64) -> u64 {
    let mut h = Fnv1a64::new_default();
    h.write_u64((time.max(0.0) * 1000.0).round() as u64);
    h.finish()
}

/// Opacity of a line at `time`: ramps over [`LINE_FADE_SEC`] at both ends.
pub fn line_opacity(line: &LyricLine, time: f64) -> f64 {
    let fade_in = (time - line.start) / LINE_FADE_SEC;
    let fade_out = (line.end - time) / LINE_FADE_SEC;
    clamp01(fade_in.min(fade_out))
}

/// Black overlay alpha of the closing fade at `time`.
pub fn ending_fade_alpha(dir: &CinematicDirection, time: f64, duration_sec: f64) -> f64 {
    let Some(ending) = dir.ending.as_ref() else {
        return 0.0;
    };
    if !matches!(ending.style, EndingStyle::Fade | EndingStyle::Dissolve)
        || ending.fade_duration_sec <= 0.0
        || duration_sec <= 0.0
    {
        return 0.0;
    }
    let fade = ending.fade_duration_sec.min(duration_sec);
    clamp01((time - (duration_sec - fade)) / fade)
}

/// Compose the draw plan for one frame.
///
/// Order: background, temperature tint, lighting, grade, lyric text, closing fade. Pure in
/// `(scene, time, beat_intensity, opts)`.
#[tracing::instrument(level = "trace", skip(scene, opts))]
pub fn compose_frame(scene: &SceneContext, time: f64, beat_intensity: f64, opts: &ComposeOpts) -> FramePlan {
    let beat = clamp01(beat_intensity);
    let state = scene.state_at(time);
    let progress = state.progress;
    let mut plan = FramePlan::new(scene.canvas, opts.clear);

    let system = background_system_for_time(&state.background_system, progress);
    draw_background(&mut plan, system, &state, beat);
    draw_temperature_tint(&mut plan, progress);
    draw_lighting(&mut plan, &state.light_source, progress, beat);

    if opts.grade_pass {
        plan.push(DrawOp::Grade(GradePass {
            filter: build_grade_filter(&state.grade, state.intensity, beat),
            grain: state.grade.grain,
            vignette: state.grade.vignette,
            seed: grain_seed(time),
        }));
    }

    if let Some((idx, line)) = active_line(&scene.lines, time) {
        draw_line(&mut plan, scene, &state, idx, line, time, beat);
    }

    let fade = ending_fade_alpha(&scene.direction, time, scene.duration_sec);
    if fade > 0.0 {
        plan.fill_canvas(Rgb::BLACK, fade, BlendMode::Normal);
    }
    plan
}

fn draw_line(
    plan: &mut FramePlan,
    scene: &SceneContext,
    state: &FrameRenderState,
    idx: usize,
    line: &LyricLine,
    time: f64,
    beat: f64,
) {
    let line_alpha = line_opacity(line, time);
    if line_alpha <= 0.0 {
        return;
    }
    let transform_text = state.typography_profile.text_transform;
    let raw_words: Vec<&str> = line.text.split_whitespace().collect();
    let shown: Vec<String> = raw_words.iter().map(|w| transform_text.apply(w)).collect();
    let treatments: Vec<_> = raw_words.iter().map(|w| scene.words.get(w)).collect();

    let base = base_font_size(scene.canvas);
    let sized: Vec<(&str, f64)> = shown
        .iter()
        .zip(&treatments)
        .map(|(w, t)| (w.as_str(), emphasis_font_size(base, t.emphasis_level)))
        .collect();
    let boxes = layout_words(&sized, scene.canvas, state.grade.layout_mode, idx as u64);

    let storyboard = scene.direction.storyboard_for_line(idx);
    let active_mod = storyboard.and_then(|s| s.entry_style.as_deref());
    let hero = storyboard
        .and_then(|s| s.hero_word.as_deref())
        .map(normalize_word_key)
        .filter(|k| !k.is_empty());

    let base_color = scene
        .line_colors
        .get(idx)
        .map(String::as_str)
        .unwrap_or(LIGHT_TEXT);
    let is_hook = scene.hooks.get(idx).copied().unwrap_or(false);
    let colors = resolve_word_colors(&line.text, base_color, &state.palette, is_hook, active_mod);
    let colors = apply_beat_flash(&colors, beat);

    let shadow = get_text_shadow(&state.light_source, &state.palette, beat).to_spec();
    let speed = speed_multiplier(state.grade.motion_intent);
    let appearances = scene.appearances.get(idx);

    for ((wbox, treatment), raw) in boxes.iter().zip(&treatments).zip(&raw_words) {
        let i = wbox.index;
        let color = colors
            .get(i)
            .and_then(|c| Rgb::parse_hex(c))
            .unwrap_or(Rgb::WHITE);
        let fx = apply_kinetic(
            treatment.kinetic,
            &KineticInput {
                current_time: time,
                beat_intensity: beat,
                word_index: i,
                appearance_count: appearances.and_then(|a| a.get(i)).copied().unwrap_or(0),
                font_size: wbox.font_size,
                word_width: wbox.width,
                speed_multiplier: speed,
            },
        );
        let transform = fx.transform_about(wbox.center());
        let opacity = clamp01(line_alpha * fx.opacity);
        if opacity <= 0.0 {
            continue;
        }
        let word_op = |color: Rgb, opacity: f64, transform: Affine| TextOp {
            text: wbox.text.clone(),
            origin: wbox.origin,
            width: wbox.width,
            font_size: wbox.font_size,
            color,
            opacity,
            transform,
            shadow: None,
            glow: None,
        };

        let mut ghosts = fx.ghosts.clone();
        if treatment.ghost_trail && ghosts.is_empty() {
            for k in 1..=2 {
                let step = f64::from(k) * GHOST_SPACING_EM * wbox.font_size;
                ghosts.push(Ghost {
                    offset: (-step, 0.0).into(),
                    opacity: 0.35 / f64::from(k),
                });
            }
        }
        for g in ghosts.iter().rev() {
            plan.push(DrawOp::Text(word_op(
                color,
                opacity * g.opacity,
                Affine::translate(g.offset) * transform,
            )));
        }
        if let Some(split) = fx.channel_split {
            for (offset, tint) in channel_split_copies(split) {
                plan.push(DrawOp::Text(word_op(
                    tint,
                    opacity * 0.6,
                    Affine::translate(offset) * transform,
                )));
            }
        }

        let is_hero = hero.as_deref() == Some(normalize_word_key(raw).as_str());
        let glow = fx
            .glow
            .map(|g| GlowSpec {
                radius_px: g.radius_px,
                strength: g.strength,
                color,
            })
            .or_else(|| {
                is_hero.then_some(GlowSpec {
                    radius_px: 6.0 + 4.0 * beat,
                    strength: 0.45,
                    color,
                })
            });
        plan.push(DrawOp::Text(TextOp {
            shadow: Some(shadow),
            glow,
            ..word_op(color, opacity, transform)
        }));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compose.rs"]
mod tests;
