//! Per-word motion by kinetic class.
//!
//! Each class maps to one strategy function. Effects are pure functions of [`KineticInput`]; the
//! only per-word memory is `appearance_count`, which callers track themselves.

use smallvec::SmallVec;
use std::f64::consts::TAU;

use crate::foundation::{
    core::{Affine, Point, Vec2},
    math::{clamp01, keyed_rng},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
/// Symbolic motion tag of a word.
pub enum KineticClass {
    /// Drops downward in cycles (`FALLING`, `SINKING`).
    Falling,
    /// Runs sideways with a stretch and trailing copies.
    Running,
    /// Bobs gently (`FLOATING`, `DRIFTING`).
    Floating,
    /// Sways under water: dimmer, slower.
    Submerging,
    /// Breathes outward with a wide glow.
    Enveloping,
    /// Beat-scaled jitter with a glitch split.
    Shaking,
    /// Climbs upward in cycles.
    Rising,
    /// Fades away more each time it appears.
    Hiding,
    /// Held still, slightly emphasized on beats.
    Static,
    /// No effect.
    #[default]
    None,
}

impl KineticClass {
    /// Parse a tag (case-insensitive); unknown or missing tags resolve to [`KineticClass::None`].
    pub fn from_tag(tag: Option<&str>) -> Self {
        let Some(tag) = tag else {
            return Self::None;
        };
        match tag.trim().to_ascii_uppercase().as_str() {
            "FALLING" | "SINKING" => Self::Falling,
            "RUNNING" => Self::Running,
            "FLOATING" | "DRIFTING" => Self::Floating,
            "SUBMERGING" => Self::Submerging,
            "ENVELOPING" => Self::Enveloping,
            "SHAKING" => Self::Shaking,
            "RISING" => Self::Rising,
            "HIDING" => Self::Hiding,
            "STATIC" => Self::Static,
            _ => Self::None,
        }
    }

    fn strategy(self) -> Strategy {
        match self {
            Self::Falling => falling,
            Self::Running => running,
            Self::Floating => floating,
            Self::Submerging => submerging,
            Self::Enveloping => enveloping,
            Self::Shaking => shaking,
            Self::Rising => rising,
            Self::Hiding => hiding,
            Self::Static => still,
            Self::None => identity,
        }
    }
}

type Strategy = fn(&KineticInput) -> KineticEffect;

#[derive(Clone, Copy, Debug, PartialEq)]
/// Everything a kinetic effect may depend on.
pub struct KineticInput {
    /// Playback time in seconds.
    pub current_time: f64,
    /// Smoothed beat intensity in `[0, 1]`.
    pub beat_intensity: f64,
    /// Index of the word within its line.
    pub word_index: usize,
    /// How many times this word has appeared before.
    pub appearance_count: u32,
    /// Font size in pixels.
    pub font_size: f64,
    /// Laid-out word width in pixels.
    pub word_width: f64,
    /// Global motion speed multiplier.
    pub speed_multiplier: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// A translucent trailing copy.
pub struct Ghost {
    /// Offset from the word.
    pub offset: Vec2,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// Glow parameters requested by an effect.
pub struct KineticGlow {
    /// Radius in pixels.
    pub radius_px: f64,
    /// Strength in `[0, 1]`.
    pub strength: f64,
}

#[derive(Clone, Debug, PartialEq)]
/// Resolved motion for one word at one instant.
pub struct KineticEffect {
    /// Positional offset in pixels.
    pub offset: Vec2,
    /// Non-uniform scale about the word center.
    pub scale: Vec2,
    /// Rotation in radians about the word center.
    pub rotation: f64,
    /// Opacity multiplier in `[0, 1]`.
    pub opacity: f64,
    /// Trailing copies, nearest first.
    pub ghosts: SmallVec<[Ghost; 3]>,
    /// Optional halo.
    pub glow: Option<KineticGlow>,
    /// Red/blue split distance in pixels.
    pub channel_split: Option<f64>,
}

impl Default for KineticEffect {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: Vec2::new(1.0, 1.0),
            rotation: 0.0,
            opacity: 1.0,
            ghosts: SmallVec::new(),
            glow: None,
            channel_split: None,
        }
    }
}

impl KineticEffect {
    /// Canvas transform for a word whose unmodified box is centered at `center`.
    pub fn transform_about(&self, center: Point) -> Affine {
        Affine::translate(self.offset + center.to_vec2())
            * Affine::rotate(self.rotation)
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
            * Affine::translate(-center.to_vec2())
    }
}

/// Apply the effect for `class`.
pub fn apply_kinetic(class: KineticClass, input: &KineticInput) -> KineticEffect {
    (class.strategy())(input)
}

fn phase(input: &KineticInput, rate: f64) -> f64 {
    input.current_time * input.speed_multiplier.max(0.0) * rate + input.word_index as f64 * 0.7
}

fn cycle(input: &KineticInput, rate: f64) -> f64 {
    (input.current_time * input.speed_multiplier.max(0.0) * rate
        + input.word_index as f64 * 0.17)
        .rem_euclid(1.0)
}

fn identity(_: &KineticInput) -> KineticEffect {
    KineticEffect::default()
}

fn still(input: &KineticInput) -> KineticEffect {
    let s = 1.0 + 0.04 * clamp01(input.beat_intensity);
    KineticEffect {
        scale: Vec2::new(s, s),
        ..KineticEffect::default()
    }
}

fn falling(input: &KineticInput) -> KineticEffect {
    let c = cycle(input, 0.6);
    let drop = input.font_size * 0.8;
    let ghosts = (1..=input.appearance_count.clamp(1, 3))
        .map(|k| Ghost {
            offset: Vec2::new(0.0, -(k as f64) * input.font_size * 0.25),
            opacity: 0.35 / k as f64,
        })
        .collect();
    KineticEffect {
        offset: Vec2::new(0.0, c * drop),
        opacity: 1.0 - 0.4 * c,
        ghosts,
        ..KineticEffect::default()
    }
}

fn running(input: &KineticInput) -> KineticEffect {
    let sway = phase(input, 6.0).sin() * input.font_size * 0.15;
    let spacing = input.word_width.max(input.font_size) * 0.08;
    let ghosts = [0.3, 0.2, 0.1]
        .iter()
        .enumerate()
        .map(|(k, &opacity)| Ghost {
            offset: Vec2::new(-spacing * (k + 1) as f64, 0.0),
            opacity,
        })
        .collect();
    KineticEffect {
        offset: Vec2::new(sway, 0.0),
        scale: Vec2::new(1.12, 0.94),
        ghosts,
        ..KineticEffect::default()
    }
}

fn floating(input: &KineticInput) -> KineticEffect {
    let p = phase(input, 1.5);
    KineticEffect {
        offset: Vec2::new(
            p.cos() * input.font_size * 0.08,
            p.sin() * input.font_size * 0.18,
        ),
        rotation: p.sin() * 0.04,
        glow: Some(KineticGlow {
            radius_px: input.font_size * 0.2,
            strength: 0.25,
        }),
        ..KineticEffect::default()
    }
}

fn submerging(input: &KineticInput) -> KineticEffect {
    let p = phase(input, 0.8);
    KineticEffect {
        offset: Vec2::new(
            (p * 0.5).sin() * input.font_size * 0.06,
            p.sin() * input.font_size * 0.15,
        ),
        scale: Vec2::new(0.96, 0.96),
        opacity: 0.55 + 0.25 * p.sin(),
        glow: Some(KineticGlow {
            radius_px: input.font_size * 0.3,
            strength: 0.2,
        }),
        ..KineticEffect::default()
    }
}

fn enveloping(input: &KineticInput) -> KineticEffect {
    let s = 1.0 + 0.08 * phase(input, 2.0).sin() + 0.1 * clamp01(input.beat_intensity);
    KineticEffect {
        scale: Vec2::new(s, s),
        glow: Some(KineticGlow {
            radius_px: input.font_size * 0.4,
            strength: 0.5,
        }),
        ..KineticEffect::default()
    }
}

fn shaking(input: &KineticInput) -> KineticEffect {
    let beat = clamp01(input.beat_intensity);
    let tick = (input.current_time * 30.0).floor().max(0.0) as u64;
    let mut rng = keyed_rng(&[input.word_index as u64, tick]);
    let magnitude = 2.0 + 6.0 * beat;
    KineticEffect {
        offset: Vec2::new(rng.next_signed() * magnitude, rng.next_signed() * magnitude),
        rotation: rng.next_signed() * 0.03 * beat,
        channel_split: (beat > 0.5).then(|| 2.0 + 4.0 * beat),
        ..KineticEffect::default()
    }
}

fn rising(input: &KineticInput) -> KineticEffect {
    let c = cycle(input, 0.5);
    let s = 1.0 + 0.05 * clamp01(input.beat_intensity);
    let ghosts = (1..=2)
        .map(|k| Ghost {
            offset: Vec2::new(0.0, f64::from(k) * input.font_size * 0.2),
            opacity: 0.3 / f64::from(k),
        })
        .collect();
    KineticEffect {
        offset: Vec2::new(0.0, -c * input.font_size * 0.6),
        scale: Vec2::new(s, s),
        ghosts,
        ..KineticEffect::default()
    }
}

fn hiding(input: &KineticInput) -> KineticEffect {
    let wave = 0.5 + 0.5 * (phase(input, 1.2) * TAU / 6.0).sin();
    let fade = 0.85f64.powi(input.appearance_count.min(16) as i32);
    KineticEffect {
        opacity: ((0.25 + 0.35 * wave) * fade).max(0.15),
        scale: Vec2::new(0.92, 0.92),
        ..KineticEffect::default()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/kinetic.rs"]
mod tests;
