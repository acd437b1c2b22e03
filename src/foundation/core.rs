use crate::foundation::error::{LyricDanceError, LyricDanceResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Zero-based frame number of an export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct FrameIndex(pub u64);

/// Half-open frame range `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRange {
    /// First frame.
    pub start: FrameIndex,
    /// One past the last frame.
    pub end: FrameIndex,
}

impl FrameRange {
    /// Validated range; `start` must not exceed `end`.
    pub fn new(start: FrameIndex, end: FrameIndex) -> LyricDanceResult<Self> {
        if start.0 > end.0 {
            return Err(LyricDanceError::validation("FrameRange start must be <= end"));
        }
        Ok(Self { start, end })
    }

    /// Number of frames.
    pub fn len_frames(self) -> u64 {
        self.end.0 - self.start.0
    }

    /// Whether the range holds no frames.
    pub fn is_empty(self) -> bool {
        self.start.0 == self.end.0
    }

    /// Intersection with `[0, total)`.
    pub fn clamp_to(self, total: u64) -> Self {
        let end = self.end.0.min(total);
        Self {
            start: FrameIndex(self.start.0.min(end)),
            end: FrameIndex(end),
        }
    }
}

/// Frames per second as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Frames.
    pub num: u32,
    /// Seconds, non-zero.
    pub den: u32,
}

impl Fps {
    /// Validated rate; both parts must be non-zero.
    pub fn new(num: u32, den: u32) -> LyricDanceResult<Self> {
        if den == 0 {
            return Err(LyricDanceError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(LyricDanceError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Rate as a float.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Song time of frame `idx` in seconds.
    pub fn frame_time_secs(self, idx: FrameIndex) -> f64 {
        idx.0 as f64 * f64::from(self.den) / f64::from(self.num)
    }

    /// Frames needed to cover `secs` (ceiling, at least one for positive durations).
    pub fn frames_for_secs(self, secs: f64) -> u64 {
        if secs.is_nan() || secs <= 0.0 {
            return 0;
        }
        (secs * self.as_f64()).ceil() as u64
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self { num: 30, den: 1 }
    }
}

/// Output surface dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Validated canvas; both sides non-zero and at most `u16::MAX`.
    pub fn new(width: u32, height: u32) -> LyricDanceResult<Self> {
        if width == 0 || height == 0 {
            return Err(LyricDanceError::validation(
                "canvas width/height must be non-zero",
            ));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(LyricDanceError::validation(
                "canvas width/height must fit in u16",
            ));
        }
        Ok(Self { width, height })
    }

    /// Center point.
    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    /// Full-canvas rectangle.
    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// Byte length of an RGBA8 frame.
    pub fn byte_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

/// Straight (non-premultiplied) sRGB color parsed from `#rgb` / `#rrggbb` / `#rrggbbaa` hex.
///
/// Alpha in 8-digit hex is accepted and ignored; alpha is carried separately by draw ops.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Rgb {
    /// `#ffffff`.
    pub const WHITE: Self = Self::new(255, 255, 255);
    /// `#000000`.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Color from channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse hex with or without `#`; `None` for anything malformed.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);
        if !s.is_ascii() {
            return None;
        }
        let byte = |pair: &str| u8::from_str_radix(pair, 16).ok();
        match s.len() {
            3 => {
                let nib = |i: usize| byte(&s[i..i + 1]).map(|v| v * 17);
                Some(Self::new(nib(0)?, nib(1)?, nib(2)?))
            }
            6 | 8 => Some(Self::new(byte(&s[0..2])?, byte(&s[2..4])?, byte(&s[4..6])?)),
            _ => None,
        }
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Move each channel toward `other` by `amount` in `[0, 1]`.
    pub fn mix(self, other: Self, amount: f64) -> Self {
        let t = amount.clamp(0.0, 1.0);
        let ch = |a: u8, b: u8| -> u8 {
            let a = f64::from(a);
            let b = f64::from(b);
            (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
        };
        Self::new(ch(self.r, other.r), ch(self.g, other.g), ch(self.b, other.b))
    }

    /// Perceived brightness in `[0, 1]` (Rec. 709 luma weights).
    pub fn perceived_brightness(self) -> f64 {
        (0.2126 * f64::from(self.r) + 0.7152 * f64::from(self.g) + 0.0722 * f64::from(self.b))
            / 255.0
    }

    /// Premultiply with `alpha` in `[0, 1]`.
    pub fn to_rgba8_premul(self, alpha: f64) -> Rgba8Premul {
        let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgba8Premul::from_straight_rgba(self.r, self.g, self.b, a)
    }
}

impl serde::Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Rgb {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hex color \"{s}\"")))
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Premultiply straight RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
