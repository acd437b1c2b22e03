//! Per-frame composition pieces: word colors, kinetic motion, lighting and layout.
//!
//! These are pure functions of their inputs; `render::compose` strings them together into a
//! [`FramePlan`](crate::render::plan::FramePlan).

/// Word colors, contrast rhythm, beat flash and temperature tint.
pub mod color;
/// Kinetic class dispatch.
pub mod kinetic;
/// Line lookup, hook detection and word placement.
pub mod layout;
/// Background phases, light overlays and text shadows.
pub mod lighting;
