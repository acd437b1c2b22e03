//! Mood-based grading: keyword recipes, filter construction, and grade interpolation.

/// Mood grade table and helpers.
pub mod mood;
