//! Cinematic direction: the canonical model, keyword tables, and the schema normalizer.
//!
//! Raw direction documents arrive in one of two shapes. [`normalize::normalize_direction`] is the
//! single adapter between them; nothing downstream inspects the raw shape.

/// Canonical direction types.
pub mod model;
/// Schema detection and normalization.
pub mod normalize;
/// Keyword lookup tables and arc templates.
pub mod tables;
