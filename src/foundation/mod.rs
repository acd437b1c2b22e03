//! Shared primitives: canvas/color types, the error taxonomy, and small deterministic math helpers.

pub mod core;
pub mod error;
pub(crate) mod math;
