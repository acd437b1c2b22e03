//! Song-scoped state: the analysis store and offline export.

/// Whole-song and single-frame rendering into sinks.
pub mod export;
/// Explicitly owned signature cache.
pub mod store;
