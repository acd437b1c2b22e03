//! Frame-state derivation: (direction, time) to a dense, fully defaulted render state.

/// Frame render state, derivation, and tolerant manifest merging.
pub mod frame;
