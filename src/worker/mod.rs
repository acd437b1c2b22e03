//! The off-thread render loop and what it precomputes.
//!
//! The main thread owns playback timing and only sends messages; the worker owns the drawing
//! backend and the sink it presents to.

/// Chapter/stage boundaries in absolute time and the word-directive lookup.
pub mod boundaries;
/// Typed command and event messages.
pub mod protocol;
/// The receive-latch-draw thread.
pub mod render_worker;
