//! Frame sinks for offline export.
//!
//! Sinks receive rendered frames in strictly increasing frame order from
//! [`export_song`](crate::session::export::export_song) or from the render worker.

/// System `ffmpeg` MP4 sink.
pub mod ffmpeg;
/// The sink trait plus in-memory, channel and PNG-sequence sinks.
pub mod sink;
