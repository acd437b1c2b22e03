//! Frame plans and the CPU raster backend.
//!
//! `compose` turns a song position into a [`plan::FramePlan`]; `backend` executes plans into
//! premultiplied RGBA frames.

/// Backend trait, settings and the frame type.
pub mod backend;
/// Per-frame plan composition.
pub mod compose;
/// `vello_cpu` backend.
pub mod cpu;
/// Draw op vocabulary.
pub mod plan;
/// Parley text layout.
pub mod text;
