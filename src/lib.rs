//! Lyric-dance renders synced lyric videos from a cinematic direction.
//!
//! The pipeline is a chain of pure derivations with I/O only at the edges:
//!
//! - Load a raw direction with [`CinematicDirection::load`] (either schema)
//! - Derive a [`FrameRenderState`] for any song position
//! - Compose a [`FramePlan`] per frame and execute it on a [`DrawBackend`]
//! - Present frames through the [`RenderWorker`] or export a whole song into a [`FrameSink`]
//!
//! Audio analysis ([`compute_signature`], [`LiveBeatEstimator`]) feeds beat intensity into the
//! composer.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Beat estimation, signature analysis and decoding.
pub mod audio;
/// Per-frame composition pieces.
pub mod compose;
/// Direction model and normalizer.
pub mod direction;
/// Frame sinks.
pub mod encode;
/// Shared primitives and the error taxonomy.
pub mod foundation;
/// Mood grades.
pub mod grade;
/// Plans, composition and the CPU backend.
pub mod render;
/// Analysis store and offline export.
pub mod session;
/// Frame-state derivation.
pub mod state;
/// Render worker and its protocol.
pub mod worker;

pub use crate::audio::beat::{BeatGrid, FrequencyAnalyser, LiveBeatEstimator};
pub use crate::audio::signature::{
    SignatureInput, SignatureOpts, SongSignature, compute_beat_interval_variance,
    compute_signature, spawn_signature_worker,
};
pub use crate::compose::layout::LyricLine;
pub use crate::direction::model::CinematicDirection;
pub use crate::direction::normalize::{DirectionSchema, detect_schema, normalize_direction};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{ChannelSink, FrameSink, InMemorySink, PngSequenceSink, SinkConfig};
pub use crate::foundation::core::{Canvas, Fps, FrameIndex, FrameRange, Rgb};
pub use crate::foundation::error::{LyricDanceError, LyricDanceResult};
pub use crate::grade::mood::{MoodGrade, get_mood_grade};
pub use crate::render::backend::{BackendKind, DrawBackend, FrameRGBA, RenderSettings, create_backend};
pub use crate::render::compose::{ComposeOpts, SceneContext, compose_frame};
pub use crate::render::plan::FramePlan;
pub use crate::session::export::{ExportOpts, RenderOpts, RenderStats, SongSession, export_song};
pub use crate::session::store::AnalysisStore;
pub use crate::state::frame::{FrameRenderState, TimePosition, derive_frame_state};
pub use crate::worker::protocol::{FrameUpdate, InitPayload, WorkerCommand, WorkerEvent};
pub use crate::worker::render_worker::RenderWorker;
