use crate::{
    audio::{beat::BeatGrid, signature::SongSignature},
    compose::layout::LyricLine,
    direction::model::CinematicDirection,
    foundation::core::{Canvas, Fps},
    render::{backend::RenderSettings, compose::ComposeOpts},
};

/// Everything the render worker needs to start drawing a song.
#[derive(Clone, Debug)]
pub struct InitPayload {
    /// Surface size.
    pub canvas: Canvas,
    /// Normalized direction.
    pub direction: CinematicDirection,
    /// Lyric lines.
    pub lines: Vec<LyricLine>,
    /// Beat grid, used for intensity when a frame update carries none.
    pub beat_grid: Option<BeatGrid>,
    /// Offline signature, blended into the fallback intensity.
    pub song_signature: Option<SongSignature>,
    /// Song length in seconds.
    pub total_duration: f64,
    /// Backend settings (font).
    pub settings: RenderSettings,
    /// Composition knobs.
    pub compose: ComposeOpts,
    /// Rate at which latched state is checked and drawn.
    pub fps: Fps,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Latest playback position from the main thread.
pub struct FrameUpdate {
    /// Playback position in seconds.
    pub current_time: f64,
    /// Live beat intensity; `None` falls back to the beat grid and signature.
    #[serde(default)]
    pub beat_intensity: Option<f64>,
}

/// Main thread to worker.
#[derive(Clone, Debug)]
pub enum WorkerCommand {
    /// Take ownership of a song and start the draw loop.
    Init(Box<InitPayload>),
    /// Latch a new playback position. Nothing is computed on receipt.
    Frame(FrameUpdate),
    /// Change the surface size.
    Resize {
        /// New width in pixels.
        width: u32,
        /// New height in pixels.
        height: u32,
    },
    /// Stop the loop and release the surface.
    Shutdown,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
/// Worker to main thread.
pub enum WorkerEvent {
    /// Init finished; frames will follow once a position is latched.
    Ready,
    /// A resize was applied.
    Resized {
        /// Surface width.
        width: u32,
        /// Surface height.
        height: u32,
    },
    /// Something failed inside the worker. The loop keeps running when it can.
    Error {
        /// Human-readable cause.
        message: String,
    },
    /// The loop exited.
    Stopped {
        /// Frames presented over the worker's life.
        #[serde(rename = "framesDrawn")]
        frames_drawn: u64,
    },
}

impl WorkerEvent {
    /// Error event from anything displayable.
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self::Error {
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/worker/protocol.rs"]
mod tests;
