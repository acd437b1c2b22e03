use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::{
    audio::{
        beat::{BeatGrid, offline_beat_intensity},
        signature::SongSignature,
    },
    encode::sink::{FrameSink, SinkConfig},
    foundation::{
        core::{Canvas, FrameIndex},
        error::{LyricDanceError, LyricDanceResult},
        math::clamp01,
    },
    render::{
        backend::{BackendKind, DrawBackend, create_backend},
        compose::{ComposeOpts, SceneContext, compose_frame},
    },
    worker::protocol::{FrameUpdate, InitPayload, WorkerCommand, WorkerEvent},
};

/// Handle to the render thread.
///
/// The thread owns the backend and the sink it presents to. The main thread only sends
/// [`WorkerCommand`]s and reads [`WorkerEvent`]s; frame updates are latched and the newest one
/// wins when several arrive between draws.
pub struct RenderWorker {
    commands: Sender<WorkerCommand>,
    events: mpsc::Receiver<WorkerEvent>,
    handle: Option<JoinHandle<u64>>,
}

impl RenderWorker {
    /// Start the thread; it idles until [`WorkerCommand::Init`].
    pub fn spawn(sink: Box<dyn FrameSink>) -> LyricDanceResult<Self> {
        let (commands, rx) = mpsc::channel();
        let (events_tx, events) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("lyric-dance-render".to_owned())
            .spawn(move || {
                let mut state = LoopState {
                    sink,
                    events: events_tx,
                    running: None,
                    frames_drawn: 0,
                };
                state.run(rx)
            })
            .map_err(|e| LyricDanceError::render(format!("failed to spawn render worker: {e}")))?;
        Ok(Self {
            commands,
            events,
            handle: Some(handle),
        })
    }

    /// Send a raw command.
    pub fn send(&self, cmd: WorkerCommand) -> LyricDanceResult<()> {
        self.commands
            .send(cmd)
            .map_err(|_| LyricDanceError::render("render worker has stopped"))
    }

    /// Hand a song to the worker.
    pub fn init(&self, payload: InitPayload) -> LyricDanceResult<()> {
        self.send(WorkerCommand::Init(Box::new(payload)))
    }

    /// Latch a playback position.
    pub fn frame(&self, current_time: f64, beat_intensity: Option<f64>) -> LyricDanceResult<()> {
        self.send(WorkerCommand::Frame(FrameUpdate {
            current_time,
            beat_intensity,
        }))
    }

    /// Resize the surface.
    pub fn resize(&self, width: u32, height: u32) -> LyricDanceResult<()> {
        self.send(WorkerCommand::Resize { width, height })
    }

    /// Next event, if one is waiting.
    pub fn try_event(&self) -> Option<WorkerEvent> {
        self.events.try_recv().ok()
    }

    /// Next event, waiting up to `timeout`.
    pub fn wait_event(&self, timeout: Duration) -> Option<WorkerEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    /// Stop the loop and return how many frames it presented.
    pub fn shutdown(mut self) -> LyricDanceResult<u64> {
        self.stop()
    }

    fn stop(&mut self) -> LyricDanceResult<u64> {
        let Some(handle) = self.handle.take() else {
            return Ok(0);
        };
        let _ = self.commands.send(WorkerCommand::Shutdown);
        handle
            .join()
            .map_err(|_| LyricDanceError::render("render worker panicked"))
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

struct Running {
    scene: SceneContext,
    backend: Box<dyn DrawBackend>,
    compose: ComposeOpts,
    beat_grid: Option<BeatGrid>,
    signature: Option<SongSignature>,
    sink_cfg: SinkConfig,
    interval: Duration,
    latched: Option<FrameUpdate>,
    dirty: bool,
    last_draw: Option<Instant>,
    next_index: u64,
}

impl Running {
    /// Time left before the next draw may happen; `None` when there is nothing to draw.
    fn wait_budget(&self) -> Option<Duration> {
        if !self.dirty || self.latched.is_none() {
            return None;
        }
        Some(
            self.last_draw
                .map_or(Duration::ZERO, |t| self.interval.saturating_sub(t.elapsed())),
        )
    }
}

struct LoopState {
    sink: Box<dyn FrameSink>,
    events: Sender<WorkerEvent>,
    running: Option<Running>,
    frames_drawn: u64,
}

impl LoopState {
    fn run(&mut self, rx: mpsc::Receiver<WorkerCommand>) -> u64 {
        'outer: loop {
            let budget = self.running.as_ref().and_then(Running::wait_budget);
            let first = match budget {
                Some(d) => match rx.recv_timeout(d) {
                    Ok(cmd) => Some(cmd),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                },
                None => match rx.recv() {
                    Ok(cmd) => Some(cmd),
                    Err(_) => break,
                },
            };
            for cmd in first.into_iter().chain(std::iter::from_fn(|| rx.try_recv().ok())) {
                if !self.apply(cmd) {
                    break 'outer;
                }
            }
            if self.running.as_ref().and_then(Running::wait_budget) == Some(Duration::ZERO) {
                self.draw();
            }
        }
        self.teardown();
        self.emit(WorkerEvent::Stopped {
            frames_drawn: self.frames_drawn,
        });
        self.frames_drawn
    }

    fn emit(&self, event: WorkerEvent) {
        let _ = self.events.send(event);
    }

    /// Returns `false` on shutdown.
    fn apply(&mut self, cmd: WorkerCommand) -> bool {
        match cmd {
            WorkerCommand::Init(payload) => self.init(*payload),
            WorkerCommand::Frame(update) => match self.running.as_mut() {
                Some(r) => {
                    r.latched = Some(update);
                    r.dirty = true;
                }
                None => tracing::debug!("frame update before init ignored"),
            },
            WorkerCommand::Resize { width, height } => self.resize(width, height),
            WorkerCommand::Shutdown => return false,
        }
        true
    }

    fn init(&mut self, payload: InitPayload) {
        self.teardown();
        let InitPayload {
            canvas,
            direction,
            lines,
            beat_grid,
            song_signature,
            total_duration,
            settings,
            compose,
            fps,
        } = payload;

        let backend = match create_backend(BackendKind::Cpu, &settings) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = %e, "render worker could not acquire a drawing context");
                self.emit(WorkerEvent::error(e));
                return;
            }
        };
        let sink_cfg = SinkConfig {
            canvas,
            fps,
            audio_path: None,
        };
        if let Err(e) = self.sink.begin(sink_cfg.clone()) {
            self.emit(WorkerEvent::error(e));
            return;
        }

        let scene = SceneContext::new(canvas, direction, lines, total_duration);
        tracing::debug!(
            width = canvas.width,
            height = canvas.height,
            lines = scene.lines().len(),
            chapters = scene.boundaries().chapters.len(),
            "render worker initialized"
        );
        self.running = Some(Running {
            scene,
            backend,
            compose,
            beat_grid,
            signature: song_signature,
            sink_cfg,
            interval: Duration::from_secs_f64(1.0 / fps.as_f64()),
            latched: None,
            dirty: false,
            last_draw: None,
            next_index: 0,
        });
        self.emit(WorkerEvent::Ready);
    }

    fn resize(&mut self, width: u32, height: u32) {
        let canvas = match Canvas::new(width, height) {
            Ok(c) => c,
            Err(e) => {
                self.emit(WorkerEvent::error(e));
                return;
            }
        };
        let Some(running) = self.running.as_mut() else {
            self.emit(WorkerEvent::error("resize before init"));
            return;
        };
        running.scene.set_canvas(canvas);
        running.sink_cfg.canvas = canvas;
        running.next_index = 0;
        running.dirty = true;
        let restarted = self
            .sink
            .end()
            .and_then(|()| self.sink.begin(running.sink_cfg.clone()));
        tracing::debug!(width, height, "render worker resized");
        match restarted {
            Ok(()) => self.emit(WorkerEvent::Resized { width, height }),
            Err(e) => self.emit(WorkerEvent::error(e)),
        }
    }

    fn draw(&mut self) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        let Some(update) = running.latched else {
            return;
        };
        running.dirty = false;
        running.last_draw = Some(Instant::now());

        let t = update.current_time;
        let beat = update.beat_intensity.map(clamp01).unwrap_or_else(|| {
            offline_beat_intensity(running.beat_grid.as_ref(), running.signature.as_ref(), t)
        });
        let plan = compose_frame(&running.scene, t, beat, &running.compose);
        let presented = running.backend.render_plan(&plan).and_then(|frame| {
            self.sink
                .push_frame(FrameIndex(running.next_index), &frame)
        });
        match presented {
            Ok(()) => {
                running.next_index += 1;
                self.frames_drawn += 1;
            }
            Err(e) => {
                tracing::warn!(error = %e, time = t, "frame dropped");
                self.emit(WorkerEvent::error(e));
            }
        }
    }

    fn teardown(&mut self) {
        if self.running.take().is_some() {
            if let Err(e) = self.sink.end() {
                self.emit(WorkerEvent::error(e));
            }
            tracing::debug!(frames = self.frames_drawn, "render worker released its surface");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/worker/render_worker.rs"]
mod tests;
