use std::io::{Read as _, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::encode::sink::{FrameSink, SinkConfig, check_order, check_size, flatten_premul_over_bg};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{LyricDanceError, LyricDanceResult};
use crate::render::backend::FrameRGBA;

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output MP4 path.
    pub out_path: PathBuf,
    /// Replace an existing file.
    pub overwrite: bool,
    /// Background that alpha is flattened over (straight RGBA8).
    pub bg_rgba: [u8; 4],
}

impl FfmpegSinkOpts {
    /// Defaults for writing `out_path`: overwrite, black background.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// Streams raw RGBA frames into a system `ffmpeg` producing H.264 MP4, with the song muxed in
/// when [`SinkConfig::audio_path`] is set.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    /// Sink that spawns `ffmpeg` on `begin`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }

    fn command(&self, cfg: &SinkConfig) -> Command {
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .arg(if self.opts.overwrite { "-y" } else { "-n" })
            .args(["-loglevel", "error", "-f", "rawvideo", "-pix_fmt", "rgba"])
            .args(["-s", &format!("{}x{}", cfg.canvas.width, cfg.canvas.height)])
            .args(["-r", &format!("{}/{}", cfg.fps.num, cfg.fps.den)])
            .args(["-i", "pipe:0"]);
        match cfg.audio_path.as_ref() {
            Some(audio) => {
                cmd.arg("-i")
                    .arg(audio)
                    .args(["-map", "0:v:0", "-map", "1:a:0", "-c:a", "aac", "-shortest"]);
            }
            None => {
                cmd.arg("-an");
            }
        }
        cmd.args([
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&self.opts.out_path);
        cmd
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> LyricDanceResult<()> {
        if !cfg.canvas.width.is_multiple_of(2) || !cfg.canvas.height.is_multiple_of(2) {
            return Err(LyricDanceError::validation(
                "mp4 output needs an even width and height (yuv420p)",
            ));
        }
        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(LyricDanceError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(LyricDanceError::render(
                "ffmpeg is required for MP4 export, but was not found on PATH",
            ));
        }

        let mut child = self
            .command(&cfg)
            .spawn()
            .map_err(|e| LyricDanceError::render(format!("failed to spawn ffmpeg: {e}")))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| LyricDanceError::render("failed to open ffmpeg stdin"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| LyricDanceError::render("failed to open ffmpeg stderr"))?;
        let drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });
        tracing::debug!(out = %self.opts.out_path.display(), "ffmpeg started");

        self.scratch = vec![0; cfg.canvas.byte_len()];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> LyricDanceResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| LyricDanceError::render("ffmpeg sink not started"))?;
        check_order(self.last_idx, idx)?;
        check_size(cfg.canvas, frame)?;
        self.last_idx = Some(idx);

        flatten_premul_over_bg(&mut self.scratch, &frame.data, self.opts.bg_rgba)?;
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| LyricDanceError::render("ffmpeg sink is already finalized"))?;
        stdin
            .write_all(&self.scratch)
            .map_err(|e| LyricDanceError::render(format!("failed to write frame to ffmpeg: {e}")))
    }

    fn end(&mut self) -> LyricDanceResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| LyricDanceError::render("ffmpeg sink not started"))?;
        let status = child
            .wait()
            .map_err(|e| LyricDanceError::render(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| LyricDanceError::render("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| LyricDanceError::render(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        self.cfg = None;
        if !status.success() {
            return Err(LyricDanceError::render(format!(
                "ffmpeg exited with status {status}: {}",
                String::from_utf8_lossy(&stderr).trim()
            )));
        }
        Ok(())
    }
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> LyricDanceResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Whether `ffmpeg -version` runs.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
