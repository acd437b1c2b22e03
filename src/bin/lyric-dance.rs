use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use lyric_dance::{
    AnalysisStore, BeatGrid, CinematicDirection, ExportOpts, FfmpegSink, FfmpegSinkOpts, Fps,
    FrameIndex, FrameSink, LyricLine, PngSequenceSink, RenderOpts, SignatureInput, SignatureOpts,
    SongSession, SongSignature, compute_signature, export_song, normalize_direction,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lyric-dance", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a direction document in canonical form.
    Normalize(NormalizeArgs),
    /// Compute the song signature of an audio file (requires `media-ffmpeg`).
    Analyze(AnalyzeArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render the whole song to MP4 (requires `ffmpeg` on PATH) or a PNG sequence.
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct NormalizeArgs {
    /// Input direction JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Audio file to decode.
    #[arg(long)]
    audio: PathBuf,

    /// Beat grid JSON (`{bpm, beats, confidence}`).
    #[arg(long)]
    beats: Option<PathBuf>,

    /// Lyric lines JSON (`[{start, end, text}]`), for lyric density.
    #[arg(long)]
    lyrics: Option<PathBuf>,

    /// Output path; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SongArgs {
    /// Direction JSON (either schema).
    #[arg(long)]
    direction: PathBuf,

    /// Lyric lines JSON (`[{start, end, text}]`).
    #[arg(long)]
    lyrics: PathBuf,

    /// Beat grid JSON.
    #[arg(long)]
    beats: Option<PathBuf>,

    /// Song audio; muxed into MP4 output and analysed for the energy curve with `media-ffmpeg`.
    #[arg(long)]
    audio: Option<PathBuf>,

    /// Song length in seconds; derived from the audio or the last lyric when omitted.
    #[arg(long)]
    duration: Option<f64>,

    /// Output width.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Output height.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Frames per second.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Font file for lyrics (defaults to `$LYRIC_DANCE_FONT`).
    #[arg(long)]
    font: Option<PathBuf>,

    /// Skip the mood grade pass.
    #[arg(long)]
    no_grade: bool,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    song: SongArgs,

    /// Song position in seconds.
    #[arg(long)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    song: SongArgs,

    /// Output MP4 path, or a directory with `--png-seq`.
    #[arg(long)]
    out: PathBuf,

    /// Write numbered PNGs instead of an MP4.
    #[arg(long)]
    png_seq: bool,

    /// Render on a single thread.
    #[arg(long)]
    sequential: bool,

    /// Worker threads for parallel rendering.
    #[arg(long)]
    threads: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Normalize(args) => cmd_normalize(args),
        Command::Analyze(args) => cmd_analyze(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let f = File::open(path).with_context(|| format!("open {what} '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse {what} JSON '{}'", path.display()))
}

fn write_output(out: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            lyric_dance::encode::ffmpeg::ensure_parent_dir(path)?;
            std::fs::write(path, text).with_context(|| format!("write '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn cmd_normalize(args: NormalizeArgs) -> anyhow::Result<()> {
    let raw: serde_json::Value = read_json(&args.in_path, "direction")?;
    let normalized = normalize_direction(&raw).context("direction must be a JSON object")?;
    let text = serde_json::to_string_pretty(normalized.as_ref())?;
    write_output(args.out.as_deref(), &text)
}

fn analyze_audio(
    audio: &Path,
    beat_grid: Option<BeatGrid>,
    lyrics: Option<Vec<LyricLine>>,
) -> anyhow::Result<SongSignature> {
    let pcm = lyric_dance::audio::decode::decode_mono_f32(
        audio,
        lyric_dance::audio::decode::ANALYSIS_SAMPLE_RATE,
    )
    .with_context(|| format!("decode audio '{}'", audio.display()))?;
    let input = SignatureInput {
        duration_sec: Some(pcm.duration_sec()),
        mono: pcm.samples,
        sample_rate: pcm.sample_rate,
        beat_grid,
        lyrics,
    };
    Ok(compute_signature(&input, &SignatureOpts::from_env())?)
}

fn cmd_analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let beat_grid = args
        .beats
        .as_deref()
        .map(|p| read_json::<BeatGrid>(p, "beat grid"))
        .transpose()?;
    let lyrics = args
        .lyrics
        .as_deref()
        .map(|p| read_json::<Vec<LyricLine>>(p, "lyrics"))
        .transpose()?;
    let sig = analyze_audio(&args.audio, beat_grid, lyrics)?;
    write_output(args.out.as_deref(), &serde_json::to_string_pretty(&sig)?)
}

fn build_session(args: &SongArgs) -> anyhow::Result<SongSession> {
    let raw: serde_json::Value = read_json(&args.direction, "direction")?;
    let direction = CinematicDirection::load(&raw)?;
    let lines: Vec<LyricLine> = read_json(&args.lyrics, "lyrics")?;
    let beat_grid = args
        .beats
        .as_deref()
        .map(|p| read_json::<BeatGrid>(p, "beat grid"))
        .transpose()?;

    let mut store = AnalysisStore::default();
    let signature = match args.audio.as_deref() {
        Some(audio) => {
            let key = audio.to_string_lossy().into_owned();
            let analysed = store.get_or_compute(&key, || {
                analyze_audio(audio, beat_grid.clone(), Some(lines.clone()))
                    .map_err(lyric_dance::LyricDanceError::from)
            });
            match analysed {
                Ok(sig) => Some(sig),
                Err(e) => {
                    tracing::warn!(error = %e, "audio analysis unavailable; using the beat grid only");
                    None
                }
            }
        }
        None => None,
    };

    let duration = args
        .duration
        .or_else(|| signature.as_ref().map(|s| s.duration_sec))
        .or_else(|| lines.iter().map(|l| l.end).reduce(f64::max).map(|end| end + 2.0))
        .context("song duration unknown: pass --duration, --audio, or non-empty lyrics")?;

    let mut opts = RenderOpts::from_env();
    opts.width = args.width;
    opts.height = args.height;
    opts.fps = Fps::new(args.fps, 1)?;
    opts.grade_pass = !args.no_grade;
    if let Some(font) = args.font.clone() {
        opts.font_path = Some(font);
    }
    if opts.font_path.is_none() {
        tracing::warn!("no font configured; lyrics will not be drawn");
    }

    let mut session = SongSession::new(direction, lines, duration, &opts)?;
    if let Some(grid) = beat_grid {
        session = session.with_beat_grid(grid);
    }
    if let Some(sig) = signature {
        session = session.with_signature(sig);
    }
    if let Some(audio) = args.audio.clone() {
        session = session.with_audio(audio);
    }
    Ok(session)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let session = build_session(&args.song)?;
    let idx = FrameIndex((args.time.max(0.0) * session.fps().as_f64()).floor() as u64);
    let frame = session.render_frame(idx)?;

    lyric_dance::encode::ffmpeg::ensure_parent_dir(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let session = build_session(&args.song)?;
    let bg = [0, 0, 0, 255];
    let mut sink: Box<dyn FrameSink> = if args.png_seq {
        Box::new(PngSequenceSink::new(&args.out, bg))
    } else {
        let mut opts = FfmpegSinkOpts::new(&args.out);
        opts.bg_rgba = bg;
        Box::new(FfmpegSink::new(opts))
    };
    let opts = ExportOpts {
        parallel: !args.sequential,
        threads: args.threads,
        ..ExportOpts::default()
    };
    let stats = export_song(&session, &opts, sink.as_mut())?;

    eprintln!(
        "wrote {} ({} frames)",
        args.out.display(),
        stats.frames_rendered
    );
    Ok(())
}
