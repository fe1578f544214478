use anyhow::Context;
use clap::Parser;
use comet_tracker::core_modules::centroid::Centroid;
use comet_tracker::core_modules::window_color_map::default_workers;
use comet_tracker::frame_source::{FrameSink, FrameSource, ImageSequenceSource};
use comet_tracker::{RunSummary, TrackerConfig, TrackerLoop};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod sinks;
#[cfg(feature = "opencv")]
mod video;

use sinks::{FanoutSink, PngSequenceSink};

#[derive(Parser)]
#[command(name = "visual_tester")]
#[command(about = "Track a color-distinctive object through a frame sequence and write the annotated frames")]
#[command(version)]
struct Cli {
    /// Directory of frames, or a video file when built with the `opencv` feature.
    #[arg(long)]
    input: PathBuf,

    /// Directory to write annotated PNG frames to.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Tracker configuration (JSON). Missing fields take the calibrated defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Starting window center, overriding the config.
    #[arg(long, num_args = 2, value_names = ["X", "Y"])]
    center: Option<Vec<i32>>,

    /// Search window width in pixels, overriding the config.
    #[arg(long)]
    window_width: Option<u32>,

    /// Search window height in pixels, overriding the config.
    #[arg(long)]
    window_height: Option<u32>,

    /// Score each window on a pool of blocking workers.
    #[arg(long)]
    parallel: bool,

    /// Worker count for --parallel (default: number of CPUs).
    #[arg(long)]
    workers: Option<usize>,

    /// Path to write the tracked trajectory (JSON).
    #[arg(long)]
    track_out: Option<PathBuf>,

    /// Show frames in a window and stop on 'q' (requires the `opencv` feature).
    #[arg(long)]
    display: bool,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn setup_logging(base_level: &str) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(base_level))
        .with_context(|| format!("invalid log filter {base_level:?}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("logger initialization failed: {e}"))
}

fn build_config(cli: &Cli) -> anyhow::Result<TrackerConfig> {
    let mut config = match &cli.config {
        Some(path) => TrackerConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => TrackerConfig::default(),
    };
    if let Some(center) = &cli.center {
        config.initial_center = Centroid::new(center[0], center[1]);
    }
    if let Some(width) = cli.window_width {
        config.window_width = width;
    }
    if let Some(height) = cli.window_height {
        config.window_height = height;
    }
    config.validate()?;
    Ok(config)
}

fn open_source(input: &Path) -> anyhow::Result<Box<dyn FrameSource>> {
    if input.is_dir() {
        let source = ImageSequenceSource::open(input)?;
        tracing::info!(dir = %input.display(), frames = source.remaining(), "reading image sequence");
        return Ok(Box::new(source));
    }
    open_video(input)
}

#[cfg(feature = "opencv")]
fn open_video(input: &Path) -> anyhow::Result<Box<dyn FrameSource>> {
    Ok(Box::new(video::VideoSource::open(input)?))
}

#[cfg(not(feature = "opencv"))]
fn open_video(input: &Path) -> anyhow::Result<Box<dyn FrameSource>> {
    anyhow::bail!(
        "{} is not a directory; reading video files requires the `opencv` feature",
        input.display()
    )
}

#[cfg(feature = "opencv")]
fn display_sink() -> anyhow::Result<Box<dyn FrameSink>> {
    Ok(Box::new(video::WindowSink::new("Video")))
}

#[cfg(not(feature = "opencv"))]
fn display_sink() -> anyhow::Result<Box<dyn FrameSink>> {
    anyhow::bail!("--display requires the `opencv` feature")
}

fn build_sink(cli: &Cli) -> anyhow::Result<FanoutSink> {
    let mut sink = FanoutSink::default();
    if let Some(output) = &cli.output {
        sink.push(Box::new(PngSequenceSink::create(output)?));
    }
    if cli.display {
        sink.push(display_sink()?);
    }
    Ok(sink)
}

fn write_track(path: &Path, summary: &RunSummary, trajectory: &[Centroid]) -> anyhow::Result<()> {
    let export = serde_json::json!({
        "frames_processed": summary.frames_processed,
        "stop_reason": format!("{:?}", summary.stop_reason),
        "final_center": summary.final_center,
        "trajectory": trajectory,
    });
    std::fs::write(path, serde_json::to_string_pretty(&export)?)
        .with_context(|| format!("writing trajectory to {}", path.display()))?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level)?;

    let config = build_config(&cli)?;
    if cli.print_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    let mut source = open_source(&cli.input)?;
    let mut sink = build_sink(&cli)?;
    let mut tracker = TrackerLoop::new(config)?;

    let summary = if cli.parallel {
        let workers = cli.workers.unwrap_or_else(default_workers);
        tracker.run_parallel(source.as_mut(), &mut sink, workers).await?
    } else {
        tracker.run(source.as_mut(), &mut sink)?
    };

    if let Some(path) = &cli.track_out {
        write_track(path, &summary, tracker.trajectory())?;
    }

    tracing::info!(
        frames = summary.frames_processed,
        center = ?summary.final_center,
        "processing complete"
    );
    Ok(())
}
