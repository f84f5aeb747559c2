use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use texlapse::{FfmpegSink, Pipeline, RunConfig, RunReport};

/// Render a time-lapse video of a LaTeX document across its git history.
#[derive(Parser, Debug)]
#[command(name = "texlapse", version)]
struct Cli {
    /// Path to the target git repository.
    path: PathBuf,

    /// Framerate of the final video.
    #[arg(long, default_value_t = texlapse::pipeline::config::DEFAULT_FRAMERATE)]
    framerate: u32,

    /// Target width of the final video in pixels.
    #[arg(long, default_value_t = texlapse::pipeline::config::DEFAULT_TARGET_WIDTH)]
    width: u32,

    /// Target aspect ratio of the final video (`1.78`, `16:9` or `16/9`).
    #[arg(
        long,
        alias = "aspect_ratio",
        value_parser = texlapse::parse_aspect_ratio,
        default_value = "16:9"
    )]
    aspect_ratio: f64,

    /// Resolution used to rasterize PDF pages before they are scaled into grid cells.
    #[arg(long, default_value_t = texlapse::raster::pdftoppm::DEFAULT_DPI)]
    dpi: u32,

    /// Video file name, written inside the repository.
    #[arg(long, default_value = texlapse::pipeline::config::DEFAULT_OUTPUT_NAME)]
    output: String,

    /// Fail instead of replacing an existing video file.
    #[arg(long)]
    no_overwrite: bool,

    /// Also write a JSON summary of the run to this file.
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("texlapse=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut cfg = RunConfig::new(cli.path);
    cfg.framerate = cli.framerate;
    cfg.target_width = cli.width;
    cfg.target_aspect_ratio = cli.aspect_ratio;
    cfg.raster_dpi = cli.dpi;
    cfg.output_name = cli.output;
    cfg.overwrite_video = !cli.no_overwrite;

    if !texlapse::is_ffmpeg_on_path() {
        tracing::warn!(
            "ffmpeg was not found on PATH; frames will still be generated, \
             but the run will fail at the encode stage"
        );
    }

    let pipeline = Pipeline::system(&cfg);
    let mut sink = FfmpegSink::new(cfg.sink_opts());
    let report = pipeline.run(&cfg, &mut sink)?;

    if let Some(path) = cli.report.as_deref() {
        write_report(&report, path)?;
    }

    eprintln!(
        "wrote {} ({} frames, {} commits skipped)",
        report.video.display(),
        report.documents,
        report.skipped_commits.len()
    );
    Ok(())
}

fn write_report(report: &RunReport, path: &std::path::Path) -> anyhow::Result<()> {
    let f = std::fs::File::create(path)
        .with_context(|| format!("create report '{}'", path.display()))?;
    serde_json::to_writer_pretty(f, report)
        .with_context(|| format!("write report '{}'", path.display()))?;
    Ok(())
}
