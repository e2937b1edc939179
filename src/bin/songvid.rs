use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "songvid", version)]
struct Cli {
    /// Log debug detail to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a video for every song in the configured audio directory (requires `ffmpeg`).
    Render(RenderArgs),
    /// Print the animation plan for one background as JSON, without rendering.
    Plan(PlanArgs),
    /// Re-encode finished videos with a smaller CRF/preset (requires `ffmpeg`).
    Compress(CompressArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Job config JSON.
    #[arg(long)]
    config: PathBuf,

    /// Re-render enhanced backgrounds even when the cache is fresh.
    #[arg(long, default_value_t = false)]
    force_regenerate: bool,

    /// Override the background shuffle seed.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Job config JSON.
    #[arg(long)]
    config: PathBuf,

    /// Background clip to probe for its duration.
    #[arg(
        long,
        conflicts_with = "background_duration",
        required_unless_present = "background_duration"
    )]
    background: Option<PathBuf>,

    /// Background duration in seconds, instead of probing a file.
    #[arg(long)]
    background_duration: Option<f64>,

    /// Song paired with the background; adds its enhanced-background cache key.
    #[arg(long, requires = "background")]
    audio: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct CompressArgs {
    /// Directory of finished `.mp4` videos.
    #[arg(long = "in")]
    in_dir: PathBuf,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,

    /// x264 constant rate factor.
    #[arg(long, default_value_t = 27)]
    crf: u8,

    /// x264 preset.
    #[arg(long, default_value = "medium")]
    preset: String,

    /// AAC audio bitrate.
    #[arg(long, default_value = "128k")]
    audio_bitrate: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Plan(args) => cmd_plan(args),
        Command::Compress(args) => cmd_compress(args),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut cfg = songvid::JobConfig::from_path(&args.config)
        .with_context(|| format!("load config '{}'", args.config.display()))?;
    if args.seed.is_some() {
        cfg.seed = args.seed;
    }
    anyhow::ensure!(
        songvid::is_ffmpeg_on_path() && songvid::is_ffprobe_on_path(),
        "ffmpeg and ffprobe must be on PATH"
    );

    let probe = songvid::Ffprobe;
    let encoder = songvid::FfmpegEncoder::default();
    let env = songvid::Collaborators {
        durations: &probe,
        tags: &probe,
        encoder: &encoder,
        stamps: &songvid::FsStamps,
    };
    let opts = songvid::RunOptions {
        force_regenerate: args.force_regenerate,
        config_source: Some(args.config.clone()),
    };
    let report = songvid::run_batch(&cfg, env, &opts)?;

    eprintln!(
        "rendered {} ({} from cache), skipped {}, failed {}",
        report.rendered, report.cache_hits, report.skipped, report.failed
    );
    for (song, err) in &report.failures {
        eprintln!("  {}: {err}", song.display());
    }
    anyhow::ensure!(report.failed == 0, "{} song(s) failed", report.failed);
    Ok(())
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let cfg = songvid::JobConfig::from_path(&args.config)
        .with_context(|| format!("load config '{}'", args.config.display()))?;

    let background_duration = match (args.background_duration, &args.background) {
        (Some(secs), _) => secs,
        (None, Some(path)) => {
            use songvid::DurationProvider as _;
            songvid::Ffprobe.duration_of(path)?
        }
        (None, None) => anyhow::bail!("pass --background or --background-duration"),
    };

    let plan = songvid::plan_song(&cfg.overlays, background_duration, &cfg.transitions)?;
    let mut json = plan.to_json();
    if let (Some(background), Some(audio)) = (&args.background, &args.audio) {
        let name = |p: &PathBuf| {
            p.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        };
        let key = songvid::cache_key(&name(background), &name(audio));
        json["cache_key"] = serde_json::Value::String(key.to_string());
    }
    let json = serde_json::to_string_pretty(&json).context("serialize plan")?;
    println!("{json}");
    Ok(())
}

fn cmd_compress(args: CompressArgs) -> anyhow::Result<()> {
    anyhow::ensure!(songvid::is_ffmpeg_on_path(), "ffmpeg must be on PATH");
    let opts = songvid::CompressOpts {
        crf: args.crf,
        preset: args.preset,
        audio_bitrate: args.audio_bitrate,
    };
    let report = songvid::compress_dir(&args.in_dir, &args.out, &opts)?;

    eprintln!(
        "compressed {}, skipped {}, failed {}",
        report.compressed, report.skipped, report.failed
    );
    if report.compressed > 0 {
        eprintln!(
            "{:.1} MB -> {:.1} MB ({:.1}% smaller)",
            report.bytes_in as f64 / 1024.0 / 1024.0,
            report.bytes_out as f64 / 1024.0 / 1024.0,
            report.reduction_percent()
        );
    }
    anyhow::ensure!(report.failed == 0, "{} file(s) failed", report.failed);
    Ok(())
}
