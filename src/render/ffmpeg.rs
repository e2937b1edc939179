use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::foundation::error::{SongvidError, SongvidResult};
use crate::plan::strategy::RenderStrategy;
use crate::render::filters::FilterGraph;

/// Everything needed to bake overlays into a background clip.
#[derive(Clone, Debug)]
pub struct BackgroundJob {
    /// Source background clip.
    pub background: PathBuf,
    /// Loop/truncate decision and target length.
    pub strategy: RenderStrategy,
    /// Overlay filter graph.
    pub graph: FilterGraph,
    /// Where to write the enhanced background.
    pub out_path: PathBuf,
}

/// Final per-song output: loop the enhanced background to length and attach the song.
#[derive(Clone, Debug)]
pub struct MuxJob {
    /// Enhanced background.
    pub video: PathBuf,
    /// Song to attach; `None` writes a silent video.
    pub audio: Option<PathBuf>,
    /// Output length in seconds.
    pub duration: f64,
    /// Output file.
    pub out_path: PathBuf,
}

/// External encoder used by the pipeline.
pub trait Encoder {
    /// Render an enhanced background. Must either fully succeed or fail.
    fn render_background(&self, job: &BackgroundJob) -> SongvidResult<()>;
    /// Write a final song video.
    fn mux_audio(&self, job: &MuxJob) -> SongvidResult<()>;
}

/// Encoder settings for [`FfmpegEncoder`].
#[derive(Clone, Debug)]
pub struct FfmpegEncoderOpts {
    /// x264 constant rate factor for enhanced backgrounds.
    pub crf: u8,
    /// x264 preset.
    pub preset: String,
    /// AAC bitrate for muxed audio.
    pub audio_bitrate: String,
}

impl Default for FfmpegEncoderOpts {
    fn default() -> Self {
        Self {
            crf: 23,
            preset: "medium".to_owned(),
            audio_bitrate: "192k".to_owned(),
        }
    }
}

/// [`Encoder`] that runs the system `ffmpeg` binary.
#[derive(Clone, Debug, Default)]
pub struct FfmpegEncoder {
    opts: FfmpegEncoderOpts,
}

impl FfmpegEncoder {
    /// Create an encoder with `opts`.
    pub fn new(opts: FfmpegEncoderOpts) -> Self {
        Self { opts }
    }
}

impl Encoder for FfmpegEncoder {
    fn render_background(&self, job: &BackgroundJob) -> SongvidResult<()> {
        ensure_parent_dir(&job.out_path)?;
        run_ffmpeg(&background_args(job, &self.opts))
    }

    fn mux_audio(&self, job: &MuxJob) -> SongvidResult<()> {
        ensure_parent_dir(&job.out_path)?;
        run_ffmpeg(&mux_args(job, &self.opts))
    }
}

/// Arguments for rendering an enhanced background.
pub fn background_args(job: &BackgroundJob, opts: &FfmpegEncoderOpts) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-y", "-nostdin", "-loglevel", "error"]
        .into_iter()
        .map(OsString::from)
        .collect();

    if job.strategy.loop_base {
        args.extend(["-stream_loop", "-1"].map(OsString::from));
    }
    args.push("-i".into());
    args.push(job.background.clone().into());

    for image in &job.graph.image_inputs {
        args.extend(["-loop", "1", "-i"].map(OsString::from));
        args.push(image.clone().into());
    }

    args.push("-filter_complex".into());
    args.push(job.graph.graph.clone().into());
    args.push("-map".into());
    args.push(format!("[{}]", job.graph.output_label).into());
    args.push("-t".into());
    args.push(format!("{:.3}", job.strategy.target_duration).into());
    args.extend(
        [
            "-an",
            "-c:v",
            "libx264",
            "-preset",
            &opts.preset,
            "-crf",
            &opts.crf.to_string(),
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ]
        .map(OsString::from),
    );
    args.push(job.out_path.clone().into());
    args
}

/// Arguments for the final loop-and-mux step.
pub fn mux_args(job: &MuxJob, opts: &FfmpegEncoderOpts) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-y",
        "-nostdin",
        "-loglevel",
        "error",
        "-stream_loop",
        "-1",
        "-i",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(job.video.clone().into());

    match &job.audio {
        Some(audio) => {
            args.push("-i".into());
            args.push(audio.clone().into());
            args.extend(
                [
                    "-map",
                    "0:v:0",
                    "-map",
                    "1:a:0",
                    "-c:v",
                    "copy",
                    "-c:a",
                    "aac",
                    "-b:a",
                    &opts.audio_bitrate,
                ]
                .map(OsString::from),
            );
        }
        None => {
            args.extend(["-map", "0:v:0", "-c:v", "copy", "-an"].map(OsString::from));
        }
    }

    args.push("-t".into());
    args.push(format!("{:.3}", job.duration).into());
    if job.audio.is_some() {
        args.push("-shortest".into());
    }
    args.extend(["-movflags", "+faststart"].map(OsString::from));
    args.push(job.out_path.clone().into());
    args
}

/// Run `ffmpeg` to completion, surfacing its stderr on failure.
pub fn run_ffmpeg(args: &[OsString]) -> SongvidResult<()> {
    tracing::debug!(args = ?args, "running ffmpeg");
    let output = Command::new("ffmpeg")
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            SongvidError::render(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SongvidError::render(format!(
            "ffmpeg exited with status {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be executed.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> SongvidResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/ffmpeg.rs"]
mod tests;
