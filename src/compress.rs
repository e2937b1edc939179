//! Bulk re-encode of finished videos for player storage.

use std::ffi::OsString;
use std::path::Path;

use crate::foundation::error::{SongvidError, SongvidResult};
use crate::foundation::fs::list_mp4s;
use crate::render::ffmpeg::run_ffmpeg;

/// Compression settings.
#[derive(Clone, Debug)]
pub struct CompressOpts {
    /// x264 constant rate factor (18 is visually lossless, 26-28 is fine for TV display).
    pub crf: u8,
    /// x264 preset.
    pub preset: String,
    /// AAC bitrate.
    pub audio_bitrate: String,
}

impl Default for CompressOpts {
    fn default() -> Self {
        Self {
            crf: 27,
            preset: "medium".to_owned(),
            audio_bitrate: "128k".to_owned(),
        }
    }
}

impl CompressOpts {
    /// Reject settings x264 would refuse.
    pub fn validate(&self) -> SongvidResult<()> {
        if self.crf > 51 {
            return Err(SongvidError::validation(format!(
                "crf must be in 0..=51, got {}",
                self.crf
            )));
        }
        const PRESETS: [&str; 10] = [
            "ultrafast",
            "superfast",
            "veryfast",
            "faster",
            "fast",
            "medium",
            "slow",
            "slower",
            "veryslow",
            "placebo",
        ];
        if !PRESETS.contains(&self.preset.as_str()) {
            return Err(SongvidError::validation(format!(
                "unknown x264 preset '{}'",
                self.preset
            )));
        }
        Ok(())
    }
}

/// Outcome counts for a compression run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompressReport {
    /// Files re-encoded.
    pub compressed: usize,
    /// Files whose encode failed.
    pub failed: usize,
    /// Files skipped because the output already exists.
    pub skipped: usize,
    /// Total input bytes of compressed files.
    pub bytes_in: u64,
    /// Total output bytes of compressed files.
    pub bytes_out: u64,
}

impl CompressReport {
    /// Size reduction in percent across compressed files.
    pub fn reduction_percent(&self) -> f64 {
        if self.bytes_in == 0 {
            return 0.0;
        }
        (1.0 - self.bytes_out as f64 / self.bytes_in as f64) * 100.0
    }
}

/// Arguments for re-encoding `input` into `output`.
pub fn compress_args(input: &Path, output: &Path, opts: &CompressOpts) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-y", "-nostdin", "-loglevel", "error", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(input.as_os_str().to_owned());
    args.extend(
        [
            "-c:v",
            "libx264",
            "-crf",
            &opts.crf.to_string(),
            "-preset",
            &opts.preset,
            "-c:a",
            "aac",
            "-b:a",
            &opts.audio_bitrate,
            "-movflags",
            "+faststart",
        ]
        .map(OsString::from),
    );
    args.push(output.as_os_str().to_owned());
    args
}

/// Compress every `*.mp4` in `input_dir` into `output_dir`, skipping existing outputs.
///
/// A failed file is counted and logged; the run continues with the next one.
pub fn compress_dir(
    input_dir: &Path,
    output_dir: &Path,
    opts: &CompressOpts,
) -> SongvidResult<CompressReport> {
    opts.validate()?;
    std::fs::create_dir_all(output_dir).map_err(|e| {
        SongvidError::validation(format!(
            "create output dir '{}': {e}",
            output_dir.display()
        ))
    })?;

    let inputs = list_mp4s(input_dir, "")?;
    tracing::info!(count = inputs.len(), crf = opts.crf, preset = %opts.preset, "compressing videos");

    let mut report = CompressReport::default();
    for input in inputs {
        let Some(name) = input.file_name() else {
            continue;
        };
        let output = output_dir.join(name);
        if output.exists() {
            tracing::info!(file = %input.display(), "skipping, output exists");
            report.skipped += 1;
            continue;
        }

        match run_ffmpeg(&compress_args(&input, &output, opts)) {
            Ok(()) => {
                let before = std::fs::metadata(&input).map(|m| m.len()).unwrap_or(0);
                let after = std::fs::metadata(&output).map(|m| m.len()).unwrap_or(0);
                report.compressed += 1;
                report.bytes_in += before;
                report.bytes_out += after;
                tracing::info!(
                    file = %input.display(),
                    before_mb = before as f64 / 1024.0 / 1024.0,
                    after_mb = after as f64 / 1024.0 / 1024.0,
                    "compressed"
                );
            }
            Err(e) => {
                let _ = std::fs::remove_file(&output);
                report.failed += 1;
                tracing::warn!(file = %input.display(), error = %e, "compression failed");
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
#[path = "../tests/unit/compress.rs"]
mod tests;
