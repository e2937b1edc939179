use std::collections::BTreeMap;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::foundation::error::{SongvidError, SongvidResult};
use crate::media::tags::AudioTags;

/// Media duration lookup.
pub trait DurationProvider {
    /// Duration of the media file at `path`, in seconds.
    fn duration_of(&self, path: &Path) -> SongvidResult<f64>;
}

/// Audio metadata lookup.
pub trait TagProvider {
    /// Container-level tags (title, artist, ...) of the file at `path`.
    fn tags_of(&self, path: &Path) -> SongvidResult<AudioTags>;
}

/// Probe implementation backed by the system `ffprobe`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ffprobe;

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    format: Option<ProbeFormat>,
}

impl Ffprobe {
    fn probe_format(&self, path: &Path) -> SongvidResult<ProbeFormat> {
        let out = Command::new("ffprobe")
            .args(["-v", "error", "-print_format", "json", "-show_format"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| SongvidError::media_unreadable(path, format!("failed to run ffprobe: {e}")))?;
        if !out.status.success() {
            return Err(SongvidError::media_unreadable(
                path,
                format!(
                    "ffprobe exited with status {}: {}",
                    out.status,
                    String::from_utf8_lossy(&out.stderr).trim()
                ),
            ));
        }
        parse_probe_json(path, &out.stdout)
    }
}

fn parse_probe_json(path: &Path, stdout: &[u8]) -> SongvidResult<ProbeFormat> {
    let parsed: ProbeOut = serde_json::from_slice(stdout)
        .map_err(|e| SongvidError::media_unreadable(path, format!("ffprobe json parse failed: {e}")))?;
    parsed
        .format
        .ok_or_else(|| SongvidError::media_unreadable(path, "ffprobe reported no format section"))
}

fn parse_duration(path: &Path, format: &ProbeFormat) -> SongvidResult<f64> {
    let raw = format
        .duration
        .as_deref()
        .ok_or_else(|| SongvidError::media_unreadable(path, "missing duration from ffprobe"))?;
    let secs: f64 = raw.trim().parse().map_err(|_| {
        SongvidError::media_unreadable(path, format!("unparseable duration '{raw}'"))
    })?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(SongvidError::media_unreadable(
            path,
            format!("non-positive duration {secs}"),
        ));
    }
    Ok(secs)
}

impl DurationProvider for Ffprobe {
    fn duration_of(&self, path: &Path) -> SongvidResult<f64> {
        let format = self.probe_format(path)?;
        parse_duration(path, &format)
    }
}

impl TagProvider for Ffprobe {
    fn tags_of(&self, path: &Path) -> SongvidResult<AudioTags> {
        let format = self.probe_format(path)?;
        Ok(AudioTags::from_raw(format.tags))
    }
}

/// Return `true` when `ffprobe` can be executed.
pub fn is_ffprobe_on_path() -> bool {
    Command::new("ffprobe")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/media/probe.rs"]
mod tests;
