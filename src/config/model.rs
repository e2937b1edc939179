use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::foundation::error::{SongvidError, SongvidResult};
use crate::foundation::time::ensure_positive_duration;
use crate::visibility::TransitionMode;

/// Default transition length for fades, in seconds.
pub const DEFAULT_TRANSITION_S: f64 = 0.5;

/// Default output scale passed to the ffmpeg `scale` filter.
pub const DEFAULT_SCALE: &str = "1280:720";

/// Complete job description for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Input locations.
    pub paths: PathsConfig,
    /// Output naming and length policy.
    #[serde(default)]
    pub output: OutputConfig,
    /// Overlay transition policy.
    #[serde(default)]
    pub transitions: TransitionConfig,
    /// Overlay declarations, in cycle order.
    #[serde(default)]
    pub overlays: Vec<OverlayDecl>,
    /// Seed for background shuffling; random when unset.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Input locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory scanned for `.mp3` songs.
    pub audio_dir: PathBuf,
    /// Directory scanned for `.mp4` background clips.
    pub background_dir: PathBuf,
    /// Only backgrounds whose file name starts with this prefix are used.
    #[serde(default)]
    pub background_prefix: String,
    /// Enhanced-background cache directory. Defaults to `{background_dir}/.enhanced`.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl PathsConfig {
    /// Resolved cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| self.background_dir.join(".enhanced"))
    }
}

/// Output naming and length policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory. Defaults to the audio directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Prefix prepended to every output file name.
    #[serde(default)]
    pub file_prefix: String,
    /// Output length policy.
    #[serde(default)]
    pub length: OutputLength,
    /// What to do when the output file already exists.
    #[serde(default)]
    pub if_exists: IfExists,
    /// ffmpeg `scale` argument applied before overlays.
    #[serde(default)]
    pub scale: Option<String>,
}

impl OutputConfig {
    /// Scale argument, falling back to [`DEFAULT_SCALE`].
    pub fn scale(&self) -> &str {
        self.scale.as_deref().unwrap_or(DEFAULT_SCALE)
    }
}

/// How long each output video runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub enum OutputLength {
    /// Match the song's duration and mux its audio.
    #[default]
    Audio,
    /// Fixed number of seconds, video only.
    Seconds(f64),
}

impl<'de> Deserialize<'de> for OutputLength {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Num(f64),
            Str(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Num(s) => Ok(Self::Seconds(s)),
            Repr::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "audio" | "mp3" => Ok(Self::Audio),
                other => other.parse::<f64>().map(Self::Seconds).map_err(|_| {
                    serde::de::Error::custom(format!(
                        "output.length must be \"audio\" or seconds, got '{other}'"
                    ))
                }),
            },
        }
    }
}

/// Raw `drawtext` options in the order the config declares them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawtextOptions(Vec<(String, String)>);

impl DrawtextOptions {
    /// Return `true` when `key` is set.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    /// Options in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Return `true` when no options are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DrawtextOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl Serialize for DrawtextOptions {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap as _;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DrawtextOptions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct OptionsVisitor;

        impl<'de> serde::de::Visitor<'de> for OptionsVisitor {
            type Value = DrawtextOptions;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of drawtext option names to string values")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut out = DrawtextOptions::default();
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    if out.contains_key(&k) {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate drawtext option '{k}'"
                        )));
                    }
                    out.0.push((k, v));
                }
                Ok(out)
            }
        }

        deserializer.deserialize_map(OptionsVisitor)
    }
}

/// Policy for outputs that already exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IfExists {
    /// Re-render and replace.
    #[default]
    Overwrite,
    /// Leave the existing file alone.
    Skip,
}

/// Overlay transition policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TransitionConfig {
    /// `cut` or `fade`.
    #[serde(default)]
    pub mode: TransitionMode,
    /// Fade ramp length in seconds.
    #[serde(default = "default_transition_s")]
    pub duration_s: f64,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            mode: TransitionMode::default(),
            duration_s: DEFAULT_TRANSITION_S,
        }
    }
}

fn default_transition_s() -> f64 {
    DEFAULT_TRANSITION_S
}

/// One overlay declaration.
///
/// Declarations without a `group` are always visible. Declarations sharing a `group` are shown
/// together and must agree on `duration_s`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayDecl {
    /// What to draw.
    #[serde(flatten)]
    pub kind: OverlayKind,
    /// Animation group name.
    #[serde(default)]
    pub group: Option<String>,
    /// On-screen duration of the group, in seconds.
    #[serde(default)]
    pub duration_s: Option<f64>,
}

/// Overlay content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverlayKind {
    /// `drawtext` overlay. `text` may contain `{tag}` placeholders filled from audio metadata.
    Text {
        /// Text template.
        text: String,
        /// Font size in pixels.
        #[serde(default)]
        font_size: Option<u32>,
        /// ffmpeg color spec.
        #[serde(default)]
        font_color: Option<String>,
        /// Font file path.
        #[serde(default)]
        font_file: Option<PathBuf>,
        /// x position expression.
        #[serde(default = "default_pos")]
        x: String,
        /// y position expression.
        #[serde(default = "default_pos")]
        y: String,
        /// Additional raw `drawtext` options, passed through in declaration order.
        #[serde(default)]
        extra: DrawtextOptions,
    },
    /// Still image composited with the `overlay` filter.
    Image {
        /// Image path, relative to the config file when not absolute.
        path: PathBuf,
        /// x position expression.
        #[serde(default = "default_pos")]
        x: String,
        /// y position expression.
        #[serde(default = "default_pos")]
        y: String,
    },
}

fn default_pos() -> String {
    "0".to_owned()
}

impl JobConfig {
    /// Load and validate a config JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> SongvidResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            SongvidError::validation(format!("open config '{}': {e}", path.display()))
        })?;
        let mut cfg = Self::from_reader(BufReader::new(f))?;
        if let Some(base) = path.parent() {
            cfg.resolve_relative_paths(base);
        }
        Ok(cfg)
    }

    /// Parse and validate config JSON from a reader.
    pub fn from_reader(r: impl Read) -> SongvidResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| SongvidError::validation(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check values serde cannot express.
    pub fn validate(&self) -> SongvidResult<()> {
        if let OutputLength::Seconds(s) = self.output.length {
            ensure_positive_duration("output.length", s)?;
        }
        if !self.transitions.duration_s.is_finite() || self.transitions.duration_s < 0.0 {
            return Err(SongvidError::validation(format!(
                "transitions.duration_s must be finite and >= 0, got {}",
                self.transitions.duration_s
            )));
        }
        if self.output.scale().trim().is_empty() {
            return Err(SongvidError::validation("output.scale must be non-empty"));
        }
        for (i, decl) in self.overlays.iter().enumerate() {
            if let Some(g) = decl.group.as_deref()
                && g.trim().is_empty()
            {
                return Err(SongvidError::validation(format!(
                    "overlays[{i}].group must be non-empty when set"
                )));
            }
            if let OverlayKind::Text { extra, .. } = &decl.kind {
                for reserved in ["text", "textfile", "enable", "alpha"] {
                    if extra.contains_key(reserved) {
                        return Err(SongvidError::validation(format!(
                            "overlays[{i}].extra must not set '{reserved}'"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Output directory, falling back to the audio directory.
    pub fn output_dir(&self) -> PathBuf {
        self.output
            .dir
            .clone()
            .unwrap_or_else(|| self.paths.audio_dir.clone())
    }

    fn resolve_relative_paths(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.paths.audio_dir);
        join(&mut self.paths.background_dir);
        if let Some(p) = self.paths.cache_dir.as_mut() {
            join(p);
        }
        if let Some(p) = self.output.dir.as_mut() {
            join(p);
        }
        for decl in &mut self.overlays {
            match &mut decl.kind {
                OverlayKind::Image { path, .. } => join(path),
                OverlayKind::Text {
                    font_file: Some(p), ..
                } => join(p),
                OverlayKind::Text { .. } => {}
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/model.rs"]
mod tests;
