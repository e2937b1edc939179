use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::cache::key::{CacheKey, cache_key};
use crate::cache::stale::{CachePolicy, FileStamps};
use crate::cache::store::EnhancedCache;
use crate::config::model::{IfExists, JobConfig, OutputLength, OverlayKind};
use crate::foundation::error::{SongvidError, SongvidResult};
use crate::media::probe::{DurationProvider, TagProvider};
use crate::media::tags::AudioTags;
use crate::pipeline::song_plan::{SongPlan, plan_song};
use crate::render::ffmpeg::{BackgroundJob, Encoder, MuxJob};
use crate::render::filters::{LayerContent, OverlayLayer, build_filter_graph};

/// External collaborators used while processing songs.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Media duration lookup.
    pub durations: &'a dyn DurationProvider,
    /// Audio tag lookup.
    pub tags: &'a dyn TagProvider,
    /// Encoder for backgrounds and final outputs.
    pub encoder: &'a dyn Encoder,
    /// File timestamps for cache staleness.
    pub stamps: &'a dyn FileStamps,
}

/// Per-run switches that are not part of the job config.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Re-render enhanced backgrounds regardless of timestamps.
    pub force_regenerate: bool,
    /// Config file the job came from; a newer config invalidates cached backgrounds.
    pub config_source: Option<PathBuf>,
}

/// What happened to one song.
#[derive(Clone, Debug, PartialEq)]
pub enum SongOutcome {
    /// Output written.
    Rendered {
        /// Output file.
        output: PathBuf,
        /// Whether the cached enhanced background was reused.
        cache_hit: bool,
    },
    /// Output already existed and the config says skip.
    Skipped {
        /// Existing output file.
        output: PathBuf,
    },
}

/// Output path for `audio`: `{output_dir}/{file_prefix}{stem}.mp4`.
pub fn output_path_for(cfg: &JobConfig, audio: &Path) -> SongvidResult<PathBuf> {
    let stem = audio
        .file_stem()
        .ok_or_else(|| SongvidError::validation(format!("'{}' has no file name", audio.display())))?;
    Ok(cfg.output_dir().join(format!(
        "{}{}.mp4",
        cfg.output.file_prefix,
        stem.to_string_lossy()
    )))
}

fn file_name_of(path: &Path) -> SongvidResult<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| SongvidError::validation(format!("'{}' has no file name", path.display())))
}

/// Produce the video for one (song, background) pair.
///
/// The cache check runs first; strategy, schedule and expressions are only computed when the
/// enhanced background has to be rendered, and are local to this call.
#[tracing::instrument(skip_all, fields(audio = %audio.display(), background = %background.display()))]
pub fn process_song(
    cfg: &JobConfig,
    env: Collaborators<'_>,
    opts: &RunOptions,
    audio: &Path,
    background: &Path,
) -> SongvidResult<SongOutcome> {
    let output = output_path_for(cfg, audio)?;
    if cfg.output.if_exists == IfExists::Skip && output.exists() {
        tracing::info!(output = %output.display(), "output exists, skipping");
        return Ok(SongOutcome::Skipped { output });
    }

    let (duration, mux_audio) = match cfg.output.length {
        OutputLength::Audio => (env.durations.duration_of(audio)?, Some(audio.to_path_buf())),
        OutputLength::Seconds(s) => (s, None),
    };

    let key = cache_key(&file_name_of(background)?, &file_name_of(audio)?);
    let cache = EnhancedCache::new(cfg.paths.cache_dir());
    let entry = cache.entry_path(&key);

    let policy = CachePolicy {
        force_regenerate: opts.force_regenerate,
    };
    let stale = policy.needs_regeneration(
        env.stamps,
        &entry,
        background,
        opts.config_source.as_deref(),
    )?;

    if stale {
        let background_duration = env.durations.duration_of(background)?;
        let plan = plan_song(&cfg.overlays, background_duration, &cfg.transitions)?;
        if plan.strategy.loop_base {
            tracing::info!(
                background_s = background_duration,
                target_s = plan.strategy.target_duration,
                "background shorter than one animation cycle, looping"
            );
        } else if plan.strategy.reports_truncation() {
            tracing::info!(
                background_s = background_duration,
                target_s = plan.strategy.target_duration,
                truncated_s = plan.strategy.truncate_amount,
                "truncating background to whole animation cycles"
            );
        }
        let tags = song_tags(env.tags, audio, duration)?;
        render_enhanced(cfg, env.encoder, &cache, &key, &plan, &tags, background)?;
    } else {
        tracing::debug!(entry = %entry.display(), "reusing enhanced background");
    }

    env.encoder.mux_audio(&MuxJob {
        video: entry,
        audio: mux_audio,
        duration,
        out_path: output.clone(),
    })?;

    tracing::info!(output = %output.display(), cache_hit = !stale, "song rendered");
    Ok(SongOutcome::Rendered {
        output,
        cache_hit: !stale,
    })
}

fn song_tags(tags: &dyn TagProvider, audio: &Path, duration: f64) -> SongvidResult<AudioTags> {
    let mut out = tags.tags_of(audio)?;
    out.insert("filename", file_name_of(audio)?);
    if let Some(stem) = audio.file_stem() {
        out.insert("stem", stem.to_string_lossy());
    }
    let secs = duration.round() as u64;
    out.insert("duration", format!("{}:{:02}", secs / 60, secs % 60));
    Ok(out)
}

fn render_enhanced(
    cfg: &JobConfig,
    encoder: &dyn Encoder,
    cache: &EnhancedCache,
    key: &CacheKey,
    plan: &SongPlan,
    tags: &AudioTags,
    background: &Path,
) -> SongvidResult<PathBuf> {
    // Text files live only as long as this render.
    let scratch = tempfile::Builder::new()
        .prefix("songvid-text-")
        .tempdir()
        .context("create scratch dir for overlay text")?;
    let layers = prepare_layers(cfg, plan, tags, scratch.path())?;
    let graph = build_filter_graph(cfg.output.scale(), &layers);

    let staging = cache.begin(key)?;
    let job = BackgroundJob {
        background: background.to_path_buf(),
        strategy: plan.strategy,
        graph,
        out_path: staging,
    };
    tracing::info!(key = %key, target_s = plan.strategy.target_duration, "rendering enhanced background");
    if let Err(e) = encoder.render_background(&job) {
        if let Err(abort_err) = cache.abort(key) {
            tracing::warn!(key = %key, error = %abort_err, "failed to remove staged render");
        }
        return Err(e);
    }
    cache.commit(key)
}

/// Turn overlay declarations into filter layers, writing text to files under `scratch`.
pub fn prepare_layers(
    cfg: &JobConfig,
    plan: &SongPlan,
    tags: &AudioTags,
    scratch: &Path,
) -> SongvidResult<Vec<OverlayLayer>> {
    let mut layers = Vec::with_capacity(cfg.overlays.len());
    for (i, decl) in cfg.overlays.iter().enumerate() {
        let visibility = decl
            .group
            .as_deref()
            .and_then(|g| plan.visibility_of(g))
            .cloned();
        let content = match &decl.kind {
            OverlayKind::Text {
                text,
                font_size,
                font_color,
                font_file,
                x,
                y,
                extra,
            } => {
                let textfile = scratch.join(format!("overlay_{i}.txt"));
                std::fs::write(&textfile, tags.fill_template(text))
                    .with_context(|| format!("write overlay text '{}'", textfile.display()))?;
                LayerContent::Text {
                    textfile,
                    font_size: *font_size,
                    font_color: font_color.clone(),
                    font_file: font_file.clone(),
                    x: x.clone(),
                    y: y.clone(),
                    extra: extra.clone(),
                }
            }
            OverlayKind::Image { path, x, y } => LayerContent::Image {
                path: path.clone(),
                x: x.clone(),
                y: y.clone(),
            },
        };
        layers.push(OverlayLayer {
            content,
            visibility,
        });
    }
    Ok(layers)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/song.rs"]
mod tests;
