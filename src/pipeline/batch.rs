use std::path::PathBuf;

use crate::anim::groups::resolve_groups;
use crate::config::model::JobConfig;
use crate::foundation::error::{SongvidError, SongvidResult};
use crate::foundation::fs::{list_mp4s, list_with_extension};
use crate::pipeline::rotation::BackgroundRotation;
use crate::pipeline::song::{Collaborators, RunOptions, SongOutcome, process_song};

/// Outcome counts for a batch run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchReport {
    /// Songs whose output was written.
    pub rendered: usize,
    /// Of `rendered`, how many reused a cached enhanced background.
    pub cache_hits: usize,
    /// Songs skipped because the output already existed.
    pub skipped: usize,
    /// Songs that failed.
    pub failed: usize,
    /// Failed songs with their error messages, in processing order.
    pub failures: Vec<(PathBuf, String)>,
}

impl BatchReport {
    /// Total songs seen.
    pub fn total(&self) -> usize {
        self.rendered + self.skipped + self.failed
    }
}

/// Render every `.mp3` in the audio directory against a rotating background.
///
/// Config problems fail the whole run before any song is touched. After that, a failed song is
/// logged, recorded in the report and the batch moves on.
pub fn run_batch(
    cfg: &JobConfig,
    env: Collaborators<'_>,
    opts: &RunOptions,
) -> SongvidResult<BatchReport> {
    cfg.validate()?;
    resolve_groups(&cfg.overlays)?;

    let songs = list_with_extension(&cfg.paths.audio_dir, "mp3", "")?;
    let backgrounds = list_mp4s(&cfg.paths.background_dir, &cfg.paths.background_prefix)?;
    if backgrounds.is_empty() {
        return Err(SongvidError::validation(format!(
            "no '{}*.mp4' backgrounds in '{}'",
            cfg.paths.background_prefix,
            cfg.paths.background_dir.display()
        )));
    }
    tracing::info!(
        songs = songs.len(),
        backgrounds = backgrounds.len(),
        "starting batch"
    );

    let mut rotation = BackgroundRotation::new(backgrounds, cfg.seed);
    let mut report = BatchReport::default();
    for audio in songs {
        let Some(background) = rotation.next_background() else {
            break;
        };
        match process_song(cfg, env, opts, &audio, &background) {
            Ok(SongOutcome::Rendered { cache_hit, .. }) => {
                report.rendered += 1;
                if cache_hit {
                    report.cache_hits += 1;
                }
            }
            Ok(SongOutcome::Skipped { .. }) => report.skipped += 1,
            Err(e) => {
                tracing::warn!(audio = %audio.display(), error = %e, "song failed");
                report.failed += 1;
                report.failures.push((audio, e.to_string()));
            }
        }
    }

    tracing::info!(
        rendered = report.rendered,
        cache_hits = report.cache_hits,
        skipped = report.skipped,
        failed = report.failed,
        "batch finished"
    );
    Ok(report)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/batch.rs"]
mod tests;
