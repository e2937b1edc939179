use super::*;
use std::cell::RefCell;
use std::path::Path;

use crate::cache::stale::FsStamps;
use crate::config::model::{OutputConfig, PathsConfig};
use crate::media::probe::{DurationProvider, TagProvider};
use crate::media::tags::AudioTags;
use crate::render::ffmpeg::{BackgroundJob, Encoder, MuxJob};

struct Probe;

impl DurationProvider for Probe {
    fn duration_of(&self, path: &Path) -> SongvidResult<f64> {
        if path.file_name().is_some_and(|n| n == "broken.mp3") {
            return Err(SongvidError::media_unreadable(path, "truncated header"));
        }
        Ok(30.0)
    }
}

impl TagProvider for Probe {
    fn tags_of(&self, _path: &Path) -> SongvidResult<AudioTags> {
        Ok(AudioTags::default())
    }
}

#[derive(Default)]
struct Recorder {
    backgrounds: RefCell<Vec<PathBuf>>,
}

impl Encoder for Recorder {
    fn render_background(&self, job: &BackgroundJob) -> SongvidResult<()> {
        self.backgrounds.borrow_mut().push(job.background.clone());
        std::fs::write(&job.out_path, b"enhanced").unwrap();
        Ok(())
    }

    fn mux_audio(&self, job: &MuxJob) -> SongvidResult<()> {
        std::fs::create_dir_all(job.out_path.parent().unwrap()).unwrap();
        std::fs::write(&job.out_path, b"final").unwrap();
        Ok(())
    }
}

fn job(root: &Path) -> JobConfig {
    let audio_dir = root.join("songs");
    let bg_dir = root.join("bg");
    std::fs::create_dir_all(&audio_dir).unwrap();
    std::fs::create_dir_all(&bg_dir).unwrap();
    JobConfig {
        paths: PathsConfig {
            audio_dir,
            background_dir: bg_dir,
            background_prefix: "xmas_".to_owned(),
            cache_dir: None,
        },
        output: OutputConfig {
            dir: Some(root.join("out")),
            ..OutputConfig::default()
        },
        transitions: Default::default(),
        overlays: Vec::new(),
        seed: Some(3),
    }
}

fn touch(path: PathBuf) {
    std::fs::write(path, b"x").unwrap();
}

fn env<'a>(probe: &'a Probe, encoder: &'a Recorder) -> Collaborators<'a> {
    Collaborators {
        durations: probe,
        tags: probe,
        encoder,
        stamps: &FsStamps,
    }
}

#[test]
fn failed_song_does_not_stop_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = job(dir.path());
    for name in ["a.mp3", "broken.mp3", "c.MP3", "notes.txt"] {
        touch(cfg.paths.audio_dir.join(name));
    }
    for name in ["xmas_snow.mp4", "xmas_tree.mp4", "summer_beach.mp4"] {
        touch(cfg.paths.background_dir.join(name));
    }

    let encoder = Recorder::default();
    let report = run_batch(&cfg, env(&Probe, &encoder), &RunOptions::default()).unwrap();
    assert_eq!(report.rendered, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.total(), 3);
    assert_eq!(report.failures[0].0, cfg.paths.audio_dir.join("broken.mp3"));

    assert!(cfg.output_dir().join("a.mp4").is_file());
    assert!(cfg.output_dir().join("c.mp4").is_file());
    for bg in encoder.backgrounds.borrow().iter() {
        let name = bg.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("xmas_"), "unexpected background {name}");
    }
}

#[test]
fn second_run_reuses_cache() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = job(dir.path());
    cfg.paths.background_prefix.clear();
    touch(cfg.paths.audio_dir.join("a.mp3"));
    touch(cfg.paths.background_dir.join("only.mp4"));

    let encoder = Recorder::default();
    let first = run_batch(&cfg, env(&Probe, &encoder), &RunOptions::default()).unwrap();
    let second = run_batch(&cfg, env(&Probe, &encoder), &RunOptions::default()).unwrap();
    assert_eq!(first.cache_hits, 0);
    assert_eq!(second.rendered, 1);
    assert_eq!(second.cache_hits, 1);
    assert_eq!(encoder.backgrounds.borrow().len(), 1);
}

#[test]
fn missing_backgrounds_is_a_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = job(dir.path());
    touch(cfg.paths.audio_dir.join("a.mp3"));
    touch(cfg.paths.background_dir.join("summer_beach.mp4"));

    let encoder = Recorder::default();
    let err = run_batch(&cfg, env(&Probe, &encoder), &RunOptions::default()).unwrap_err();
    assert!(matches!(err, SongvidError::Validation(_)));
}
