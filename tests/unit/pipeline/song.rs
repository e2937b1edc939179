use super::*;
use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::cache::stale::FsStamps;
use crate::config::model::{
    DrawtextOptions, OutputConfig, OverlayDecl, PathsConfig, TransitionConfig,
};
use crate::visibility::TransitionMode;

struct FakeProbe {
    durations: BTreeMap<PathBuf, f64>,
    probed: RefCell<Vec<PathBuf>>,
}

impl DurationProvider for FakeProbe {
    fn duration_of(&self, path: &Path) -> SongvidResult<f64> {
        self.probed.borrow_mut().push(path.to_path_buf());
        self.durations
            .get(path)
            .copied()
            .ok_or_else(|| SongvidError::media_unreadable(path, "not a media file"))
    }
}

impl TagProvider for FakeProbe {
    fn tags_of(&self, _path: &Path) -> SongvidResult<AudioTags> {
        let mut t = AudioTags::default();
        t.insert("title", "Silent Night");
        Ok(t)
    }
}

#[derive(Default)]
struct FakeEncoder {
    fail_background: bool,
    stage_as_directory: bool,
    backgrounds: RefCell<Vec<BackgroundJob>>,
    muxes: RefCell<Vec<MuxJob>>,
}

impl Encoder for FakeEncoder {
    fn render_background(&self, job: &BackgroundJob) -> SongvidResult<()> {
        self.backgrounds.borrow_mut().push(job.clone());
        if self.stage_as_directory {
            std::fs::create_dir_all(&job.out_path).unwrap();
            return Err(SongvidError::render("encoder crashed"));
        }
        std::fs::write(&job.out_path, b"partial").unwrap();
        if self.fail_background {
            return Err(SongvidError::render("encoder crashed"));
        }
        std::fs::write(&job.out_path, b"enhanced").unwrap();
        Ok(())
    }

    fn mux_audio(&self, job: &MuxJob) -> SongvidResult<()> {
        self.muxes.borrow_mut().push(job.clone());
        std::fs::create_dir_all(job.out_path.parent().unwrap()).unwrap();
        std::fs::write(&job.out_path, b"final").unwrap();
        Ok(())
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    cfg: JobConfig,
    audio: PathBuf,
    background: PathBuf,
    probe: FakeProbe,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let audio_dir = dir.path().join("songs");
    let bg_dir = dir.path().join("bg");
    std::fs::create_dir_all(&audio_dir).unwrap();
    std::fs::create_dir_all(&bg_dir).unwrap();
    let audio = audio_dir.join("silent night.mp3");
    let background = bg_dir.join("snow.mp4");
    std::fs::write(&audio, b"mp3").unwrap();
    std::fs::write(&background, b"mp4").unwrap();

    let cfg = JobConfig {
        paths: PathsConfig {
            audio_dir: audio_dir.clone(),
            background_dir: bg_dir,
            background_prefix: String::new(),
            cache_dir: None,
        },
        output: OutputConfig {
            dir: Some(dir.path().join("out")),
            file_prefix: "fpp_".to_owned(),
            ..OutputConfig::default()
        },
        transitions: TransitionConfig {
            mode: TransitionMode::Fade,
            duration_s: 0.5,
        },
        overlays: vec![
            OverlayDecl {
                kind: OverlayKind::Text {
                    text: "{title} ({duration})".to_owned(),
                    font_size: Some(40),
                    font_color: None,
                    font_file: None,
                    x: "10".to_owned(),
                    y: "10".to_owned(),
                    extra: DrawtextOptions::default(),
                },
                group: Some("title".to_owned()),
                duration_s: Some(10.0),
            },
            OverlayDecl {
                kind: OverlayKind::Image {
                    path: PathBuf::from("logo.png"),
                    x: "0".to_owned(),
                    y: "0".to_owned(),
                },
                group: Some("logo".to_owned()),
                duration_s: Some(5.0),
            },
            OverlayDecl {
                kind: OverlayKind::Text {
                    text: "always".to_owned(),
                    font_size: None,
                    font_color: None,
                    font_file: None,
                    x: "0".to_owned(),
                    y: "0".to_owned(),
                    extra: DrawtextOptions::default(),
                },
                group: None,
                duration_s: None,
            },
        ],
        seed: Some(1),
    };

    let probe = FakeProbe {
        durations: BTreeMap::from([(audio.clone(), 125.0), (background.clone(), 47.0)]),
        probed: RefCell::new(Vec::new()),
    };

    Fixture {
        _dir: dir,
        cfg,
        audio,
        background,
        probe,
    }
}

fn env<'a>(probe: &'a FakeProbe, encoder: &'a FakeEncoder) -> Collaborators<'a> {
    Collaborators {
        durations: probe,
        tags: probe,
        encoder,
        stamps: &FsStamps,
    }
}

#[test]
fn first_run_renders_then_reuses_cache() {
    let fx = fixture();
    let encoder = FakeEncoder::default();
    let opts = RunOptions::default();

    let first = process_song(&fx.cfg, env(&fx.probe, &encoder), &opts, &fx.audio, &fx.background)
        .unwrap();
    let output = fx.cfg.output_dir().join("fpp_silent night.mp4");
    assert_eq!(
        first,
        SongOutcome::Rendered {
            output: output.clone(),
            cache_hit: false
        }
    );

    let backgrounds = encoder.backgrounds.borrow();
    assert_eq!(backgrounds.len(), 1);
    let job = &backgrounds[0];
    assert_eq!(job.strategy.target_duration, 45.0);
    assert!(!job.strategy.loop_base);
    assert_eq!(job.graph.image_inputs, vec![PathBuf::from("logo.png")]);
    assert!(job.graph.graph.contains("alpha="));
    drop(backgrounds);

    let key = cache_key("snow.mp4", "silent night.mp3");
    let entry = fx.cfg.paths.cache_dir().join(key.file_name());
    assert_eq!(std::fs::read(&entry).unwrap(), b"enhanced");

    let mux = encoder.muxes.borrow()[0].clone();
    assert_eq!(mux.video, entry);
    assert_eq!(mux.audio.as_deref(), Some(fx.audio.as_path()));
    assert_eq!(mux.duration, 125.0);
    assert_eq!(mux.out_path, output);

    fx.probe.probed.borrow_mut().clear();
    let second = process_song(&fx.cfg, env(&fx.probe, &encoder), &opts, &fx.audio, &fx.background)
        .unwrap();
    assert_eq!(
        second,
        SongOutcome::Rendered {
            output,
            cache_hit: true
        }
    );
    assert_eq!(encoder.backgrounds.borrow().len(), 1);
    assert_eq!(encoder.muxes.borrow().len(), 2);
    assert_eq!(*fx.probe.probed.borrow(), vec![fx.audio.clone()]);
}

#[test]
fn force_regenerate_ignores_fresh_cache() {
    let fx = fixture();
    let encoder = FakeEncoder::default();
    let forced = RunOptions {
        force_regenerate: true,
        config_source: None,
    };
    for _ in 0..2 {
        process_song(&fx.cfg, env(&fx.probe, &encoder), &forced, &fx.audio, &fx.background)
            .unwrap();
    }
    assert_eq!(encoder.backgrounds.borrow().len(), 2);
}

#[test]
fn existing_output_is_skipped_when_configured() {
    let mut fx = fixture();
    fx.cfg.output.if_exists = IfExists::Skip;
    let output = output_path_for(&fx.cfg, &fx.audio).unwrap();
    std::fs::create_dir_all(output.parent().unwrap()).unwrap();
    std::fs::write(&output, b"old").unwrap();

    let encoder = FakeEncoder::default();
    let outcome = process_song(
        &fx.cfg,
        env(&fx.probe, &encoder),
        &RunOptions::default(),
        &fx.audio,
        &fx.background,
    )
    .unwrap();
    assert_eq!(outcome, SongOutcome::Skipped { output });
    assert!(encoder.muxes.borrow().is_empty());
}

#[test]
fn failed_render_keeps_previous_entry_and_skips_mux() {
    let fx = fixture();
    let key = cache_key("snow.mp4", "silent night.mp3");
    let cache = EnhancedCache::new(fx.cfg.paths.cache_dir());
    std::fs::create_dir_all(cache.dir()).unwrap();
    std::fs::write(cache.entry_path(&key), b"previous").unwrap();

    let encoder = FakeEncoder {
        fail_background: true,
        ..FakeEncoder::default()
    };
    let forced = RunOptions {
        force_regenerate: true,
        config_source: None,
    };
    let err = process_song(&fx.cfg, env(&fx.probe, &encoder), &forced, &fx.audio, &fx.background)
        .unwrap_err();
    assert!(matches!(err, SongvidError::Render(_)));
    assert_eq!(std::fs::read(cache.entry_path(&key)).unwrap(), b"previous");
    assert!(!cache.staging_path(&key).exists());
    assert!(encoder.muxes.borrow().is_empty());
}

#[test]
fn render_error_survives_failed_cleanup() {
    let fx = fixture();
    let encoder = FakeEncoder {
        stage_as_directory: true,
        ..FakeEncoder::default()
    };
    let err = process_song(
        &fx.cfg,
        env(&fx.probe, &encoder),
        &RunOptions::default(),
        &fx.audio,
        &fx.background,
    )
    .unwrap_err();
    match err {
        SongvidError::Render(msg) => assert_eq!(msg, "encoder crashed"),
        other => panic!("expected render error, got {other:?}"),
    }
    assert!(encoder.muxes.borrow().is_empty());
}

#[test]
fn fixed_length_output_is_silent() {
    let mut fx = fixture();
    fx.cfg.output.length = OutputLength::Seconds(30.0);
    let encoder = FakeEncoder::default();
    process_song(
        &fx.cfg,
        env(&fx.probe, &encoder),
        &RunOptions::default(),
        &fx.audio,
        &fx.background,
    )
    .unwrap();
    let mux = encoder.muxes.borrow()[0].clone();
    assert_eq!(mux.audio, None);
    assert_eq!(mux.duration, 30.0);
    assert!(!fx.probe.probed.borrow().contains(&fx.audio));
}

#[test]
fn unreadable_background_fails_only_this_song() {
    let fx = fixture();
    let other_bg = fx.background.with_file_name("corrupt.mp4");
    std::fs::write(&other_bg, b"??").unwrap();
    let encoder = FakeEncoder::default();
    let err = process_song(
        &fx.cfg,
        env(&fx.probe, &encoder),
        &RunOptions::default(),
        &fx.audio,
        &other_bg,
    )
    .unwrap_err();
    assert!(matches!(err, SongvidError::MediaUnreadable { .. }));
}

#[test]
fn layers_carry_filled_text_and_group_visibility() {
    let fx = fixture();
    let plan = plan_song(&fx.cfg.overlays, 47.0, &fx.cfg.transitions).unwrap();
    let mut tags = AudioTags::default();
    tags.insert("title", "Silent Night");
    tags.insert("duration", "2:05");
    let scratch = tempfile::tempdir().unwrap();

    let layers = prepare_layers(&fx.cfg, &plan, &tags, scratch.path()).unwrap();
    assert_eq!(layers.len(), 3);
    match &layers[0].content {
        LayerContent::Text { textfile, .. } => {
            assert_eq!(
                std::fs::read_to_string(textfile).unwrap(),
                "Silent Night (2:05)"
            );
        }
        other => panic!("expected text layer, got {other:?}"),
    }
    assert!(layers[0].visibility.is_some());
    assert!(layers[1].visibility.is_some());
    assert!(layers[2].visibility.is_none());
}

#[test]
fn song_tags_add_file_details() {
    let fx = fixture();
    let tags = song_tags(&fx.probe, &fx.audio, 125.4).unwrap();
    assert_eq!(tags.get("title"), Some("Silent Night"));
    assert_eq!(tags.get("filename"), Some("silent night.mp3"));
    assert_eq!(tags.get("stem"), Some("silent night"));
    assert_eq!(tags.get("duration"), Some("2:05"));
}
