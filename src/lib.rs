//! songvid builds per-song display videos for light-show players.
//!
//! Each song gets a background clip with text and image overlays that take turns on screen.
//! The heavy lifting (scaling, drawing, encoding) is done by the system `ffmpeg`; this crate
//! decides *what* to draw and *when*:
//!
//! - Resolve overlay declarations into [`AnimationGroups`]
//! - Reconcile the background length with the animation cycle ([`compute_render_strategy`])
//! - Lay the cycle out on the timeline ([`compute_schedule`])
//! - Turn each group's intervals into gate and fade [`Expr`]essions ([`build_visibility`])
//! - Reuse enhanced backgrounds from an on-disk cache ([`cache_key`], [`is_stale`])
//!
//! [`run_batch`] drives all of it for a directory of songs.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod anim;
pub(crate) mod cache;
pub(crate) mod compress;
pub(crate) mod config;
pub(crate) mod expr;
pub(crate) mod media;
pub(crate) mod pipeline;
pub(crate) mod plan;
pub(crate) mod render;
pub(crate) mod visibility;

pub use crate::foundation::error::{SongvidError, SongvidResult};
pub use crate::foundation::fs::list_mp4s;
pub use crate::foundation::time::{DURATION_EPSILON, Interval, TRUNCATION_REPORT_THRESHOLD};

pub use crate::anim::groups::{AnimationGroup, AnimationGroups, resolve_groups};
pub use crate::plan::schedule::{GroupSchedule, ScheduleMap, compute_schedule};
pub use crate::plan::strategy::{RenderStrategy, compute_render_strategy};

pub use crate::expr::ast::{Expr, Segment};
pub use crate::expr::ffmpeg::TimeVar;
pub use crate::visibility::{TransitionMode, Visibility, build_visibility};

pub use crate::cache::key::{CacheKey, DIGEST_LEN, cache_key};
pub use crate::cache::stale::{CachePolicy, FileStamps, FsStamps, is_stale, is_stale_with};
pub use crate::cache::store::EnhancedCache;

pub use crate::config::model::{
    DEFAULT_SCALE, DEFAULT_TRANSITION_S, DrawtextOptions, IfExists, JobConfig, OutputConfig,
    OutputLength, OverlayDecl, OverlayKind, PathsConfig, TransitionConfig,
};

pub use crate::media::probe::{DurationProvider, Ffprobe, TagProvider, is_ffprobe_on_path};
pub use crate::media::tags::AudioTags;

pub use crate::render::ffmpeg::{
    BackgroundJob, Encoder, FfmpegEncoder, FfmpegEncoderOpts, MuxJob, background_args,
    is_ffmpeg_on_path, mux_args,
};
pub use crate::render::filters::{FilterGraph, LayerContent, OverlayLayer, build_filter_graph};

pub use crate::pipeline::batch::{BatchReport, run_batch};
pub use crate::pipeline::rotation::BackgroundRotation;
pub use crate::pipeline::song::{
    Collaborators, RunOptions, SongOutcome, output_path_for, prepare_layers, process_song,
};
pub use crate::pipeline::song_plan::{SongPlan, plan_song};

pub use crate::compress::{CompressOpts, CompressReport, compress_args, compress_dir};
