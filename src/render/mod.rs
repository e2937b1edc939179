//! Render boundary: ffmpeg filter graphs and encoder invocations.

pub(crate) mod ffmpeg;
pub(crate) mod filters;
