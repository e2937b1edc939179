//! Batch orchestration: one song at a time, failures isolated per song.

pub(crate) mod batch;
pub(crate) mod rotation;
pub(crate) mod song;
pub(crate) mod song_plan;
