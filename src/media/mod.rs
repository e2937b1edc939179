//! Media probing through the system `ffprobe` binary.

pub(crate) mod probe;
pub(crate) mod tags;
