//! Job configuration loaded from a JSON file.
//!
//! The configuration is an explicit value passed into each pipeline step; nothing is read at
//! module load time.

pub(crate) mod model;
