//! Time-domain expression tree for overlay visibility.
//!
//! Expressions are built by the visibility builder, evaluated natively in tests and
//! diagnostics, and serialized to ffmpeg expression syntax only when the filter graph is
//! assembled.

pub(crate) mod ast;
pub(crate) mod ffmpeg;
