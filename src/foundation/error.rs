use std::path::PathBuf;

/// Convenience result type used across songvid.
pub type SongvidResult<T> = Result<T, SongvidError>;

/// Error taxonomy for the scheduling, caching and rendering pipeline.
///
/// Every variant is scoped to a single song; the batch orchestrator decides whether to
/// continue with the next one.
#[derive(thiserror::Error, Debug)]
pub enum SongvidError {
    /// Invalid user-provided configuration or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// The same animation group was declared with two different durations.
    #[error(
        "configuration inconsistency: animation group '{group}' declared with duration {first}s and {second}s"
    )]
    ConfigurationInconsistency {
        /// Group name.
        group: String,
        /// Duration fixed by the first declaration.
        first: f64,
        /// Conflicting duration of a later declaration.
        second: f64,
    },

    /// A media file could not be probed.
    #[error("media unreadable: '{}': {reason}", path.display())]
    MediaUnreadable {
        /// File that failed to probe.
        path: PathBuf,
        /// Probe failure detail.
        reason: String,
    },

    /// The enhanced-background cache could not be written or replaced.
    #[error("cache write failure: '{}': {reason}", path.display())]
    CacheWriteFailure {
        /// Cache file or directory involved.
        path: PathBuf,
        /// IO failure detail.
        reason: String,
    },

    /// The external encoder failed.
    #[error("render error: {0}")]
    Render(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SongvidError {
    /// Build a [`SongvidError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SongvidError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`SongvidError::MediaUnreadable`] value.
    pub fn media_unreadable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MediaUnreadable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`SongvidError::CacheWriteFailure`] value.
    pub fn cache_write(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CacheWriteFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
