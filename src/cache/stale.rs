use std::path::Path;
use std::time::SystemTime;

use anyhow::Context as _;

use crate::foundation::error::SongvidResult;

/// File existence and modification time lookups.
pub trait FileStamps {
    /// Return `true` when `path` exists.
    fn exists(&self, path: &Path) -> bool;
    /// Last modification time of `path`.
    fn modified(&self, path: &Path) -> SongvidResult<SystemTime>;
}

/// [`FileStamps`] backed by the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsStamps;

impl FileStamps for FsStamps {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn modified(&self, path: &Path) -> SongvidResult<SystemTime> {
        let meta = std::fs::metadata(path)
            .with_context(|| format!("stat '{}'", path.display()))?;
        let mtime = meta
            .modified()
            .with_context(|| format!("read mtime of '{}'", path.display()))?;
        Ok(mtime)
    }
}

/// Cache reuse policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CachePolicy {
    /// Regenerate regardless of timestamps.
    pub force_regenerate: bool,
}

impl CachePolicy {
    /// Decide whether the cached enhanced background must be rendered again.
    pub fn needs_regeneration(
        &self,
        stamps: &dyn FileStamps,
        cache: &Path,
        background: &Path,
        config: Option<&Path>,
    ) -> SongvidResult<bool> {
        if self.force_regenerate {
            return Ok(true);
        }
        is_stale_with(stamps, cache, background, config)
    }
}

/// Filesystem-backed [`is_stale_with`].
pub fn is_stale(cache: &Path, background: &Path, config: Option<&Path>) -> SongvidResult<bool> {
    is_stale_with(&FsStamps, cache, background, config)
}

/// A cache entry is stale when it is missing or older than the background or the config
/// source it was rendered from.
pub fn is_stale_with(
    stamps: &dyn FileStamps,
    cache: &Path,
    background: &Path,
    config: Option<&Path>,
) -> SongvidResult<bool> {
    if !stamps.exists(cache) {
        return Ok(true);
    }
    let cached_at = stamps.modified(cache)?;
    if stamps.modified(background)? > cached_at {
        return Ok(true);
    }
    if let Some(config) = config
        && stamps.modified(config)? > cached_at
    {
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
#[path = "../../tests/unit/cache/stale.rs"]
mod tests;
