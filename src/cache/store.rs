use std::path::{Path, PathBuf};

use crate::cache::key::CacheKey;
use crate::foundation::error::{SongvidError, SongvidResult};

/// Directory of rendered enhanced backgrounds.
///
/// Renders are written to a staging file next to the entry and renamed over it on success, so
/// readers see either the previous complete file or the new one.
#[derive(Clone, Debug)]
pub struct EnhancedCache {
    dir: PathBuf,
}

impl EnhancedCache {
    /// Cache rooted at `dir`. The directory is created lazily.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for `key`.
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Path renders for `key` are written to before commit.
    pub fn staging_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!(".{}.partial.mp4", key.as_str()))
    }

    /// Create the cache directory and return a clean staging path for `key`.
    pub fn begin(&self, key: &CacheKey) -> SongvidResult<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| SongvidError::cache_write(&self.dir, format!("create dir: {e}")))?;
        let staging = self.staging_path(key);
        remove_if_exists(&staging)?;
        Ok(staging)
    }

    /// Atomically replace the entry for `key` with its staged render.
    pub fn commit(&self, key: &CacheKey) -> SongvidResult<PathBuf> {
        let staging = self.staging_path(key);
        let entry = self.entry_path(key);
        if !staging.is_file() {
            return Err(SongvidError::cache_write(
                &staging,
                "staged render is missing",
            ));
        }
        if let Err(e) = std::fs::rename(&staging, &entry) {
            let _ = std::fs::remove_file(&staging);
            return Err(SongvidError::cache_write(&entry, format!("rename: {e}")));
        }
        tracing::debug!(entry = %entry.display(), "committed enhanced background");
        Ok(entry)
    }

    /// Drop a staged render after a failed encode. The existing entry is left untouched.
    pub fn abort(&self, key: &CacheKey) -> SongvidResult<()> {
        remove_if_exists(&self.staging_path(key))
    }
}

fn remove_if_exists(path: &Path) -> SongvidResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SongvidError::cache_write(path, format!("remove: {e}"))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/store.rs"]
mod tests;
