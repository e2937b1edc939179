use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::SongvidResult;

/// Regular files directly inside `dir` with extension `ext` (any case) whose name starts with
/// `prefix`, sorted by path.
pub(crate) fn list_with_extension(
    dir: &Path,
    ext: &str,
    prefix: &str,
) -> SongvidResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("read directory '{}'", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read directory '{}'", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches_ext = path
            .extension()
            .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(ext));
        let matches_prefix = path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with(prefix));
        if matches_ext && matches_prefix {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// `*.mp4` files directly inside `dir`, sorted by name.
pub fn list_mp4s(dir: &Path, prefix: &str) -> SongvidResult<Vec<PathBuf>> {
    list_with_extension(dir, "mp4", prefix)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/fs.rs"]
mod tests;
