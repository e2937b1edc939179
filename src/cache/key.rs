use std::fmt;
use std::path::Path;

use sha2::Digest as _;

/// Hex characters of the audio digest kept in the key.
pub const DIGEST_LEN: usize = 7;

/// Cache identity for one (background, song) pair: `{background-stem}__enh_{digest}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the cached enhanced background.
    pub fn file_name(&self) -> String {
        format!("{}.mp4", self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the cache key from the background and audio file names.
///
/// Pure: the same pair always maps to the same key, and different songs over the same
/// background map to different keys.
pub fn cache_key(background_filename: &str, audio_filename: &str) -> CacheKey {
    let stem = Path::new(background_filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| background_filename.to_owned());
    let digest = sha256_hex(audio_filename.as_bytes());
    CacheKey(format!("{stem}__enh_{}", &digest[..DIGEST_LEN]))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/cache/key.rs"]
mod tests;
