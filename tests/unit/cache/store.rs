use super::*;
use crate::cache::key::cache_key;

#[test]
fn commit_replaces_entry_with_staged_file() {
    let dir = tempfile::tempdir().unwrap();
    let cache = EnhancedCache::new(dir.path().join("enh"));
    let key = cache_key("bg.mp4", "song.mp3");

    let staging = cache.begin(&key).unwrap();
    assert!(cache.dir().is_dir());
    std::fs::write(&staging, b"v1").unwrap();
    let entry = cache.commit(&key).unwrap();
    assert_eq!(entry, cache.entry_path(&key));
    assert_eq!(std::fs::read(&entry).unwrap(), b"v1");
    assert!(!staging.exists());

    let staging = cache.begin(&key).unwrap();
    std::fs::write(&staging, b"v2").unwrap();
    cache.commit(&key).unwrap();
    assert_eq!(std::fs::read(&entry).unwrap(), b"v2");
}

#[test]
fn begin_clears_leftover_staging() {
    let dir = tempfile::tempdir().unwrap();
    let cache = EnhancedCache::new(dir.path());
    let key = cache_key("bg.mp4", "song.mp3");
    std::fs::write(cache.staging_path(&key), b"half-written").unwrap();
    let staging = cache.begin(&key).unwrap();
    assert!(!staging.exists());
}

#[test]
fn abort_keeps_previous_entry() {
    let dir = tempfile::tempdir().unwrap();
    let cache = EnhancedCache::new(dir.path());
    let key = cache_key("bg.mp4", "song.mp3");
    std::fs::write(cache.entry_path(&key), b"old").unwrap();

    let staging = cache.begin(&key).unwrap();
    std::fs::write(&staging, b"partial").unwrap();
    cache.abort(&key).unwrap();
    assert!(!staging.exists());
    assert_eq!(std::fs::read(cache.entry_path(&key)).unwrap(), b"old");
}

#[test]
fn commit_without_staged_render_is_a_cache_write_failure() {
    let dir = tempfile::tempdir().unwrap();
    let cache = EnhancedCache::new(dir.path());
    let key = cache_key("bg.mp4", "song.mp3");
    assert!(matches!(
        cache.commit(&key),
        Err(SongvidError::CacheWriteFailure { .. })
    ));
}

#[test]
fn unwritable_cache_dir_is_a_cache_write_failure() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();
    let cache = EnhancedCache::new(blocker.join("enh"));
    let key = cache_key("bg.mp4", "song.mp3");
    assert!(matches!(
        cache.begin(&key),
        Err(SongvidError::CacheWriteFailure { .. })
    ));
}
