use super::*;

#[test]
fn lists_matching_files_sorted() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["b.mp3", "a.MP3", "c.wav", "xmas_d.mp3"] {
        std::fs::write(dir.path().join(name), b"x").unwrap();
    }
    std::fs::create_dir(dir.path().join("nested.mp3")).unwrap();

    let names = |v: Vec<PathBuf>| -> Vec<String> {
        v.iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    };
    assert_eq!(
        names(list_with_extension(dir.path(), "mp3", "").unwrap()),
        vec!["a.MP3", "b.mp3", "xmas_d.mp3"]
    );
    assert_eq!(
        names(list_with_extension(dir.path(), "mp3", "xmas_").unwrap()),
        vec!["xmas_d.mp3"]
    );
}

#[test]
fn missing_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(list_with_extension(&dir.path().join("gone"), "mp3", "").is_err());
}
