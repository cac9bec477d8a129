use super::*;
use tempfile::tempdir;

#[test]
fn test_settings_path_layout() {
    let path = settings_path_in(Path::new("/cache"));
    assert_eq!(path, PathBuf::from("/cache/treesync/settings.json"));
}

#[test]
fn test_ensure_writes_defaults_once() {
    let dir = tempdir().unwrap();
    let path = settings_path_in(dir.path());

    ensure_settings_file_at(&path).unwrap();
    let loaded = load_settings_from(&path).unwrap();
    assert_eq!(loaded.max_cached_trees, 16);
    assert_eq!(loaded.installed_languages, vec!["python", "json"]);

    std::fs::write(&path, r#"{"max_cached_trees": 4}"#).unwrap();
    ensure_settings_file_at(&path).unwrap();
    assert_eq!(load_settings_from(&path).unwrap().max_cached_trees, 4);
}

#[test]
fn test_partial_file_keeps_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{
            "debug": true,
            "installed_languages": ["rust", "python"],
            "language_name_to_debounce_ms": {"rust": 120}
        }"#,
    )
    .unwrap();

    let settings = load_settings_from(&path).unwrap();
    assert!(settings.debug);
    assert_eq!(settings.max_cached_trees, 16);
    assert_eq!(settings.debounce_ms("rust"), 120);
    assert!(settings.file_ignore_patterns.is_empty());
}

#[test]
fn test_missing_or_malformed_file_is_none() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    assert!(load_settings_from(&path).is_none());

    std::fs::write(&path, "{ not json").unwrap();
    assert!(load_settings_from(&path).is_none());
}
