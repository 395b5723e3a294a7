use lasercam_settings::{Config, SettingsError};

#[test]
fn test_partial_toml_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lasercam.toml");
    std::fs::write(
        &path,
        "[layers]\ncut = \"Outline\"\n\n[sorting]\ninterleave_stride = 3\n",
    )
    .unwrap();

    let config = Config::load_from_file(&path).unwrap();
    assert_eq!(config.layers.cut, "Outline");
    assert_eq!(config.layers.engrave, "engrave");
    assert_eq!(config.sorting.interleave_stride, 3);
    assert_eq!(config.validation.tolerance, 0.001);
    assert_eq!(config.output.extension, "nc");
}

#[test]
fn test_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::new();
    config.estimate.factor = 1.2;
    config.profiles.default_material = Some("Cardboard".to_string());
    config.output.include_summary = false;

    for name in ["nested/lasercam.toml", "lasercam.json"] {
        let path = dir.path().join(name);
        config.save_to_file(&path).unwrap();
        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded, config, "{name}");
    }
}

#[test]
fn test_invalid_values_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{ "validation": { "tolerance": 0.0 } }"#).unwrap();

    let err = Config::load_from_file(&path).unwrap_err();
    assert!(matches!(
        err,
        SettingsError::InvalidSetting { ref key, .. } if key == "validation.tolerance"
    ));

    let mut config = Config::new();
    config.output.extension = "n c".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::new();
    config.sorting.interleave_stride = 0;
    assert!(config.save_to_file(&dir.path().join("x.toml")).is_err());
}

#[test]
fn test_malformed_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[layers\n").unwrap();
    assert!(matches!(
        Config::load_from_file(&path),
        Err(SettingsError::TomlError(_))
    ));

    let missing = dir.path().join("missing.json");
    assert!(matches!(
        Config::load_from_file(&missing),
        Err(SettingsError::LoadError(_))
    ));
}

#[test]
fn test_cache_path_override() {
    let mut config = Config::new();
    config.profiles.cache = Some("/tmp/profiles.json".into());
    assert_eq!(
        config.profiles.cache_path().unwrap(),
        std::path::PathBuf::from("/tmp/profiles.json")
    );
}
