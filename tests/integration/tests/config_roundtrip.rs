//! Config save/load roundtrip tests.

use shellgym::EnvConfig;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("env.json");

    let config = EnvConfig::default();
    config.save(&path).unwrap();

    let loaded = EnvConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_config_modify_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("env.json");

    let config = EnvConfig::new("ubuntu:24.04").with_timeout_secs(30);
    config.save(&path).unwrap();

    let loaded = EnvConfig::load(&path).unwrap();
    assert_eq!(loaded.image, "ubuntu:24.04");
    assert_eq!(loaded.timeout_secs, 30);
}

#[test]
fn test_config_load_nonexistent() {
    assert!(EnvConfig::load(Path::new("/nonexistent/env.json")).is_err());
}

#[test]
fn test_config_load_rejects_invalid_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("env.json");
    std::fs::write(&path, r#"{"image": "", "timeout_secs": 0}"#).unwrap();

    assert!(EnvConfig::load(&path).is_err());
}
