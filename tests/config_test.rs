// tests/config_test.rs
use git_lifecycle::config::{parse_config, Config, ConfigStore, Prefixes, CONFIG_FILE_NAME};
use git_lifecycle::LifecycleError;
use std::fs;
use tempfile::TempDir;

fn store() -> (TempDir, ConfigStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::in_dir(dir.path());
    (dir, store)
}

#[test]
fn test_load_documented_example() {
    let json = r#"{
      "mainBranch": "main", "developBranch": "develop",
      "useStaging": false, "stagingBranch": "staging",
      "pushBranches": true, "createBranches": false, "debug": false,
      "prefixes": {"feature":"feature/","release":"release/","bugfix":"bugfix/","hotfix":"hotfix/"}
    }"#;
    assert_eq!(parse_config(json).unwrap(), Config::default());
}

#[test]
fn test_persist_then_load_round_trip() {
    let (_dir, store) = store();
    let config = Config {
        main_branch: "master".to_string(),
        develop_branch: "dev".to_string(),
        use_staging: true,
        staging_branch: Some("qa".to_string()),
        push_branches: false,
        create_branches: true,
        debug: true,
        remote: "upstream".to_string(),
        prefixes: Prefixes {
            feature: "feat/".to_string(),
            release: "rel/".to_string(),
            bugfix: "fix/".to_string(),
            hotfix: "hot/".to_string(),
        },
    };

    store.persist(&config).unwrap();

    assert_eq!(store.load().unwrap(), config);
}

#[test]
fn test_round_trip_fills_defaults() {
    let (_dir, store) = store();
    let config = Config {
        staging_branch: None,
        ..Config::default()
    };

    store.persist(&config).unwrap();

    // Persisted without a staging branch; the default fills it back in
    assert_eq!(store.load().unwrap(), Config::default());
}

#[test]
fn test_store_uses_standard_file_name() {
    let (dir, store) = store();
    assert_eq!(store.path(), dir.path().join(CONFIG_FILE_NAME));
    assert!(!store.exists());
    store.persist(&Config::default()).unwrap();
    assert!(store.exists());

    let text = fs::read_to_string(store.path()).unwrap();
    assert!(text.contains("\"mainBranch\": \"main\""));
    assert!(text.ends_with('\n'));
}

#[test]
fn test_load_partial_file_merges_defaults() {
    let (_dir, store) = store();
    fs::write(store.path(), r#"{"developBranch": "next", "pushBranches": false}"#).unwrap();

    let config = store.load().unwrap();

    assert_eq!(config.develop_branch, "next");
    assert!(!config.push_branches);
    assert_eq!(config.main_branch, "main");
    assert_eq!(config.prefixes, Prefixes::default());
}

#[test]
fn test_load_missing_file_is_configuration_error() {
    let (_dir, store) = store();
    let err = store.load().unwrap_err();
    assert!(matches!(err, LifecycleError::Configuration(_)));
}

#[test]
fn test_load_rejects_invalid_file() {
    let (_dir, store) = store();
    fs::write(store.path(), r#"{"useStaging": true, "stagingBranch": "qa env"}"#).unwrap();

    let err = store.load().unwrap_err();

    assert!(matches!(err, LifecycleError::Configuration(_)));
    assert!(err.to_string().contains("stagingBranch"));
}

#[test]
fn test_persist_rejects_invalid_config() {
    let (_dir, store) = store();
    let mut config = Config::default();
    config.prefixes.hotfix = String::new();

    let err = store.persist(&config).unwrap_err();

    assert!(err.to_string().contains("prefixes.hotfix is required"));
    assert!(!store.exists());
}
