//! Integration tests for configuration loading feeding the engine

use super::test_utils::{keys, snapshot_in, write_file};
use dirsnap::config::ConfigLoader;
use dirsnap::engine::SnapshotEngine;
use dirsnap::fingerprint::Strategy;
use dirsnap::manifest::writer::WritePolicy;
use tempfile::TempDir;

/// A config file drives a full run
#[tokio::test]
async fn test_config_file_drives_engine() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("data");
    write_file(&root, "a.csv", "1,2");
    write_file(&root, "skip/b.csv", "3,4");
    write_file(&root, "c.txt", "c");

    let config_path = temp_dir.path().join("dirsnap.toml");
    std::fs::write(
        &config_path,
        format!(
            "[snapshot]\nroot = {:?}\nignore = [\"skip\"]\nextension = \".csv\"\nstrategy = \"content\"\nindent = 4\n",
            root.to_string_lossy()
        ),
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_path).unwrap();
    assert_eq!(config.snapshot.strategy, Strategy::ContentHash);
    assert_eq!(config.snapshot.write_policy, WritePolicy::Always);

    let report = SnapshotEngine::new(config.snapshot)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.files(), 1);
    assert_eq!(keys(&snapshot_in(&root).await), vec!["a.csv"]);
    let text = std::fs::read_to_string(root.join("manifest.json")).unwrap();
    assert!(text.starts_with("{\n    \"a.csv\""));
}

/// Invalid values in a config file surface as errors, not defaults
#[test]
fn test_invalid_strategy_in_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("dirsnap.toml");
    std::fs::write(&config_path, "[snapshot]\nstrategy = \"sha1\"\n").unwrap();

    assert!(ConfigLoader::load_from_file(&config_path).is_err());
}
