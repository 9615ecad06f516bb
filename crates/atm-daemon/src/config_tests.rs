// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("does-not-exist.toml");

    let config = Config::load(&path).unwrap();
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.environment.android.avd_name, "Pixel6_API33");
}

#[test]
fn partial_file_fills_in_defaults_for_missing_sections() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("atmd.toml");
    std::fs::write(&path, "[server]\nport = 9090\n").unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.workers.max_workers, 10);
}

#[test]
fn malformed_file_is_reported_as_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("atmd.toml");
    std::fs::write(&path, "this is not [ valid toml").unwrap();

    assert!(Config::load(&path).is_err());
}

#[test]
fn full_file_overrides_every_section() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("atmd.toml");
    std::fs::write(
        &path,
        r#"
[server]
host = "0.0.0.0"
port = 9999

[workers]
max_workers = 4
worker_types = ["env"]

[environment.android]
snapshot_dir = "/var/atm/snapshots"
claim_dir = "/var/atm/claims"
emulator_path = "/opt/sdk/emulator/emulator"
adb_path = "/opt/sdk/platform-tools/adb"
avd_name = "Pixel7_API34"
base_port = 5600
boot_timeout_secs = 120
max_idle_secs = 1800
idle_sweep_secs = 30

[logging]
level = "debug"
log_dir = "/var/log/atmd"
"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9999);
    assert_eq!(config.workers.max_workers, 4);
    assert_eq!(config.workers.worker_types, vec!["env".to_string()]);
    assert_eq!(
        config.environment.android.snapshot_dir,
        PathBuf::from("/var/atm/snapshots")
    );
    assert_eq!(config.environment.android.avd_name, "Pixel7_API34");
    assert_eq!(config.environment.android.base_port, 5600);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.log_dir, PathBuf::from("/var/log/atmd"));
}
