//! Configuration loading through the binary.

use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use std::fs;

use crate::common::{FakeRegistry, TestEnv};

#[test]
fn test_missing_explicit_config_fails() {
    let env = TestEnv::new();
    let missing = env.home().join("nope.toml");

    env.depmap()
        .args(["--config", missing.to_str().unwrap(), "tree", "a", "1.0.0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn test_malformed_config_fails() {
    let env = TestEnv::new();
    let path = env.home().join("config.toml");
    fs::write(&path, "registry_url = = \"oops\"\n").unwrap();

    env.depmap()
        .args(["--config", path.to_str().unwrap(), "tree", "a", "1.0.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_unknown_key_fails() {
    let env = TestEnv::new();
    let path = env.home().join("config.toml");
    fs::write(&path, "registry = \"http://localhost\"\n").unwrap();

    env.depmap()
        .args(["--config", path.to_str().unwrap(), "tree", "a", "1.0.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("registry"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_registry_url_from_default_config_location() {
    let registry = FakeRegistry::new().package("a", "1.0.0", "1.0.0", &[]).start().await;
    let env = TestEnv::new();

    let dir = env.home().join(".depmap");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("config.toml"),
        format!("registry_url = \"{}\"\nfetch_retries = 0\n", registry.url),
    )
    .unwrap();

    let mut cmd = env.depmap();
    cmd.args(["tree", "a", "1.0.0"]);
    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap()).await.unwrap();

    output.assert().success().stdout(predicate::str::contains("a@1.0.0"));
    assert_eq!(registry.hits(), 1);
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread")]
async fn test_config_path_expands_tilde() {
    let registry = FakeRegistry::new().package("a", "2.0.0", "2.0.0", &[]).start().await;
    let env = TestEnv::new();
    fs::write(env.home().join("custom.toml"), format!("registry_url = \"{}\"\n", registry.url))
        .unwrap();

    let mut cmd = env.depmap();
    cmd.args(["--config", "~/custom.toml", "tree", "a", "2.0.0"]);
    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap()).await.unwrap();

    output.assert().success().stdout(predicate::str::contains("a@2.0.0"));
}
