//! Tests of the `depmap` binary.

use assert_cmd::Command;
use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use std::process::Output;

use crate::common::{FakeRegistry, TestEnv};

/// Run `cmd` off the async runtime so the fake registry keeps serving.
async fn run(mut cmd: Command) -> Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap()).await.unwrap()
}

fn sample_registry() -> FakeRegistry {
    FakeRegistry::new()
        .package("a", "1.0.0", "1.0.0", &[("b", "^2.0.0"), ("missing", "1.0.0")])
        .package("b", "2.0.0", "2.1.0", &[])
}

#[test]
fn test_help_lists_commands() {
    let env = TestEnv::new();
    env.depmap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("tree"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn test_empty_version_is_rejected() {
    let env = TestEnv::new();
    env.depmap()
        .args(["tree", "a", ""])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Version can't be empty"));
}

#[test]
fn test_empty_package_is_rejected() {
    let env = TestEnv::new();
    env.depmap()
        .args(["tree", "", "1.0.0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Package name must not be empty"));
}

#[test]
fn test_invalid_format_is_rejected() {
    let env = TestEnv::new();
    env.depmap()
        .args(["tree", "a", "1.0.0", "--format", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid format"));
}

#[test]
fn test_invalid_registry_url_is_rejected() {
    let env = TestEnv::new();
    env.depmap()
        .args(["--registry", "ftp://example.com", "tree", "a", "1.0.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("registry_url"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_tree_output() {
    let registry = sample_registry().start().await;
    let env = TestEnv::new();

    let mut cmd = env.depmap();
    cmd.args(["--registry", &registry.url, "tree", "a", "1.0.0"]);

    run(cmd)
        .await
        .assert()
        .success()
        .stdout(predicate::str::contains("a@1.0.0"))
        .stdout(predicate::str::contains("├── b@2.1.0 (^2.0.0)"))
        .stdout(predicate::str::contains("└── missing@1.0.0 (unresolved)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_json_output() {
    let registry = sample_registry().start().await;
    let env = TestEnv::new();

    let mut cmd = env.depmap();
    cmd.args(["-q", "--registry", &registry.url, "tree", "a", "1.0.0", "--format", "json"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["name"], "a");
    assert_eq!(json["version"]["originalExpression"], "1.0.0");
    assert_eq!(json["version"]["minimalVersion"], "1.0.0");

    let b = &json["dependencies"][0];
    assert_eq!(b["name"], "b");
    assert_eq!(b["version"]["originalExpression"], "^2.0.0");
    assert_eq!(b["version"]["minimalVersion"], "2.1.0");
    assert!(b["version"].get("searchExpression").is_none());

    let missing = &json["dependencies"][1];
    assert_eq!(missing["name"], "missing");
    assert!(missing["version"]["minimalVersion"].is_null());
    assert_eq!(missing["dependencies"], serde_json::json!([]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_package_is_not_an_error() {
    let registry = FakeRegistry::new().start().await;
    let env = TestEnv::new();

    let mut cmd = env.depmap();
    cmd.args(["--registry", &registry.url, "tree", "nope", "latest"]);

    run(cmd)
        .await
        .assert()
        .success()
        .stdout(predicate::str::contains("nope@latest (unresolved)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_depth_limits_output() {
    let registry = FakeRegistry::new()
        .package("a", "1.0.0", "1.0.0", &[("b", "1.0.0")])
        .package("b", "1.0.0", "1.0.0", &[("c", "1.0.0")])
        .package("c", "1.0.0", "1.0.0", &[])
        .start()
        .await;
    let env = TestEnv::new();

    let mut cmd = env.depmap();
    cmd.args(["--registry", &registry.url, "tree", "a", "1.0.0", "--depth", "1"]);

    run(cmd)
        .await
        .assert()
        .success()
        .stdout(predicate::str::contains("b@1.0.0"))
        .stdout(predicate::str::contains("c@1.0.0").not());
}
