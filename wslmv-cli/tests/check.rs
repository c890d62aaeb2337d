#![cfg(unix)]

use predicates::prelude::*;
use rstest::rstest;

mod common;

#[test]
fn test_check_reports_satisfied_preconditions() {
    let ctx = common::TestContext::new();

    ctx.cmd()
        .args([
            "check",
            "--source",
            ctx.source.to_str().unwrap(),
            "--target",
            ctx.target.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Preconditions satisfied"));

    // Check never mutates anything.
    assert!(!ctx.target.exists());
}

#[test]
fn test_check_json_summary() {
    let ctx = common::TestContext::new();

    let output = ctx
        .cmd()
        .args([
            "--json",
            "check",
            "--source",
            ctx.source.to_str().unwrap(),
            "--target",
            ctx.target.to_str().unwrap(),
        ])
        .assert()
        .success()
        .get_output()
        .clone();

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["source_bytes"], 16); // b"disk image bytes"
    assert!(summary["free_bytes"].as_u64().unwrap() > 0);
}

#[test]
fn test_check_insufficient_space() {
    let ctx = common::TestContext::new();

    ctx.cmd()
        .args([
            "check",
            "--source",
            ctx.source.to_str().unwrap(),
            "--target",
            ctx.target.to_str().unwrap(),
            "--margin-gib",
            "10000000",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("insufficient space"));
}

#[test]
fn test_check_rejects_same_source_and_target() {
    let ctx = common::TestContext::new();

    ctx.cmd()
        .args([
            "check",
            "--source",
            ctx.source.to_str().unwrap(),
            "--target",
            ctx.source.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("same path"));
}

#[rstest]
#[case("tarball")]
#[case("copy")]
#[case("relink")]
fn test_check_rejects_unknown_strategy(#[case] strategy: &str) {
    let ctx = common::TestContext::new();

    ctx.cmd()
        .args([
            "check",
            "--source",
            ctx.source.to_str().unwrap(),
            "--target",
            ctx.target.to_str().unwrap(),
            "--strategy",
            strategy,
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown strategy"));
}
