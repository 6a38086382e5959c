use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn lettercount() -> Command {
    let mut cmd = Command::cargo_bin("lettercount").unwrap();
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[test]
fn wrong_argument_count_prints_usage() {
    lettercount()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage"));

    lettercount()
        .args(["in", "count", "sort", "extra"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn writes_sorted_report() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    fs::write(&input, "cbb\nBaA a\n").unwrap();
    let (count, sort) = (dir.path().join("count"), dir.path().join("sort"));

    lettercount()
        .arg(&input)
        .arg(&count)
        .arg(&sort)
        .args(["--map-workers", "2", "--split-size", "3"])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(count.join("part-r-00000")).unwrap(),
        "A 3\nB 3\nC 1\n"
    );
    assert_eq!(
        fs::read_to_string(sort.join("part-r-00000")).unwrap(),
        "A 3\nB 3\nC 1\n"
    );
    assert!(sort.join("_SUCCESS").is_file());
}

#[test]
fn empty_input_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    fs::write(&input, "").unwrap();

    lettercount()
        .arg(&input)
        .arg(dir.path().join("count"))
        .arg(dir.path().join("sort"))
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(dir.path().join("sort").join("part-r-00000")).unwrap(),
        ""
    );
}

#[test]
fn missing_input_fails_with_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    lettercount()
        .arg(dir.path().join("nope"))
        .arg(dir.path().join("count"))
        .arg(dir.path().join("sort"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("stage \"count\" failed"));
    assert!(!dir.path().join("sort").exists());
}

#[test]
fn invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    fs::write(&input, "abc").unwrap();

    lettercount()
        .arg(&input)
        .arg(dir.path().join("count"))
        .arg(dir.path().join("sort"))
        .env("LETTERCOUNT_MAX_ATTEMPTS", "0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_attempts"));
    assert!(!dir.path().join("count").exists());
}
