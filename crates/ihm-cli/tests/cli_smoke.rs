//! CLI binary smoke tests using assert_cmd.
//!
//! These tests exercise the compiled `ihm` binary to verify that
//! argument parsing, help text, and end-to-end runs work.

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("ihm").unwrap()
}

const TWO_CLUSTERS: &str = "\
f1,f2,class
0.0,0.1,a
0.1,0.0,a
0.2,0.2,a
0.1,0.3,a
5.0,5.1,b
5.1,5.0,b
5.2,5.2,b
5.1,5.3,b
";

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

#[test]
fn no_args_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_flag() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("measure"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ihm"));
}

#[test]
fn config_prints_defaults() {
    cmd()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"k\": 10"))
        .stdout(predicate::str::contains("\"grid\""));
}

// ---------------------------------------------------------------------------
// Measure subcommand
// ---------------------------------------------------------------------------

#[test]
fn measure_no_input_errors() {
    cmd().arg("measure").assert().failure();
}

#[test]
fn measure_nonexistent_input_errors() {
    cmd()
        .args(["measure", "/nonexistent/instances.csv"])
        .assert()
        .failure();
}

#[test]
fn measure_writes_output_table() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("clusters.csv");
    std::fs::write(&input, TWO_CLUSTERS).unwrap();
    let output = dir.path().join("out.csv");

    cmd()
        .args(["measure", input.to_str().unwrap(), "-m", "kDN,N2", "-k", "3", "-o"])
        .arg(&output)
        .assert()
        .success();

    let text = std::fs::read_to_string(&output).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("instance,feature_N2,feature_kDN"));
    assert_eq!(lines.count(), 8);
}

#[test]
fn measure_single_class_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("one_class.csv");
    std::fs::write(&input, "f1,class\n0.0,a\n1.0,a\n").unwrap();

    cmd()
        .args(["measure", input.to_str().unwrap()])
        .assert()
        .failure();
}
