//! End-to-end tests for the redelim binary
//!
//! Each test copies the built binary into a fresh directory and runs it from
//! somewhere else, so the files it touches prove that the base directory is
//! taken from the executable's location:
//! - Conversion and archiving
//! - The empty-directory exit code
//! - Per-file failures
//! - Invalid configuration

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "REDELIM_SOURCE_DELIMITER",
    "REDELIM_DESTINATION_DELIMITER",
    "REDELIM_EXTENSION",
    "REDELIM_MARKER_SUFFIX",
    "REDELIM_ARCHIVE_DIR",
    "REDELIM_LOG_LEVEL",
    "REDELIM_LOG_FORMAT",
    "REDELIM_PAUSE_SECS",
];

/// Helper to place a copy of the binary in `dir`
fn install_binary(dir: &Path) -> PathBuf {
    let built = assert_cmd::cargo::cargo_bin("redelim");
    let target = dir.join(built.file_name().expect("binary has a file name"));
    fs::copy(&built, &target).expect("copy binary");
    target
}

/// Helper to build a command for the copied binary, run from an unrelated cwd
fn redelim(binary: &Path, cwd: &Path) -> Command {
    let mut cmd = Command::new(binary);
    cmd.current_dir(cwd).arg("--no-pause");
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn read_log(dir: &Path) -> String {
    fs::read_to_string(dir.join("redelim.log")).expect("log file exists")
}

// ============================================================================
// Successful Runs
// ============================================================================

#[test]
fn test_converts_and_archives_next_to_binary() {
    let base = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    let binary = install_binary(base.path());

    fs::write(base.path().join("a.csv"), "José<Ñandú;X<y>z\n").unwrap();
    fs::write(base.path().join("b_ok.csv"), "left;alone\r\n").unwrap();
    // A file in the working directory must not be touched
    fs::write(elsewhere.path().join("c.csv"), "c<d\n").unwrap();

    redelim(&binary, elsewhere.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed file saved as:"))
        .stdout(predicate::str::contains("Processed 1 file(s) successfully."));

    assert_eq!(
        fs::read_to_string(base.path().join("a_ok.csv")).unwrap(),
        "Jose;NanduX;yz\r\n"
    );
    assert!(!base.path().join("a.csv").exists());
    assert_eq!(
        fs::read_to_string(base.path().join("originals").join("a.csv")).unwrap(),
        "José<Ñandú;X<y>z\n"
    );

    // Already-processed files are never selected
    assert!(!base.path().join("b_ok_ok.csv").exists());
    assert!(base.path().join("b_ok.csv").exists());

    assert!(elsewhere.path().join("c.csv").exists());
    assert!(!elsewhere.path().join("redelim.log").exists());

    let log = read_log(base.path());
    assert!(log.contains("Moved original a.csv"));
    assert!(log.contains("end of run"));
}

#[test]
fn test_empty_directory_exits_with_one() {
    let base = TempDir::new().unwrap();
    let binary = install_binary(base.path());

    redelim(&binary, base.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("No CSV files found in the directory."));

    let log = read_log(base.path());
    assert!(log.contains("No CSV files found in the directory."));
    assert!(!base.path().join("originals").exists());
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_undecodable_file_is_left_in_place() {
    let base = TempDir::new().unwrap();
    let binary = install_binary(base.path());

    fs::write(base.path().join("bad.csv"), b"caf\xe9<x\n").unwrap();
    fs::write(base.path().join("good.csv"), "a<b\n").unwrap();

    redelim(&binary, base.path()).assert().success();

    assert!(base.path().join("bad.csv").exists());
    assert!(!base.path().join("bad_ok.csv").exists());
    assert!(base.path().join("good_ok.csv").exists());
    assert!(base.path().join("originals").join("good.csv").exists());

    let log = read_log(base.path());
    assert!(log.contains("Error processing"));
    assert!(log.contains("1 file(s) failed and were left in place: bad.csv"));
}

#[test]
fn test_invalid_config_aborts_with_trace() {
    let base = TempDir::new().unwrap();
    let binary = install_binary(base.path());

    fs::write(base.path().join("redelim.toml"), "archive_dir = '../escape'\n").unwrap();
    fs::write(base.path().join("a.csv"), "a<b\n").unwrap();

    redelim(&binary, base.path()).assert().code(70);

    assert!(base.path().join("a.csv").exists());
    let log = read_log(base.path());
    assert!(log.contains("[config] Unexpected error during init"));
    assert!(log.contains("Stack trace:"));
    assert!(log.contains("end of run"));
}

#[test]
fn test_custom_delimiters_from_config_file() {
    let base = TempDir::new().unwrap();
    let binary = install_binary(base.path());

    fs::write(
        base.path().join("redelim.toml"),
        "source_delimiter = '|'\ndestination_delimiter = ','\n",
    )
    .unwrap();
    fs::write(base.path().join("a.csv"), "x|y,z\n").unwrap();

    redelim(&binary, base.path()).assert().success();

    // The new destination delimiter is stripped from fields
    assert_eq!(
        fs::read_to_string(base.path().join("a_ok.csv")).unwrap(),
        "x,yz\r\n"
    );
}
