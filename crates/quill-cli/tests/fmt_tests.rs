//! Formatter CLI tests
//!
//! Covers check mode, in-place rewriting, stdout mode, directory
//! recursion, configuration flags, and error handling.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

fn temp_quill_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".quill").unwrap();
    write!(file, "{}", content).unwrap();
    file
}

fn quill() -> Command {
    Command::cargo_bin("quill").unwrap()
}

// === Check mode ===

#[test]
fn test_check_mode_accepts_formatted_file() {
    let file = temp_quill_file("1 + 2\n");
    quill()
        .args(["fmt", "--check", file.path().to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("formatted correctly"));
}

#[test]
fn test_check_mode_rejects_unformatted_file() {
    let file = temp_quill_file("1+2");
    quill()
        .args(["fmt", "--check", file.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Would reformat"));
}

#[test]
fn test_check_mode_does_not_modify_files() {
    let file = temp_quill_file("1+2");
    quill()
        .args(["fmt", "--check", file.path().to_str().unwrap()])
        .assert()
        .failure();
    assert_eq!(fs::read_to_string(file.path()).unwrap(), "1+2");
}

// === Writing ===

#[test]
fn test_fmt_rewrites_in_place() {
    let file = temp_quill_file("1  +  2");
    quill()
        .args(["fmt", file.path().to_str().unwrap()])
        .assert()
        .success();
    assert_eq!(fs::read_to_string(file.path()).unwrap(), "1 + 2\n");
}

#[test]
fn test_fmt_stdout_leaves_file_alone() {
    let file = temp_quill_file("1+2");
    quill()
        .args(["fmt", "--stdout", file.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout("1 + 2\n");
    assert_eq!(fs::read_to_string(file.path()).unwrap(), "1+2");
}

#[test]
fn test_fmt_directory_recurses() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("nested");
    fs::create_dir(&nested).unwrap();
    fs::write(dir.path().join("a.quill"), "1+2").unwrap();
    fs::write(nested.join("b.quill"), "f( 1 )").unwrap();
    fs::write(nested.join("untouched.txt"), "1+2").unwrap();

    quill()
        .args(["fmt", dir.path().to_str().unwrap()])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(dir.path().join("a.quill")).unwrap(),
        "1 + 2\n"
    );
    assert_eq!(
        fs::read_to_string(nested.join("b.quill")).unwrap(),
        "f(1)\n"
    );
    assert_eq!(
        fs::read_to_string(nested.join("untouched.txt")).unwrap(),
        "1+2"
    );
}

// === Configuration ===

#[test]
fn test_indent_flag() {
    let file = temp_quill_file("{1,2}");
    quill()
        .args(["fmt", "--indent", "2", file.path().to_str().unwrap()])
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(file.path()).unwrap(),
        "{\n  1,\n  2\n}\n"
    );
}

#[test]
fn test_tabs_flag() {
    let file = temp_quill_file("{1,2}");
    quill()
        .args(["fmt", "--tabs", file.path().to_str().unwrap()])
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(file.path()).unwrap(),
        "{\n\t1,\n\t2\n}\n"
    );
}

#[test]
fn test_newline_flag() {
    let file = temp_quill_file("1+2");
    quill()
        .args(["fmt", "--newline", "crlf", file.path().to_str().unwrap()])
        .assert()
        .success();
    assert_eq!(fs::read_to_string(file.path()).unwrap(), "1 + 2\r\n");
}

#[test]
fn test_invalid_newline_flag() {
    let file = temp_quill_file("1+2");
    quill()
        .args(["fmt", "--newline", "cr", file.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown newline style"));
}

#[test]
fn test_config_file() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("quill.toml");
    fs::write(&config, "indent_size = 2\n").unwrap();
    let source = dir.path().join("a.quill");
    fs::write(&source, "{1,2}").unwrap();

    quill()
        .args([
            "fmt",
            "--config",
            config.to_str().unwrap(),
            source.to_str().unwrap(),
        ])
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(&source).unwrap(),
        "{\n  1,\n  2\n}\n"
    );
}

#[test]
fn test_cli_flag_overrides_config_file() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("quill.toml");
    fs::write(&config, "indent_size = 2\n").unwrap();
    let source = dir.path().join("a.quill");
    fs::write(&source, "{1,2}").unwrap();

    quill()
        .args([
            "fmt",
            "--config",
            config.to_str().unwrap(),
            "--indent",
            "8",
            source.to_str().unwrap(),
        ])
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(&source).unwrap(),
        "{\n        1,\n        2\n}\n"
    );
}

// === Errors ===

#[test]
fn test_missing_file() {
    quill()
        .args(["fmt", "--check", "nonexistent.quill"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_parse_error_reports_and_fails() {
    let file = temp_quill_file("1 +");
    quill()
        .args(["fmt", file.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Formatting failed"));
    // a file with errors is never rewritten
    assert_eq!(fs::read_to_string(file.path()).unwrap(), "1 +");
}

#[test]
fn test_localized_error_prefix() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("quill.toml");
    fs::write(&config, "locale = \"fr-FR\"\n").unwrap();
    let source = dir.path().join("bad.quill");
    fs::write(&source, "1 +").unwrap();

    quill()
        .args([
            "fmt",
            "--config",
            config.to_str().unwrap(),
            source.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Échec du formatage"));
}
