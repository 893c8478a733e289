//! Tests for the tileterm binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn tileterm(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tileterm").expect("binary exists");
    cmd.env_clear()
        .arg("--config")
        .arg(dir.path().join("config.toml"));
    cmd
}

#[test]
fn test_probe_reports_kitty() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    tileterm(&dir)
        .env("TERM", "xterm-kitty")
        .arg("--probe")
        .assert()
        .success()
        .stdout(predicate::str::contains("image protocol: yes"))
        .stdout(predicate::str::contains("renderer:       kitty"));
}

#[test]
fn test_probe_unknown_renderer_falls_back_to_auto() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    tileterm(&dir)
        .env("TERM", "xterm-256color")
        .args(["--probe", "--renderer", "hologram"])
        .assert()
        .success()
        .stdout(predicate::str::contains("override:       auto"))
        .stdout(predicate::str::contains("renderer:       braille"));
}

#[test]
fn test_ascii_frame_written_to_stdout() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    tileterm(&dir)
        .args(["--renderer", "ascii", "--frames", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\x1B[3;4H\x1B[38;2;255;255;0m"))
        .stdout(predicate::str::contains("renderer: ascii  frame: 2"));
}

#[test]
fn test_config_file_selects_renderer() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("config.toml"), "renderer = \"sixel\"\n")
        .expect("write config");
    tileterm(&dir)
        .arg("--probe")
        .assert()
        .success()
        .stdout(predicate::str::contains("renderer:       sixel"));
}

#[test]
fn test_bad_config_fails() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("config.toml"), "color = [\n").expect("write config");
    tileterm(&dir)
        .arg("--probe")
        .assert()
        .failure()
        .stderr(predicate::str::contains("loading configuration"));
}

#[test]
fn test_sixel_frame_draws_gradient() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    tileterm(&dir)
        .args(["--renderer", "sixel"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\x1B[2;17H\x1BPq\"1;1;64;32"))
        .stdout(predicate::str::starts_with("\x1B[?25l"))
        .stdout(predicate::str::ends_with("\x1B[?25h"));
}
