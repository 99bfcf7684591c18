//! Integration tests for the `coderun` binary entry point.
//!
//! The container runtime is pointed at a path that does not exist, so every
//! well-formed request fails fast without starting anything.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use tempfile::TempDir;

fn command(workdir: &TempDir) -> assert_cmd::Command {
    let mut command = cargo_bin_cmd!("coderun");
    command
        .current_dir(workdir.path())
        .env("HOME", workdir.path())
        .env("CODERUN_CONTAINER_RUNTIME", "/nonexistent/coderun-runtime")
        .env("CODERUN_LOG_FORMAT", "compact");
    command
}

#[test]
fn unreachable_runtime_is_reported_per_request() {
    let workdir = TempDir::new().expect("tempdir");
    command(&workdir)
        .write_stdin("{\"language\":\"python\",\"code\":\"print('Hello!')\"}\n")
        .assert()
        .success()
        .stdout(contains("\"error_kind\":\"runtime_unavailable\""));
}

#[test]
fn malformed_request_does_not_stop_the_binary() {
    let workdir = TempDir::new().expect("tempdir");
    command(&workdir)
        .write_stdin("{oops\n{\"language\":\"brainfuck\",\"code\":\"+\"}\n")
        .assert()
        .success()
        .stdout(contains("\"error_kind\":\"invalid_request\""))
        .stdout(contains("\"error_kind\":\"unsupported_language\""));
}

#[test]
fn root_user_is_refused_at_startup() {
    let workdir = TempDir::new().expect("tempdir");
    command(&workdir)
        .env("CODERUN_USER", "0:0")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(contains("invalid sandbox policy"));
}
