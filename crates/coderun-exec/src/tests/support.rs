//! Helpers shared by unit tests.

use std::process::Command;

use tempfile::TempDir;

/// Writes an executable shell script standing in for the container runtime
/// and returns its path.
///
/// The file is written by a child shell so no descriptor for it is ever open
/// in the test process; otherwise a concurrent fork elsewhere in the test
/// binary can make the exec fail with `ETXTBSY`.
pub(crate) fn fake_runtime(dir: &TempDir, body: &str) -> String {
    let path = dir.path().join("runtime");
    let path = path.to_string_lossy().into_owned();
    let status = Command::new("sh")
        .arg("-c")
        .arg(r#"printf '#!/bin/sh\n%s\n' "$1" > "$2" && chmod 755 "$2""#)
        .arg("sh")
        .arg(body)
        .arg(&path)
        .status()
        .expect("write fake runtime");
    assert!(status.success(), "fake runtime script was not written");
    path
}
