//! Unit tests for execution error types.

use std::sync::Arc;
use std::time::Duration;

use rstest::rstest;

use super::*;

#[test]
fn unsupported_language_lists_supported_set() {
    let error = ExecutionError::UnsupportedLanguage {
        language: "cobol".into(),
        supported: "python, rust".into(),
    };
    let message = error.to_string();
    assert!(
        message.contains("cobol"),
        "expected tag in message: {message}"
    );
    assert!(
        message.contains("python, rust"),
        "expected supported list in message: {message}"
    );
}

#[test]
fn launch_failure_exposes_io_source() {
    let error = ExecutionError::LaunchFailure {
        language: Language::Rust,
        message: "runtime binary not found".into(),
        source: Some(Arc::new(std::io::Error::other("missing"))),
    };
    assert!(std::error::Error::source(&error).is_some());
    assert!(error.to_string().contains("rust container failed to start"));
}

#[rstest]
#[case::runtime(
    ExecutionError::RuntimeUnavailable { runtime: "docker".into() },
    ErrorKind::RuntimeUnavailable,
    "runtime_unavailable"
)]
#[case::timeout(
    ExecutionError::Timeout { language: Language::Python, timeout: Duration::from_secs(2) },
    ErrorKind::Timeout,
    "timeout"
)]
#[case::non_zero(
    ExecutionError::NonZeroExit { language: Language::C, status: 3 },
    ErrorKind::NonZeroExit,
    "non_zero_exit"
)]
#[case::rejected(
    ExecutionError::DependencyRejected { name: "requests".into() },
    ErrorKind::DependencyRejected,
    "dependency_rejected"
)]
fn kinds_are_stable(
    #[case] error: ExecutionError,
    #[case] expected: ErrorKind,
    #[case] tag: &str,
) {
    assert_eq!(error.kind(), expected);
    assert_eq!(expected.to_string(), tag);
}

#[test]
fn error_kind_serialises_as_snake_case() {
    let json = serde_json::to_string(&ErrorKind::UnsupportedLanguage).expect("serialise kind");
    assert_eq!(json, "\"unsupported_language\"");
}

#[test]
fn execution_error_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ExecutionError>();
}

#[test]
fn timeout_message_includes_deadline() {
    let error = ExecutionError::Timeout {
        language: Language::Go,
        timeout: Duration::from_millis(1500),
    };
    let message = error.to_string();
    assert!(message.contains("1.5s"), "expected deadline in message: {message}");
}
