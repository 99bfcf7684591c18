//! Domain errors raised by sandboxed execution.
//!
//! Every failure is a variant of [`ExecutionError`] with structured context,
//! and maps onto a stable [`ErrorKind`] that the tool layer reports to
//! callers. I/O errors are wrapped in `Arc` to satisfy the `result_large_err`
//! Clippy lint.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::language::Language;

/// Errors arising from a single execution request.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The container engine could not be reached.
    #[error("container runtime '{runtime}' is not available or not running")]
    RuntimeUnavailable {
        /// Runtime binary that was probed.
        runtime: String,
    },

    /// The language tag has no registered executor.
    #[error("unsupported language '{language}' (supported: {supported})")]
    UnsupportedLanguage {
        /// Tag supplied by the caller.
        language: String,
        /// Comma-separated list of supported tags.
        supported: String,
    },

    /// The request itself is malformed.
    #[error("invalid execution request: {message}")]
    InvalidRequest {
        /// Description of the problem.
        message: String,
    },

    /// A dependency name is unsafe to pass to an installer.
    #[error("invalid dependency '{name}': {reason}")]
    InvalidDependency {
        /// Offending dependency name.
        name: String,
        /// Why the name was refused.
        reason: String,
    },

    /// A dependency is not on the configured allow-list.
    #[error("dependency '{name}' is not on the allowed package list")]
    DependencyRejected {
        /// Offending dependency name.
        name: String,
    },

    /// The container process could not be started.
    #[error("{language} container failed to start: {message}")]
    LaunchFailure {
        /// Language of the request.
        language: Language,
        /// Human-readable failure description.
        message: String,
        /// Optional underlying I/O error.
        #[source]
        source: Option<Arc<io::Error>>,
    },

    /// The program did not finish within the request deadline.
    #[error("{language} execution timed out after {timeout:?}")]
    Timeout {
        /// Language of the request.
        language: Language,
        /// Deadline that elapsed.
        timeout: Duration,
    },

    /// The contained program ran and exited unsuccessfully.
    #[error("{language} program exited with non-zero status {status}")]
    NonZeroExit {
        /// Language of the request.
        language: Language,
        /// Exit status, or `-1` when terminated by a signal.
        status: i32,
    },
}

impl ExecutionError {
    /// Returns the stable classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::RuntimeUnavailable { .. } => ErrorKind::RuntimeUnavailable,
            Self::UnsupportedLanguage { .. } => ErrorKind::UnsupportedLanguage,
            Self::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            Self::InvalidDependency { .. } => ErrorKind::InvalidDependency,
            Self::DependencyRejected { .. } => ErrorKind::DependencyRejected,
            Self::LaunchFailure { .. } => ErrorKind::LaunchFailure,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::NonZeroExit { .. } => ErrorKind::NonZeroExit,
        }
    }

    pub(crate) fn launch(language: Language, message: impl Into<String>) -> Self {
        Self::LaunchFailure {
            language,
            message: message.into(),
            source: None,
        }
    }
}

/// Stable, serialisable classification of an [`ExecutionError`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Container engine unreachable.
    RuntimeUnavailable,
    /// Language tag not registered.
    UnsupportedLanguage,
    /// Malformed request or undecodable tool input.
    InvalidRequest,
    /// Unsafe dependency name.
    InvalidDependency,
    /// Dependency outside the allow-list.
    DependencyRejected,
    /// Container could not be started.
    LaunchFailure,
    /// Deadline exceeded.
    Timeout,
    /// Program exited unsuccessfully.
    NonZeroExit,
}

#[cfg(test)]
mod tests;
