//! Normalised execution results and their wire form.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, ExecutionError};

/// Outcome of one execution request.
///
/// `output` carries whatever the program wrote, even when `error` is set, so
/// callers must examine both. Only timeouts leave `output` empty.
#[derive(Debug)]
pub struct ExecutionResult {
    output: String,
    error: Option<ExecutionError>,
}

impl ExecutionResult {
    /// A successful run with merged output.
    #[must_use]
    pub const fn success(output: String) -> Self {
        Self {
            output,
            error: None,
        }
    }

    /// A failed run, with whatever output was captured.
    #[must_use]
    pub const fn failure(output: String, error: ExecutionError) -> Self {
        Self {
            output,
            error: Some(error),
        }
    }

    /// A failure detected before anything ran; the error message is the
    /// only diagnostic, so it also becomes the output.
    #[must_use]
    pub fn rejected(error: ExecutionError) -> Self {
        Self {
            output: error.to_string(),
            error: Some(error),
        }
    }

    /// Merged stdout and stderr.
    #[must_use]
    pub const fn output(&self) -> &str {
        self.output.as_str()
    }

    /// Classified failure, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&ExecutionError> {
        self.error.as_ref()
    }

    /// Returns `true` when no failure was recorded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Splits the result into output and error.
    #[must_use]
    pub fn into_parts(self) -> (String, Option<ExecutionError>) {
        (self.output, self.error)
    }

    /// Renders the result for the tool layer.
    #[must_use]
    pub fn to_response(&self) -> ToolResponse {
        ToolResponse {
            output: self.output.clone(),
            error: self.error.as_ref().map(ToString::to_string),
            error_kind: self.error.as_ref().map(ExecutionError::kind),
        }
    }
}

/// Result payload returned to the outer tool layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResponse {
    /// Merged stdout and stderr.
    pub output: String,
    /// Human-readable failure, or `null` on success.
    pub error: Option<String>,
    /// Stable failure classification, or `null` on success.
    pub error_kind: Option<ErrorKind>,
}

impl ToolResponse {
    /// A failure that happened before a request could be formed. The
    /// message doubles as the output, like any other diagnostic.
    #[must_use]
    pub fn rejected(kind: ErrorKind, message: String) -> Self {
        Self {
            output: message.clone(),
            error: Some(message),
            error_kind: Some(kind),
        }
    }

    /// Returns `true` when the response carries no error.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
