//! Execution requests and their wire form.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Deadline applied when a request is built without an explicit timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(coderun_config::DEFAULT_TIMEOUT_SECS);

/// One request to run untrusted source code.
///
/// The language stays a raw tag so unsupported values can be reported with
/// the supported set rather than rejected at construction.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use coderun_exec::ExecutionRequest;
///
/// let request = ExecutionRequest::new("python", "print(input())")
///     .with_stdin("hello")
///     .with_timeout(Duration::from_secs(5));
/// assert_eq!(request.language(), "python");
/// assert_eq!(request.input(), b"print(input())hello");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    language: String,
    code: String,
    stdin: Option<String>,
    dependencies: Vec<String>,
    timeout: Duration,
}

impl ExecutionRequest {
    /// Creates a request with no stdin, no dependencies and the default
    /// deadline.
    #[must_use]
    pub fn new(language: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            code: code.into(),
            stdin: None,
            dependencies: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Supplies text for the program's standard input. Empty text is
    /// treated as no input.
    #[must_use]
    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        let text = stdin.into();
        self.stdin = (!text.is_empty()).then_some(text);
        self
    }

    /// Supplies packages to install before running, in order.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Overrides the execution deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Language tag as supplied by the caller.
    #[must_use]
    pub const fn language(&self) -> &str {
        self.language.as_str()
    }

    /// Source text.
    #[must_use]
    pub const fn code(&self) -> &str {
        self.code.as_str()
    }

    /// Program input, if any.
    #[must_use]
    pub fn stdin(&self) -> Option<&str> {
        self.stdin.as_deref()
    }

    /// Packages to install.
    #[must_use]
    pub const fn dependencies(&self) -> &[String] {
        self.dependencies.as_slice()
    }

    /// Execution deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Bytes written to the container's standard input: the source, then
    /// the program input.
    #[must_use]
    pub fn input(&self) -> Vec<u8> {
        let stdin = self.stdin.as_deref().unwrap_or_default();
        let mut bytes = Vec::with_capacity(self.code.len() + stdin.len());
        bytes.extend_from_slice(self.code.as_bytes());
        bytes.extend_from_slice(stdin.as_bytes());
        bytes
    }
}

/// Tool-call arguments as received from the outer tool layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeParams {
    /// Language tag to run.
    pub language: String,
    /// Source code to execute.
    pub code: String,
    /// Optional standard input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
    /// Packages to install before running.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl CodeParams {
    /// Converts the arguments into a request bounded by `timeout`.
    #[must_use]
    pub fn into_request(self, timeout: Duration) -> ExecutionRequest {
        let request = ExecutionRequest::new(self.language, self.code)
            .with_dependencies(self.dependencies)
            .with_timeout(timeout);
        match self.stdin {
            Some(stdin) => request.with_stdin(stdin),
            None => request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stdin_is_treated_as_absent() {
        let request = ExecutionRequest::new("python", "print(1)").with_stdin("");
        assert_eq!(request.stdin(), None);
        assert_eq!(request.input(), b"print(1)");
    }

    #[test]
    fn code_params_accept_minimal_json() {
        let params: CodeParams =
            serde_json::from_str(r#"{"language":"python","code":"print(1)"}"#)
                .expect("minimal params");
        assert_eq!(params.stdin, None);
        assert!(params.dependencies.is_empty());
    }

    #[test]
    fn code_params_carry_everything_into_request() {
        let params = CodeParams {
            language: "python".into(),
            code: "import sys; print(sys.stdin.read())".into(),
            stdin: Some("42".into()),
            dependencies: vec!["numpy".into(), "pandas".into()],
        };
        let request = params.into_request(Duration::from_secs(3));
        assert_eq!(request.language(), "python");
        assert_eq!(request.stdin(), Some("42"));
        assert_eq!(request.dependencies(), ["numpy", "pandas"]);
        assert_eq!(request.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn new_requests_use_default_timeout() {
        let request = ExecutionRequest::new("go", "package main");
        assert_eq!(request.timeout(), DEFAULT_TIMEOUT);
    }
}
