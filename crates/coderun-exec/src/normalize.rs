//! Classification of raw run outcomes into [`ExecutionResult`]s.

use std::time::Duration;

use crate::error::ExecutionError;
use crate::language::Language;
use crate::result::ExecutionResult;
use crate::runner::RunOutcome;

/// Exit status the runtime client uses when the container itself could not
/// be created or started.
pub const RUNTIME_START_FAILURE: i32 = 125;

/// Merges captured streams: stdout, then a newline and stderr when stderr is
/// non-empty. Stderr alone when stdout is empty.
#[must_use]
pub fn merge_streams(stdout: &str, stderr: &str) -> String {
    match (stdout.is_empty(), stderr.is_empty()) {
        (_, true) => stdout.to_owned(),
        (true, false) => stderr.to_owned(),
        (false, false) => format!("{stdout}\n{stderr}"),
    }
}

/// Turns a raw [`RunOutcome`] into the caller-facing result.
///
/// Output is decoded lossily; nothing is added beyond what was captured.
#[must_use]
pub fn normalize(language: Language, timeout: Duration, outcome: RunOutcome) -> ExecutionResult {
    match outcome {
        RunOutcome::Completed {
            exit_code,
            stdout,
            stderr,
        } => {
            let stdout_text = String::from_utf8_lossy(&stdout);
            let stderr_text = String::from_utf8_lossy(&stderr);
            let output = merge_streams(&stdout_text, &stderr_text);
            match exit_code {
                Some(0) => ExecutionResult::success(output),
                Some(RUNTIME_START_FAILURE) if stdout.is_empty() => {
                    let message = match stderr_text.trim() {
                        "" => String::from("container runtime could not start the container"),
                        detail => detail.to_owned(),
                    };
                    ExecutionResult::failure(output, ExecutionError::launch(language, message))
                }
                code => ExecutionResult::failure(
                    output,
                    ExecutionError::NonZeroExit {
                        language,
                        status: code.unwrap_or(-1),
                    },
                ),
            }
        }
        RunOutcome::TimedOut => {
            ExecutionResult::failure(String::new(), ExecutionError::Timeout { language, timeout })
        }
        RunOutcome::LaunchFailed { message, source } => ExecutionResult::failure(
            message.clone(),
            ExecutionError::LaunchFailure {
                language,
                message,
                source,
            },
        ),
    }
}
