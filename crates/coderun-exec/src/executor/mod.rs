//! Per-language executors.
//!
//! A [`LanguageExecutor`] describes how one language is run: its image, the
//! file name its source is written to, how the run step is invoked, and
//! whether and how dependencies are installed. [`build_invocation`] combines
//! that description with a request and the shared [`SandboxPolicy`] into an
//! [`InvocationSpec`]. Isolation flags are rendered by [`InvocationSpec`]
//! alone, so a new executor cannot weaken them.

mod compiled;
mod interpreted;

use std::fmt;

use tracing::warn;

use crate::error::ExecutionError;
use crate::invocation::{InvocationSpec, SourceDelivery, shell_quote};
use crate::language::Language;
use crate::policy::SandboxPolicy;
use crate::request::ExecutionRequest;

pub use compiled::{
    CExecutor, CppExecutor, GCC_IMAGE, GO_IMAGE, GoExecutor, JAVA_IMAGE, JavaExecutor,
    RUST_IMAGE, RustExecutor,
};
pub use interpreted::{JavaScriptExecutor, NODE_IMAGE, PYTHON_IMAGE, PythonExecutor};

/// Tracing target for invocation building.
const EXECUTOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::executor");

/// Where the run step finds the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLocation<'a> {
    /// The program arrives on standard input.
    Stdin,
    /// The program has been written to this absolute path.
    File(&'a str),
}

/// Language-specific half of an invocation.
///
/// Implementations only describe commands; they never spawn anything.
pub trait LanguageExecutor: fmt::Debug + Send + Sync {
    /// Language this executor runs.
    fn language(&self) -> Language;

    /// Container image reference.
    fn image(&self) -> &str;

    /// File name the source is written to inside the scratch directory.
    fn source_file(&self) -> &'static str;

    /// Whether the interpreter can read the program from standard input.
    fn reads_source_from_stdin(&self) -> bool {
        false
    }

    /// Shell command running the program found at `source`.
    ///
    /// `scratch_dir` is the writable directory for build artefacts.
    fn run_step(&self, source: SourceLocation<'_>, scratch_dir: &str) -> String;

    /// Shell command installing `dependencies`, or `None` when the language
    /// does not support dynamic installation.
    fn install_step(&self, _dependencies: &[String], _scratch_dir: &str) -> Option<String> {
        None
    }

    /// Extra environment variables for the container.
    fn environment(&self, _scratch_dir: &str) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// Builds the isolated-run specification for `request`.
///
/// Source is delivered over standard input. When the request carries its
/// own stdin the stream is shared, so the source is always copied to a file
/// first (exactly its byte length, via `head -c`) and the program reads the
/// remainder.
///
/// # Errors
///
/// Returns [`ExecutionError::InvalidDependency`] or
/// [`ExecutionError::DependencyRejected`] when an installable dependency
/// fails the policy checks.
pub fn build_invocation(
    executor: &dyn LanguageExecutor,
    request: &ExecutionRequest,
    policy: &SandboxPolicy,
) -> Result<InvocationSpec, ExecutionError> {
    let scratch = policy.scratch_dir();
    let mut steps = Vec::new();

    let dependencies = request.dependencies();
    if !dependencies.is_empty() {
        match executor.install_step(dependencies, scratch) {
            Some(step) => {
                policy.check_dependencies(dependencies)?;
                steps.push(step);
            }
            None => warn!(
                target: EXECUTOR_TARGET,
                language = %executor.language(),
                dependencies = ?dependencies,
                "dependencies are not supported for this language; ignoring"
            ),
        }
    }

    let delivery = if executor.reads_source_from_stdin() && request.stdin().is_none() {
        SourceDelivery::Stream
    } else {
        SourceDelivery::File
    };

    let source_path = format!("{scratch}/{}", executor.source_file());
    let run = match delivery {
        SourceDelivery::Stream => executor.run_step(SourceLocation::Stdin, scratch),
        SourceDelivery::File => {
            steps.push(format!(
                "head -c {} > {}",
                request.code().len(),
                shell_quote(&source_path)
            ));
            executor.run_step(SourceLocation::File(&source_path), scratch)
        }
    };
    steps.push(run);

    let mut builder = InvocationSpec::builder(executor.language(), executor.image(), policy)
        .delivery(delivery)
        .steps(steps);
    for (key, value) in executor.environment(scratch) {
        builder = builder.env(key, value);
    }
    Ok(builder.build())
}
