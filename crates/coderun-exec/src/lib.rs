//! Sandboxed execution of untrusted source code in throwaway containers.
//!
//! Every request runs in a fresh container started through a container
//! runtime client such as `docker` or `podman`. The isolation posture is
//! fixed and applied to every language alike:
//! - Networking is disabled.
//! - The root filesystem is read-only; one `tmpfs` scratch directory is
//!   writable and serves as the working directory.
//! - All capabilities are dropped and privilege escalation is blocked.
//! - The program runs as a non-root user under CPU, memory and process caps.
//!
//! Callers build an [`ExecutionRequest`] and hand it to a [`Sandbox`]. The
//! sandbox resolves the language to a [`LanguageExecutor`], checks that the
//! runtime is reachable, runs the container under the request deadline and
//! returns an [`ExecutionResult`] with stdout and stderr merged. Failures are
//! classified by [`ExecutionError`]; the captured output is returned
//! alongside the error so callers can show diagnostics.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use coderun_exec::{ExecutionRequest, Sandbox, SandboxPolicy};
//!
//! let sandbox = Sandbox::from_policy(SandboxPolicy::new());
//! let request = ExecutionRequest::new("python", "print('Hello!')")
//!     .with_timeout(Duration::from_secs(10));
//! let result = sandbox.execute(&request);
//! assert_eq!(result.output(), "Hello!\n");
//! ```
//!
//! The sandbox keeps no state between requests and may be shared freely
//! between threads. It does not queue or limit concurrent requests.

mod error;
pub mod executor;
mod invocation;
mod language;
mod normalize;
mod policy;
mod probe;
mod registry;
mod request;
mod result;
mod runner;
mod sandbox;

#[cfg(test)]
mod tests;

pub use error::{ErrorKind, ExecutionError};
pub use executor::{LanguageExecutor, SourceLocation, build_invocation};
pub use invocation::{
    InvocationBuilder, InvocationSpec, SourceDelivery, shell_join, shell_quote,
};
pub use language::{Language, LanguageParseError};
pub use normalize::{RUNTIME_START_FAILURE, merge_streams, normalize};
pub use policy::{MAX_PROBE_TIMEOUT, PolicyError, ResourceLimits, SandboxPolicy, UserId};
pub use probe::{AvailabilityProbe, RuntimeProbe};
pub use registry::ExecutorRegistry;
pub use request::{CodeParams, DEFAULT_TIMEOUT, ExecutionRequest};
pub use result::{ExecutionResult, ToolResponse};
pub use runner::{CLEANUP_TIMEOUT, ContainerRunner, ProcessRunner, RunOutcome};
pub use sandbox::Sandbox;
