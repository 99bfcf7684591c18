//! The sandbox facade tying probe, executors and runner together.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::ExecutionError;
use crate::executor::build_invocation;
use crate::language::Language;
use crate::normalize::normalize;
use crate::policy::SandboxPolicy;
use crate::probe::{AvailabilityProbe, RuntimeProbe};
use crate::registry::ExecutorRegistry;
use crate::request::ExecutionRequest;
use crate::result::ExecutionResult;
use crate::runner::{ContainerRunner, ProcessRunner};

const SANDBOX_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::sandbox");

/// Runs untrusted code, one fresh container per request.
///
/// A sandbox holds only immutable configuration, so one instance can serve
/// any number of concurrent callers; each call owns its container
/// exclusively for its lifetime. There is no admission control: every call
/// starts a container immediately.
#[derive(Debug)]
pub struct Sandbox<P = RuntimeProbe, R = ProcessRunner> {
    policy: SandboxPolicy,
    registry: ExecutorRegistry,
    probe: P,
    runner: R,
}

impl Sandbox {
    /// Builds a sandbox with the built-in executors, probing and running
    /// through the runtime named in `policy`.
    #[must_use]
    pub fn from_policy(policy: SandboxPolicy) -> Self {
        let probe = RuntimeProbe::from_policy(&policy);
        let runner = ProcessRunner::from_policy(&policy);
        Self::with_parts(policy, ExecutorRegistry::with_defaults(), probe, runner)
    }
}

impl<P, R> Sandbox<P, R>
where
    P: AvailabilityProbe,
    R: ContainerRunner,
{
    /// Assembles a sandbox from explicit parts.
    #[must_use]
    pub const fn with_parts(
        policy: SandboxPolicy,
        registry: ExecutorRegistry,
        probe: P,
        runner: R,
    ) -> Self {
        Self {
            policy,
            registry,
            probe,
            runner,
        }
    }

    /// Policy applied to every run.
    #[must_use]
    pub const fn policy(&self) -> &SandboxPolicy {
        &self.policy
    }

    /// Languages this sandbox can run.
    pub fn supported_languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.registry.supported()
    }

    /// Reports whether the container runtime is reachable right now.
    #[must_use]
    pub fn is_runtime_available(&self) -> bool {
        self.probe.is_available()
    }

    /// Executes `request` and returns its normalised result.
    ///
    /// Checks run cheapest first: the language is resolved before the
    /// runtime is probed, and the request is fully validated before any
    /// container is started. Failures never panic; they are reported in the
    /// returned result.
    #[must_use]
    pub fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        let started = Instant::now();
        let result = match self.prepare_and_run(request) {
            Ok(result) => result,
            Err(error) => ExecutionResult::rejected(error),
        };
        match result.error() {
            None => info!(
                target: SANDBOX_TARGET,
                language = request.language(),
                elapsed = ?started.elapsed(),
                "execution succeeded"
            ),
            Some(error) => warn!(
                target: SANDBOX_TARGET,
                language = request.language(),
                kind = %error.kind(),
                elapsed = ?started.elapsed(),
                error = %error,
                "execution failed"
            ),
        }
        result
    }

    fn prepare_and_run(
        &self,
        request: &ExecutionRequest,
    ) -> Result<ExecutionResult, ExecutionError> {
        let executor = self.registry.resolve(request.language())?;
        if request.timeout().is_zero() {
            return Err(ExecutionError::InvalidRequest {
                message: String::from("timeout must be greater than zero"),
            });
        }
        let spec = build_invocation(executor, request, &self.policy)?;

        if !self.probe.is_available() {
            return Err(ExecutionError::RuntimeUnavailable {
                runtime: self.policy.runtime().to_owned(),
            });
        }

        debug!(
            target: SANDBOX_TARGET,
            language = %spec.language(),
            image = spec.image(),
            delivery = ?spec.delivery(),
            timeout = ?request.timeout(),
            "running invocation"
        );
        let outcome = self.runner.run(&spec, &request.input(), request.timeout());
        Ok(normalize(spec.language(), request.timeout(), outcome))
    }
}
