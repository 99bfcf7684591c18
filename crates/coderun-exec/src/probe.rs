//! Container runtime availability probing.

use std::process::{Command, Stdio};
use std::time::Duration;

use tracing::debug;
use wait_timeout::ChildExt;

use crate::policy::SandboxPolicy;

const PROBE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::probe");

/// Reports whether the container runtime can currently run containers.
pub trait AvailabilityProbe: Send + Sync {
    /// Returns `true` when the runtime answered. Never fails.
    fn is_available(&self) -> bool;
}

/// Probes a runtime by running `<runtime> version` under a short deadline.
///
/// The command contacts the engine, so it fails when the client binary is
/// installed but the daemon is down. Each call probes afresh so a runtime
/// that starts later is picked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeProbe {
    runtime: String,
    timeout: Duration,
}

impl RuntimeProbe {
    /// Probes `runtime`, giving up after `timeout`.
    #[must_use]
    pub fn new(runtime: impl Into<String>, timeout: Duration) -> Self {
        Self {
            runtime: runtime.into(),
            timeout,
        }
    }

    /// Probes the runtime configured in `policy`.
    #[must_use]
    pub fn from_policy(policy: &SandboxPolicy) -> Self {
        Self::new(policy.runtime(), policy.probe_timeout())
    }

    /// Runtime binary being probed.
    #[must_use]
    pub const fn runtime(&self) -> &str {
        self.runtime.as_str()
    }
}

impl AvailabilityProbe for RuntimeProbe {
    fn is_available(&self) -> bool {
        let spawned = Command::new(&self.runtime)
            .arg("version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(error) => {
                debug!(
                    target: PROBE_TARGET,
                    runtime = %self.runtime,
                    %error,
                    "runtime could not be started"
                );
                return false;
            }
        };

        match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => {
                debug!(
                    target: PROBE_TARGET,
                    runtime = %self.runtime,
                    %status,
                    "runtime probe finished"
                );
                status.success()
            }
            Ok(None) => {
                drop(child.kill());
                drop(child.wait());
                debug!(
                    target: PROBE_TARGET,
                    runtime = %self.runtime,
                    timeout = ?self.timeout,
                    "runtime probe timed out"
                );
                false
            }
            Err(error) => {
                drop(child.kill());
                drop(child.wait());
                debug!(
                    target: PROBE_TARGET,
                    runtime = %self.runtime,
                    %error,
                    "runtime probe could not be awaited"
                );
                false
            }
        }
    }
}
