//! Kill-and-remove guard for a running container.

use std::process::{Child, Command, Stdio};
use std::time::Duration;

use tracing::{debug, warn};
use wait_timeout::ChildExt;

use super::RUNNER_TARGET;

/// Owns the runtime client process of one container.
///
/// While armed, dropping the guard kills and reaps the client, then runs
/// `<runtime> rm --force <name>`, since killing the client alone leaves the
/// container running under the engine.
#[derive(Debug)]
pub(super) struct ContainerGuard<'a> {
    runtime: &'a str,
    name: String,
    child: Child,
    cleanup_timeout: Duration,
    armed: bool,
}

impl<'a> ContainerGuard<'a> {
    pub(super) const fn new(
        runtime: &'a str,
        name: String,
        child: Child,
        cleanup_timeout: Duration,
    ) -> Self {
        Self {
            runtime,
            name,
            child,
            cleanup_timeout,
            armed: true,
        }
    }

    pub(super) const fn child_mut(&mut self) -> &mut Child {
        &mut self.child
    }

    pub(super) const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Marks the container as exited normally; `--rm` removes it.
    pub(super) const fn disarm(&mut self) {
        self.armed = false;
    }

    fn remove_container(&self) {
        let spawned = Command::new(self.runtime)
            .args(["rm", "--force", self.name.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        let mut remover = match spawned {
            Ok(remover) => remover,
            Err(error) => {
                warn!(
                    target: RUNNER_TARGET,
                    container = %self.name,
                    %error,
                    "failed to start container removal"
                );
                return;
            }
        };
        match remover.wait_timeout(self.cleanup_timeout) {
            Ok(Some(status)) => debug!(
                target: RUNNER_TARGET,
                container = %self.name,
                %status,
                "container removed"
            ),
            Ok(None) => {
                drop(remover.kill());
                drop(remover.wait());
                warn!(
                    target: RUNNER_TARGET,
                    container = %self.name,
                    timeout = ?self.cleanup_timeout,
                    "container removal timed out"
                );
            }
            Err(error) => warn!(
                target: RUNNER_TARGET,
                container = %self.name,
                %error,
                "failed to await container removal"
            ),
        }
    }
}

impl Drop for ContainerGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(error) = self.child.kill() {
            debug!(
                target: RUNNER_TARGET,
                container = %self.name,
                %error,
                "runtime client already exited"
            );
        }
        drop(self.child.wait());
        self.remove_container();
    }
}
