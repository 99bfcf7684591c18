//! Sandbox policy shared by every executor.
//!
//! The policy holds the operator-tunable parts of the isolation posture:
//! resource caps, the unprivileged identity, the scratch mount point and the
//! dependency allow-list. The fixed parts (no network, read-only root,
//! dropped capabilities) are not configurable and are rendered by
//! [`InvocationSpec`](crate::invocation::InvocationSpec) unconditionally.

use std::collections::BTreeSet;
use std::time::Duration;

use coderun_config::Config;
use thiserror::Error;

use crate::error::ExecutionError;

/// Upper bound on the availability probe so a wedged runtime daemon cannot
/// hang the caller.
pub const MAX_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors raised while assembling a [`SandboxPolicy`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The user identity is not of the form `uid:gid`.
    #[error("user '{user}' must be a numeric uid:gid pair")]
    MalformedUser {
        /// Rejected value.
        user: String,
    },

    /// The user identity resolves to root.
    #[error("containers must not run as root (got '{user}')")]
    RootUser {
        /// Rejected value.
        user: String,
    },

    /// The scratch directory is not an absolute, non-root path.
    #[error("scratch directory '{path}' must be an absolute path below '/'")]
    InvalidScratchDir {
        /// Rejected value.
        path: String,
    },

    /// A resource limit is empty or zero.
    #[error("resource limit '{name}' is invalid: {message}")]
    InvalidLimit {
        /// Limit name.
        name: &'static str,
        /// Description of the problem.
        message: String,
    },
}

/// Resource caps applied to every container.
///
/// Swap is always capped to the memory value so a program cannot page its
/// way past the memory limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLimits {
    cpus: String,
    memory: String,
    pids_limit: u32,
}

impl ResourceLimits {
    /// Creates limits after validating each value.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidLimit`] when a value is empty or the
    /// process cap is zero.
    pub fn new(
        cpus: impl Into<String>,
        memory: impl Into<String>,
        pids_limit: u32,
    ) -> Result<Self, PolicyError> {
        let cpu_share = cpus.into();
        let memory_cap = memory.into();
        if cpu_share.trim().is_empty() {
            return Err(PolicyError::InvalidLimit {
                name: "cpus",
                message: String::from("must not be empty"),
            });
        }
        if memory_cap.trim().is_empty() {
            return Err(PolicyError::InvalidLimit {
                name: "memory",
                message: String::from("must not be empty"),
            });
        }
        if pids_limit == 0 {
            return Err(PolicyError::InvalidLimit {
                name: "pids_limit",
                message: String::from("must be greater than zero"),
            });
        }
        Ok(Self {
            cpus: cpu_share,
            memory: memory_cap,
            pids_limit,
        })
    }

    /// Fractional CPU share.
    #[must_use]
    pub const fn cpus(&self) -> &str {
        self.cpus.as_str()
    }

    /// Memory cap, also used for swap.
    #[must_use]
    pub const fn memory(&self) -> &str {
        self.memory.as_str()
    }

    /// Process and thread cap.
    #[must_use]
    pub const fn pids_limit(&self) -> u32 {
        self.pids_limit
    }
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            cpus: String::from(coderun_config::DEFAULT_CPUS),
            memory: String::from(coderun_config::DEFAULT_MEMORY),
            pids_limit: coderun_config::DEFAULT_PIDS_LIMIT,
        }
    }
}

/// Unprivileged numeric identity the contained program runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId {
    uid: u32,
    gid: u32,
}

impl UserId {
    /// Creates an identity, refusing uid 0.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::RootUser`] for uid 0.
    pub fn new(uid: u32, gid: u32) -> Result<Self, PolicyError> {
        if uid == 0 {
            return Err(PolicyError::RootUser {
                user: format!("{uid}:{gid}"),
            });
        }
        Ok(Self { uid, gid })
    }

    /// Parses a `uid:gid` pair.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::MalformedUser`] for anything but two decimal
    /// numbers, and [`PolicyError::RootUser`] for uid 0.
    pub fn parse(text: &str) -> Result<Self, PolicyError> {
        let malformed = || PolicyError::MalformedUser {
            user: text.to_owned(),
        };
        let (uid_text, gid_text) = text.trim().split_once(':').ok_or_else(malformed)?;
        let uid = uid_text.parse::<u32>().map_err(|_| malformed())?;
        let gid = gid_text.parse::<u32>().map_err(|_| malformed())?;
        Self::new(uid, gid)
    }

    /// Numeric user id.
    #[must_use]
    pub const fn uid(self) -> u32 {
        self.uid
    }

    /// Numeric group id.
    #[must_use]
    pub const fn gid(self) -> u32 {
        self.gid
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.uid, self.gid)
    }
}

/// Operator-tunable isolation settings applied to every request.
#[derive(Debug, Clone)]
pub struct SandboxPolicy {
    runtime: String,
    probe_timeout: Duration,
    limits: ResourceLimits,
    user: UserId,
    scratch_dir: String,
    allowed_packages: BTreeSet<String>,
}

impl SandboxPolicy {
    /// Creates a policy with the documented defaults: `docker`, half a core,
    /// 256 MiB, 64 processes, user `1000:1000`, scratch at `/sandbox`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            runtime: String::from(coderun_config::DEFAULT_CONTAINER_RUNTIME),
            probe_timeout: Duration::from_secs(coderun_config::DEFAULT_PROBE_TIMEOUT_SECS),
            limits: ResourceLimits::default(),
            user: UserId {
                uid: 1000,
                gid: 1000,
            },
            scratch_dir: String::from(coderun_config::DEFAULT_SCRATCH_DIR),
            allowed_packages: BTreeSet::new(),
        }
    }

    /// Builds a policy from layered configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`PolicyError`] when the configured identity, scratch
    /// directory, limits or probe timeout are unacceptable.
    pub fn from_config(config: &Config) -> Result<Self, PolicyError> {
        let limits = ResourceLimits::new(&config.cpus, &config.memory, config.pids_limit)?;
        let mut policy = Self::new()
            .with_runtime(&config.container_runtime)
            .with_probe_timeout(config.probe_timeout())?
            .with_limits(limits)
            .with_user(UserId::parse(&config.user)?)
            .with_scratch_dir(&config.scratch_dir)?;
        for package in &config.allowed_packages {
            policy = policy.allow_package(package);
        }
        Ok(policy)
    }

    /// Sets the container runtime binary.
    #[must_use]
    pub fn with_runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime = runtime.into();
        self
    }

    /// Sets the bound on the availability probe.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidLimit`] unless the timeout is non-zero
    /// and no longer than [`MAX_PROBE_TIMEOUT`].
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Result<Self, PolicyError> {
        if timeout.is_zero() || timeout > MAX_PROBE_TIMEOUT {
            return Err(PolicyError::InvalidLimit {
                name: "probe_timeout",
                message: format!(
                    "must be between 1ms and {}s (got {timeout:?})",
                    MAX_PROBE_TIMEOUT.as_secs()
                ),
            });
        }
        self.probe_timeout = timeout;
        Ok(self)
    }

    /// Replaces the resource caps.
    #[must_use]
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Replaces the unprivileged identity.
    #[must_use]
    pub const fn with_user(mut self, user: UserId) -> Self {
        self.user = user;
        self
    }

    /// Moves the scratch mount.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidScratchDir`] unless the path is absolute,
    /// not `/` itself, and made of path-safe characters.
    pub fn with_scratch_dir(mut self, path: &str) -> Result<Self, PolicyError> {
        let trimmed = path.trim_end_matches('/');
        let safe = trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-' | '.'));
        if !trimmed.starts_with('/') || trimmed.len() < 2 || !safe || trimmed.contains("..") {
            return Err(PolicyError::InvalidScratchDir {
                path: path.to_owned(),
            });
        }
        trimmed.clone_into(&mut self.scratch_dir);
        Ok(self)
    }

    /// Adds a package to the dependency allow-list.
    ///
    /// An empty allow-list permits any well-formed package name.
    #[must_use]
    pub fn allow_package(mut self, name: impl Into<String>) -> Self {
        let _ = self.allowed_packages.insert(name.into());
        self
    }

    /// Container runtime binary.
    #[must_use]
    pub const fn runtime(&self) -> &str {
        self.runtime.as_str()
    }

    /// Bound on the availability probe.
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Resource caps.
    #[must_use]
    pub const fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// Unprivileged identity.
    #[must_use]
    pub const fn user(&self) -> UserId {
        self.user
    }

    /// Scratch mount point, without a trailing slash.
    #[must_use]
    pub const fn scratch_dir(&self) -> &str {
        self.scratch_dir.as_str()
    }

    /// Checks dependency names against the safety rules and the allow-list.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::InvalidDependency`] for names that could be
    /// mistaken for installer options or that carry whitespace, and
    /// [`ExecutionError::DependencyRejected`] for names outside a non-empty
    /// allow-list.
    pub fn check_dependencies(&self, dependencies: &[String]) -> Result<(), ExecutionError> {
        for name in dependencies {
            validate_dependency_name(name)?;
            if !self.allowed_packages.is_empty() && !self.allowed_packages.contains(name) {
                return Err(ExecutionError::DependencyRejected { name: name.clone() });
            }
        }
        Ok(())
    }
}

impl Default for SandboxPolicy {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_dependency_name(name: &str) -> Result<(), ExecutionError> {
    let problem = if name.is_empty() {
        "name must not be empty"
    } else if name.starts_with('-') {
        "name must not start with '-'"
    } else if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        "name must not contain whitespace or control characters"
    } else {
        return Ok(());
    };
    Err(ExecutionError::InvalidDependency {
        name: name.to_owned(),
        reason: problem.to_owned(),
    })
}
