//! Shared configuration for the coderun sandbox.
//!
//! [`Config`] is assembled by `ortho_config` from, in increasing order of
//! precedence: built-in defaults, a TOML configuration file, `CODERUN_*`
//! environment variables, and command-line flags. The values describe the
//! container runtime to drive, the resource caps applied to every container,
//! the per-request deadline, and how the binaries emit telemetry.

mod defaults;
mod logging;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_CONTAINER_RUNTIME, DEFAULT_CPUS, DEFAULT_LOG_FILTER, DEFAULT_MEMORY,
    DEFAULT_PIDS_LIMIT, DEFAULT_PROBE_TIMEOUT_SECS, DEFAULT_SCRATCH_DIR, DEFAULT_TIMEOUT_SECS,
    DEFAULT_USER, default_log_filter_string, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Layered configuration consumed by the sandbox and its binaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CODERUN")]
pub struct Config {
    /// Container runtime binary (`docker`, `podman`, or an absolute path).
    #[serde(default = "defaults::default_container_runtime")]
    pub container_runtime: String,
    /// Per-request execution deadline in seconds.
    #[serde(default = "defaults::default_timeout_secs")]
    pub timeout_secs: u64,
    /// Upper bound for the runtime availability probe in seconds.
    #[serde(default = "defaults::default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    /// Fractional CPU share granted to each container.
    #[serde(default = "defaults::default_cpus")]
    pub cpus: String,
    /// Memory cap for each container, also applied to swap.
    #[serde(default = "defaults::default_memory")]
    pub memory: String,
    /// Maximum number of processes and threads per container.
    #[serde(default = "defaults::default_pids_limit")]
    pub pids_limit: u32,
    /// Unprivileged `uid:gid` the contained program runs as.
    #[serde(default = "defaults::default_user")]
    pub user: String,
    /// Mount point of the writable scratch directory inside the container.
    #[serde(default = "defaults::default_scratch_dir")]
    pub scratch_dir: String,
    /// Packages callers may install. Empty means any well-formed name.
    #[serde(default)]
    pub allowed_packages: Vec<String>,
    /// Tracing filter expression.
    #[serde(default = "defaults::default_log_filter_string")]
    pub log_filter: String,
    /// Output format for telemetry.
    #[serde(default = "defaults::default_log_format")]
    pub log_format: LogFormat,
}

impl Config {
    /// Execution deadline applied to requests that do not carry their own.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Bound applied to the runtime availability probe.
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Tracing filter expression.
    #[must_use]
    pub const fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Telemetry output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            container_runtime: defaults::default_container_runtime(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            cpus: defaults::default_cpus(),
            memory: defaults::default_memory(),
            pids_limit: DEFAULT_PIDS_LIMIT,
            user: defaults::default_user(),
            scratch_dir: defaults::default_scratch_dir(),
            allowed_packages: Vec::new(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}
