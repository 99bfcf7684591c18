//! Default values shared by the configuration layers.

/// Container runtime binary used when none is configured.
pub const DEFAULT_CONTAINER_RUNTIME: &str = "docker";

/// Default per-request execution deadline in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default bound on the container runtime availability probe in seconds.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;

/// Default CPU share granted to each container.
pub const DEFAULT_CPUS: &str = "0.5";

/// Default memory cap; swap is always capped to the same value.
pub const DEFAULT_MEMORY: &str = "256m";

/// Default cap on processes and threads inside each container.
pub const DEFAULT_PIDS_LIMIT: u32 = 64;

/// Default unprivileged `uid:gid` the contained program runs as.
pub const DEFAULT_USER: &str = "1000:1000";

/// Default mount point of the writable scratch directory.
pub const DEFAULT_SCRATCH_DIR: &str = "/sandbox";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Owned container runtime value for serde defaults.
pub fn default_container_runtime() -> String {
    DEFAULT_CONTAINER_RUNTIME.to_owned()
}

/// Execution deadline default for serde.
pub const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Probe timeout default for serde.
pub const fn default_probe_timeout_secs() -> u64 {
    DEFAULT_PROBE_TIMEOUT_SECS
}

/// Owned CPU share value for serde defaults.
pub fn default_cpus() -> String {
    DEFAULT_CPUS.to_owned()
}

/// Owned memory cap value for serde defaults.
pub fn default_memory() -> String {
    DEFAULT_MEMORY.to_owned()
}

/// Process cap default for serde.
pub const fn default_pids_limit() -> u32 {
    DEFAULT_PIDS_LIMIT
}

/// Owned user identity value for serde defaults.
pub fn default_user() -> String {
    DEFAULT_USER.to_owned()
}

/// Owned scratch directory value for serde defaults.
pub fn default_scratch_dir() -> String {
    DEFAULT_SCRATCH_DIR.to_owned()
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}
