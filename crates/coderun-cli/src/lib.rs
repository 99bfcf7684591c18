//! JSONL tool surface for the coderun sandbox.
//!
//! The `coderun` binary loads [`coderun_config::Config`], initialises
//! structured telemetry on stderr, and then serves requests: each line read
//! from stdin is one JSON [`CodeParams`] object and produces exactly one JSON
//! [`ToolResponse`] line on stdout. Requests are handled one at a time in
//! arrival order. A malformed line yields an `invalid_request` response and
//! the loop carries on; only configuration, telemetry or output failures
//! stop the binary.

mod telemetry;

use std::ffi::OsString;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use coderun_config::Config;
use ortho_config::OrthoConfig;
use coderun_exec::{
    AvailabilityProbe, CodeParams, ContainerRunner, ErrorKind, PolicyError, Sandbox,
    SandboxPolicy, ToolResponse,
};
use ortho_config::OrthoError;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use telemetry::{TelemetryError, TelemetryHandle, initialise as initialise_telemetry};

const SERVE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::serve");

/// Errors that stop the `coderun` binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("failed to load configuration: {0}")]
    Config(#[source] Arc<OrthoError>),
    /// Configuration values do not form a valid sandbox policy.
    #[error("invalid sandbox policy: {0}")]
    Policy(#[from] PolicyError),
    /// Telemetry could not be initialised.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    /// Reading a request line failed.
    #[error("failed to read request: {0}")]
    Read(#[source] io::Error),
    /// Writing a response line failed.
    #[error("failed to write response: {0}")]
    Write(#[source] io::Error),
    /// A response could not be encoded.
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Counts of requests handled by [`serve`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ServeSummary {
    /// Requests that produced a response.
    pub handled: usize,
    /// Requests whose response carried an error.
    pub failed: usize,
}

/// Loads configuration from `args` and the environment, then serves
/// requests from `input` until end of input.
///
/// # Errors
///
/// Returns an [`AppError`] when configuration, telemetry or the response
/// stream fails.
pub fn run<I, T>(args: I, input: impl BufRead, output: impl Write) -> Result<(), AppError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let config = Config::load_from_iter(args).map_err(AppError::Config)?;
    initialise_telemetry(&config)?;
    let policy = SandboxPolicy::from_config(&config)?;
    info!(
        target: SERVE_TARGET,
        runtime = policy.runtime(),
        timeout_secs = config.timeout_secs,
        "serving execution requests"
    );
    let sandbox = Sandbox::from_policy(policy);
    let summary = serve(&sandbox, config.timeout(), input, output)?;
    info!(
        target: SERVE_TARGET,
        handled = summary.handled,
        failed = summary.failed,
        "input closed; exiting"
    );
    Ok(())
}

/// Answers each non-blank line of `input` with one response line on
/// `output`, bounding every request by `timeout`.
///
/// # Errors
///
/// Returns [`AppError::Read`], [`AppError::Write`] or [`AppError::Encode`]
/// when the streams fail. Malformed requests are answered, not returned.
pub fn serve<P, R>(
    sandbox: &Sandbox<P, R>,
    timeout: Duration,
    input: impl BufRead,
    mut output: impl Write,
) -> Result<ServeSummary, AppError>
where
    P: AvailabilityProbe,
    R: ContainerRunner,
{
    let mut summary = ServeSummary::default();
    for line in input.lines() {
        let text = line.map_err(AppError::Read)?;
        if text.trim().is_empty() {
            continue;
        }
        let response = respond(sandbox, timeout, &text);
        summary.handled += 1;
        if !response.is_success() {
            summary.failed += 1;
        }
        let encoded = serde_json::to_string(&response)?;
        writeln!(output, "{encoded}").map_err(AppError::Write)?;
        output.flush().map_err(AppError::Write)?;
    }
    Ok(summary)
}

fn respond<P, R>(sandbox: &Sandbox<P, R>, timeout: Duration, line: &str) -> ToolResponse
where
    P: AvailabilityProbe,
    R: ContainerRunner,
{
    match serde_json::from_str::<CodeParams>(line.trim()) {
        Ok(params) => {
            debug!(
                target: SERVE_TARGET,
                language = %params.language,
                dependencies = params.dependencies.len(),
                "request received"
            );
            sandbox.execute(&params.into_request(timeout)).to_response()
        }
        Err(error) => {
            warn!(target: SERVE_TARGET, %error, "malformed request line");
            ToolResponse::rejected(
                ErrorKind::InvalidRequest,
                format!("malformed request: {error}"),
            )
        }
    }
}
