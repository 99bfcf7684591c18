//! Container process supervision.
//!
//! [`ProcessRunner`] starts `<runtime> run` for an [`InvocationSpec`], feeds
//! standard input, collects both output streams concurrently and enforces the
//! request deadline. Every container is started under a fresh name; a
//! [`ContainerGuard`] force-removes it on any path that does not end in a
//! normal exit, so a timed-out program never outlives its request. Output
//! collection shares the same deadline: a process that inherited the pipes
//! cannot hold a run open after the runtime client has exited.

mod guard;

use std::io::{self, Read, Write};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

use crate::invocation::InvocationSpec;
use crate::policy::SandboxPolicy;

use self::guard::ContainerGuard;

pub(crate) const RUNNER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::runner");

/// Deadline for the forced removal of an abandoned container.
pub const CLEANUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw result of one container run, before classification.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The runtime client exited on its own.
    Completed {
        /// Exit code, or `None` when terminated by a signal.
        exit_code: Option<i32>,
        /// Everything written to standard output.
        stdout: Vec<u8>,
        /// Everything written to standard error.
        stderr: Vec<u8>,
    },
    /// The deadline elapsed; the container was killed and removed.
    TimedOut,
    /// The runtime client could not be started or awaited.
    LaunchFailed {
        /// Human-readable failure description.
        message: String,
        /// Underlying I/O error.
        source: Option<Arc<io::Error>>,
    },
}

impl RunOutcome {
    fn launch_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self::LaunchFailed {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }
}

/// Runs an invocation to completion or deadline.
pub trait ContainerRunner: Send + Sync {
    /// Runs `spec`, writing `input` to the container's standard input.
    fn run(&self, spec: &InvocationSpec, input: &[u8], timeout: Duration) -> RunOutcome;
}

/// Runs containers by spawning the runtime client binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRunner {
    runtime: String,
    cleanup_timeout: Duration,
}

impl ProcessRunner {
    /// Spawns `runtime` for each run.
    #[must_use]
    pub fn new(runtime: impl Into<String>) -> Self {
        Self {
            runtime: runtime.into(),
            cleanup_timeout: CLEANUP_TIMEOUT,
        }
    }

    /// Uses the runtime configured in `policy`.
    #[must_use]
    pub fn from_policy(policy: &SandboxPolicy) -> Self {
        Self::new(policy.runtime())
    }

    /// Overrides how long forced removal may take.
    #[must_use]
    pub const fn with_cleanup_timeout(mut self, timeout: Duration) -> Self {
        self.cleanup_timeout = timeout;
        self
    }

    /// Runtime binary.
    #[must_use]
    pub const fn runtime(&self) -> &str {
        self.runtime.as_str()
    }
}

impl ContainerRunner for ProcessRunner {
    fn run(&self, spec: &InvocationSpec, input: &[u8], timeout: Duration) -> RunOutcome {
        let name = match unique_container_name() {
            Ok(name) => name,
            Err(error) => {
                return RunOutcome::launch_failed("could not allocate a container name", error);
            }
        };

        let mut command = Command::new(&self.runtime);
        command
            .args(spec.container_args(&name))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(error) => {
                let message = format!(
                    "failed to spawn container runtime '{}': {error}",
                    self.runtime
                );
                return RunOutcome::launch_failed(message, error);
            }
        };
        debug!(
            target: RUNNER_TARGET,
            container = %name,
            image = spec.image(),
            language = %spec.language(),
            "container started"
        );

        spawn_input_writer(child.stdin.take(), input.to_vec());
        let stdout_reader = spawn_pipe_reader(child.stdout.take(), "stdout");
        let stderr_reader = spawn_pipe_reader(child.stderr.take(), "stderr");
        let mut guard = ContainerGuard::new(&self.runtime, name, child, self.cleanup_timeout);

        let started = Instant::now();
        match guard.child_mut().wait_timeout(timeout) {
            Ok(Some(status)) => {
                guard.disarm();
                let stdout = collect_pipe(stdout_reader.as_ref(), timeout, started);
                let stderr = collect_pipe(stderr_reader.as_ref(), timeout, started);
                info!(
                    target: RUNNER_TARGET,
                    container = guard.name(),
                    exit_code = ?status.code(),
                    elapsed = ?started.elapsed(),
                    "container finished"
                );
                RunOutcome::Completed {
                    exit_code: status.code(),
                    stdout,
                    stderr,
                }
            }
            Ok(None) => {
                warn!(
                    target: RUNNER_TARGET,
                    container = guard.name(),
                    timeout = ?timeout,
                    "container exceeded its deadline; terminating"
                );
                // Reader threads are detached: a lingering grandchild may
                // hold the pipes open past the kill.
                drop(guard);
                RunOutcome::TimedOut
            }
            Err(error) => {
                let message = format!(
                    "failed to await container runtime '{}': {error}",
                    self.runtime
                );
                drop(guard);
                RunOutcome::launch_failed(message, error)
            }
        }
    }
}

/// Allocates a container name no other run can share.
///
/// The random suffix comes from a uniquely created temporary directory,
/// which is removed again at once.
fn unique_container_name() -> io::Result<String> {
    let dir = tempfile::Builder::new()
        .prefix("coderun-")
        .rand_bytes(12)
        .tempdir()?;
    let name = dir
        .path()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| io::Error::other("temporary directory has no name"))?;
    dir.close()?;
    Ok(name)
}

/// Feeds `input` on a detached thread; a reader that never drains the pipe
/// must not stall the run.
fn spawn_input_writer<W>(pipe: Option<W>, input: Vec<u8>)
where
    W: Write + Send + 'static,
{
    if let Some(mut stream) = pipe {
        drop(thread::spawn(move || {
            // Programs may exit without reading their input.
            match stream.write_all(&input) {
                Err(error) if error.kind() != io::ErrorKind::BrokenPipe => {
                    warn!(target: RUNNER_TARGET, %error, "failed to write container stdin");
                }
                _ => {}
            }
        }));
    }
}

/// Output captured by a reader thread.
///
/// Bytes land in the shared buffer as they arrive, so whatever was read by
/// the deadline is still available when the stream never reaches end of
/// file.
struct PipeCapture {
    stream_name: &'static str,
    buffer: Arc<Mutex<Vec<u8>>>,
    finished: Receiver<()>,
}

fn spawn_pipe_reader<R>(pipe: Option<R>, stream_name: &'static str) -> Option<PipeCapture>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut stream| {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let (done, finished) = mpsc::channel();
        drop(thread::spawn(move || {
            let mut chunk = [0_u8; 8192];
            loop {
                match stream.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(read) => {
                        let bytes = chunk.get(..read).unwrap_or_default();
                        lock_buffer(&sink).extend_from_slice(bytes);
                    }
                    Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                    Err(error) => {
                        warn!(
                            target: RUNNER_TARGET,
                            stream = stream_name,
                            %error,
                            "failed to read container output; keeping partial capture"
                        );
                        break;
                    }
                }
            }
            drop(done.send(()));
        }));
        PipeCapture {
            stream_name,
            buffer,
            finished,
        }
    })
}

/// Waits for a reader until the run deadline, then takes what it captured.
fn collect_pipe(capture: Option<&PipeCapture>, timeout: Duration, started: Instant) -> Vec<u8> {
    let Some(pipe) = capture else {
        return Vec::new();
    };
    let remaining = timeout.saturating_sub(started.elapsed());
    if matches!(
        pipe.finished.recv_timeout(remaining),
        Err(RecvTimeoutError::Timeout)
    ) {
        warn!(
            target: RUNNER_TARGET,
            stream = pipe.stream_name,
            timeout = ?timeout,
            "output stream still open at the deadline; keeping partial capture"
        );
    }
    std::mem::take(&mut *lock_buffer(&pipe.buffer))
}

fn lock_buffer(buffer: &Mutex<Vec<u8>>) -> MutexGuard<'_, Vec<u8>> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}
