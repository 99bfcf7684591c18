//! Isolated-run specifications rendered to container runtime arguments.
//!
//! An [`InvocationSpec`] is built fresh for every request. The isolation
//! posture is not a set of options: no network, a read-only root with one
//! `tmpfs` scratch mount, dropped capabilities, `no-new-privileges` and a
//! non-root user are always rendered, so no executor can forget one. Only the
//! image, the entrypoint script, extra environment variables and the
//! operator-tunable [`SandboxPolicy`] values vary.

use std::ffi::OsString;

use crate::language::Language;
use crate::policy::{ResourceLimits, SandboxPolicy, UserId};

/// How the source text reaches the language runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceDelivery {
    /// The interpreter reads the program directly from standard input.
    Stream,
    /// The entrypoint copies the source bytes into the scratch directory.
    File,
}

/// Fully resolved description of one sandboxed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSpec {
    language: Language,
    image: String,
    limits: ResourceLimits,
    user: UserId,
    scratch_dir: String,
    environment: Vec<(String, String)>,
    delivery: SourceDelivery,
    script: String,
}

impl InvocationSpec {
    /// Starts a specification for `language` running in `image` under
    /// `policy`.
    #[must_use]
    pub fn builder(
        language: Language,
        image: impl Into<String>,
        policy: &SandboxPolicy,
    ) -> InvocationBuilder {
        InvocationBuilder {
            spec: Self {
                language,
                image: image.into(),
                limits: policy.limits().clone(),
                user: policy.user(),
                scratch_dir: policy.scratch_dir().to_owned(),
                environment: vec![
                    (String::from("HOME"), policy.scratch_dir().to_owned()),
                    (String::from("TMPDIR"), policy.scratch_dir().to_owned()),
                ],
                delivery: SourceDelivery::File,
                script: String::new(),
            },
        }
    }

    /// Language being run.
    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    /// Container image reference.
    #[must_use]
    pub const fn image(&self) -> &str {
        self.image.as_str()
    }

    /// Resource caps.
    #[must_use]
    pub const fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// Identity the program runs as.
    #[must_use]
    pub const fn user(&self) -> UserId {
        self.user
    }

    /// Writable scratch mount point.
    #[must_use]
    pub const fn scratch_dir(&self) -> &str {
        self.scratch_dir.as_str()
    }

    /// Environment variables set inside the container.
    #[must_use]
    pub const fn environment(&self) -> &[(String, String)] {
        self.environment.as_slice()
    }

    /// How the source reaches the runtime.
    #[must_use]
    pub const fn delivery(&self) -> SourceDelivery {
        self.delivery
    }

    /// Shell script run by `sh -c` inside the container.
    #[must_use]
    pub const fn script(&self) -> &str {
        self.script.as_str()
    }

    /// Flags enforcing the isolation posture, in rendering order.
    #[must_use]
    pub fn isolation_flags(&self) -> Vec<String> {
        let memory = self.limits.memory().to_owned();
        vec![
            String::from("--network"),
            String::from("none"),
            String::from("--cpus"),
            self.limits.cpus().to_owned(),
            String::from("--memory"),
            memory.clone(),
            String::from("--memory-swap"),
            memory,
            String::from("--pids-limit"),
            self.limits.pids_limit().to_string(),
            String::from("--read-only"),
            String::from("--tmpfs"),
            format!(
                "{}:rw,exec,nosuid,nodev,uid={},gid={}",
                self.scratch_dir,
                self.user.uid(),
                self.user.gid()
            ),
            String::from("--cap-drop"),
            String::from("ALL"),
            String::from("--security-opt"),
            String::from("no-new-privileges"),
            String::from("--user"),
            self.user.to_string(),
        ]
    }

    /// Renders the full runtime argument vector for a container named
    /// `container_name`.
    #[must_use]
    pub fn container_args(&self, container_name: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["run", "--rm", "-i", "--name", container_name]
            .iter()
            .map(OsString::from)
            .collect();
        args.extend(self.isolation_flags().into_iter().map(OsString::from));
        for (key, value) in &self.environment {
            args.push(OsString::from("--env"));
            args.push(OsString::from(format!("{key}={value}")));
        }
        args.push(OsString::from("--workdir"));
        args.push(OsString::from(&self.scratch_dir));
        args.push(OsString::from(&self.image));
        args.push(OsString::from("sh"));
        args.push(OsString::from("-c"));
        args.push(OsString::from(&self.script));
        args
    }
}

/// Consuming builder for [`InvocationSpec`].
#[derive(Debug)]
pub struct InvocationBuilder {
    spec: InvocationSpec,
}

impl InvocationBuilder {
    /// Sets an environment variable, replacing any earlier value.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let name = key.into();
        let text = value.into();
        match self.spec.environment.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = text,
            None => self.spec.environment.push((name, text)),
        }
        self
    }

    /// Records how the source reaches the runtime.
    #[must_use]
    pub const fn delivery(mut self, delivery: SourceDelivery) -> Self {
        self.spec.delivery = delivery;
        self
    }

    /// Sets the entrypoint script from steps run in order, each only if the
    /// previous one succeeded.
    #[must_use]
    pub fn steps<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.spec.script = steps
            .into_iter()
            .map(|step| step.as_ref().to_owned())
            .collect::<Vec<_>>()
            .join(" && ");
        self
    }

    /// Finishes the specification.
    #[must_use]
    pub fn build(self) -> InvocationSpec {
        self.spec
    }
}

/// Quotes `arg` for POSIX `sh` so it is passed through as one literal word.
#[must_use]
pub fn shell_quote(arg: &str) -> String {
    if arg.is_empty() {
        return String::from("''");
    }
    let plain = arg
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-' | '.' | ':' | '='));
    if plain {
        return arg.to_owned();
    }
    format!("'{}'", arg.replace('\'', "'\\''"))
}

/// Quotes each argument and joins them with single spaces, preserving order.
#[must_use]
pub fn shell_join<S: AsRef<str>>(args: &[S]) -> String {
    args.iter()
        .map(|arg| shell_quote(arg.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests;
