//! Unit tests for invocation rendering and shell quoting.

use std::ffi::OsString;

use rstest::{fixture, rstest};

use super::*;
use crate::policy::{ResourceLimits, UserId};

#[fixture]
fn policy() -> SandboxPolicy {
    SandboxPolicy::new()
}

fn rendered(args: &[OsString]) -> Vec<String> {
    args.iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

fn value_after(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|index| args.get(index + 1))
        .cloned()
}

#[rstest]
fn container_args_carry_full_isolation_posture(policy: SandboxPolicy) {
    let spec = InvocationSpec::builder(Language::Python, "python:3.11", &policy)
        .steps(["python3 -"])
        .build();
    let args = rendered(&spec.container_args("coderun-test"));

    assert_eq!(&args[..5], ["run", "--rm", "-i", "--name", "coderun-test"]);
    assert_eq!(value_after(&args, "--network").as_deref(), Some("none"));
    assert_eq!(value_after(&args, "--cap-drop").as_deref(), Some("ALL"));
    assert_eq!(
        value_after(&args, "--security-opt").as_deref(),
        Some("no-new-privileges")
    );
    assert!(args.iter().any(|arg| arg == "--read-only"));
    assert_eq!(
        value_after(&args, "--tmpfs").as_deref(),
        Some("/sandbox:rw,exec,nosuid,nodev,uid=1000,gid=1000")
    );
    assert_eq!(value_after(&args, "--user").as_deref(), Some("1000:1000"));
}

#[rstest]
fn memory_swap_matches_memory_limit(policy: SandboxPolicy) {
    let limits = ResourceLimits::new("1.5", "512m", 32).expect("valid limits");
    let policy = policy.with_limits(limits);
    let spec = InvocationSpec::builder(Language::C, "gcc:13", &policy).build();
    let flags = spec.isolation_flags();

    assert_eq!(value_after(&flags, "--cpus").as_deref(), Some("1.5"));
    assert_eq!(value_after(&flags, "--memory").as_deref(), Some("512m"));
    assert_eq!(value_after(&flags, "--memory-swap").as_deref(), Some("512m"));
    assert_eq!(value_after(&flags, "--pids-limit").as_deref(), Some("32"));
}

#[rstest]
fn image_and_script_close_the_argument_list(policy: SandboxPolicy) {
    let spec = InvocationSpec::builder(Language::Go, "golang:1.22", &policy)
        .steps(["head -c 3 > /sandbox/main.go", "go run /sandbox/main.go"])
        .build();
    let args = rendered(&spec.container_args("coderun-x"));
    let tail = &args[args.len() - 4..];

    assert_eq!(tail[0], "golang:1.22");
    assert_eq!(tail[1], "sh");
    assert_eq!(tail[2], "-c");
    assert_eq!(
        tail[3],
        "head -c 3 > /sandbox/main.go && go run /sandbox/main.go"
    );
    assert_eq!(value_after(&args, "--workdir").as_deref(), Some("/sandbox"));
}

#[rstest]
fn custom_user_is_rendered_into_mount_and_flag(policy: SandboxPolicy) {
    let user = UserId::new(2000, 3000).expect("non-root user");
    let policy = policy.with_user(user);
    let spec = InvocationSpec::builder(Language::Rust, "rust:1.83", &policy).build();
    let flags = spec.isolation_flags();

    assert_eq!(value_after(&flags, "--user").as_deref(), Some("2000:3000"));
    assert!(
        value_after(&flags, "--tmpfs")
            .is_some_and(|mount| mount.ends_with("uid=2000,gid=3000"))
    );
}

#[rstest]
fn env_replaces_existing_keys(policy: SandboxPolicy) {
    let spec = InvocationSpec::builder(Language::Go, "golang:1.22", &policy)
        .env("HOME", "/sandbox/home")
        .env("GOCACHE", "/sandbox/.cache")
        .build();

    let home: Vec<_> = spec
        .environment()
        .iter()
        .filter(|(key, _)| key == "HOME")
        .collect();
    assert_eq!(home.len(), 1);
    assert_eq!(home[0].1, "/sandbox/home");
    assert!(
        spec.environment()
            .iter()
            .any(|(key, value)| key == "GOCACHE" && value == "/sandbox/.cache")
    );
}

#[rstest]
fn environment_renders_as_env_flags(policy: SandboxPolicy) {
    let spec = InvocationSpec::builder(Language::Python, "python:3.11", &policy).build();
    let args = rendered(&spec.container_args("coderun-env"));

    assert!(
        args.windows(2)
            .any(|pair| pair[0] == "--env" && pair[1] == "TMPDIR=/sandbox")
    );
}

#[rstest]
#[case("numpy", "numpy")]
#[case("pandas==2.1.0", "pandas==2.1.0")]
#[case("", "''")]
#[case("a b", "'a b'")]
#[case("pandas>=2", "'pandas>=2'")]
#[case("x; rm -rf /", "'x; rm -rf /'")]
#[case("it's", "'it'\\''s'")]
#[case("$(id)", "'$(id)'")]
fn shell_quote_passes_words_literally(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(shell_quote(input), expected);
}

#[test]
fn shell_join_preserves_order() {
    let joined = shell_join(&["numpy", "pandas", "scikit learn"]);
    assert_eq!(joined, "numpy pandas 'scikit learn'");
}

#[test]
fn shell_join_of_nothing_is_empty() {
    let empty: [&str; 0] = [];
    assert_eq!(shell_join(&empty), "");
}
