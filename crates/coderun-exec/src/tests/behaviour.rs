//! Behavioural tests for the sandbox facade using `rstest-bdd`.

use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mockall::mock;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::{
    AvailabilityProbe, ContainerRunner, ExecutionRequest, ExecutionResult, ExecutorRegistry,
    InvocationSpec, RunOutcome, Sandbox, SandboxPolicy, SourceDelivery,
};

mock! {
    Probe {}
    impl AvailabilityProbe for Probe {
        fn is_available(&self) -> bool;
    }
}

mock! {
    Runner {}
    impl ContainerRunner for Runner {
        fn run(&self, spec: &InvocationSpec, input: &[u8], timeout: Duration) -> RunOutcome;
    }
}

#[derive(Debug, Clone, Default)]
enum ContainerBehaviour {
    #[default]
    Silent,
    Prints(String),
    FailsWith(String),
    NeverFinishes,
    EchoesInput,
}

impl ContainerBehaviour {
    fn outcome(&self, input: &[u8]) -> RunOutcome {
        let completed = |exit_code, stdout: &[u8], stderr: &[u8]| RunOutcome::Completed {
            exit_code: Some(exit_code),
            stdout: stdout.to_vec(),
            stderr: stderr.to_vec(),
        };
        match self {
            Self::Silent => completed(0, b"", b""),
            Self::Prints(text) => completed(0, text.as_bytes(), b""),
            Self::FailsWith(text) => completed(1, b"", text.as_bytes()),
            Self::NeverFinishes => RunOutcome::TimedOut,
            Self::EchoesInput => completed(0, input, b""),
        }
    }
}

struct TestWorld {
    runtime_available: bool,
    behaviour: ContainerBehaviour,
    policy: SandboxPolicy,
    probe_calls: Arc<AtomicUsize>,
    deliveries: Arc<Mutex<Vec<SourceDelivery>>>,
    result: Option<ExecutionResult>,
}

impl TestWorld {
    fn new() -> Self {
        Self {
            runtime_available: false,
            behaviour: ContainerBehaviour::default(),
            policy: SandboxPolicy::new(),
            probe_calls: Arc::new(AtomicUsize::new(0)),
            deliveries: Arc::new(Mutex::new(Vec::new())),
            result: None,
        }
    }

    fn execute(&mut self, request: &ExecutionRequest) {
        let mut probe = MockProbe::new();
        let available = self.runtime_available;
        let probe_calls = Arc::clone(&self.probe_calls);
        probe.expect_is_available().returning(move || {
            probe_calls.fetch_add(1, Ordering::SeqCst);
            available
        });

        let mut runner = MockRunner::new();
        let behaviour = self.behaviour.clone();
        let deliveries = Arc::clone(&self.deliveries);
        runner.expect_run().returning(
            move |spec: &InvocationSpec, input: &[u8], _timeout: Duration| {
                deliveries
                    .lock()
                    .expect("deliveries lock")
                    .push(spec.delivery());
                behaviour.outcome(input)
            },
        );

        let sandbox = Sandbox::with_parts(
            self.policy.clone(),
            ExecutorRegistry::with_defaults(),
            probe,
            runner,
        );
        self.result = Some(sandbox.execute(request));
    }

    fn result(&self) -> &ExecutionResult {
        self.result.as_ref().expect("execution result missing")
    }

    fn containers_started(&self) -> usize {
        self.deliveries.lock().expect("deliveries lock").len()
    }
}

#[fixture]
fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}

fn unquote(text: &str) -> &str {
    text.trim_matches('"')
}

#[given("a reachable container runtime")]
fn given_reachable_runtime(world: &RefCell<TestWorld>) {
    world.borrow_mut().runtime_available = true;
}

#[given("an unreachable container runtime")]
fn given_unreachable_runtime(world: &RefCell<TestWorld>) {
    world.borrow_mut().runtime_available = false;
}

#[given("a container that prints {text}")]
fn given_printing_container(world: &RefCell<TestWorld>, text: String) {
    world.borrow_mut().behaviour = ContainerBehaviour::Prints(unquote(&text).to_owned());
}

#[given("a container that fails with {text}")]
fn given_failing_container(world: &RefCell<TestWorld>, text: String) {
    world.borrow_mut().behaviour = ContainerBehaviour::FailsWith(unquote(&text).to_owned());
}

#[given("a container that never finishes")]
fn given_hanging_container(world: &RefCell<TestWorld>) {
    world.borrow_mut().behaviour = ContainerBehaviour::NeverFinishes;
}

#[given("a container that echoes its input")]
fn given_echoing_container(world: &RefCell<TestWorld>) {
    world.borrow_mut().behaviour = ContainerBehaviour::EchoesInput;
}

#[given("an allow-list containing {package}")]
fn given_allow_list(world: &RefCell<TestWorld>, package: String) {
    let mut world = world.borrow_mut();
    world.policy = world.policy.clone().allow_package(unquote(&package));
}

#[when("the sandbox executes {language} code")]
fn when_execute(world: &RefCell<TestWorld>, language: String) {
    let request = ExecutionRequest::new(language, "main").with_timeout(Duration::from_secs(1));
    world.borrow_mut().execute(&request);
}

#[when("the sandbox executes {language} code depending on {package}")]
fn when_execute_with_dependency(world: &RefCell<TestWorld>, language: String, package: String) {
    let request = ExecutionRequest::new(language, "main")
        .with_dependencies(vec![unquote(&package).to_owned()]);
    world.borrow_mut().execute(&request);
}

#[when("the sandbox executes {language} code with stdin {stdin}")]
fn when_execute_with_stdin(world: &RefCell<TestWorld>, language: String, stdin: String) {
    let request = ExecutionRequest::new(language, "main").with_stdin(unquote(&stdin));
    world.borrow_mut().execute(&request);
}

#[then("the execution succeeds")]
fn then_succeeds(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    let result = world.result();
    assert!(result.is_success(), "unexpected error: {:?}", result.error());
}

#[then("the error kind is {kind}")]
fn then_error_kind(world: &RefCell<TestWorld>, kind: String) {
    let world = world.borrow();
    let actual = world
        .result()
        .error()
        .map(|error| error.kind().to_string());
    assert_eq!(actual.as_deref(), Some(unquote(&kind)));
}

#[then("the output contains {text}")]
fn then_output_contains(world: &RefCell<TestWorld>, text: String) {
    let world = world.borrow();
    let output = world.result().output();
    assert!(output.contains(unquote(&text)), "output was {output:?}");
}

#[then("the output ends with {text}")]
fn then_output_ends_with(world: &RefCell<TestWorld>, text: String) {
    let world = world.borrow();
    let output = world.result().output();
    assert!(output.ends_with(unquote(&text)), "output was {output:?}");
}

#[then("the output is empty")]
fn then_output_empty(world: &RefCell<TestWorld>) {
    assert_eq!(world.borrow().result().output(), "");
}

#[then("no container is started")]
fn then_no_container(world: &RefCell<TestWorld>) {
    assert_eq!(world.borrow().containers_started(), 0);
}

#[then("the runtime is not probed")]
fn then_not_probed(world: &RefCell<TestWorld>) {
    assert_eq!(world.borrow().probe_calls.load(Ordering::SeqCst), 0);
}

#[then("the source was delivered as a file")]
fn then_file_delivery(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    let deliveries = world.deliveries.lock().expect("deliveries lock");
    assert_eq!(deliveries.as_slice(), [SourceDelivery::File]);
}

#[scenario(
    path = "tests/features/execution.feature",
    name = "Program output is returned on success"
)]
fn successful_execution(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/execution.feature",
    name = "An unreachable runtime fails fast"
)]
fn unreachable_runtime(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/execution.feature",
    name = "Unknown languages are refused before probing"
)]
fn unknown_language(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/execution.feature",
    name = "A program that overruns its deadline is reported as a timeout"
)]
fn overrunning_program(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/execution.feature",
    name = "A failing program keeps its diagnostics"
)]
fn failing_program(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/execution.feature",
    name = "Dependencies outside the allow-list are rejected"
)]
fn rejected_dependency(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/execution.feature",
    name = "Program input follows the source on the input stream"
)]
fn stdin_follows_source(world: RefCell<TestWorld>) {
    let _ = world;
}
