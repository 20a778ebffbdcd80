//! Unit tests for the hook runner.

use std::io;
use std::sync::Arc;

use mockall::mock;
use mockall::predicate::always;
use rstest::{fixture, rstest};

use super::*;
use crate::event::{ServiceName, ServiceRecord};

mock! {
    Executor {}
    impl HookExecutor for Executor {
        fn execute(
            &self,
            command: &HookCommand,
            environment: &HookEnvironment,
        ) -> Result<HookExit, HookError>;
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[fixture]
fn command() -> HookCommand {
    HookCommand::new("/usr/local/bin/on-change", ["--from-koishee"])
}

#[fixture]
fn start_event() -> LifecycleEvent {
    LifecycleEvent::Start {
        name: ServiceName::new("web"),
        record: ServiceRecord {
            host: Some(String::from("10.1.2.3")),
            port: Some(443),
            proto: Some(String::from("tcp")),
            labels: None,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[rstest]
fn invoke_passes_command_and_event_environment(
    command: HookCommand,
    start_event: LifecycleEvent,
) {
    let expected_command = command.clone();
    let mut executor = MockExecutor::new();
    executor
        .expect_execute()
        .once()
        .withf(move |cmd, environment| {
            cmd == &expected_command
                && environment.to_assignments()
                    == [
                        "svc_action=start",
                        "svc_name=web",
                        "svc_host=10.1.2.3",
                        "svc_port=443",
                        "svc_proto=tcp",
                    ]
        })
        .returning(|_, _| Ok(HookExit::success()));

    let runner = HookRunner::new(command, executor);
    let exit = runner.invoke(&start_event).expect("hook succeeds");
    assert!(exit.is_success());
}

#[rstest]
fn invoke_reports_non_zero_exit(command: HookCommand) {
    let mut executor = MockExecutor::new();
    executor
        .expect_execute()
        .with(always(), always())
        .once()
        .returning(|_, _| Ok(HookExit::new(Some(2))));

    let runner = HookRunner::new(command, executor);
    let event = LifecycleEvent::Stop {
        name: ServiceName::new("web"),
    };
    let error = runner.invoke(&event).expect_err("non-zero exit");
    assert!(matches!(
        error,
        HookError::NonZeroExit {
            code: Some(2),
            ref program,
        } if program == "/usr/local/bin/on-change"
    ));
}

#[rstest]
fn invoke_reports_signal_termination(command: HookCommand, start_event: LifecycleEvent) {
    let mut executor = MockExecutor::new();
    executor
        .expect_execute()
        .once()
        .returning(|_, _| Ok(HookExit::new(None)));

    let runner = HookRunner::new(command, executor);
    let error = runner.invoke(&start_event).expect_err("signalled");
    assert!(matches!(error, HookError::NonZeroExit { code: None, .. }));
}

#[rstest]
fn invoke_propagates_spawn_failure(command: HookCommand, start_event: LifecycleEvent) {
    let mut executor = MockExecutor::new();
    executor.expect_execute().once().returning(|cmd, _| {
        Err(HookError::Spawn {
            program: cmd.program().to_string_lossy().into_owned(),
            source: Arc::new(io::Error::from(io::ErrorKind::NotFound)),
        })
    });

    let runner = HookRunner::new(command, executor);
    let error = runner.invoke(&start_event).expect_err("spawn failure");
    assert!(matches!(error, HookError::Spawn { .. }));
}

#[test]
fn exit_classification() {
    assert!(HookExit::success().is_success());
    assert!(!HookExit::new(Some(1)).is_success());
    assert!(!HookExit::new(None).is_success());
    assert_eq!(HookExit::new(Some(7)).code(), Some(7));
}
