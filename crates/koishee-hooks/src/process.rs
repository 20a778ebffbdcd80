//! Process-based hook execution.
//!
//! [`ProcessExecutor`] implements [`HookExecutor`] by spawning the hook with
//! an emptied environment plus the event variables. Standard streams are
//! attached to the null device: hook output is not collected, and a chatty
//! hook cannot block on a full pipe.

use std::process::{Command, Stdio};
use std::sync::Arc;

use tracing::debug;

use crate::command::HookCommand;
use crate::environment::HookEnvironment;
use crate::error::HookError;
use crate::runner::{HookExecutor, HookExit};

/// Tracing target for hook process operations.
const HOOK_TARGET: &str = "koishee_hooks::process";

/// Executes hooks as child processes and waits for them to exit.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

impl HookExecutor for ProcessExecutor {
    fn execute(
        &self,
        command: &HookCommand,
        environment: &HookEnvironment,
    ) -> Result<HookExit, HookError> {
        let program = command.program().to_string_lossy().into_owned();

        let mut process = Command::new(command.program());
        process
            .args(command.args())
            .env_clear()
            .envs(environment.iter())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        debug!(
            target: HOOK_TARGET,
            hook = %program,
            variables = environment.len(),
            "spawning hook process"
        );

        let mut child = process.spawn().map_err(|err| HookError::Spawn {
            program: program.clone(),
            source: Arc::new(err),
        })?;

        let status = child.wait().map_err(|err| HookError::Wait {
            program: program.clone(),
            source: Arc::new(err),
        })?;

        debug!(
            target: HOOK_TARGET,
            hook = %program,
            ?status,
            "hook process exited"
        );

        Ok(HookExit::new(status.code()))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::event::{LifecycleEvent, ServiceName, ServiceRecord};

    fn shell_hook(script: &str, output: &std::path::Path) -> HookCommand {
        HookCommand::new(
            "/bin/sh",
            [
                std::ffi::OsString::from("-c"),
                std::ffi::OsString::from(script),
                std::ffi::OsString::from("hook"),
                output.as_os_str().to_owned(),
            ],
        )
    }

    #[test]
    fn hook_sees_event_variables() {
        let dir = TempDir::new().expect("temp dir");
        let output = dir.path().join("env.txt");
        let command = shell_hook(
            r#"printf '%s|%s|%s|%s|%s|%s' "$svc_action" "$svc_name" "$svc_host" "$svc_port" "$svc_proto" "$svc_attr_zone" > "$1""#,
            &output,
        );
        let record = ServiceRecord::from_json(
            r#"{"host":"10.0.0.1","port":8080,"proto":"tcp","labels":{"zone":"a"}}"#,
        )
        .expect("decode");
        let event = LifecycleEvent::Start {
            name: ServiceName::new("services"),
            record,
        };

        let exit = ProcessExecutor
            .execute(&command, &HookEnvironment::for_event(&event))
            .expect("hook runs");

        assert!(exit.is_success());
        let written = fs::read_to_string(&output).expect("read hook output");
        assert_eq!(written, "start|services|10.0.0.1|8080|tcp|a");
    }

    #[test]
    fn hook_does_not_inherit_watcher_environment() {
        let dir = TempDir::new().expect("temp dir");
        let output = dir.path().join("home.txt");
        let command = shell_hook(r#"printf '%s' "${HOME-unset}" > "$1""#, &output);
        let event = LifecycleEvent::Stop {
            name: ServiceName::new("1"),
        };

        ProcessExecutor
            .execute(&command, &HookEnvironment::for_event(&event))
            .expect("hook runs");

        let written = fs::read_to_string(&output).expect("read hook output");
        assert_eq!(written, "unset");
    }

    #[test]
    fn reports_exit_code() {
        let dir = TempDir::new().expect("temp dir");
        let command = shell_hook("exit 3", &dir.path().join("unused"));
        let exit = ProcessExecutor
            .execute(&command, &HookEnvironment::default())
            .expect("hook runs");
        assert_eq!(exit.code(), Some(3));
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let command = HookCommand::new("/nonexistent/koishee-hook", Vec::<String>::new());
        let error = ProcessExecutor
            .execute(&command, &HookEnvironment::default())
            .expect_err("spawn fails");
        assert!(matches!(error, HookError::Spawn { .. }));
        assert_eq!(error.program(), "/nonexistent/koishee-hook");
    }
}
