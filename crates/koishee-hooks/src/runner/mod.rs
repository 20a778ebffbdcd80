//! Hook runner turning lifecycle events into hook invocations.
//!
//! [`HookRunner`] owns the configured [`HookCommand`], builds the
//! [`HookEnvironment`] for each event and hands both to a [`HookExecutor`].
//! The executor abstraction lets tests observe invocations without spawning
//! processes.

use crate::command::HookCommand;
use crate::environment::HookEnvironment;
use crate::error::HookError;
use crate::event::LifecycleEvent;

/// How a hook process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookExit {
    code: Option<i32>,
}

impl HookExit {
    /// Records an exit with the given code; `None` means killed by a signal.
    #[must_use]
    pub const fn new(code: Option<i32>) -> Self {
        Self { code }
    }

    /// A clean exit.
    #[must_use]
    pub const fn success() -> Self {
        Self { code: Some(0) }
    }

    /// Exit code, if the process exited normally.
    #[must_use]
    pub const fn code(self) -> Option<i32> {
        self.code
    }

    /// Whether the hook reported success.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// Runs a hook command with a prepared environment and waits for it.
///
/// The production implementation is
/// [`ProcessExecutor`](crate::process::ProcessExecutor).
pub trait HookExecutor {
    /// Executes `command` with exactly the variables in `environment`.
    ///
    /// # Errors
    ///
    /// Returns a [`HookError`] when the process cannot be started or waited
    /// on. An unsuccessful exit is reported through [`HookExit`], not as an
    /// error.
    fn execute(
        &self,
        command: &HookCommand,
        environment: &HookEnvironment,
    ) -> Result<HookExit, HookError>;
}

/// Invokes the configured hook once per lifecycle event.
#[derive(Debug)]
pub struct HookRunner<E> {
    command: HookCommand,
    executor: E,
}

impl<E> HookRunner<E> {
    /// Creates a runner for `command` using `executor`.
    #[must_use]
    pub const fn new(command: HookCommand, executor: E) -> Self {
        Self { command, executor }
    }
}

impl<E: HookExecutor> HookRunner<E> {
    /// Runs the hook for `event` and waits for it to finish.
    ///
    /// # Errors
    ///
    /// Returns any executor error, or [`HookError::NonZeroExit`] when the
    /// hook exits unsuccessfully.
    pub fn invoke(&self, event: &LifecycleEvent) -> Result<HookExit, HookError> {
        let environment = HookEnvironment::for_event(event);
        let exit = self.executor.execute(&self.command, &environment)?;
        if exit.is_success() {
            Ok(exit)
        } else {
            Err(HookError::NonZeroExit {
                program: self.command.program().to_string_lossy().into_owned(),
                code: exit.code(),
            })
        }
    }
}

#[cfg(test)]
mod tests;
