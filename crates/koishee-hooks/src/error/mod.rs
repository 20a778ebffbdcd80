//! Errors raised while running a hook.
//!
//! The watcher never retries or escalates these; they exist so the failure
//! can be reported with enough context to find the broken hook.

use std::sync::Arc;

use thiserror::Error;

/// Errors arising from a single hook invocation.
#[derive(Debug, Clone, Error)]
pub enum HookError {
    /// The hook process could not be started.
    #[error("hook '{program}' failed to start: {source}")]
    Spawn {
        /// Program that was executed.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Waiting for the hook process failed.
    #[error("failed waiting for hook '{program}': {source}")]
    Wait {
        /// Program that was executed.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The hook exited unsuccessfully.
    #[error("hook '{program}' exited with {}", describe_code(.code.as_ref().copied()))]
    NonZeroExit {
        /// Program that was executed.
        program: String,
        /// Exit code, absent when the hook was killed by a signal.
        code: Option<i32>,
    },
}

impl HookError {
    /// Program the failing invocation ran.
    #[must_use]
    pub fn program(&self) -> &str {
        match self {
            Self::Spawn { program, .. }
            | Self::Wait { program, .. }
            | Self::NonZeroExit { program, .. } => program,
        }
    }
}

fn describe_code(code: Option<i32>) -> String {
    code.map_or_else(
        || String::from("no exit code (terminated by signal)"),
        |value| format!("status {value}"),
    )
}
