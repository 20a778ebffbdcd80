//! Hook invocation for registry lifecycle events.
//!
//! koishee turns every service registration or removal into one run of an
//! operator-supplied program, the *hook*. The hook learns about the event
//! purely through its environment: the watcher clears the inherited
//! environment and passes only the `svc_*` variables built by
//! [`HookEnvironment`].
//!
//! The [`HookRunner`] builds the environment for a [`LifecycleEvent`] and
//! delegates the actual process handling to a [`HookExecutor`]. The
//! production executor, [`ProcessExecutor`](process::ProcessExecutor),
//! spawns the hook with its standard streams attached to the null device and
//! waits for it to exit. There is deliberately no timeout: a hook that hangs
//! holds up the subtree that triggered it.
//!
//! # Example
//!
//! ```rust,no_run
//! use koishee_hooks::{HookCommand, HookRunner, LifecycleEvent, ServiceName};
//! use koishee_hooks::process::ProcessExecutor;
//!
//! let command = HookCommand::new("/usr/local/bin/reload-proxy", ["--quiet"]);
//! let runner = HookRunner::new(command, ProcessExecutor);
//! let event = LifecycleEvent::Stop {
//!     name: ServiceName::new("web"),
//! };
//! // Failures are reported to the caller, which decides whether they matter.
//! let _ = runner.invoke(&event);
//! ```

pub mod command;
pub mod environment;
pub mod error;
pub mod event;
pub mod process;
pub mod runner;

pub use self::command::HookCommand;
pub use self::environment::HookEnvironment;
pub use self::error::HookError;
pub use self::event::{LifecycleEvent, ServiceName, ServiceRecord};
pub use self::runner::{HookExecutor, HookExit, HookRunner};
