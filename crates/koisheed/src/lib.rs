//! Watcher daemon that runs a hook whenever a service registers in or
//! leaves the SkyDNS registry.
//!
//! The daemon watches two subtrees of the etcd key space: the global domain
//! shared by all hosts and a per-host domain under `nodes`. At startup each
//! subtree is bootstrapped from a snapshot, replaying every stored record as
//! a registration, and then followed for changes. Each change is turned into
//! a `start` or `stop` event and handed to the hook through `svc_*`
//! environment variables.
//!
//! Work for a subtree is strictly sequential on its own thread, so a slow
//! hook delays only that subtree. Undecodable registry data or a lost change
//! stream stops the whole daemon with a failure status; the process
//! supervisor is expected to restart it.

mod bootstrap;
mod cli;
mod daemon;
mod health;
mod processor;
mod settings;
mod telemetry;
mod watch;

#[cfg(test)]
mod test_support;

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

pub use bootstrap::{BootstrapOutcome, bootstrap};
pub use cli::{CommandLine, USAGE, split_command_line};
pub use daemon::{
    ConfigLoader, DaemonError, OrthoConfigLoader, StaticConfigLoader, launch, prepare, supervise,
};
pub use health::{StructuredReporter, WatchReporter};
pub use processor::{Dispatch, EventProcessor, ProcessError, translate};
pub use settings::{
    HostnameError, HostnameSource, Settings, SettingsError, Subtree, SystemHostname, WatchTarget,
};
pub use telemetry::{TelemetryError, initialise as initialise_telemetry};
pub use watch::{HaltLatch, SubtreeWatcher, WatchError};

/// Runs the daemon with the process arguments and returns its exit status.
///
/// `--help` prints the usage summary to `stdout` and succeeds. Otherwise the
/// daemon runs until it stops, and the reason is written to `stderr`.
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let command_line = split_command_line(args);
    if command_line.help_requested {
        return match writeln!(stdout, "{USAGE}") {
            Ok(()) => ExitCode::SUCCESS,
            Err(_) => ExitCode::FAILURE,
        };
    }

    let Err(error) = launch(&OrthoConfigLoader, command_line);
    tracing::error!(target: "koisheed", %error, "daemon stopped");
    if let Err(write_error) = writeln!(stderr, "koisheed: {error}") {
        tracing::debug!(target: "koisheed", %write_error, "failed to report stop reason");
    }
    ExitCode::FAILURE
}
