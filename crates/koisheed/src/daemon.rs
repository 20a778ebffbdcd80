//! Startup sequence and worker supervision.
//!
//! [`prepare`] turns the command line into [`Settings`], failing fast on any
//! configuration problem. [`supervise`] then runs one [`SubtreeWatcher`] per
//! subtree on a named thread and waits for the first of them to stop. The
//! watcher never recovers in-process: the first stop ends the daemon, and
//! restarting (and therefore re-bootstrapping) is left to the supervisor
//! that launched it.

use std::convert::Infallible;
use std::ffi::OsString;
use std::io;
use std::sync::{Arc, mpsc};
use std::thread;

use koishee_config::Config;
use koishee_hooks::process::ProcessExecutor;
use koishee_hooks::{HookExecutor, HookRunner};
use koishee_registry::{EtcdClient, Registry, RegistryError};
use ortho_config::OrthoError;
use thiserror::Error;

use crate::cli::{CommandLine, USAGE};
use crate::health::{StructuredReporter, WatchReporter};
use crate::processor::EventProcessor;
use crate::settings::{HostnameSource, Settings, SettingsError, Subtree, SystemHostname};
use crate::telemetry::{self, TelemetryError};
use crate::watch::{HaltLatch, SubtreeWatcher, WatchError};

/// Loads configuration from the configuration-flag part of the command line.
pub trait ConfigLoader: Send + Sync {
    /// Loads the configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader error when flags, environment or files are invalid.
    fn load(&self, arguments: &[OsString]) -> Result<Config, Arc<OrthoError>>;
}

/// Loader layering defaults, configuration files, `KOISHEE_*` environment
/// variables and flags.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, arguments: &[OsString]) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_args(arguments.to_vec())
    }
}

/// Loader returning a fixed configuration regardless of the arguments.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _arguments: &[OsString]) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Reasons the daemon stops.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// No hook command was given.
    #[error("missing hook command\n{USAGE}")]
    MissingHook,
    /// Telemetry could not be initialised.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Settings could not be resolved.
    #[error("invalid settings: {source}")]
    Settings {
        /// Underlying resolution error.
        #[source]
        source: SettingsError,
    },
    /// The registry client could not be built.
    #[error("failed to create registry client: {source}")]
    Registry {
        /// Underlying client error.
        #[source]
        source: RegistryError,
    },
    /// A worker thread could not be started.
    #[error("failed to start {subtree} watcher: {source}")]
    Spawn {
        /// Subtree the worker would have served.
        subtree: Subtree,
        /// Underlying OS error.
        #[source]
        source: Arc<io::Error>,
    },
    /// A worker stopped.
    #[error("{subtree} watcher stopped: {source}")]
    Watch {
        /// Subtree whose worker stopped first.
        subtree: Subtree,
        /// Why it stopped.
        #[source]
        source: WatchError,
    },
    /// Every worker disappeared without reporting why.
    #[error("all watchers exited without reporting a reason")]
    WorkersLost,
}

/// Loads configuration, initialises telemetry and resolves settings.
///
/// # Errors
///
/// Returns a [`DaemonError`] describing the first startup step that failed.
pub fn prepare(
    loader: &dyn ConfigLoader,
    command_line: CommandLine,
    hostnames: &dyn HostnameSource,
) -> Result<Settings, DaemonError> {
    let config = loader
        .load(&command_line.config_arguments)
        .map_err(|source| DaemonError::Configuration { source })?;
    let hook = command_line.hook.ok_or(DaemonError::MissingHook)?;
    telemetry::initialise(&config).map_err(|source| DaemonError::Telemetry { source })?;
    Settings::resolve(&config, hook, hostnames).map_err(|source| DaemonError::Settings { source })
}

/// Runs both subtree workers until the first one stops.
///
/// # Errors
///
/// Always returns why the daemon stopped.
pub fn supervise<R, E>(
    settings: &Settings,
    registry: &Arc<R>,
    executor: &E,
    reporter: &Arc<dyn WatchReporter>,
) -> Result<Infallible, DaemonError>
where
    R: Registry + 'static,
    E: HookExecutor + Clone + Send + 'static,
{
    reporter.startup(settings);
    let halt = HaltLatch::new();
    let (sender, receiver) = mpsc::channel::<(Subtree, WatchError)>();

    for target in settings.targets() {
        let subtree = target.subtree;
        let runner = HookRunner::new(settings.hook().clone(), executor.clone());
        let processor = EventProcessor::new(target.clone(), runner, Arc::clone(reporter));
        let watcher = SubtreeWatcher::new(Arc::clone(registry), processor, halt.clone());
        let outcomes = sender.clone();

        thread::Builder::new()
            .name(format!("watch-{subtree}"))
            .spawn(move || {
                let Err(reason) = watcher.run();
                if outcomes.send((subtree, reason)).is_err() {
                    tracing::debug!(
                        target: "koisheed::daemon",
                        %subtree,
                        "daemon already exiting, stop reason dropped"
                    );
                }
            })
            .map_err(|source| {
                halt.raise();
                DaemonError::Spawn {
                    subtree,
                    source: Arc::new(source),
                }
            })?;
    }
    drop(sender);

    match receiver.recv() {
        Ok((subtree, source)) => Err(DaemonError::Watch { subtree, source }),
        Err(_) => Err(DaemonError::WorkersLost),
    }
}

/// Starts the daemon against etcd with the real hook executor.
///
/// # Errors
///
/// Always returns why the daemon stopped.
pub fn launch(
    loader: &dyn ConfigLoader,
    command_line: CommandLine,
) -> Result<Infallible, DaemonError> {
    let settings = prepare(loader, command_line, &SystemHostname)?;
    let registry = EtcdClient::new(settings.endpoint().clone())
        .map_err(|source| DaemonError::Registry { source })?;
    let reporter: Arc<dyn WatchReporter> = Arc::new(StructuredReporter);
    supervise(&settings, &Arc::new(registry), &ProcessExecutor, &reporter)
}
