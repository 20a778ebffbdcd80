//! Immutable watcher settings resolved once at startup.

use std::ffi::OsString;
use std::fmt;

use koishee_config::{Config, EndpointError, local_domain_for_host};
use koishee_hooks::HookCommand;
use koishee_registry::Prefix;
use thiserror::Error;
use url::Url;

/// Which of the two watched subtrees a component serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subtree {
    /// Registrations shared by every host.
    Global,
    /// Registrations for this host only.
    Local,
}

impl Subtree {
    /// Lower-case label used in logs and thread names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for Subtree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A subtree together with the registry prefix it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    /// Subtree identity.
    pub subtree: Subtree,
    /// Domain the prefix was derived from.
    pub domain: String,
    /// Registry prefix to bootstrap and watch.
    pub prefix: Prefix,
}

impl WatchTarget {
    /// Derives the target for `domain`.
    #[must_use]
    pub fn new(subtree: Subtree, domain: &str) -> Self {
        Self {
            subtree,
            domain: domain.to_owned(),
            prefix: Prefix::from_domain(domain),
        }
    }
}

/// Source of the host name used for the default local domain.
pub trait HostnameSource {
    /// Returns this machine's host name.
    ///
    /// # Errors
    ///
    /// Returns a [`HostnameError`] when the name cannot be determined.
    fn hostname(&self) -> Result<String, HostnameError>;
}

/// Reads the host name from the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHostname;

impl HostnameSource for SystemHostname {
    fn hostname(&self) -> Result<String, HostnameError> {
        let name = nix::unistd::gethostname().map_err(HostnameError::Lookup)?;
        name.into_string().map_err(HostnameError::NotUtf8)
    }
}

/// Errors raised while determining the host name.
#[derive(Debug, Error)]
pub enum HostnameError {
    /// The system call failed.
    #[error("failed to read host name: {0}")]
    Lookup(#[source] nix::Error),
    /// The host name is not valid UTF-8.
    #[error("host name {0:?} is not valid UTF-8")]
    NotUtf8(OsString),
}

/// Errors raised while resolving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The etcd endpoint is unusable.
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    /// No local domain was configured and the host name is unavailable.
    #[error("cannot derive the local domain: {0}")]
    Hostname(#[from] HostnameError),
}

/// Everything the watcher needs after startup, fixed for the process
/// lifetime and shared by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    endpoint: Url,
    global: WatchTarget,
    local: WatchTarget,
    hook: HookCommand,
}

impl Settings {
    /// Resolves `config` and the hook command into settings.
    ///
    /// The host name is only consulted when no local domain is configured.
    ///
    /// # Errors
    ///
    /// Returns a [`SettingsError`] when the endpoint is invalid or the local
    /// domain cannot be derived.
    pub fn resolve(
        config: &Config,
        hook: HookCommand,
        hostnames: &dyn HostnameSource,
    ) -> Result<Self, SettingsError> {
        let endpoint = config.etcd_url()?;
        let local_domain = match config.local_override() {
            Some(domain) => domain.to_owned(),
            None => local_domain_for_host(&hostnames.hostname()?),
        };
        Ok(Self {
            endpoint,
            global: WatchTarget::new(Subtree::Global, config.domain()),
            local: WatchTarget::new(Subtree::Local, &local_domain),
            hook,
        })
    }

    /// etcd endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Target for the global domain.
    #[must_use]
    pub const fn global(&self) -> &WatchTarget {
        &self.global
    }

    /// Target for the per-host domain.
    #[must_use]
    pub const fn local(&self) -> &WatchTarget {
        &self.local
    }

    /// Both targets, global first.
    #[must_use]
    pub fn targets(&self) -> [&WatchTarget; 2] {
        [&self.global, &self.local]
    }

    /// Hook run for every lifecycle event.
    #[must_use]
    pub const fn hook(&self) -> &HookCommand {
        &self.hook
    }
}
