//! Layered configuration for the koishee registry watcher.
//!
//! [`Config`] is assembled by `ortho_config` from built-in defaults, an
//! optional configuration file, `KOISHEE_*` environment variables and
//! command-line flags, with later layers taking precedence. The values are
//! raw operator input: the watcher resolves them once at startup into an
//! immutable settings value and never consults `Config` again.

mod defaults;
mod logging;

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub use defaults::{
    DEFAULT_ETCD_ENDPOINT, DEFAULT_GLOBAL_DOMAIN, LOCAL_DOMAIN_SUFFIX, local_domain_for_host,
};
pub use logging::{DEFAULT_LOG_FILTER, LogFormat, LogFormatParseError};

/// Operator-facing configuration for the watcher.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "KOISHEE")]
pub struct Config {
    /// Base URL of the etcd client endpoint.
    #[serde(default = "defaults::default_etcd_endpoint")]
    #[ortho_config(cli_short = 'e')]
    pub etcd: String,
    /// Domain watched for registrations visible to every host.
    #[serde(default = "defaults::default_global_domain")]
    #[ortho_config(cli_short = 'd')]
    pub domain: String,
    /// Per-host domain; derived from the host name when unset.
    #[serde(default)]
    #[ortho_config(cli_short = 'l')]
    pub local: Option<String>,
    /// `tracing` filter expression.
    #[serde(default = "logging::default_log_filter")]
    #[ortho_config(cli_short = 'f')]
    pub log_filter: String,
    /// Output format for diagnostics.
    #[serde(default = "logging::default_log_format")]
    #[ortho_config(cli_short = 'F')]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            etcd: defaults::default_etcd_endpoint(),
            domain: defaults::default_global_domain(),
            local: None,
            log_filter: logging::default_log_filter(),
            log_format: logging::default_log_format(),
        }
    }
}

/// The configured etcd endpoint could not be used as a base URL.
#[derive(Debug, Error)]
#[error("invalid etcd endpoint '{endpoint}': {reason}")]
pub struct EndpointError {
    endpoint: String,
    reason: String,
}

impl EndpointError {
    /// The endpoint text that was rejected.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Config {
    /// Loads configuration from every layer, reading flags from `args`.
    ///
    /// `args` must start with the program name and contain only the flags
    /// understood by [`Config`]; positional arguments belong to the hook and
    /// must be split off by the caller.
    ///
    /// # Errors
    ///
    /// Returns the loader error when a flag is unknown or lacks its value,
    /// a configuration file cannot be read, or a layer holds a value of the
    /// wrong type.
    pub fn load_from_args(args: Vec<OsString>) -> Result<Self, Arc<OrthoError>> {
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Parses the etcd endpoint into a URL suitable for joining key paths.
    ///
    /// # Errors
    ///
    /// Returns an [`EndpointError`] when the endpoint is not an absolute URL
    /// or is an opaque URL such as `mailto:` that cannot carry a path.
    pub fn etcd_url(&self) -> Result<Url, EndpointError> {
        let url = Url::parse(&self.etcd).map_err(|error| EndpointError {
            endpoint: self.etcd.clone(),
            reason: error.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(EndpointError {
                endpoint: self.etcd.clone(),
                reason: String::from("URL cannot carry a key path"),
            });
        }
        Ok(url)
    }

    /// Global domain name.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Explicitly configured per-host domain, if any.
    #[must_use]
    pub fn local_override(&self) -> Option<&str> {
        self.local.as_deref()
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_skydns_layout() {
        let config = Config::default();
        assert_eq!(config.etcd, "http://127.0.0.1:2379");
        assert_eq!(config.domain(), "skydns.local");
        assert!(config.local_override().is_none());
        assert_eq!(config.log_filter(), "info");
        assert_eq!(config.log_format(), LogFormat::Json);
    }

    #[test]
    fn parses_default_endpoint() {
        let url = Config::default().etcd_url().expect("default endpoint parses");
        assert_eq!(url.host_str(), Some("127.0.0.1"));
        assert_eq!(url.port(), Some(2379));
    }

    #[test]
    fn rejects_relative_endpoint() {
        let config = Config {
            etcd: String::from("127.0.0.1:2379/keys"),
            ..Config::default()
        };
        let error = config.etcd_url().expect_err("relative endpoint must fail");
        assert_eq!(error.endpoint(), "127.0.0.1:2379/keys");
    }

    #[test]
    fn rejects_opaque_endpoint() {
        let config = Config {
            etcd: String::from("mailto:ops@example.com"),
            ..Config::default()
        };
        assert!(config.etcd_url().is_err());
    }

    #[test]
    fn local_domain_appends_suffix() {
        assert_eq!(local_domain_for_host("edge-1"), "edge-1.nodes.skydns.local");
    }
}
