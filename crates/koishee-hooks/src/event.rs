//! Lifecycle events handed to the hook.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// Instance details published in the registry.
///
/// Every field is optional: absence means the publisher did not report it.
/// Unknown fields are ignored so publishers can add data without breaking
/// watchers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceRecord {
    /// Address the instance listens on.
    #[serde(default)]
    pub host: Option<String>,
    /// Port the instance listens on.
    #[serde(default)]
    pub port: Option<i64>,
    /// Transport protocol, e.g. `tcp`.
    #[serde(default)]
    pub proto: Option<String>,
    /// Free-form attributes; sorted so iteration order is stable.
    #[serde(default)]
    pub labels: Option<BTreeMap<String, String>>,
}

impl ServiceRecord {
    /// Decodes a registry value.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when `value` is not an object matching the
    /// record schema.
    pub fn from_json(value: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(value)
    }

    /// Iterates over the labels, if any, in key order.
    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels
            .iter()
            .flatten()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

/// Name a hook sees in `svc_name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceName(String);

impl ServiceName {
    /// Wraps a name taken from a registry key.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A service appearing in or disappearing from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// An instance was registered or updated.
    Start {
        /// Service the instance belongs to.
        name: ServiceName,
        /// Published instance details.
        record: ServiceRecord,
    },
    /// An instance was removed.
    Stop {
        /// Service the instance belonged to.
        name: ServiceName,
    },
}

impl LifecycleEvent {
    /// Service the event concerns.
    #[must_use]
    pub const fn name(&self) -> &ServiceName {
        match self {
            Self::Start { name, .. } | Self::Stop { name } => name,
        }
    }

    /// Value of `svc_action` for this event.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Stop { .. } => "stop",
        }
    }
}
