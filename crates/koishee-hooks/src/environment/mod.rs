//! The `svc_*` environment contract between the watcher and its hook.
//!
//! Start events produce, in order:
//!
//! ```text
//! svc_action=start
//! svc_name=<name>
//! svc_host=<host>
//! svc_port=<port>
//! svc_proto=<proto>
//! svc_attr_<label>=<value>   (one per label, sorted by label)
//! ```
//!
//! Unreported host and proto render as empty strings and an unreported port
//! as `0`, so hooks can rely on the five fixed variables being present. Stop
//! events carry only `svc_action=stop` and `svc_name`.

use crate::event::LifecycleEvent;

/// Prefix of the per-label variables.
pub const ATTRIBUTE_PREFIX: &str = "svc_attr_";

/// Ordered variables passed to one hook run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookEnvironment {
    variables: Vec<(String, String)>,
}

impl HookEnvironment {
    /// Builds the environment describing `event`.
    #[must_use]
    pub fn for_event(event: &LifecycleEvent) -> Self {
        let mut environment = Self::default();
        environment.push("svc_action", event.action());
        environment.push("svc_name", event.name().as_str());
        if let LifecycleEvent::Start { record, .. } = event {
            environment.push("svc_host", record.host.as_deref().unwrap_or_default());
            environment.push("svc_port", record.port.unwrap_or_default().to_string());
            environment.push("svc_proto", record.proto.as_deref().unwrap_or_default());
            for (label, value) in record.labels() {
                environment.push(format!("{ATTRIBUTE_PREFIX}{label}"), value);
            }
        }
        environment
    }

    fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.push((key.into(), value.into()));
    }

    /// Iterates over `(name, value)` pairs in contract order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.variables
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Looks up a variable by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.iter()
            .find_map(|(name, value)| (name == key).then_some(value))
    }

    /// Renders the variables as `name=value` strings in contract order.
    #[must_use]
    pub fn to_assignments(&self) -> Vec<String> {
        self.iter().map(|(key, value)| format!("{key}={value}")).collect()
    }

    /// Number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether no variables are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
