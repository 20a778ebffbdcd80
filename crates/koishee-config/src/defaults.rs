//! Built-in defaults mirroring the SkyDNS registry layout.

/// etcd client endpoint used when none is configured.
pub const DEFAULT_ETCD_ENDPOINT: &str = "http://127.0.0.1:2379";

/// Domain whose registrations are shared by every host.
pub const DEFAULT_GLOBAL_DOMAIN: &str = "skydns.local";

/// Suffix appended to the host name to form the per-host domain.
pub const LOCAL_DOMAIN_SUFFIX: &str = "nodes.skydns.local";

pub(crate) fn default_etcd_endpoint() -> String {
    DEFAULT_ETCD_ENDPOINT.to_owned()
}

pub(crate) fn default_global_domain() -> String {
    DEFAULT_GLOBAL_DOMAIN.to_owned()
}

/// Builds the per-host domain for `host`.
///
/// ```
/// assert_eq!(
///     koishee_config::local_domain_for_host("web-3"),
///     "web-3.nodes.skydns.local"
/// );
/// ```
#[must_use]
pub fn local_domain_for_host(host: &str) -> String {
    format!("{host}.{LOCAL_DOMAIN_SUFFIX}")
}
