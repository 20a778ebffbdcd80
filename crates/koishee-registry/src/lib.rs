//! Registry access for the koishee watcher.
//!
//! Service instances are published to etcd under the SkyDNS key layout: a
//! domain such as `skydns.local` owns the subtree `/skydns/local/skydns`,
//! and every instance below it stores a JSON record. This crate models that
//! key space ([`Prefix`], [`RegistryNode`], [`Notification`]) and exposes the
//! two capabilities the watcher needs through the [`Registry`] trait:
//!
//! * a recursive snapshot of a subtree, used once at startup, and
//! * a stream of subsequent changes, resumed from a registry index.
//!
//! [`EtcdClient`] implements the trait against the etcd v2 keys API using
//! blocking HTTP long polls, so each watched subtree can be served by a
//! plain worker thread.
//!
//! # Example
//!
//! ```rust,no_run
//! use koishee_registry::{EtcdClient, Prefix, Registry};
//! use url::Url;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = EtcdClient::new(Url::parse("http://127.0.0.1:2379")?)?;
//! let prefix = Prefix::from_domain("skydns.local");
//! let snapshot = client.snapshot(&prefix)?;
//! for leaf in snapshot.root().leaves() {
//!     println!("{} = {:?}", leaf.key, leaf.value);
//! }
//! for notification in client.watch(&prefix, snapshot.resume_index()) {
//!     let notification = notification?;
//!     println!("{:?} {}", notification.action, notification.node.key);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod etcd;
pub mod node;
pub mod prefix;

pub use self::error::RegistryError;
pub use self::etcd::{EtcdClient, WatchStream};
pub use self::node::{Action, Notification, RegistryNode, Snapshot};
pub use self::prefix::{NAMESPACE_ROOT, Prefix};

/// Read access to a hierarchical service registry.
///
/// Implementations must be shareable across the watcher's worker threads;
/// each worker drives its own [`Registry::Watch`] stream.
pub trait Registry: Send + Sync {
    /// Stream of change notifications below a prefix.
    type Watch: Iterator<Item = Result<Notification, RegistryError>> + Send;

    /// Fetches the current contents of the subtree rooted at `prefix`.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] when the registry cannot be reached, the
    /// prefix does not exist, or the response cannot be decoded.
    fn snapshot(&self, prefix: &Prefix) -> Result<Snapshot, RegistryError>;

    /// Streams changes at or below `prefix`.
    ///
    /// With `after_index` set, the stream starts with the first change whose
    /// index is strictly greater; otherwise it starts with the next change
    /// made after the call. The stream yields an error and then ends when
    /// the registry can no longer be followed.
    fn watch(&self, prefix: &Prefix, after_index: Option<u64>) -> Self::Watch;
}
