//! Blocking client for the etcd v2 keys API.
//!
//! Snapshots are a single recursive `GET`. Watches are long polls: each
//! request with `wait=true` blocks until one change arrives, and the next
//! poll asks for the index after that change's `modifiedIndex`, so a
//! [`WatchStream`] observes every change exactly once while it stays
//! connected.

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Registry;
use crate::error::RegistryError;
use crate::node::{Notification, Snapshot};
use crate::prefix::Prefix;

/// Tracing target for registry traffic.
const ETCD_TARGET: &str = "koishee_registry::etcd";

/// Response header carrying the registry's current index.
const ETCD_INDEX_HEADER: &str = "x-etcd-index";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// etcd v2 client bound to one endpoint.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct EtcdClient {
    endpoint: Url,
    http: Client,
}

impl EtcdClient {
    /// Creates a client for `endpoint`, e.g. `http://127.0.0.1:2379`.
    ///
    /// Requests carry no overall timeout because watch polls legitimately
    /// block until the next change.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidEndpoint`] when the URL cannot carry a
    /// key path, or [`RegistryError::Client`] when the HTTP client cannot be
    /// built.
    pub fn new(endpoint: Url) -> Result<Self, RegistryError> {
        if endpoint.cannot_be_a_base() {
            return Err(RegistryError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
            });
        }
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Option::<Duration>::None)
            .build()
            .map_err(|source| RegistryError::Client {
                source: Arc::new(source),
            })?;
        Ok(Self { endpoint, http })
    }

    fn keys_url(&self, prefix: &Prefix) -> Result<Url, RegistryError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| RegistryError::InvalidEndpoint {
                endpoint: self.endpoint.to_string(),
            })?
            .pop_if_empty()
            .extend(["v2", "keys"])
            .extend(prefix.segments());
        Ok(url)
    }

    fn snapshot_url(&self, prefix: &Prefix) -> Result<Url, RegistryError> {
        let mut url = self.keys_url(prefix)?;
        url.query_pairs_mut()
            .append_pair("recursive", "true")
            .append_pair("sorted", "true");
        Ok(url)
    }

    fn watch_url(&self, prefix: &Prefix, wait_index: Option<u64>) -> Result<Url, RegistryError> {
        let mut url = self.keys_url(prefix)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("wait", "true")
                .append_pair("recursive", "true");
            if let Some(index) = wait_index {
                query.append_pair("waitIndex", &index.to_string());
            }
        }
        Ok(url)
    }

    /// Issues a `GET` and decodes the keys API envelope.
    fn fetch<T: DeserializeOwned>(&self, url: &Url) -> Result<(T, Option<u64>), RegistryError> {
        let transport = |source| RegistryError::Transport {
            url: url.to_string(),
            source: Arc::new(source),
        };
        let response = self.http.get(url.clone()).send().map_err(transport)?;
        let status = response.status();
        let index = response
            .headers()
            .get(ETCD_INDEX_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());
        let body = response.text().map_err(transport)?;

        debug!(
            target: ETCD_TARGET,
            url = %url,
            status = status.as_u16(),
            index,
            body_bytes = body.len(),
            "received etcd response"
        );

        if !status.is_success() {
            return Err(RegistryError::from_response(
                url.as_str(),
                status.as_u16(),
                &body,
            ));
        }

        let payload = serde_json::from_str(&body).map_err(|source| RegistryError::Decode {
            url: url.to_string(),
            source: Arc::new(source),
        })?;
        Ok((payload, index))
    }

    /// Blocks until the next change at or after `wait_index`.
    fn poll(&self, prefix: &Prefix, wait_index: Option<u64>) -> Result<Notification, RegistryError> {
        let url = self.watch_url(prefix, wait_index)?;
        let (notification, _) = self.fetch::<Notification>(&url)?;
        Ok(notification)
    }
}

impl Registry for EtcdClient {
    type Watch = WatchStream;

    fn snapshot(&self, prefix: &Prefix) -> Result<Snapshot, RegistryError> {
        let url = self.snapshot_url(prefix)?;
        let (envelope, index) = self.fetch::<Notification>(&url)?;
        Ok(Snapshot::new(envelope.node, index))
    }

    fn watch(&self, prefix: &Prefix, after_index: Option<u64>) -> WatchStream {
        WatchStream {
            client: self.clone(),
            prefix: prefix.clone(),
            wait_index: after_index.map(|index| index.saturating_add(1)),
            finished: false,
        }
    }
}

/// Iterator over the changes below one prefix.
///
/// Each call to `next` performs one long poll. The first failure is yielded
/// and the stream then ends.
#[derive(Debug)]
pub struct WatchStream {
    client: EtcdClient,
    prefix: Prefix,
    wait_index: Option<u64>,
    finished: bool,
}

impl WatchStream {
    /// Index the next poll waits for, if one has been established.
    #[must_use]
    pub const fn wait_index(&self) -> Option<u64> {
        self.wait_index
    }
}

impl Iterator for WatchStream {
    type Item = Result<Notification, RegistryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.client.poll(&self.prefix, self.wait_index) {
            Ok(notification) => {
                self.wait_index = Some(notification.node.modified_index.saturating_add(1));
                Some(Ok(notification))
            }
            Err(error) => {
                self.finished = true;
                Some(Err(error))
            }
        }
    }
}
