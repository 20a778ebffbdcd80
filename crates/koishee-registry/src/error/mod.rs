//! Errors raised while talking to the registry.
//!
//! Transport and decode errors are wrapped in `Arc` to keep the enum small
//! and cloneable.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

/// etcd error code for a missing key.
pub const KEY_NOT_FOUND: u64 = 100;

/// etcd error code for a watch index that has been compacted away.
pub const EVENT_INDEX_CLEARED: u64 = 401;

/// Errors arising from registry operations.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// The endpoint URL cannot carry a key path.
    #[error("etcd endpoint '{endpoint}' cannot address keys")]
    InvalidEndpoint {
        /// Endpoint that was rejected.
        endpoint: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    Client {
        /// Underlying client error.
        #[source]
        source: Arc<reqwest::Error>,
    },

    /// The request could not be sent or its body could not be read.
    #[error("request to {url} failed: {source}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: Arc<reqwest::Error>,
    },

    /// The registry answered with an error document.
    #[error("etcd error {code} for {url}: {message}{}", cause_suffix(.cause.as_deref()))]
    Api {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// etcd error code.
        code: u64,
        /// etcd error message.
        message: String,
        /// Key or detail the error refers to.
        cause: Option<String>,
    },

    /// The registry answered with a non-success status and no error document.
    #[error("etcd returned HTTP {status} for {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// A success response did not match the keys API schema.
    #[error("failed to decode etcd response from {url}: {source}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Underlying JSON error.
        #[source]
        source: Arc<serde_json::Error>,
    },
}

impl RegistryError {
    /// Whether the error reports a missing key.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { code, .. } if *code == KEY_NOT_FOUND)
    }

    /// Builds the error for a non-success response body.
    pub(crate) fn from_response(url: &str, status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorDocument>(body) {
            Ok(document) => Self::Api {
                url: url.to_owned(),
                status,
                code: document.error_code,
                message: document.message,
                cause: document.cause,
            },
            Err(_) => Self::Status {
                url: url.to_owned(),
                status,
            },
        }
    }
}

fn cause_suffix(cause: Option<&str>) -> String {
    cause.map(|text| format!(" ({text})")).unwrap_or_default()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDocument {
    error_code: u64,
    message: String,
    #[serde(default)]
    cause: Option<String>,
}
