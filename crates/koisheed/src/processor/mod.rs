//! Turns registry notifications into hook invocations.
//!
//! Translation is pure ([`translate`]): a set notification becomes a
//! [`LifecycleEvent::Start`] carrying the decoded record, a delete becomes
//! [`LifecycleEvent::Stop`], and every other action is ignored. The
//! [`EventProcessor`] then runs the hook for the event and reports the
//! result. Hook failures never stop the watcher; undecodable payloads and
//! set keys too shallow to name a service do.

use std::sync::Arc;

use koishee_hooks::{HookExecutor, HookRunner, LifecycleEvent, ServiceName, ServiceRecord};
use koishee_registry::{Action, Notification};
use thiserror::Error;

use crate::health::WatchReporter;
use crate::settings::WatchTarget;

/// Number of key segments from the leaf back to the service name on set.
///
/// For `/skydns/local/skydns/services/web/1` the name is `services`.
const START_NAME_DEPTH: usize = 3;

/// Fatal problems found while interpreting a notification.
#[derive(Debug, Clone, Error)]
pub enum ProcessError {
    /// The stored value is not a service record.
    #[error("malformed service record at '{key}': {source}")]
    MalformedPayload {
        /// Key holding the value.
        key: String,
        /// JSON decode error.
        #[source]
        source: Arc<serde_json::Error>,
    },

    /// A set key has too few segments to derive a service name.
    #[error("key '{key}' is too shallow to name a service")]
    KeyTooShallow {
        /// Offending key.
        key: String,
    },
}

/// What became of a processed notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The hook ran (successfully or not) for this event.
    Invoked(LifecycleEvent),
    /// Nothing was dispatched.
    Ignored,
}

/// Maps a notification to the lifecycle event it represents, if any.
///
/// # Errors
///
/// Returns [`ProcessError::MalformedPayload`] when a set carries a value
/// that is not a service record, and [`ProcessError::KeyTooShallow`] when
/// a set key cannot yield a service name. Deletes always yield one.
pub fn translate(notification: &Notification) -> Result<Option<LifecycleEvent>, ProcessError> {
    let node = &notification.node;
    match notification.action {
        Action::Set if node.dir => Ok(None),
        Action::Set => {
            let value = node.value.as_deref().unwrap_or_default();
            let record =
                ServiceRecord::from_json(value).map_err(|source| ProcessError::MalformedPayload {
                    key: node.key.clone(),
                    source: Arc::new(source),
                })?;
            let name = start_name(&node.key)?;
            Ok(Some(LifecycleEvent::Start { name, record }))
        }
        Action::Delete => Ok(Some(LifecycleEvent::Stop {
            name: stop_name(&node.key),
        })),
        Action::Unhandled(_) => Ok(None),
    }
}

fn segments(key: &str) -> Vec<&str> {
    key.trim_start_matches('/').split('/').collect()
}

fn start_name(key: &str) -> Result<ServiceName, ProcessError> {
    let parts = segments(key);
    parts
        .len()
        .checked_sub(START_NAME_DEPTH)
        .and_then(|index| parts.get(index))
        .filter(|segment| !segment.is_empty())
        .map(|segment| ServiceName::new(*segment))
        .ok_or_else(|| ProcessError::KeyTooShallow {
            key: key.to_owned(),
        })
}

/// Last key segment; an empty one (trailing slash) is passed on as is.
fn stop_name(key: &str) -> ServiceName {
    ServiceName::new(key.rsplit('/').next().unwrap_or_default())
}

/// Dispatches notifications for one subtree.
pub struct EventProcessor<E> {
    target: WatchTarget,
    runner: HookRunner<E>,
    reporter: Arc<dyn WatchReporter>,
}

impl<E> EventProcessor<E> {
    /// Creates a processor for `target`.
    #[must_use]
    pub const fn new(
        target: WatchTarget,
        runner: HookRunner<E>,
        reporter: Arc<dyn WatchReporter>,
    ) -> Self {
        Self {
            target,
            runner,
            reporter,
        }
    }

    /// Subtree this processor serves.
    #[must_use]
    pub const fn target(&self) -> &WatchTarget {
        &self.target
    }

    /// Reporter receiving milestones.
    #[must_use]
    pub fn reporter(&self) -> &dyn WatchReporter {
        self.reporter.as_ref()
    }
}

impl<E: HookExecutor> EventProcessor<E> {
    /// Handles one notification, running the hook and waiting for it.
    ///
    /// # Errors
    ///
    /// Returns a [`ProcessError`] when the notification cannot be
    /// interpreted. Hook failures are reported, not returned.
    pub fn process(&self, notification: &Notification) -> Result<Dispatch, ProcessError> {
        let Some(event) = translate(notification)? else {
            self.reporter.notification_ignored(
                &self.target,
                &notification.action,
                &notification.node.key,
            );
            return Ok(Dispatch::Ignored);
        };

        match self.runner.invoke(&event) {
            Ok(exit) => self.reporter.hook_completed(&self.target, &event, exit),
            Err(error) => self.reporter.hook_failed(&self.target, &event, &error),
        }
        Ok(Dispatch::Invoked(event))
    }
}
