//! Structured reporting of watcher lifecycle milestones.

use std::sync::Arc;

use koishee_hooks::{HookError, HookExit, LifecycleEvent};
use koishee_registry::{Action, RegistryError};

use crate::settings::{Settings, WatchTarget};
use crate::watch::WatchError;

/// Observer for everything worth telling an operator about.
///
/// The watcher itself never acts on these callbacks; they exist so telemetry
/// can be swapped or captured in tests.
pub trait WatchReporter: Send + Sync {
    /// Settings were resolved and workers are about to start.
    fn startup(&self, settings: &Settings);

    /// The snapshot for a subtree could not be fetched.
    fn bootstrap_skipped(&self, target: &WatchTarget, error: &RegistryError);

    /// The snapshot for a subtree was replayed.
    fn bootstrap_replayed(&self, target: &WatchTarget, events: usize, resume_index: Option<u64>);

    /// The change stream for a subtree was opened.
    fn watch_started(&self, target: &WatchTarget, after_index: Option<u64>);

    /// A notification produced no hook invocation.
    fn notification_ignored(&self, target: &WatchTarget, action: &Action, key: &str);

    /// A hook finished successfully.
    fn hook_completed(&self, target: &WatchTarget, event: &LifecycleEvent, exit: HookExit);

    /// A hook could not be run or exited unsuccessfully.
    fn hook_failed(&self, target: &WatchTarget, event: &LifecycleEvent, error: &HookError);

    /// A subtree worker stopped.
    fn worker_stopped(&self, target: &WatchTarget, reason: &WatchError);
}

impl<T> WatchReporter for Arc<T>
where
    T: WatchReporter + ?Sized,
{
    fn startup(&self, settings: &Settings) {
        (**self).startup(settings);
    }

    fn bootstrap_skipped(&self, target: &WatchTarget, error: &RegistryError) {
        (**self).bootstrap_skipped(target, error);
    }

    fn bootstrap_replayed(&self, target: &WatchTarget, events: usize, resume_index: Option<u64>) {
        (**self).bootstrap_replayed(target, events, resume_index);
    }

    fn watch_started(&self, target: &WatchTarget, after_index: Option<u64>) {
        (**self).watch_started(target, after_index);
    }

    fn notification_ignored(&self, target: &WatchTarget, action: &Action, key: &str) {
        (**self).notification_ignored(target, action, key);
    }

    fn hook_completed(&self, target: &WatchTarget, event: &LifecycleEvent, exit: HookExit) {
        (**self).hook_completed(target, event, exit);
    }

    fn hook_failed(&self, target: &WatchTarget, event: &LifecycleEvent, error: &HookError) {
        (**self).hook_failed(target, event, error);
    }

    fn worker_stopped(&self, target: &WatchTarget, reason: &WatchError) {
        (**self).worker_stopped(target, reason);
    }
}

/// Default reporter that records milestones using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredReporter;

impl WatchReporter for StructuredReporter {
    fn startup(&self, settings: &Settings) {
        tracing::info!(
            target: "koisheed::health",
            event = "startup",
            endpoint = %settings.endpoint(),
            global_prefix = %settings.global().prefix,
            local_prefix = %settings.local().prefix,
            hook = %settings.hook(),
            "starting registry watch"
        );
    }

    fn bootstrap_skipped(&self, target: &WatchTarget, error: &RegistryError) {
        tracing::warn!(
            target: "koisheed::health",
            event = "bootstrap_skipped",
            subtree = %target.subtree,
            prefix = %target.prefix,
            error = %error,
            "snapshot unavailable, watching without bootstrap"
        );
    }

    fn bootstrap_replayed(&self, target: &WatchTarget, events: usize, resume_index: Option<u64>) {
        tracing::info!(
            target: "koisheed::health",
            event = "bootstrap_replayed",
            subtree = %target.subtree,
            prefix = %target.prefix,
            events,
            resume_index,
            "snapshot replayed"
        );
    }

    fn watch_started(&self, target: &WatchTarget, after_index: Option<u64>) {
        tracing::info!(
            target: "koisheed::health",
            event = "watch_started",
            subtree = %target.subtree,
            prefix = %target.prefix,
            after_index,
            "watching for changes"
        );
    }

    fn notification_ignored(&self, target: &WatchTarget, action: &Action, key: &str) {
        tracing::debug!(
            target: "koisheed::health",
            event = "notification_ignored",
            subtree = %target.subtree,
            action = action.as_str(),
            key,
            "notification ignored"
        );
    }

    fn hook_completed(&self, target: &WatchTarget, event: &LifecycleEvent, exit: HookExit) {
        tracing::info!(
            target: "koisheed::health",
            event = "hook_completed",
            subtree = %target.subtree,
            svc_action = event.action(),
            svc_name = %event.name(),
            code = exit.code(),
            "hook completed"
        );
    }

    fn hook_failed(&self, target: &WatchTarget, event: &LifecycleEvent, error: &HookError) {
        tracing::warn!(
            target: "koisheed::health",
            event = "hook_failed",
            subtree = %target.subtree,
            svc_action = event.action(),
            svc_name = %event.name(),
            error = %error,
            "hook failed"
        );
    }

    fn worker_stopped(&self, target: &WatchTarget, reason: &WatchError) {
        tracing::error!(
            target: "koisheed::health",
            event = "worker_stopped",
            subtree = %target.subtree,
            prefix = %target.prefix,
            error = %reason,
            "watch worker stopped"
        );
    }
}
