//! In-memory doubles shared by the daemon's unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use koishee_hooks::{
    HookCommand, HookEnvironment, HookError, HookExecutor, HookExit, HookRunner, LifecycleEvent,
};
use koishee_registry::{
    Action, Notification, Prefix, Registry, RegistryError, RegistryNode, Snapshot,
};

use crate::health::WatchReporter;
use crate::processor::EventProcessor;
use crate::settings::{Settings, Subtree, WatchTarget};
use crate::watch::WatchError;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Executor that records each environment and returns a fixed exit.
#[derive(Debug, Clone)]
pub(crate) struct RecordingExecutor {
    calls: Arc<Mutex<Vec<Vec<String>>>>,
    exit: HookExit,
}

impl RecordingExecutor {
    pub(crate) fn succeeding() -> Self {
        Self::exiting_with(HookExit::success())
    }

    pub(crate) fn exiting_with(exit: HookExit) -> Self {
        Self {
            calls: Arc::default(),
            exit,
        }
    }

    /// Every recorded environment as `key=value` lists, in call order.
    pub(crate) fn calls(&self) -> Vec<Vec<String>> {
        lock(&self.calls).clone()
    }

    /// `svc_action:svc_name` for every call, in order.
    pub(crate) fn summary(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .map(|assignments| {
                let lookup = |prefix: &str| {
                    assignments
                        .iter()
                        .find_map(|pair| pair.strip_prefix(prefix))
                        .unwrap_or_default()
                        .to_owned()
                };
                format!("{}:{}", lookup("svc_action="), lookup("svc_name="))
            })
            .collect()
    }
}

impl HookExecutor for RecordingExecutor {
    fn execute(
        &self,
        _command: &HookCommand,
        environment: &HookEnvironment,
    ) -> Result<HookExit, HookError> {
        lock(&self.calls).push(environment.to_assignments());
        Ok(self.exit)
    }
}

/// Reporter that keeps a line per milestone.
#[derive(Debug, Default)]
pub(crate) struct RecordingReporter {
    lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub(crate) fn lines(&self) -> Vec<String> {
        lock(&self.lines).clone()
    }

    fn record(&self, line: String) {
        lock(&self.lines).push(line);
    }
}

impl WatchReporter for RecordingReporter {
    fn startup(&self, _settings: &Settings) {
        self.record(String::from("startup"));
    }

    fn bootstrap_skipped(&self, target: &WatchTarget, _error: &RegistryError) {
        self.record(format!("{}:bootstrap_skipped", target.subtree));
    }

    fn bootstrap_replayed(&self, target: &WatchTarget, events: usize, resume_index: Option<u64>) {
        self.record(format!(
            "{}:bootstrap_replayed:{events}:{resume_index:?}",
            target.subtree
        ));
    }

    fn watch_started(&self, target: &WatchTarget, after_index: Option<u64>) {
        self.record(format!("{}:watch_started:{after_index:?}", target.subtree));
    }

    fn notification_ignored(&self, target: &WatchTarget, action: &Action, _key: &str) {
        self.record(format!("{}:ignored:{}", target.subtree, action.as_str()));
    }

    fn hook_completed(&self, target: &WatchTarget, event: &LifecycleEvent, _exit: HookExit) {
        self.record(format!(
            "{}:hook_completed:{}:{}",
            target.subtree,
            event.action(),
            event.name()
        ));
    }

    fn hook_failed(&self, target: &WatchTarget, event: &LifecycleEvent, _error: &HookError) {
        self.record(format!(
            "{}:hook_failed:{}:{}",
            target.subtree,
            event.action(),
            event.name()
        ));
    }

    fn worker_stopped(&self, target: &WatchTarget, _reason: &WatchError) {
        self.record(format!("{}:worker_stopped", target.subtree));
    }
}

/// Scripted registry keyed by prefix.
#[derive(Debug, Default)]
pub(crate) struct FakeRegistry {
    snapshots: HashMap<String, Result<Snapshot, RegistryError>>,
    streams: Mutex<HashMap<String, Vec<Result<Notification, RegistryError>>>>,
    watches: Mutex<Vec<(String, Option<u64>)>>,
}

impl FakeRegistry {
    pub(crate) fn with_snapshot(mut self, prefix: &Prefix, snapshot: Snapshot) -> Self {
        self.snapshots.insert(prefix.to_string(), Ok(snapshot));
        self
    }

    pub(crate) fn with_snapshot_error(mut self, prefix: &Prefix, error: RegistryError) -> Self {
        self.snapshots.insert(prefix.to_string(), Err(error));
        self
    }

    pub(crate) fn with_stream(
        self,
        prefix: &Prefix,
        items: Vec<Result<Notification, RegistryError>>,
    ) -> Self {
        lock(&self.streams).insert(prefix.to_string(), items);
        self
    }

    /// `(prefix, after_index)` for every opened watch.
    pub(crate) fn watches(&self) -> Vec<(String, Option<u64>)> {
        lock(&self.watches).clone()
    }
}

impl Registry for FakeRegistry {
    type Watch = std::vec::IntoIter<Result<Notification, RegistryError>>;

    fn snapshot(&self, prefix: &Prefix) -> Result<Snapshot, RegistryError> {
        self.snapshots
            .get(prefix.as_str())
            .cloned()
            .unwrap_or_else(|| Err(unavailable(prefix)))
    }

    fn watch(&self, prefix: &Prefix, after_index: Option<u64>) -> Self::Watch {
        lock(&self.watches).push((prefix.to_string(), after_index));
        lock(&self.streams)
            .remove(prefix.as_str())
            .unwrap_or_default()
            .into_iter()
    }
}

pub(crate) fn unavailable(prefix: &Prefix) -> RegistryError {
    RegistryError::Status {
        url: format!("http://registry.test/v2/keys{prefix}"),
        status: 503,
    }
}

pub(crate) fn global_target() -> WatchTarget {
    WatchTarget::new(Subtree::Global, "skydns.local")
}

pub(crate) fn local_target() -> WatchTarget {
    WatchTarget::new(Subtree::Local, "box.nodes.skydns.local")
}

pub(crate) fn set(key: &str, value: &str, index: u64) -> Notification {
    Notification::new("set", RegistryNode::leaf(key, value).with_modified_index(index))
}

pub(crate) fn delete(key: &str, index: u64) -> Notification {
    Notification::new("delete", RegistryNode::removed(key).with_modified_index(index))
}

pub(crate) fn processor(
    target: WatchTarget,
    executor: RecordingExecutor,
    reporter: Arc<RecordingReporter>,
) -> EventProcessor<RecordingExecutor> {
    let runner = HookRunner::new(HookCommand::new("/usr/bin/on-change", ["--quiet"]), executor);
    EventProcessor::new(target, runner, reporter)
}
