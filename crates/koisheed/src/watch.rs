//! Per-subtree worker: bootstrap, then follow the change stream.
//!
//! Each watched subtree is served by one [`SubtreeWatcher`] on its own
//! thread. Notifications are processed strictly one at a time, hook included,
//! so events for a subtree reach the hook in registry order. The only state
//! shared between workers is the [`HaltLatch`]: once either worker stops, the
//! other dispatches nothing further.

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use koishee_hooks::HookExecutor;
use koishee_registry::{Registry, RegistryError};
use thiserror::Error;

use crate::bootstrap::bootstrap;
use crate::processor::{EventProcessor, ProcessError};
use crate::settings::WatchTarget;

/// One-way flag telling every worker to stop dispatching.
#[derive(Debug, Clone, Default)]
pub struct HaltLatch(Arc<AtomicBool>);

impl HaltLatch {
    /// Creates a lowered latch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the latch; it never lowers again.
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether any worker has raised the latch.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a subtree worker stopped.
#[derive(Debug, Clone, Error)]
pub enum WatchError {
    /// A notification could not be interpreted.
    #[error(transparent)]
    Fatal(#[from] ProcessError),
    /// The change stream failed.
    #[error("watch stream failed: {0}")]
    Registry(#[source] RegistryError),
    /// The change stream closed without an error.
    #[error("watch stream ended")]
    StreamEnded,
    /// Another worker stopped first.
    #[error("halted after another subtree stopped")]
    Halted,
}

/// Serves one subtree for the lifetime of the process.
pub struct SubtreeWatcher<R, E> {
    registry: Arc<R>,
    processor: EventProcessor<E>,
    halt: HaltLatch,
}

impl<R, E> SubtreeWatcher<R, E>
where
    R: Registry,
    E: HookExecutor,
{
    /// Creates a worker sharing `registry` and `halt` with its siblings.
    #[must_use]
    pub const fn new(registry: Arc<R>, processor: EventProcessor<E>, halt: HaltLatch) -> Self {
        Self {
            registry,
            processor,
            halt,
        }
    }

    /// Subtree served by this worker.
    #[must_use]
    pub const fn target(&self) -> &WatchTarget {
        self.processor.target()
    }

    /// Bootstraps the subtree and then watches it until something stops it.
    ///
    /// Any stop raises the halt latch, since the process cannot carry on
    /// with one subtree unwatched.
    ///
    /// # Errors
    ///
    /// Always returns the reason the worker stopped.
    pub fn run(&self) -> Result<Infallible, WatchError> {
        let reason = match bootstrap(self.registry.as_ref(), &self.processor, &self.halt) {
            Ok(outcome) => self.watch(outcome.resume_index()),
            Err(error) => error,
        };
        self.halt.raise();
        self.processor
            .reporter()
            .worker_stopped(self.target(), &reason);
        Err(reason)
    }

    /// Follows changes after `after_index`, or from now when `None`.
    ///
    /// Returns the reason the stream stopped being followed; it never
    /// returns while the stream keeps delivering processable notifications.
    #[must_use]
    pub fn watch(&self, after_index: Option<u64>) -> WatchError {
        let target = self.target();
        self.processor
            .reporter()
            .watch_started(target, after_index);

        for item in self.registry.watch(&target.prefix, after_index) {
            if self.halt.is_raised() {
                return WatchError::Halted;
            }
            let notification = match item {
                Ok(notification) => notification,
                Err(error) => return WatchError::Registry(error),
            };
            if let Err(error) = self.processor.process(&notification) {
                return WatchError::Fatal(error);
            }
        }
        WatchError::StreamEnded
    }
}
