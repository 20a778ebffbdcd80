//! Replays a subtree's current contents before watching it.

use koishee_hooks::HookExecutor;
use koishee_registry::{Action, Notification, Registry, RegistryError};

use crate::processor::{Dispatch, EventProcessor};
use crate::watch::{HaltLatch, WatchError};

/// How bootstrapping a subtree went.
#[derive(Debug, Clone)]
pub enum BootstrapOutcome {
    /// The snapshot was replayed.
    Replayed {
        /// Hooks run during the replay.
        events: usize,
        /// Index the watch should resume after.
        resume_index: Option<u64>,
    },
    /// The snapshot could not be fetched; the watch starts from now.
    Skipped(RegistryError),
}

impl BootstrapOutcome {
    /// Index the watch should resume after, if any.
    #[must_use]
    pub const fn resume_index(&self) -> Option<u64> {
        match self {
            Self::Replayed { resume_index, .. } => *resume_index,
            Self::Skipped(_) => None,
        }
    }
}

/// Fetches the subtree served by `processor` and replays every stored
/// record as a registration, in key order.
///
/// A failed fetch is reported and tolerated. Directories carry no record
/// and are not replayed.
///
/// # Errors
///
/// Returns [`WatchError::Fatal`] when a stored record cannot be
/// interpreted and [`WatchError::Halted`] when another worker stopped
/// mid-replay.
pub fn bootstrap<R, E>(
    registry: &R,
    processor: &EventProcessor<E>,
    halt: &HaltLatch,
) -> Result<BootstrapOutcome, WatchError>
where
    R: Registry + ?Sized,
    E: HookExecutor,
{
    let target = processor.target();
    let snapshot = match registry.snapshot(&target.prefix) {
        Ok(snapshot) => snapshot,
        Err(error) => {
            processor.reporter().bootstrap_skipped(target, &error);
            return Ok(BootstrapOutcome::Skipped(error));
        }
    };

    let mut events = 0_usize;
    for leaf in snapshot.root().leaves() {
        if halt.is_raised() {
            return Err(WatchError::Halted);
        }
        let notification = Notification::new(Action::Set, leaf.clone());
        if let Dispatch::Invoked(_) = processor.process(&notification)? {
            events += 1;
        }
    }

    let resume_index = snapshot.resume_index();
    processor
        .reporter()
        .bootstrap_replayed(target, events, resume_index);
    Ok(BootstrapOutcome::Replayed {
        events,
        resume_index,
    })
}
