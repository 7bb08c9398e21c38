//! Single-flight coordination of token refreshes.
//!
//! At most one refresh runs at a time per client. The first request rejected
//! with 401 while idle becomes the leader and performs the refresh; requests
//! rejected while it runs park on a oneshot channel and are woken with the
//! leader's outcome. The flag and the waiter queue live behind one mutex that
//! is never held across an `.await`.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use paykit_core::error::RefreshFailure;

pub(crate) type Outcome = Result<(), RefreshFailure>;

#[derive(Debug, Default)]
struct RefreshState {
    refreshing: bool,
    /// Bumped on every successful refresh.
    generation: u64,
    waiters: Vec<oneshot::Sender<Outcome>>,
}

/// What a rejected request should do next.
pub(crate) enum Ticket<'a> {
    /// Run the refresh and hand the outcome to the guard.
    Leader(RefreshGuard<'a>),
    /// Wait for the refresh that is already running.
    Follower(oneshot::Receiver<Outcome>),
    /// A refresh completed after the request read its token; replay at once.
    Stale,
}

#[derive(Debug, Default)]
pub(crate) struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        // The critical sections cannot leave the state half-updated.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_refreshing(&self) -> bool {
        self.lock().refreshing
    }

    pub(crate) fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Check-and-set entry point.
    ///
    /// `seen_generation` is the generation observed before the rejected
    /// request read its access token; `None` forces a refresh unless one is
    /// already running.
    pub(crate) fn join(&self, seen_generation: Option<u64>) -> Ticket<'_> {
        let mut state = self.lock();

        if state.refreshing {
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            return Ticket::Follower(rx);
        }

        if seen_generation.is_some_and(|seen| seen != state.generation) {
            return Ticket::Stale;
        }

        state.refreshing = true;
        Ticket::Leader(RefreshGuard {
            coordinator: self,
            completed: false,
        })
    }

    fn complete(&self, outcome: &Outcome) {
        let waiters = {
            let mut state = self.lock();
            state.refreshing = false;
            if outcome.is_ok() {
                state.generation += 1;
            }
            std::mem::take(&mut state.waiters)
        };

        for waiter in waiters {
            // A waiter whose request was dropped is simply gone.
            let _ = waiter.send(outcome.clone());
        }
    }
}

/// Held by the leader for the duration of a refresh.
///
/// Dropping the guard without calling [`finish`](Self::finish) (the leader's
/// future was cancelled or panicked) still resets the flag and fails every
/// waiter with [`RefreshFailure::Interrupted`].
pub(crate) struct RefreshGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    completed: bool,
}

impl RefreshGuard<'_> {
    /// Publish the outcome: reset the flag and wake every waiter.
    pub(crate) fn finish(mut self, outcome: Outcome) -> Outcome {
        self.completed = true;
        self.coordinator.complete(&outcome);
        outcome
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.coordinator.complete(&Err(RefreshFailure::Interrupted));
        }
    }
}

/// Wait for a leader's outcome.
pub(crate) async fn wait(rx: oneshot::Receiver<Outcome>) -> Outcome {
    rx.await.unwrap_or(Err(RefreshFailure::Interrupted))
}
