use crate::ledger::{ReactionLedger, Rejection};
use crate::store::RemoteStore;
use std::sync::{Mutex, MutexGuard, PoisonError};
use storefront_core::{ReactionState, ReactionSubject, Session};
use tracing::debug;

/// Reaction state owned by one mounted detail view.
///
/// Dropping the binding is the unmount. A toggle future dropped before it
/// completes restores the pre-toggle state and clears `pending`.
pub struct ReactionBinding<S> {
    ledger: ReactionLedger<S>,
    subject: ReactionSubject,
    cell: Mutex<Cell>,
}

/// `epoch` moves on every write to `state`. A refresh only applies if the
/// epoch it started from is still current.
#[derive(Debug, Clone, Copy)]
struct Cell {
    state: ReactionState,
    epoch: u64,
}

impl Cell {
    fn set(&mut self, state: ReactionState) {
        self.state = state;
        self.epoch = self.epoch.wrapping_add(1);
    }
}

/// Restores `before` unless the toggle committed.
struct Rollback<'a> {
    cell: &'a Mutex<Cell>,
    before: ReactionState,
    armed: bool,
}

impl Rollback<'_> {
    fn commit(mut self, next: ReactionState) {
        self.armed = false;
        lock(self.cell).set(next.settled());
    }
}

impl Drop for Rollback<'_> {
    fn drop(&mut self) {
        if self.armed {
            lock(self.cell).set(self.before.settled());
        }
    }
}

fn lock(cell: &Mutex<Cell>) -> MutexGuard<'_, Cell> {
    cell.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S: RemoteStore> ReactionBinding<S> {
    pub fn mount(ledger: ReactionLedger<S>, subject: ReactionSubject, initial_count: u64) -> Self {
        Self {
            ledger,
            subject,
            cell: Mutex::new(Cell {
                state: ReactionState::mounted(initial_count),
                epoch: 0,
            }),
        }
    }

    pub fn subject(&self) -> &ReactionSubject {
        &self.subject
    }

    pub fn snapshot(&self) -> ReactionState {
        lock(&self.cell).state
    }

    /// Re-reads the liked flag for the session's actor.
    ///
    /// Unresolved sessions leave the state alone. A read that lands while a
    /// toggle is in flight, or after the state changed under it, is dropped.
    pub async fn refresh(&self, session: &Session) {
        if !session.is_resolved() {
            return;
        }
        let Cell { state, epoch } = *lock(&self.cell);
        let loaded = self.ledger.load(&self.subject, session, state.count).await;

        let mut cell = lock(&self.cell);
        if cell.state.pending || cell.epoch != epoch {
            debug!(subject = %self.subject, "refresh skipped, state changed during read");
            return;
        }
        let next = ReactionState {
            liked: loaded.liked,
            ..cell.state
        };
        cell.set(next);
    }

    /// Returns the new liked value.
    pub async fn toggle(&self, session: &Session) -> Result<bool, Rejection> {
        let before = {
            let mut cell = lock(&self.cell);
            if cell.state.pending {
                return Err(Rejection::AlreadyPending);
            }
            let before = cell.state;
            cell.set(ReactionState {
                pending: true,
                ..before
            });
            before
        };
        let rollback = Rollback {
            cell: &self.cell,
            before,
            armed: true,
        };

        let next = self.ledger.toggle(&self.subject, session, before).await?;
        rollback.commit(next);
        Ok(next.liked)
    }
}
