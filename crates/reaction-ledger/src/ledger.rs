use crate::store::{ReactionFilter, ReactionRow, RemoteStore, StoreError};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use storefront_core::{
    ActorId, ReactionState, ReactionSubject, Session, StorefrontConfig, SubjectKind,
};
use thiserror::Error;
use tracing::{debug, warn};

/// Why a toggle did not commit. `Display` is the reason string handed to the
/// caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("not-authenticated")]
    NotAuthenticated,
    #[error("invalid-subject")]
    InvalidSubject,
    #[error("already-pending")]
    AlreadyPending,
    #[error("toggle-failed")]
    ToggleFailed(#[source] StoreError),
}

impl Rejection {
    /// User-visible notice. Only a failed write has one; the caller prompts
    /// login for `NotAuthenticated` itself.
    pub fn notice(&self, config: &StorefrontConfig) -> Option<String> {
        match self {
            Rejection::ToggleFailed(_) => Some(config.toggle_failed_notice.clone()),
            _ => None,
        }
    }
}

/// Read that fell back to "not liked". Logged, never shown to the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("reaction read degraded: {0}")]
pub struct ReadDegraded(#[from] pub StoreError);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PendingKey {
    kind: SubjectKind,
    subject_id: String,
    actor: ActorId,
}

impl PendingKey {
    fn new(subject: &ReactionSubject, actor: &ActorId) -> Self {
        Self {
            kind: subject.kind,
            subject_id: subject.id.clone(),
            actor: actor.clone(),
        }
    }
}

type InFlight = Arc<Mutex<HashSet<PendingKey>>>;

/// Claim on one (subject, actor) pair. Released on drop, which covers
/// success, failure and a caller abandoning the future mid-write.
struct PendingSlot {
    key: PendingKey,
    in_flight: InFlight,
}

impl PendingSlot {
    fn claim(in_flight: &InFlight, key: PendingKey) -> Option<Self> {
        let mut set = in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(key.clone()) {
            return None;
        }
        Some(Self {
            key,
            in_flight: Arc::clone(in_flight),
        })
    }
}

impl Drop for PendingSlot {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Like/unlike ledger over a [`RemoteStore`].
///
/// Holds no per-view state beyond the in-flight set; clones share it, so two
/// views of the same subject still cannot overlap toggles for one actor.
pub struct ReactionLedger<S> {
    store: Arc<S>,
    in_flight: InFlight,
}

impl<S> Clone for ReactionLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<S: RemoteStore> ReactionLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn is_pending(&self, subject: &ReactionSubject, actor: &ActorId) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&PendingKey::new(subject, actor))
    }

    /// Whether `actor` has a recorded reaction on `subject`. "No row" is
    /// `Ok(false)`, not an error.
    pub async fn try_load(
        &self,
        subject: &ReactionSubject,
        actor: &ActorId,
    ) -> Result<bool, ReadDegraded> {
        if !subject.has_id() {
            return Ok(false);
        }
        let rows = self.store.select(&ReactionFilter::new(subject, actor)).await?;
        Ok(!rows.is_empty())
    }

    /// Best-effort read of the liked flag. Absent actors, missing rows and
    /// store failures all yield `liked = false`.
    pub async fn load(
        &self,
        subject: &ReactionSubject,
        session: &Session,
        initial_count: u64,
    ) -> ReactionState {
        let mut state = ReactionState::mounted(initial_count);
        let Some(actor) = session.actor() else {
            return state;
        };
        match self.try_load(subject, actor).await {
            Ok(liked) => state.liked = liked,
            Err(err) => {
                warn!(%subject, %actor, error = %err, "reaction read degraded to not-liked");
            }
        }
        state
    }

    /// Flips `current.liked` against the store.
    ///
    /// On success returns the committed state. On any error the caller keeps
    /// `current`, which is the rollback. Failed writes are not retried: the
    /// remote row may already have changed.
    pub async fn toggle(
        &self,
        subject: &ReactionSubject,
        session: &Session,
        current: ReactionState,
    ) -> Result<ReactionState, Rejection> {
        let actor = session.actor().ok_or(Rejection::NotAuthenticated)?;
        if !subject.has_id() {
            return Err(Rejection::InvalidSubject);
        }
        if current.pending {
            return Err(Rejection::AlreadyPending);
        }
        let _slot = PendingSlot::claim(&self.in_flight, PendingKey::new(subject, actor))
            .ok_or(Rejection::AlreadyPending)?;

        let filter = ReactionFilter::new(subject, actor);
        let written = if current.liked {
            self.store.delete(&filter).await.map(|removed| {
                debug!(%subject, %actor, removed, "reaction removed");
                current.after_remove()
            })
        } else {
            let row = ReactionRow::for_subject(subject, actor, Utc::now());
            self.store.insert(row).await.map(|()| {
                debug!(%subject, %actor, "reaction added");
                current.after_add()
            })
        };

        written.map_err(|err| {
            warn!(
                %subject,
                %actor,
                error = %err,
                "reaction toggle failed, keeping previous state"
            );
            Rejection::ToggleFailed(err)
        })
    }
}
