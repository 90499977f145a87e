use serde::{Deserialize, Serialize};

/// Liked flag and counter a detail view shows for one subject and actor.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReactionState {
    pub liked: bool,
    pub count: u64,
    /// A toggle is in flight. No second toggle may start until it clears.
    pub pending: bool,
}

impl ReactionState {
    /// State a view starts from when it mounts.
    pub fn mounted(count: u64) -> Self {
        Self {
            liked: false,
            count,
            pending: false,
        }
    }

    /// Committed result of a successful add.
    pub fn after_add(self) -> Self {
        Self {
            liked: true,
            count: self.count.saturating_add(1),
            pending: false,
        }
    }

    /// Committed result of a successful remove. The counter saturates at
    /// zero when it has drifted from the remote store.
    pub fn after_remove(self) -> Self {
        Self {
            liked: false,
            count: self.count.saturating_sub(1),
            pending: false,
        }
    }

    pub fn settled(self) -> Self {
        Self {
            pending: false,
            ..self
        }
    }
}
