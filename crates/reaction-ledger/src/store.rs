use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_core::{ActorId, IdentityColumn, ReactionSubject, SubjectKind};
use thiserror::Error;

/// Errors surfaced by a [`RemoteStore`]. Error-shaped responses and transport
/// failures both land here and the ledger treats them alike.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("remote store rejected request: {0}")]
    Rejected(String),
    #[error("remote store unreachable: {0}")]
    Transport(String),
    #[error("malformed reaction row: {0}")]
    Malformed(String),
}

/// Stored reaction. Exactly one of `product_id` / `brand_id` is set, the one
/// selected by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReactionRow {
    pub kind: SubjectKind,
    pub actor: ActorId,
    pub product_id: Option<String>,
    pub brand_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReactionRow {
    /// Add-reaction payload: the subject's own column carries the id, every
    /// other identity column is `None`.
    pub fn for_subject(
        subject: &ReactionSubject,
        actor: &ActorId,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut row = Self {
            kind: subject.kind,
            actor: actor.clone(),
            product_id: None,
            brand_id: None,
            created_at,
        };
        *row.column_mut(subject.identity_column()) = Some(subject.id.clone());
        row
    }

    pub fn column(&self, column: IdentityColumn) -> Option<&str> {
        match column {
            IdentityColumn::ProductId => self.product_id.as_deref(),
            IdentityColumn::BrandId => self.brand_id.as_deref(),
        }
    }

    fn column_mut(&mut self, column: IdentityColumn) -> &mut Option<String> {
        match column {
            IdentityColumn::ProductId => &mut self.product_id,
            IdentityColumn::BrandId => &mut self.brand_id,
        }
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        let own = self.kind.identity_column();
        for column in IdentityColumn::ALL {
            let populated = self.column(column).is_some_and(|id| !id.trim().is_empty());
            if column == own && !populated {
                return Err(StoreError::Malformed(format!(
                    "{} reaction without {}",
                    self.kind,
                    column.name()
                )));
            }
            if column != own && self.column(column).is_some() {
                return Err(StoreError::Malformed(format!(
                    "{} reaction also sets {}",
                    self.kind,
                    column.name()
                )));
            }
        }
        Ok(())
    }
}

/// `select/delete where <kind id column> = subject_id and actor = actor`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ReactionFilter {
    pub column: IdentityColumn,
    pub subject_id: String,
    pub actor: ActorId,
}

impl ReactionFilter {
    pub fn new(subject: &ReactionSubject, actor: &ActorId) -> Self {
        Self {
            column: subject.identity_column(),
            subject_id: subject.id.clone(),
            actor: actor.clone(),
        }
    }

    pub fn matches(&self, row: &ReactionRow) -> bool {
        row.actor == self.actor && row.column(self.column) == Some(self.subject_id.as_str())
    }
}

/// Query/command surface of the backend that persists reactions.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Matching rows, oldest first. At most one is expected.
    async fn select(&self, filter: &ReactionFilter) -> Result<Vec<ReactionRow>, StoreError>;

    /// Returns the number of rows removed.
    async fn delete(&self, filter: &ReactionFilter) -> Result<u64, StoreError>;

    async fn insert(&self, row: ReactionRow) -> Result<(), StoreError>;
}
