//! In-process [`RemoteStore`] with switchable failures and optional read and
//! write gates, for tests and the console.

use crate::store::{ReactionFilter, ReactionRow, RemoteStore, StoreError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use storefront_core::ReactionSubject;
use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<ReactionRow>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    read_gate: Option<Arc<Notify>>,
    write_gate: Option<Arc<Notify>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write waits for one `notify_one` on `gate` before it applies.
    pub fn with_write_gate(gate: Arc<Notify>) -> Self {
        Self {
            write_gate: Some(gate),
            ..Self::default()
        }
    }

    /// Every read computes its rows, then waits for one `notify_one` on
    /// `gate` before returning them.
    pub fn with_read_gate(gate: Arc<Notify>) -> Self {
        Self {
            read_gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn seed(&self, row: ReactionRow) -> Result<(), StoreError> {
        row.validate()?;
        self.rows().push(row);
        Ok(())
    }

    pub fn all_rows(&self) -> Vec<ReactionRow> {
        self.rows().clone()
    }

    /// Reactions recorded for a subject across all actors.
    pub fn count_for(&self, subject: &ReactionSubject) -> u64 {
        let column = subject.identity_column();
        self.rows()
            .iter()
            .filter(|row| row.column(column) == Some(subject.id.as_str()))
            .count() as u64
    }

    fn rows(&self) -> MutexGuard<'_, Vec<ReactionRow>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn before_write(&self) -> Result<(), StoreError> {
        if let Some(gate) = &self.write_gate {
            gate.notified().await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("write refused by fault injection".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select(&self, filter: &ReactionFilter) -> Result<Vec<ReactionRow>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("read refused by fault injection".into()));
        }
        let mut rows: Vec<_> = self
            .rows()
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.created_at);
        if let Some(gate) = &self.read_gate {
            gate.notified().await;
        }
        Ok(rows)
    }

    async fn delete(&self, filter: &ReactionFilter) -> Result<u64, StoreError> {
        self.before_write().await?;
        let mut rows = self.rows();
        let before = rows.len();
        rows.retain(|row| !filter.matches(row));
        Ok((before - rows.len()) as u64)
    }

    async fn insert(&self, row: ReactionRow) -> Result<(), StoreError> {
        self.before_write().await?;
        row.validate()?;
        let own = row.kind.identity_column();
        let mut rows = self.rows();
        let duplicate = rows.iter().any(|existing| {
            existing.actor == row.actor && existing.column(own) == row.column(own)
        });
        if duplicate {
            return Err(StoreError::Rejected(format!(
                "duplicate reaction on {} for {}",
                own.name(),
                row.actor
            )));
        }
        rows.push(row);
        Ok(())
    }
}
