//! Like/unlike toggling for products and brands.
//!
//! [`ReactionLedger`] talks to the [`RemoteStore`] and serializes toggles per
//! (subject, actor). [`ReactionBinding`] is the per-view cell that owns a
//! [`ReactionState`](storefront_core::ReactionState) and rolls it back when a
//! write fails or is abandoned.

mod binding;
mod ledger;
pub mod memory;
mod store;
#[cfg(test)]
mod tests;

pub use binding::ReactionBinding;
pub use ledger::{ReactionLedger, ReadDegraded, Rejection};
pub use memory::MemoryStore;
pub use store::{ReactionFilter, ReactionRow, RemoteStore, StoreError};
