//! Admission control for role-gated storefront views.
//!
//! A guard turns the current [`Session`](storefront_core::Session) into an
//! [`AdmissionDecision`]. `Pending` means the session has not resolved yet
//! and the caller shows a neutral state: no redirect, no callbacks. The
//! first `Granted` fires the post-admission callbacks, once per guard
//! instance.

mod callbacks;
mod decision;
mod follow;
mod guard;

pub use callbacks::{Callback, Callbacks};
pub use decision::{AdmissionDecision, DenyReason};
pub use follow::follow_session;
pub use guard::{admission, is_granted, AuthorizationGuard, GuardError};
