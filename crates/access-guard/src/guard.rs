use crate::callbacks::Callbacks;
use crate::decision::{AdmissionDecision, DenyReason};
use storefront_core::{Role, Session, StorefrontConfig};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("post-admission callback #{index} failed: {source}")]
    Callback {
        index: usize,
        #[source]
        source: anyhow::Error,
    },
}

/// Side-effect free admission. `evaluate` and [`is_granted`] both derive from
/// [`Session::has_role`], so the two entry points cannot disagree.
pub fn admission(session: &Session, required: &Role) -> AdmissionDecision {
    match session.has_role(required) {
        None => AdmissionDecision::Pending,
        Some(true) => AdmissionDecision::Granted,
        Some(false) if session.identity().is_none() => {
            AdmissionDecision::Denied(DenyReason::NotAuthenticated)
        }
        Some(false) => AdmissionDecision::Denied(DenyReason::InsufficientRole),
    }
}

/// `None` while the session is unresolved.
pub fn is_granted(session: &Session, required: &Role) -> Option<bool> {
    session.has_role(required)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Latch {
    Armed,
    Fired,
}

/// Guard for one mounted view. The latch lives and dies with the instance;
/// a new view builds a new guard.
#[derive(Debug)]
pub struct AuthorizationGuard {
    required: Role,
    latch: Latch,
}

impl AuthorizationGuard {
    pub fn new(required: Role) -> Self {
        Self {
            required,
            latch: Latch::Armed,
        }
    }

    pub fn for_admin(config: &StorefrontConfig) -> Self {
        Self::new(config.admin_role())
    }

    pub fn required_role(&self) -> &Role {
        &self.required
    }

    pub fn has_fired(&self) -> bool {
        self.latch == Latch::Fired
    }

    /// Re-run on every session change.
    ///
    /// The first `Granted` trips the latch and then drains `callbacks` in
    /// order. The latch trips before dispatch, so a failing callback is
    /// reported once and never re-attempted by a later evaluation.
    pub fn evaluate(
        &mut self,
        session: &Session,
        callbacks: &mut Callbacks,
    ) -> Result<AdmissionDecision, GuardError> {
        let decision = admission(session, &self.required);
        match decision {
            AdmissionDecision::Pending => {
                debug!(required = %self.required, "session unresolved, admission pending");
            }
            AdmissionDecision::Denied(reason) => {
                info!(required = %self.required, %reason, "admission denied");
            }
            AdmissionDecision::Granted if self.latch == Latch::Armed => {
                self.latch = Latch::Fired;
                debug!(
                    required = %self.required,
                    callbacks = callbacks.len(),
                    "admission granted, dispatching callbacks"
                );
                callbacks
                    .dispatch()
                    .map_err(|(index, source)| GuardError::Callback { index, source })?;
            }
            AdmissionDecision::Granted => {}
        }
        Ok(decision)
    }
}
