use crate::callbacks::Callbacks;
use crate::decision::AdmissionDecision;
use crate::guard::{AuthorizationGuard, GuardError};
use storefront_core::Session;
use tokio::sync::watch;

/// Evaluates `guard` against the current session and again after every
/// change, handing each decision to `sink`. Returns once the session source
/// is dropped, or with the first callback failure.
pub async fn follow_session<F>(
    guard: &mut AuthorizationGuard,
    mut sessions: watch::Receiver<Session>,
    mut callbacks: Callbacks,
    mut sink: F,
) -> Result<(), GuardError>
where
    F: FnMut(&AdmissionDecision),
{
    loop {
        let session = sessions.borrow_and_update().clone();
        let decision = guard.evaluate(&session, &mut callbacks)?;
        sink(&decision);

        if sessions.changed().await.is_err() {
            return Ok(());
        }
    }
}
