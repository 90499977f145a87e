use crate::session::Session;
use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

/// Source of the current session. Implementations resolve asynchronously and
/// start out `Unresolved`.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    fn current(&self) -> Session;

    fn subscribe(&self) -> watch::Receiver<Session>;

    /// Waits until the session leaves `Unresolved`. Returns the last known
    /// session if the provider shuts down first.
    async fn resolved(&self) -> Session {
        let mut rx = self.subscribe();
        loop {
            let session = rx.borrow_and_update().clone();
            if session.is_resolved() {
                return session;
            }
            if rx.changed().await.is_err() {
                return rx.borrow().clone();
            }
        }
    }
}

/// Provider backed by a `tokio::sync::watch` channel. The session backend
/// publishes into it; guards and ledgers subscribe.
#[derive(Debug)]
pub struct WatchSessionProvider {
    tx: watch::Sender<Session>,
}

impl WatchSessionProvider {
    pub fn new() -> Self {
        Self::starting_with(Session::Unresolved)
    }

    pub fn starting_with(session: Session) -> Self {
        let (tx, _rx) = watch::channel(session);
        Self { tx }
    }

    pub fn publish(&self, session: Session) {
        debug!(?session, "session published");
        self.tx.send_replace(session);
    }
}

impl Default for WatchSessionProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionProvider for WatchSessionProvider {
    fn current(&self) -> Session {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }
}
