pub mod config;
pub mod provider;
pub mod reaction;
pub mod session;
pub mod subject;

pub use config::{ConfigError, StorefrontConfig};
pub use provider::{SessionProvider, WatchSessionProvider};
pub use reaction::ReactionState;
pub use session::{ActorId, Identity, Role, Session};
pub use subject::{IdentityColumn, ReactionSubject, SubjectKind, UnknownSubjectKind};
