use serde::{Deserialize, Serialize};
use std::fmt;

/// Role attached to an authenticated identity, e.g. `"user"` or `"admin"`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn admin() -> Self {
        Self::new("admin")
    }

    pub fn user() -> Self {
        Self::new("user")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact, case-sensitive match. Every admission path goes through here.
    pub fn satisfies(&self, required: &Role) -> bool {
        self.0 == required.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Stable identifier of the actor behind a session.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Authenticated identity as reported by the session backend.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub actor: ActorId,
    pub role: Role,
}

impl Identity {
    pub fn new(actor: impl Into<ActorId>, role: impl Into<Role>) -> Self {
        Self {
            actor: actor.into(),
            role: role.into(),
        }
    }
}

/// Session status. `Unresolved` means "don't know yet" and must never be
/// read as `Anonymous`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Session {
    #[default]
    Unresolved,
    Anonymous,
    Authenticated(Identity),
}

impl Session {
    pub fn authenticated(actor: impl Into<ActorId>, role: impl Into<Role>) -> Self {
        Session::Authenticated(Identity::new(actor, role))
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Session::Unresolved)
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Authenticated(identity) => Some(identity),
            Session::Unresolved | Session::Anonymous => None,
        }
    }

    pub fn actor(&self) -> Option<&ActorId> {
        self.identity().map(|identity| &identity.actor)
    }

    /// Role comparison shared by the guard's `evaluate` and `is_granted`.
    ///
    /// `None` while unresolved, `Some(false)` for anonymous sessions and
    /// mismatched roles.
    pub fn has_role(&self, required: &Role) -> Option<bool> {
        match self {
            Session::Unresolved => None,
            Session::Anonymous => Some(false),
            Session::Authenticated(identity) => Some(identity.role.satisfies(required)),
        }
    }
}
