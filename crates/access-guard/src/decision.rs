use serde::{Deserialize, Serialize};
use std::fmt;
use storefront_core::StorefrontConfig;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum DenyReason {
    NotAuthenticated,
    InsufficientRole,
}

impl DenyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DenyReason::NotAuthenticated => "not-authenticated",
            DenyReason::InsufficientRole => "insufficient-role",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum AdmissionDecision {
    Pending,
    Denied(DenyReason),
    Granted,
}

impl AdmissionDecision {
    pub fn is_granted(self) -> bool {
        matches!(self, AdmissionDecision::Granted)
    }

    pub fn label(self) -> &'static str {
        match self {
            AdmissionDecision::Pending => "pending",
            AdmissionDecision::Denied(_) => "denied",
            AdmissionDecision::Granted => "granted",
        }
    }

    /// Where the caller navigates. Only denials redirect.
    pub fn redirect(self, config: &StorefrontConfig) -> Option<&str> {
        match self {
            AdmissionDecision::Denied(DenyReason::NotAuthenticated) => Some(&config.login_route),
            AdmissionDecision::Denied(DenyReason::InsufficientRole) => {
                Some(&config.default_route)
            }
            AdmissionDecision::Pending | AdmissionDecision::Granted => None,
        }
    }

    /// Transient notice shown before redirecting. Only a role mismatch has one;
    /// unauthenticated visitors go straight to the login surface.
    pub fn notice(self, config: &StorefrontConfig) -> Option<&str> {
        match self {
            AdmissionDecision::Denied(DenyReason::InsufficientRole) => {
                Some(&config.insufficient_role_notice)
            }
            _ => None,
        }
    }
}

impl fmt::Display for AdmissionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdmissionDecision::Denied(reason) => write!(f, "denied({reason})"),
            other => f.write_str(other.label()),
        }
    }
}
