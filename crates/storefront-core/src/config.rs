use crate::session::Role;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};
use thiserror::Error;
use tracing::{info, warn};

pub const ENV_PREFIX: &str = "STOREFRONT_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Routes and user-visible notices for guard denials and failed toggles.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorefrontConfig {
    pub admin_role: String,
    pub login_route: String,
    pub default_route: String,
    pub insufficient_role_notice: String,
    pub toggle_failed_notice: String,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            admin_role: "admin".to_string(),
            login_route: "/login".to_string(),
            default_route: "/".to_string(),
            insufficient_role_notice: "You do not have access to this page.".to_string(),
            toggle_failed_notice: "Something went wrong, please try again.".to_string(),
        }
    }
}

impl StorefrontConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Reads `STOREFRONT_*` variables, keeping the default for anything
    /// missing or blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            admin_role: try_load(&lookup, "ADMIN_ROLE", defaults.admin_role),
            login_route: try_load(&lookup, "LOGIN_ROUTE", defaults.login_route),
            default_route: try_load(&lookup, "DEFAULT_ROUTE", defaults.default_route),
            insufficient_role_notice: try_load(
                &lookup,
                "INSUFFICIENT_ROLE_NOTICE",
                defaults.insufficient_role_notice,
            ),
            toggle_failed_notice: try_load(
                &lookup,
                "TOGGLE_FAILED_NOTICE",
                defaults.toggle_failed_notice,
            ),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admin_role.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "admin_role",
                reason: "must not be blank".into(),
            });
        }
        for (field, route) in [
            ("login_route", &self.login_route),
            ("default_route", &self.default_route),
        ] {
            if !route.starts_with('/') {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("route {route:?} must start with '/'"),
                });
            }
        }
        Ok(())
    }

    pub fn admin_role(&self) -> Role {
        Role::new(self.admin_role.clone())
    }
}

fn try_load<F>(lookup: &F, key: &str, default: String) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let full_key = format!("{ENV_PREFIX}{key}");
    match lookup(&full_key) {
        Some(value) if !value.trim().is_empty() => value.trim().to_string(),
        Some(_) => {
            warn!("{full_key} is blank, using default: {default}");
            default
        }
        None => {
            info!("{full_key} not set, using default: {default}");
            default
        }
    }
}
