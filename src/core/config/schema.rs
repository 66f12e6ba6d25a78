//! core::config::schema
//!
//! Settings schema types.
//!
//! # Global Settings
//!
//! Located at (in order of precedence):
//! 1. `$GT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gt/settings.toml`
//! 3. `~/.gt/settings.toml` (canonical write location)
//!
//! # Repo Settings
//!
//! Located at `<common-git-dir>/gt/settings.toml`.
//!
//! # Validation
//!
//! Values are validated after parsing (the default trunk must be a valid
//! branch name, the remote must be non-empty).

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::stack::RemovalPolicy;
use crate::core::types::BranchName;

/// How the restack pass chooses each branch's rebase target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestackStrategy {
    /// Rebase every managed branch directly onto trunk.
    #[default]
    Trunk,
    /// Rebase each branch onto its recorded parent, parents first.
    Parent,
}

/// Global settings (user scope).
///
/// # Example
///
/// ```toml
/// default_trunk = "main"
/// interactive = true
///
/// [stack]
/// restack = "parent"
/// removal = "reparent"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Trunk used when a repository has no recorded state yet
    pub default_trunk: Option<String>,

    /// Default interactive mode
    pub interactive: Option<bool>,

    /// Stack behavior defaults
    pub stack: Option<StackSettings>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_trunk(self.default_trunk.as_deref())
    }
}

/// Repository settings.
///
/// # Example
///
/// ```toml
/// default_trunk = "develop"
/// remote = "upstream"
///
/// [stack]
/// removal = "require-explicit"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Trunk used when this repository has no recorded state yet
    pub default_trunk: Option<String>,

    /// Remote name (default: "origin")
    pub remote: Option<String>,

    /// Stack behavior overrides
    pub stack: Option<StackSettings>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_trunk(self.default_trunk.as_deref())?;

        if let Some(remote) = &self.remote {
            if remote.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "remote cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// `[stack]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StackSettings {
    /// Rebase target selection for sync and restack
    pub restack: Option<RestackStrategy>,

    /// What happens to children when a branch is removed
    pub removal: Option<RemovalPolicy>,
}

fn validate_trunk(trunk: Option<&str>) -> Result<(), ConfigError> {
    if let Some(trunk) = trunk {
        BranchName::new(trunk)
            .map_err(|e| ConfigError::InvalidValue(format!("invalid default trunk: {}", e)))?;
    }
    Ok(())
}
