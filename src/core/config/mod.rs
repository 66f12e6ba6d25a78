//! core::config
//!
//! Settings schema and loading.
//!
//! # Overview
//!
//! gt has two settings scopes:
//! - **Global**: User-level settings
//! - **Repo**: Repository-level overrides
//!
//! Settings are separate from the workspace state file: they describe how gt
//! behaves, the state file records the stack itself.
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global settings file
//! 3. Repo settings file
//! 4. CLI flags (not handled here)
//!
//! # Example
//!
//! ```no_run
//! use gtstack::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Some(Path::new("/path/to/repo/.git"))).unwrap();
//! println!("Remote: {}", config.remote());
//! println!("Restack: {:?}", config.restack_strategy());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, RepoConfig, RestackStrategy, StackSettings};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::paths::GtPaths;
use crate::core::stack::RemovalPolicy;
use crate::core::types::BranchName;

/// Environment variable naming an explicit global settings file.
pub const CONFIG_ENV: &str = "GT_CONFIG";

const DEFAULT_TRUNK: &str = "main";
const DEFAULT_REMOTE: &str = "origin";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Merged settings from all sources.
///
/// Accessors apply precedence: repo over global over defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global settings
    pub global: GlobalConfig,
    /// Repository settings (if in a repo with a settings file)
    pub repo: Option<RepoConfig>,
    global_path: Option<PathBuf>,
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load settings from default locations.
    ///
    /// `common_dir` is the repository's shared git directory; when given,
    /// repo settings are read from `<common_dir>/gt/settings.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file exists but cannot be parsed or
    /// fails validation. Missing files are not an error.
    pub fn load(common_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let global_path = Self::global_candidates().into_iter().find(|p| p.exists());
        let repo_path =
            common_dir.map(|dir| GtPaths::new(dir.to_path_buf()).settings_path());
        Self::load_from(global_path.as_deref(), repo_path.as_deref())
    }

    /// Load settings from explicit file locations.
    ///
    /// Missing files are treated as empty.
    pub fn load_from(global: Option<&Path>, repo: Option<&Path>) -> Result<Self, ConfigError> {
        let (global, global_path) = match global {
            Some(path) if path.exists() => (read_toml::<GlobalConfig>(path)?, Some(path)),
            _ => (GlobalConfig::default(), None),
        };
        let (repo, repo_path) = match repo {
            Some(path) if path.exists() => (Some(read_toml::<RepoConfig>(path)?), Some(path)),
            _ => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        if let Some(path) = global_path {
            tracing::debug!(path = %path.display(), "loaded global settings");
        }
        if let Some(path) = repo_path {
            tracing::debug!(path = %path.display(), "loaded repo settings");
        }

        Ok(Config {
            global,
            repo,
            global_path: global_path.map(Path::to_path_buf),
            repo_path: repo_path.map(Path::to_path_buf),
        })
    }

    /// Global settings locations, most specific first.
    fn global_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            candidates.push(PathBuf::from(path));
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            candidates.push(PathBuf::from(xdg_home).join("gt/settings.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".gt/settings.toml"));
        }
        candidates
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Trunk for repositories without recorded state.
    ///
    /// Defaults to "main".
    pub fn default_trunk(&self) -> BranchName {
        self.repo
            .as_ref()
            .and_then(|r| r.default_trunk.as_deref())
            .or(self.global.default_trunk.as_deref())
            .and_then(|name| BranchName::new(name).ok())
            .unwrap_or_else(|| BranchName::from_static(DEFAULT_TRUNK))
    }

    /// Remote name. Defaults to "origin".
    pub fn remote(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.remote.as_deref())
            .unwrap_or(DEFAULT_REMOTE)
    }

    /// Whether prompts are allowed. Defaults to `true`.
    pub fn interactive(&self) -> bool {
        self.global.interactive.unwrap_or(true)
    }

    pub fn restack_strategy(&self) -> RestackStrategy {
        self.stack_value(|s| s.restack).unwrap_or_default()
    }

    pub fn removal_policy(&self) -> RemovalPolicy {
        self.stack_value(|s| s.removal).unwrap_or_default()
    }

    fn stack_value<T>(&self, get: impl Fn(&StackSettings) -> Option<T>) -> Option<T> {
        let repo = self
            .repo
            .as_ref()
            .and_then(|r| r.stack.as_ref())
            .and_then(&get);
        repo.or_else(|| self.global.stack.as_ref().and_then(&get))
    }

    /// Path of the global settings file, if one was loaded.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Path of the repo settings file, if one was loaded.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
