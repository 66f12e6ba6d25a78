//! core::paths
//!
//! Centralized path routing for gt storage locations.
//!
//! All gt data lives under `<common_dir>/gt/`, inside the repository's
//! control directory so it is never part of the tracked tree:
//! - `config.json` - Workspace state (trunk + managed branches)
//! - `settings.toml` - Repository settings
//!
//! Linked worktrees share `common_dir`, so every worktree of one repository
//! sees the same stack.
//!
//! # Example
//!
//! ```
//! use gtstack::core::paths::GtPaths;
//! use std::path::PathBuf;
//!
//! let paths = GtPaths::new(PathBuf::from("/repo/.git"));
//! assert_eq!(paths.state_path(), PathBuf::from("/repo/.git/gt/config.json"));
//! ```

use std::path::{Path, PathBuf};

/// Directory name under the common git dir.
const GT_DIR: &str = "gt";

/// Storage locations for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GtPaths {
    /// Shared git directory (refs, objects, config).
    /// For linked worktrees this is the parent repository's git dir.
    pub common_dir: PathBuf,
}

impl GtPaths {
    pub fn new(common_dir: PathBuf) -> Self {
        Self { common_dir }
    }

    /// Locate the repository containing `start` and route paths to it.
    ///
    /// Returns `None` when no repository encloses `start`.
    pub fn discover(start: &Path) -> Option<Self> {
        crate::git::discover_common_dir(start).map(Self::new)
    }

    /// `<common_dir>/gt`
    pub fn gt_dir(&self) -> PathBuf {
        self.common_dir.join(GT_DIR)
    }

    /// `<common_dir>/gt/config.json`
    pub fn state_path(&self) -> PathBuf {
        self.gt_dir().join("config.json")
    }

    /// `<common_dir>/gt/settings.toml`
    pub fn settings_path(&self) -> PathBuf {
        self.gt_dir().join("settings.toml")
    }
}
