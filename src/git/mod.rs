//! git
//!
//! Single interface for all version-control operations.
//!
//! # Architecture
//!
//! This module is the **only doorway** to git. Engines talk to the [`Vcs`]
//! trait; nothing outside this module imports `git2` or spawns `git`.
//!
//! - [`interface`] - The [`Vcs`] contract and its error type
//! - [`Git`] - Real repositories (`git2` reads, `git` subprocess mutations)
//! - [`mock`] - In-memory [`MockVcs`](mock::MockVcs) for tests
//!
//! # Example
//!
//! ```ignore
//! use gtstack::git::{Git, Vcs};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! println!("on {}", git.head()?);
//! ```

mod interface;
pub mod mock;
mod repo;

pub use interface::{RebaseOutcome, RemoteLookup, Vcs, VcsError, VcsOp};
pub use repo::Git;

use std::path::{Path, PathBuf};

/// Shared git directory of the repository enclosing `start`.
///
/// For linked worktrees this is the main repository's git dir, so every
/// worktree resolves to the same location. `None` outside a repository.
pub fn discover_common_dir(start: &Path) -> Option<PathBuf> {
    git2::Repository::discover(start)
        .ok()
        .map(|repo| repo.commondir().to_path_buf())
}
