//! engine
//!
//! Stack operations: sync, restack and the branch lifecycle.
//!
//! # Architecture
//!
//! Every operation follows the same shape:
//!
//! ```text
//! load state -> check preconditions -> drive Vcs -> mutate StackModel -> save state
//! ```
//!
//! Engines receive a [`Vcs`](crate::git::Vcs) and a
//! [`StateStore`](crate::core::state::StateStore) from the caller. They never
//! spawn processes or parse tool output themselves, so every path is testable
//! against [`MockVcs`](crate::git::mock::MockVcs).
//!
//! # Modules
//!
//! - [`sync`] - [`SyncEngine`]: update trunk, prune vanished branches, restack
//! - [`restack`] - The shared restack pass and the standalone `restack`
//! - [`lifecycle`] - `create`, `pop`, `modify`
//! - [`recovery`] - `continue` after a conflict, `submit`
//! - [`report`] - [`SyncReport`]

pub mod lifecycle;
pub mod recovery;
pub mod report;
pub mod restack;
pub mod sync;

pub use lifecycle::{
    CreateOutcome, CreateRequest, LifecycleError, ModifyOutcome, ModifyRequest, PopOutcome,
};
pub use recovery::{RecoveryError, SubmitOutcome};
pub use report::{BranchFailure, FinalPosition, SyncReport};
pub use sync::{SyncEngine, SyncError};

use std::path::PathBuf;

use crate::core::config::{Config, RestackStrategy};
use crate::core::stack::{RemovalPolicy, StackError, StackModel};
use crate::core::types::BranchName;

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags that affect command behavior.
#[derive(Debug, Clone)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// Interactive mode enabled.
    pub interactive: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            cwd: None,
            debug: false,
            quiet: false,
            interactive: true,
        }
    }
}

/// Broad class of a failure, for reporting and exit handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Wrong branch or repository state for the operation.
    Precondition,
    /// Name collision or a cyclic parent chain.
    Conflict,
    /// Workspace state unreadable or unwritable.
    StateIntegrity,
    /// The version-control tool reported failure.
    ExternalToolFailure,
}

/// Settings the engines act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackOptions {
    pub remote: String,
    pub restack: RestackStrategy,
    pub removal: RemovalPolicy,
}

impl Default for StackOptions {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            restack: RestackStrategy::default(),
            removal: RemovalPolicy::default(),
        }
    }
}

impl StackOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            remote: config.remote().to_string(),
            restack: config.restack_strategy(),
            removal: config.removal_policy(),
        }
    }
}

/// Drop `branch` from the model under `policy`.
///
/// With [`RemovalPolicy::RequireExplicit`] the children are first moved to
/// the removed branch's parent (or trunk if that parent is gone), so engine
/// removals never fail on dependents.
pub(crate) fn remove_managed(
    model: &mut StackModel,
    branch: &BranchName,
    policy: RemovalPolicy,
) -> Result<(), StackError> {
    if policy == RemovalPolicy::RequireExplicit {
        let parent = model.resolve_parent(branch).clone();
        let parent = if model.is_trunk(&parent) || model.is_managed(&parent) {
            parent
        } else {
            model.trunk().clone()
        };
        for child in model.children(branch) {
            tracing::info!(%child, %parent, "re-parenting before removal");
            model.reparent(&child, parent.clone())?;
        }
    }
    model.remove(branch, policy)?;
    Ok(())
}
