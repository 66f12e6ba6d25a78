//! engine::recovery
//!
//! `continue` after a conflict the user resolved by hand, and `submit`,
//! which publishes the current branch together with its managed ancestors.

use thiserror::Error;

use super::{ErrorCategory, StackOptions};
use crate::core::stack::StackError;
use crate::core::state::{StateError, StateStore};
use crate::core::types::{BranchName, Head};
use crate::git::{RebaseOutcome, Vcs, VcsError};

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("no rebase in progress")]
    NoRebaseInProgress,

    #[error("rebase stopped on another conflict; resolve it and run `gt continue` again:\n{output}")]
    StillConflicted { output: String },

    #[error("cannot submit trunk '{0}'")]
    SubmitOnTrunk(BranchName),

    #[error("HEAD is detached at {0}; check out a branch first")]
    DetachedHead(String),

    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Stack(#[from] StackError),
}

impl RecoveryError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RecoveryError::NoRebaseInProgress
            | RecoveryError::SubmitOnTrunk(_)
            | RecoveryError::DetachedHead(_) => ErrorCategory::Precondition,
            RecoveryError::StillConflicted { .. } | RecoveryError::Stack(_) => {
                ErrorCategory::Conflict
            }
            RecoveryError::Vcs(_) => ErrorCategory::ExternalToolFailure,
            RecoveryError::State(_) => ErrorCategory::StateIntegrity,
        }
    }
}

/// Resume a rebase stopped on a conflict.
pub fn continue_rebase<V: Vcs + ?Sized>(vcs: &V) -> Result<(), RecoveryError> {
    if !vcs.rebase_in_progress()? {
        return Err(RecoveryError::NoRebaseInProgress);
    }
    match vcs.rebase_continue()? {
        RebaseOutcome::Success => Ok(()),
        RebaseOutcome::Conflict { output } => Err(RecoveryError::StillConflicted { output }),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Pushed branches, root of the stack first.
    pub pushed: Vec<BranchName>,
    /// Recorded ancestors that no longer exist locally.
    pub skipped: Vec<BranchName>,
}

/// Push the current branch and every managed branch below it.
///
/// Pushes use `--force-with-lease` since restacked branches have rewritten
/// history. The first failed push stops the run.
pub fn submit<V: Vcs + ?Sized>(
    vcs: &V,
    store: &StateStore,
    options: &StackOptions,
) -> Result<SubmitOutcome, RecoveryError> {
    let model = store.load()?;
    let branch = match vcs.head()? {
        Head::Branch(branch) => branch,
        Head::Detached { oid } => return Err(RecoveryError::DetachedHead(oid)),
    };
    if model.is_trunk(&branch) {
        return Err(RecoveryError::SubmitOnTrunk(branch));
    }

    let mut chain: Vec<BranchName> = model
        .ancestors_of(&branch)?
        .into_iter()
        .filter(|b| model.is_managed(b))
        .collect();
    chain.reverse();
    chain.push(branch);

    let mut outcome = SubmitOutcome::default();
    for name in chain {
        if !vcs.branch_exists_locally(&name)? {
            tracing::warn!(branch = %name, "not present locally, not pushed");
            outcome.skipped.push(name);
            continue;
        }
        vcs.push(&options.remote, &name, true)?;
        tracing::info!(branch = %name, remote = %options.remote, "pushed");
        outcome.pushed.push(name);
    }
    Ok(outcome)
}
