//! engine::sync
//!
//! Bring the stack up to date with the remote trunk.
//!
//! # Algorithm
//!
//! 1. Record the checked-out position.
//! 2. Fetch. Failure is fatal: nothing is reconciled against stale refs.
//! 3. Check out trunk and fast-forward it. Diverged history is fatal; trunk
//!    is never merged or force-updated.
//! 4. Classify each managed branch (parents first):
//!    - missing locally: skipped
//!    - missing on the remote: the operator is asked whether to delete it.
//!      A confirmed deletion is saved immediately, so a later failure in the
//!      same run cannot undo it. A declined one is kept and restacked.
//!    - present on the remote, or the lookup failed: restacked
//! 5. Restack the kept branches (see [`restack`](super::restack)).
//! 6. Return to the original position, or trunk if it is gone.
//! 7. Save the model. This happens even when step 5 or 6 went wrong, so
//!    repairs made by the pass are never lost.
//!
//! Per-branch failures in steps 4 and 5 are collected in the
//! [`SyncReport`]; they never stop the run.

use thiserror::Error;

use super::report::SyncReport;
use super::restack::{ensure_no_rebase, restack_pass, restore_position};
use super::{remove_managed, ErrorCategory, StackOptions};
use crate::core::stack::{StackError, StackModel};
use crate::core::state::{StateError, StateStore};
use crate::core::types::{BranchName, Head};
use crate::git::{RemoteLookup, Vcs, VcsError};
use crate::ui::prompts::Confirm;

/// Errors that stop a sync (or restack) run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("a rebase is in progress; finish it with 'gt continue' or abort it with 'git rebase --abort'")]
    RebaseInProgress,

    #[error("failed to fetch from '{remote}'")]
    FetchFailed {
        remote: String,
        #[source]
        source: VcsError,
    },

    #[error("trunk '{trunk}' cannot be fast-forwarded from '{remote}'; it has diverged")]
    TrunkNotFastForward {
        trunk: BranchName,
        remote: String,
        #[source]
        source: VcsError,
    },

    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Stack(#[from] StackError),
}

impl SyncError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::RebaseInProgress => ErrorCategory::Precondition,
            SyncError::FetchFailed { .. }
            | SyncError::TrunkNotFastForward { .. }
            | SyncError::Vcs(_) => ErrorCategory::ExternalToolFailure,
            SyncError::State(_) => ErrorCategory::StateIntegrity,
            SyncError::Stack(_) => ErrorCategory::Conflict,
        }
    }
}

/// Sync driver bound to one repository and state file.
pub struct SyncEngine<'a, V: Vcs + ?Sized> {
    vcs: &'a V,
    store: &'a StateStore,
    options: &'a StackOptions,
}

impl<'a, V: Vcs + ?Sized> SyncEngine<'a, V> {
    pub fn new(vcs: &'a V, store: &'a StateStore, options: &'a StackOptions) -> Self {
        Self {
            vcs,
            store,
            options,
        }
    }

    /// Run a full sync.
    ///
    /// `confirm` answers deletion questions; `None` means non-interactive,
    /// in which case branches gone from the remote are kept with a warning.
    pub fn run(&self, mut confirm: Option<&mut dyn Confirm>) -> Result<SyncReport, SyncError> {
        ensure_no_rebase(self.vcs)?;
        let origin = self.vcs.head()?;
        let mut model = self.store.load()?;
        let trunk = model.trunk().clone();
        let remote = self.options.remote.as_str();
        let mut report = SyncReport::default();

        tracing::info!(%remote, %trunk, "syncing");
        self.vcs
            .fetch(remote)
            .map_err(|source| SyncError::FetchFailed {
                remote: remote.to_string(),
                source,
            })?;

        if let Err(e) = self.update_trunk(&trunk) {
            self.recover(&origin, &trunk);
            return Err(e);
        }

        let mut candidates = Vec::new();
        for branch in model.restack_order()? {
            match self.vcs.branch_exists_locally(&branch) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(%branch, "not present locally, skipping");
                    report.skipped.push(branch);
                    continue;
                }
                Err(e) => {
                    report.warn(format!("could not look up '{}': {}", branch, e));
                    candidates.push(branch);
                    continue;
                }
            }

            match self.vcs.branch_exists_on_remote(remote, &branch) {
                Ok(RemoteLookup::Absent) => {
                    tracing::debug!(%branch, "missing on remote");
                    if self.handle_gone(&branch, &mut model, &mut report, &mut confirm)? {
                        candidates.push(branch);
                    }
                }
                Ok(lookup) => {
                    tracing::debug!(%branch, ?lookup, "keeping");
                    candidates.push(branch);
                }
                Err(e) => {
                    report.warn(format!(
                        "could not check '{}' on '{}'; keeping it: {}",
                        branch, remote, e
                    ));
                    candidates.push(branch);
                }
            }
        }

        let pass = restack_pass(
            self.vcs,
            &mut model,
            self.options.restack,
            &candidates,
            &mut report,
        );
        restore_position(self.vcs, &origin, &trunk, &mut report);
        self.store.save(&model)?;
        pass?;

        tracing::info!(
            deleted = report.deleted.len(),
            rebased = report.rebased.len(),
            failed = report.failed.len(),
            "sync finished"
        );
        Ok(report)
    }

    fn update_trunk(&self, trunk: &BranchName) -> Result<(), SyncError> {
        let remote = &self.options.remote;
        self.vcs.checkout(trunk)?;
        self.vcs
            .fast_forward_pull(remote, trunk)
            .map_err(|source| SyncError::TrunkNotFastForward {
                trunk: trunk.clone(),
                remote: remote.clone(),
                source,
            })
    }

    /// Best-effort return to `origin` after a fatal error.
    fn recover(&self, origin: &Head, trunk: &BranchName) {
        let mut scratch = SyncReport::default();
        restore_position(self.vcs, origin, trunk, &mut scratch);
        for warning in scratch.warnings {
            tracing::debug!(%warning, "after failed sync");
        }
    }

    /// Ask about a branch gone from the remote and delete it if confirmed.
    ///
    /// Returns whether the branch should still be restacked.
    fn handle_gone(
        &self,
        branch: &BranchName,
        model: &mut StackModel,
        report: &mut SyncReport,
        confirm: &mut Option<&mut dyn Confirm>,
    ) -> Result<bool, SyncError> {
        let remote = &self.options.remote;
        let delete = match confirm {
            None => {
                report.warn(format!(
                    "'{}' is not on '{}'; keeping it (non-interactive)",
                    branch, remote
                ));
                false
            }
            Some(prompt) => {
                let question = format!(
                    "Branch '{}' no longer exists on '{}'. Delete it locally?",
                    branch, remote
                );
                match prompt.confirm(&question) {
                    Ok(answer) => answer,
                    Err(e) => {
                        report.warn(format!("keeping '{}': {}", branch, e));
                        false
                    }
                }
            }
        };

        if !delete {
            report.kept.push(branch.clone());
            return Ok(true);
        }

        if let Err(e) = self.delete_local(branch) {
            report.fail(branch, e.to_string());
            return Ok(false);
        }
        remove_managed(model, branch, self.options.removal)?;
        self.store.save(model)?;
        tracing::info!(%branch, "deleted");
        report.deleted.push(branch.clone());
        Ok(false)
    }

    /// Safe delete first; force only if git refuses an unmerged branch.
    fn delete_local(&self, branch: &BranchName) -> Result<(), VcsError> {
        match self.vcs.delete_branch(branch, false) {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::debug!(%branch, error = %e, "safe delete refused, forcing");
                self.vcs.delete_branch(branch, true)
            }
        }
    }
}
