//! git::interface
//!
//! The adapter contract between gt and a version-control backend.
//!
//! Engines depend only on [`Vcs`]; they never see git's argument syntax. Two
//! implementations exist: [`Git`](super::Git) for real repositories and
//! [`MockVcs`](super::mock::MockVcs) for tests.
//!
//! # Failure contract
//!
//! Every failed operation returns [`VcsError::CommandFailed`] carrying the
//! tool's captured output verbatim. Callers never inspect that output to make
//! decisions. The one signal the adapter itself interprets is "remote not
//! configured", surfaced as [`RemoteLookup::NotConfigured`].

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::types::{BranchName, Head};

/// Primitive operations exposed by the adapter.
///
/// Used to label failures and, in the mock, to inject them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VcsOp {
    Head,
    ListBranches,
    RemoteQuery,
    Checkout,
    CreateBranch,
    DeleteBranch,
    StageAll,
    Commit,
    Amend,
    Reset,
    Fetch,
    Pull,
    Rebase,
    RebaseAbort,
    RebaseContinue,
    Push,
}

impl VcsOp {
    /// Short human label.
    pub fn label(self) -> &'static str {
        match self {
            VcsOp::Head => "read HEAD",
            VcsOp::ListBranches => "list branches",
            VcsOp::RemoteQuery => "query remote branch",
            VcsOp::Checkout => "checkout",
            VcsOp::CreateBranch => "create branch",
            VcsOp::DeleteBranch => "delete branch",
            VcsOp::StageAll => "stage changes",
            VcsOp::Commit => "commit",
            VcsOp::Amend => "amend commit",
            VcsOp::Reset => "reset last commit",
            VcsOp::Fetch => "fetch",
            VcsOp::Pull => "fast-forward pull",
            VcsOp::Rebase => "rebase",
            VcsOp::RebaseAbort => "abort rebase",
            VcsOp::RebaseContinue => "continue rebase",
            VcsOp::Push => "push",
        }
    }
}

impl fmt::Display for VcsOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors from the version-control adapter.
#[derive(Debug, Error)]
pub enum VcsError {
    /// No repository encloses the path.
    #[error("not a git repository: {}", path.display())]
    NotARepo { path: PathBuf },

    /// The external tool reported failure.
    #[error("{}", describe_failure(*op, branch.as_ref(), output))]
    CommandFailed {
        op: VcsOp,
        branch: Option<BranchName>,
        output: String,
    },

    /// The external tool could not be started.
    #[error("failed to run git: {0}")]
    Spawn(#[source] std::io::Error),

    /// Repository read through the library failed.
    #[error("repository access error: {message}")]
    Internal { message: String },
}

fn describe_failure(op: VcsOp, branch: Option<&BranchName>, output: &str) -> String {
    let subject = match branch {
        Some(b) => format!("git {} failed for '{}'", op, b),
        None => format!("git {} failed", op),
    };
    if output.trim().is_empty() {
        subject
    } else {
        format!("{}:\n{}", subject, output.trim_end())
    }
}

impl VcsError {
    /// Captured tool output, when the tool ran.
    pub fn output(&self) -> Option<&str> {
        match self {
            VcsError::CommandFailed { output, .. } => Some(output),
            _ => None,
        }
    }
}

impl From<git2::Error> for VcsError {
    fn from(err: git2::Error) -> Self {
        VcsError::Internal {
            message: err.message().to_string(),
        }
    }
}

/// Result of asking whether a branch exists on the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteLookup {
    Present,
    Absent,
    /// No such remote is configured; not an error.
    NotConfigured,
}

/// Result of a rebase attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebaseOutcome {
    Success,
    /// The rebase stopped on a conflict and is still in progress.
    Conflict { output: String },
}

/// Version-control operations consumed by the engines.
///
/// All calls are blocking. Mutating calls act on the working copy the
/// implementation was opened on.
pub trait Vcs {
    /// Where the working copy currently points.
    fn head(&self) -> Result<Head, VcsError>;

    fn list_local_branches(&self) -> Result<Vec<BranchName>, VcsError>;

    fn branch_exists_locally(&self, name: &BranchName) -> Result<bool, VcsError>;

    /// Distinguishes an absent remote from a failed query: the former is
    /// [`RemoteLookup::NotConfigured`], the latter an error.
    fn branch_exists_on_remote(
        &self,
        remote: &str,
        name: &BranchName,
    ) -> Result<RemoteLookup, VcsError>;

    fn checkout(&self, name: &BranchName) -> Result<(), VcsError>;

    /// Check out a commit without a branch.
    fn checkout_detached(&self, oid: &str) -> Result<(), VcsError>;

    /// Create `name` at HEAD and switch to it.
    fn create_branch(&self, name: &BranchName) -> Result<(), VcsError>;

    /// Delete a local branch. Without `force` unmerged branches are refused.
    fn delete_branch(&self, name: &BranchName, force: bool) -> Result<(), VcsError>;

    /// Stage every change in the working tree, including new files.
    fn stage_all(&self) -> Result<(), VcsError>;

    fn commit(&self, message: &str) -> Result<(), VcsError>;

    /// Fold staged changes into the last commit. Without `message` the
    /// existing message is kept.
    fn amend_commit(&self, message: Option<&str>) -> Result<(), VcsError>;

    /// Undo the last commit, leaving its changes unstaged in the working tree.
    fn reset_last_commit(&self) -> Result<(), VcsError>;

    fn fetch(&self, remote: &str) -> Result<(), VcsError>;

    /// Fast-forward the checked-out `branch` from `remote`. Diverged
    /// history is an error; nothing is merged.
    fn fast_forward_pull(&self, remote: &str, branch: &BranchName) -> Result<(), VcsError>;

    /// Rebase the checked-out branch onto `onto`.
    fn rebase(&self, onto: &BranchName) -> Result<RebaseOutcome, VcsError>;

    fn rebase_abort(&self) -> Result<(), VcsError>;

    fn rebase_continue(&self) -> Result<RebaseOutcome, VcsError>;

    fn rebase_in_progress(&self) -> Result<bool, VcsError>;

    /// Push `branch` to `remote` and set upstream tracking.
    fn push(&self, remote: &str, branch: &BranchName, force_with_lease: bool)
        -> Result<(), VcsError>;
}
