//! engine::report
//!
//! What a sync or restack run did, branch by branch.

use std::fmt;

use crate::core::types::{BranchName, Head};

/// A branch whose reconciliation failed, with the tool's diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchFailure {
    pub branch: BranchName,
    pub diagnostic: String,
}

impl fmt::Display for BranchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.branch, self.diagnostic.trim_end())
    }
}

/// Where the working copy ended up.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FinalPosition {
    /// Back where the run started.
    Restored(Head),
    /// The starting branch no longer exists; trunk is checked out.
    FellBackToTrunk(BranchName),
    /// Neither the starting position nor trunk could be checked out (or
    /// the run stopped before touching the working copy).
    #[default]
    Unchanged,
}

/// Outcome of a sync or restack run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Deleted locally and removed from the stack.
    pub deleted: Vec<BranchName>,
    /// Rebased successfully (including no-op rebases).
    pub rebased: Vec<BranchName>,
    /// Rebase or deletion failed; the branch was left as it was.
    pub failed: Vec<BranchFailure>,
    /// Managed but absent locally, or blocked by a failed parent.
    pub skipped: Vec<BranchName>,
    /// Gone from the remote but kept by the operator (or by a
    /// non-interactive run).
    pub kept: Vec<BranchName>,
    /// Re-parented to trunk because their parent no longer exists.
    pub repaired: Vec<BranchName>,
    pub warnings: Vec<String>,
    pub position: FinalPosition,
}

impl SyncReport {
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!("{}", message);
        self.warnings.push(message);
    }

    pub fn fail(&mut self, branch: &BranchName, diagnostic: impl Into<String>) {
        let failure = BranchFailure {
            branch: branch.clone(),
            diagnostic: diagnostic.into(),
        };
        tracing::warn!(branch = %failure.branch, "reconciliation failed");
        self.failed.push(failure);
    }

    /// True when every branch was reconciled.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn has_failed(&self, branch: &BranchName) -> bool {
        self.failed.iter().any(|f| &f.branch == branch)
    }
}
