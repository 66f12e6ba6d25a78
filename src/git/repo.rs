//! git::repo
//!
//! [`Vcs`] backed by a real repository.
//!
//! Reads (HEAD, branch existence, rebase state) go through `git2`. Mutations
//! run the `git` binary so hooks, config and credential helpers behave
//! exactly as they do for the user's own commands.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::interface::{RebaseOutcome, RemoteLookup, Vcs, VcsError, VcsOp};
use crate::core::types::{BranchName, Head};

/// Printed by git when a remote name resolves to nothing usable.
const NO_SUCH_REMOTE: &str = "does not appear to be a git repository";

/// A non-bare repository and its working directory.
pub struct Git {
    repo: git2::Repository,
    workdir: PathBuf,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    /// Open the repository enclosing `path`.
    ///
    /// # Errors
    ///
    /// [`VcsError::NotARepo`] when no repository is found or it has no
    /// working directory.
    pub fn open(path: &Path) -> Result<Self, VcsError> {
        let not_a_repo = || VcsError::NotARepo {
            path: path.to_path_buf(),
        };
        let repo = git2::Repository::discover(path).map_err(|_| not_a_repo())?;
        let workdir = repo.workdir().ok_or_else(not_a_repo)?.to_path_buf();
        Ok(Self { repo, workdir })
    }

    /// Run git, returning combined stdout and stderr.
    fn run(
        &self,
        op: VcsOp,
        branch: Option<&BranchName>,
        args: &[&str],
    ) -> Result<String, VcsError> {
        tracing::debug!(?args, "git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .env("GIT_EDITOR", "true")
            .output()
            .map_err(VcsError::Spawn)?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            Ok(text)
        } else {
            tracing::debug!(?args, output = %text.trim_end(), "git failed");
            Err(VcsError::CommandFailed {
                op,
                branch: branch.cloned(),
                output: text,
            })
        }
    }

    /// Run a rebase step, mapping a stop-with-conflict to [`RebaseOutcome::Conflict`].
    fn run_rebase(&self, op: VcsOp, args: &[&str]) -> Result<RebaseOutcome, VcsError> {
        match self.run(op, None, args) {
            Ok(_) => Ok(RebaseOutcome::Success),
            Err(VcsError::CommandFailed { output, .. }) if self.rebase_in_progress()? => {
                Ok(RebaseOutcome::Conflict { output })
            }
            Err(e) => Err(e),
        }
    }
}

impl Vcs for Git {
    fn head(&self) -> Result<Head, VcsError> {
        match self.repo.head() {
            Ok(head) if head.is_branch() => {
                let name = head.shorthand().unwrap_or_default();
                let name = BranchName::new(name).map_err(|e| VcsError::Internal {
                    message: e.to_string(),
                })?;
                Ok(Head::Branch(name))
            }
            Ok(head) => {
                let oid = head.target().map(|o| o.to_string()).unwrap_or_default();
                Ok(Head::Detached { oid })
            }
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => {
                // Fresh repository: HEAD names a branch with no commits yet.
                let head = self.repo.find_reference("HEAD")?;
                let target = head.symbolic_target().unwrap_or_default();
                let name = target.strip_prefix("refs/heads/").unwrap_or(target);
                BranchName::new(name)
                    .map(Head::Branch)
                    .map_err(|e| VcsError::Internal {
                        message: e.to_string(),
                    })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn list_local_branches(&self) -> Result<Vec<BranchName>, VcsError> {
        let mut names = Vec::new();
        for entry in self.repo.branches(Some(git2::BranchType::Local))? {
            let (branch, _) = entry?;
            if let Some(name) = branch.name()? {
                if let Ok(name) = BranchName::new(name) {
                    names.push(name);
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn branch_exists_locally(&self, name: &BranchName) -> Result<bool, VcsError> {
        match self
            .repo
            .find_branch(name.as_str(), git2::BranchType::Local)
        {
            Ok(_) => Ok(true),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn branch_exists_on_remote(
        &self,
        remote: &str,
        name: &BranchName,
    ) -> Result<RemoteLookup, VcsError> {
        if self.repo.find_remote(remote).is_err() {
            return Ok(RemoteLookup::NotConfigured);
        }

        let refname = format!("refs/heads/{}", name);
        match self.run(
            VcsOp::RemoteQuery,
            Some(name),
            &["ls-remote", "--heads", remote, &refname],
        ) {
            Ok(out) if out.trim().is_empty() => Ok(RemoteLookup::Absent),
            Ok(_) => Ok(RemoteLookup::Present),
            Err(VcsError::CommandFailed { output, .. }) if output.contains(NO_SUCH_REMOTE) => {
                Ok(RemoteLookup::NotConfigured)
            }
            Err(e) => Err(e),
        }
    }

    fn checkout(&self, name: &BranchName) -> Result<(), VcsError> {
        self.run(VcsOp::Checkout, Some(name), &["checkout", name.as_str()])
            .map(drop)
    }

    fn checkout_detached(&self, oid: &str) -> Result<(), VcsError> {
        self.run(VcsOp::Checkout, None, &["checkout", "--detach", oid])
            .map(drop)
    }

    fn create_branch(&self, name: &BranchName) -> Result<(), VcsError> {
        self.run(
            VcsOp::CreateBranch,
            Some(name),
            &["checkout", "-b", name.as_str()],
        )
        .map(drop)
    }

    fn delete_branch(&self, name: &BranchName, force: bool) -> Result<(), VcsError> {
        let flag = if force { "-D" } else { "-d" };
        self.run(VcsOp::DeleteBranch, Some(name), &["branch", flag, name.as_str()])
            .map(drop)
    }

    fn stage_all(&self) -> Result<(), VcsError> {
        self.run(VcsOp::StageAll, None, &["add", "-A"]).map(drop)
    }

    fn commit(&self, message: &str) -> Result<(), VcsError> {
        self.run(VcsOp::Commit, None, &["commit", "-m", message])
            .map(drop)
    }

    fn amend_commit(&self, message: Option<&str>) -> Result<(), VcsError> {
        let args = match message {
            Some(message) => vec!["commit", "--amend", "-m", message],
            None => vec!["commit", "--amend", "--no-edit"],
        };
        self.run(VcsOp::Amend, None, &args).map(drop)
    }

    fn reset_last_commit(&self) -> Result<(), VcsError> {
        self.run(VcsOp::Reset, None, &["reset", "HEAD~1"]).map(drop)
    }

    fn fetch(&self, remote: &str) -> Result<(), VcsError> {
        self.run(VcsOp::Fetch, None, &["fetch", remote]).map(drop)
    }

    fn fast_forward_pull(&self, remote: &str, branch: &BranchName) -> Result<(), VcsError> {
        self.run(
            VcsOp::Pull,
            Some(branch),
            &["pull", "--ff-only", remote, branch.as_str()],
        )
        .map(drop)
    }

    fn rebase(&self, onto: &BranchName) -> Result<RebaseOutcome, VcsError> {
        self.run_rebase(VcsOp::Rebase, &["rebase", onto.as_str()])
    }

    fn rebase_abort(&self) -> Result<(), VcsError> {
        self.run(VcsOp::RebaseAbort, None, &["rebase", "--abort"])
            .map(drop)
    }

    fn rebase_continue(&self) -> Result<RebaseOutcome, VcsError> {
        self.run_rebase(VcsOp::RebaseContinue, &["rebase", "--continue"])
    }

    fn rebase_in_progress(&self) -> Result<bool, VcsError> {
        Ok(matches!(
            self.repo.state(),
            git2::RepositoryState::Rebase
                | git2::RepositoryState::RebaseInteractive
                | git2::RepositoryState::RebaseMerge
                | git2::RepositoryState::ApplyMailboxOrRebase
        ))
    }

    fn push(
        &self,
        remote: &str,
        branch: &BranchName,
        force_with_lease: bool,
    ) -> Result<(), VcsError> {
        let mut args = vec!["push"];
        if force_with_lease {
            args.push("--force-with-lease");
        }
        args.extend(["-u", remote, branch.as_str()]);
        self.run(VcsOp::Push, Some(branch), &args).map(drop)
    }
}
