//! git::mock
//!
//! In-memory [`Vcs`] for deterministic testing.
//!
//! # Model
//!
//! Every branch is a linear list of commit ids, oldest first. Commits carry a
//! message, the files they touched, and a patch id shared by all rewrites of
//! the same change, so a rebase skips changes the target already contains
//! (as git does). An optional remote holds its own branch lists.
//!
//! The working tree is two lists of file names: unstaged and staged.
//!
//! # Example
//!
//! ```
//! use gtstack::git::mock::MockVcs;
//! use gtstack::git::Vcs;
//! use gtstack::core::types::{BranchName, Head};
//!
//! let main = BranchName::new("main").unwrap();
//! let vcs = MockVcs::new(&main).with_remote("origin");
//!
//! vcs.write_file("a.txt");
//! vcs.stage_all().unwrap();
//! vcs.commit("add a").unwrap();
//!
//! assert_eq!(vcs.head().unwrap(), Head::Branch(main.clone()));
//! assert_eq!(vcs.history(&main).unwrap().len(), 2);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use super::interface::{RebaseOutcome, RemoteLookup, Vcs, VcsError, VcsOp};
use crate::core::types::{BranchName, Head};

/// Mock repository.
///
/// Thread-safe via internal `Arc<Mutex<...>>`; clones share state.
#[derive(Debug, Clone)]
pub struct MockVcs {
    inner: Arc<Mutex<MockVcsInner>>,
}

#[derive(Debug, Clone)]
struct MockCommit {
    message: String,
    files: Vec<String>,
    patch_id: String,
}

#[derive(Debug)]
struct MockVcsInner {
    head: Head,
    local: BTreeMap<BranchName, Vec<String>>,
    remote_name: Option<String>,
    remote: BTreeMap<BranchName, Vec<String>>,
    commits: HashMap<String, MockCommit>,
    next_commit: u64,
    unstaged: Vec<String>,
    staged: Vec<String>,
    /// Branch being rebased and its target.
    rebasing: Option<(BranchName, BranchName)>,
    conflicts: BTreeSet<BranchName>,
    failing_remote_queries: BTreeSet<BranchName>,
    fail_on: Vec<FailOn>,
    operations: Vec<MockOperation>,
}

/// Failure injection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailOn {
    pub op: VcsOp,
    /// Only fail when the call concerns this branch.
    pub branch: Option<BranchName>,
}

/// Recorded call for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    Head,
    ListBranches,
    BranchExistsLocally(BranchName),
    BranchExistsOnRemote { remote: String, branch: BranchName },
    Checkout(String),
    CreateBranch(BranchName),
    DeleteBranch { branch: BranchName, force: bool },
    StageAll,
    Commit(String),
    Amend(Option<String>),
    Reset,
    Fetch(String),
    Pull { remote: String, branch: BranchName },
    Rebase { branch: BranchName, onto: BranchName },
    RebaseAbort,
    RebaseContinue,
    RebaseInProgress,
    Push { remote: String, branch: BranchName, force_with_lease: bool },
}

impl MockVcs {
    /// Repository with `trunk` checked out holding one root commit.
    pub fn new(trunk: &BranchName) -> Self {
        let mut inner = MockVcsInner {
            head: Head::Branch(trunk.clone()),
            local: BTreeMap::new(),
            remote_name: None,
            remote: BTreeMap::new(),
            commits: HashMap::new(),
            next_commit: 1,
            unstaged: Vec::new(),
            staged: Vec::new(),
            rebasing: None,
            conflicts: BTreeSet::new(),
            failing_remote_queries: BTreeSet::new(),
            fail_on: Vec::new(),
            operations: Vec::new(),
        };
        let root = inner.new_commit("initial commit", Vec::new(), None);
        inner.local.insert(trunk.clone(), vec![root]);
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Configure a remote mirroring every current local branch.
    pub fn with_remote(self, name: &str) -> Self {
        {
            let mut inner = self.lock();
            inner.remote_name = Some(name.to_string());
            inner.remote = inner.local.clone();
        }
        self
    }

    /// Fail every call to `op`.
    pub fn fail_on(self, op: VcsOp) -> Self {
        self.lock().fail_on.push(FailOn { op, branch: None });
        self
    }

    /// Fail calls to `op` that concern `branch`.
    pub fn fail_on_branch(self, op: VcsOp, branch: &BranchName) -> Self {
        self.lock().fail_on.push(FailOn {
            op,
            branch: Some(branch.clone()),
        });
        self
    }

    pub fn clear_fail_on(&self) {
        self.lock().fail_on.clear();
    }

    /// Rebasing `branch` stops on a conflict until [`resolve_conflict`](Self::resolve_conflict).
    pub fn conflict_on_rebase(&self, branch: &BranchName) {
        self.lock().conflicts.insert(branch.clone());
    }

    pub fn resolve_conflict(&self, branch: &BranchName) {
        self.lock().conflicts.remove(branch);
    }

    /// Remote existence queries for `branch` fail as if the network dropped.
    pub fn fail_remote_query(&self, branch: &BranchName) {
        self.lock().failing_remote_queries.insert(branch.clone());
    }

    // =========================================================================
    // Scenario setup
    // =========================================================================

    /// Add an unstaged file change.
    pub fn write_file(&self, path: &str) {
        self.lock().unstaged.push(path.to_string());
    }

    /// Create `name` from `from` with one commit, without moving HEAD.
    pub fn add_branch(&self, name: &BranchName, from: &BranchName, message: &str) -> String {
        let mut inner = self.lock();
        let mut history = inner.local.get(from).cloned().unwrap_or_default();
        let id = inner.new_commit(message, vec![format!("{}.txt", name)], None);
        history.push(id.clone());
        inner.local.insert(name.clone(), history);
        id
    }

    /// Append a commit to a local branch without moving HEAD.
    pub fn commit_on(&self, branch: &BranchName, message: &str) -> String {
        let mut inner = self.lock();
        let id = inner.new_commit(message, vec![format!("{}.txt", message)], None);
        inner.local.entry(branch.clone()).or_default().push(id.clone());
        id
    }

    /// Append a commit to a remote branch (someone else pushed).
    pub fn commit_on_remote(&self, branch: &BranchName, message: &str) -> String {
        let mut inner = self.lock();
        let id = inner.new_commit(message, vec![format!("{}.txt", message)], None);
        inner.remote.entry(branch.clone()).or_default().push(id.clone());
        id
    }

    /// Copy a local branch to the remote.
    pub fn publish(&self, branch: &BranchName) {
        let mut inner = self.lock();
        if let Some(history) = inner.local.get(branch).cloned() {
            inner.remote.insert(branch.clone(), history);
        }
    }

    /// Drop a branch from the remote (merged and deleted upstream).
    pub fn delete_remote_branch(&self, branch: &BranchName) {
        self.lock().remote.remove(branch);
    }

    pub fn detach_head(&self) {
        let mut inner = self.lock();
        let oid = inner.head_tip().unwrap_or_default();
        inner.head = Head::Detached { oid };
    }

    /// Put the repository mid-rebase on the current branch.
    pub fn start_rebase(&self, onto: &BranchName) {
        let mut inner = self.lock();
        if let Head::Branch(b) = inner.head.clone() {
            inner.rebasing = Some((b, onto.clone()));
        }
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    pub fn clear_operations(&self) {
        self.lock().operations.clear();
    }

    /// Commit ids of a local branch, oldest first.
    pub fn history(&self, branch: &BranchName) -> Option<Vec<String>> {
        self.lock().local.get(branch).cloned()
    }

    pub fn remote_history(&self, branch: &BranchName) -> Option<Vec<String>> {
        self.lock().remote.get(branch).cloned()
    }

    pub fn tip(&self, branch: &BranchName) -> Option<String> {
        self.history(branch).and_then(|h| h.last().cloned())
    }

    /// Messages of a local branch's commits, oldest first.
    pub fn messages(&self, branch: &BranchName) -> Vec<String> {
        let inner = self.lock();
        inner
            .local
            .get(branch)
            .map(|h| h.iter().map(|id| inner.commits[id].message.clone()).collect())
            .unwrap_or_default()
    }

    /// Whether `branch` contains every commit of `base` (base is an ancestor).
    pub fn contains(&self, branch: &BranchName, base: &BranchName) -> bool {
        let inner = self.lock();
        match (inner.local.get(branch), inner.local.get(base)) {
            (Some(b), Some(base)) => b.starts_with(base),
            _ => false,
        }
    }

    pub fn unstaged(&self) -> Vec<String> {
        self.lock().unstaged.clone()
    }

    pub fn staged(&self) -> Vec<String> {
        self.lock().staged.clone()
    }

    pub fn has_local(&self, branch: &BranchName) -> bool {
        self.lock().local.contains_key(branch)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockVcsInner> {
        self.inner.lock().unwrap()
    }

    /// Record the call, then apply any matching injected failure.
    fn enter(
        &self,
        op: VcsOp,
        branch: Option<&BranchName>,
        record: MockOperation,
    ) -> Result<std::sync::MutexGuard<'_, MockVcsInner>, VcsError> {
        let mut inner = self.lock();
        inner.operations.push(record);
        let hit = inner
            .fail_on
            .iter()
            .any(|f| f.op == op && (f.branch.is_none() || f.branch.as_ref() == branch));
        if hit {
            return Err(failure(op, branch, "injected failure"));
        }
        Ok(inner)
    }
}

fn failure(op: VcsOp, branch: Option<&BranchName>, output: &str) -> VcsError {
    VcsError::CommandFailed {
        op,
        branch: branch.cloned(),
        output: output.to_string(),
    }
}

impl MockVcsInner {
    fn new_commit(&mut self, message: &str, files: Vec<String>, patch_id: Option<String>) -> String {
        let id = format!("c{}", self.next_commit);
        self.next_commit += 1;
        let patch_id = patch_id.unwrap_or_else(|| id.clone());
        self.commits.insert(
            id.clone(),
            MockCommit {
                message: message.to_string(),
                files,
                patch_id,
            },
        );
        id
    }

    fn current_branch(&self, op: VcsOp) -> Result<BranchName, VcsError> {
        self.head
            .branch()
            .cloned()
            .ok_or_else(|| failure(op, None, "fatal: not on a branch (HEAD detached)"))
    }

    fn head_tip(&self) -> Option<String> {
        match &self.head {
            Head::Branch(b) => self.local.get(b).and_then(|h| h.last().cloned()),
            Head::Detached { oid } => Some(oid.clone()),
        }
    }

    fn head_history(&self) -> Vec<String> {
        match &self.head {
            Head::Branch(b) => self.local.get(b).cloned().unwrap_or_default(),
            Head::Detached { oid } => self
                .local
                .values()
                .find_map(|h| h.iter().position(|c| c == oid).map(|i| h[..=i].to_vec()))
                .unwrap_or_default(),
        }
    }

    /// Replay `branch` on top of `onto`, skipping changes `onto` already has.
    fn replay(&mut self, branch: &BranchName, onto: &BranchName) {
        let source = self.local.get(branch).cloned().unwrap_or_default();
        let target = self.local.get(onto).cloned().unwrap_or_default();
        if source.starts_with(&target) {
            return;
        }

        let base = source
            .iter()
            .zip(target.iter())
            .take_while(|(a, b)| a == b)
            .count();
        let present: BTreeSet<String> = target
            .iter()
            .map(|id| self.commits[id].patch_id.clone())
            .collect();

        let mut rebuilt = target;
        for id in &source[base..] {
            let commit = self.commits[id].clone();
            if present.contains(&commit.patch_id) {
                continue;
            }
            let new_id = self.new_commit(&commit.message, commit.files, Some(commit.patch_id));
            rebuilt.push(new_id);
        }
        self.local.insert(branch.clone(), rebuilt);
    }

    fn dirty(&self) -> bool {
        !self.unstaged.is_empty() || !self.staged.is_empty()
    }
}

impl Vcs for MockVcs {
    fn head(&self) -> Result<Head, VcsError> {
        let inner = self.enter(VcsOp::Head, None, MockOperation::Head)?;
        Ok(inner.head.clone())
    }

    fn list_local_branches(&self) -> Result<Vec<BranchName>, VcsError> {
        let inner = self.enter(VcsOp::ListBranches, None, MockOperation::ListBranches)?;
        Ok(inner.local.keys().cloned().collect())
    }

    fn branch_exists_locally(&self, name: &BranchName) -> Result<bool, VcsError> {
        let inner = self.enter(
            VcsOp::ListBranches,
            Some(name),
            MockOperation::BranchExistsLocally(name.clone()),
        )?;
        Ok(inner.local.contains_key(name))
    }

    fn branch_exists_on_remote(
        &self,
        remote: &str,
        name: &BranchName,
    ) -> Result<RemoteLookup, VcsError> {
        let inner = self.enter(
            VcsOp::RemoteQuery,
            Some(name),
            MockOperation::BranchExistsOnRemote {
                remote: remote.to_string(),
                branch: name.clone(),
            },
        )?;
        if inner.remote_name.as_deref() != Some(remote) {
            return Ok(RemoteLookup::NotConfigured);
        }
        if inner.failing_remote_queries.contains(name) {
            return Err(failure(
                VcsOp::RemoteQuery,
                Some(name),
                "fatal: unable to access remote: Could not resolve host",
            ));
        }
        Ok(if inner.remote.contains_key(name) {
            RemoteLookup::Present
        } else {
            RemoteLookup::Absent
        })
    }

    fn checkout(&self, name: &BranchName) -> Result<(), VcsError> {
        let mut inner = self.enter(
            VcsOp::Checkout,
            Some(name),
            MockOperation::Checkout(name.to_string()),
        )?;
        if inner.rebasing.is_some() {
            return Err(failure(
                VcsOp::Checkout,
                Some(name),
                "error: you need to resolve your current index first",
            ));
        }
        if !inner.local.contains_key(name) {
            return Err(failure(
                VcsOp::Checkout,
                Some(name),
                &format!("error: pathspec '{}' did not match any file(s) known to git", name),
            ));
        }
        inner.head = Head::Branch(name.clone());
        Ok(())
    }

    fn checkout_detached(&self, oid: &str) -> Result<(), VcsError> {
        let mut inner = self.enter(
            VcsOp::Checkout,
            None,
            MockOperation::Checkout(oid.to_string()),
        )?;
        if !inner.commits.contains_key(oid) {
            return Err(failure(
                VcsOp::Checkout,
                None,
                &format!("fatal: reference is not a tree: {}", oid),
            ));
        }
        inner.head = Head::Detached {
            oid: oid.to_string(),
        };
        Ok(())
    }

    fn create_branch(&self, name: &BranchName) -> Result<(), VcsError> {
        let mut inner = self.enter(
            VcsOp::CreateBranch,
            Some(name),
            MockOperation::CreateBranch(name.clone()),
        )?;
        if inner.local.contains_key(name) {
            return Err(failure(
                VcsOp::CreateBranch,
                Some(name),
                &format!("fatal: a branch named '{}' already exists", name),
            ));
        }
        let history = inner.head_history();
        inner.local.insert(name.clone(), history);
        inner.head = Head::Branch(name.clone());
        Ok(())
    }

    fn delete_branch(&self, name: &BranchName, force: bool) -> Result<(), VcsError> {
        let mut inner = self.enter(
            VcsOp::DeleteBranch,
            Some(name),
            MockOperation::DeleteBranch {
                branch: name.clone(),
                force,
            },
        )?;
        if inner.head.branch() == Some(name) {
            return Err(failure(
                VcsOp::DeleteBranch,
                Some(name),
                &format!("error: cannot delete branch '{}' checked out", name),
            ));
        }
        let Some(history) = inner.local.get(name).cloned() else {
            return Err(failure(
                VcsOp::DeleteBranch,
                Some(name),
                &format!("error: branch '{}' not found", name),
            ));
        };
        if !force {
            let head_history = inner.head_history();
            let merged = history.iter().all(|c| head_history.contains(c));
            if !merged {
                return Err(failure(
                    VcsOp::DeleteBranch,
                    Some(name),
                    &format!("error: the branch '{}' is not fully merged", name),
                ));
            }
        }
        inner.local.remove(name);
        Ok(())
    }

    fn stage_all(&self) -> Result<(), VcsError> {
        let mut inner = self.enter(VcsOp::StageAll, None, MockOperation::StageAll)?;
        let files = std::mem::take(&mut inner.unstaged);
        inner.staged.extend(files);
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<(), VcsError> {
        let mut inner = self.enter(
            VcsOp::Commit,
            None,
            MockOperation::Commit(message.to_string()),
        )?;
        let branch = inner.current_branch(VcsOp::Commit)?;
        if inner.staged.is_empty() {
            return Err(failure(
                VcsOp::Commit,
                None,
                "nothing added to commit but untracked files present",
            ));
        }
        let files = std::mem::take(&mut inner.staged);
        let id = inner.new_commit(message, files, None);
        inner.local.entry(branch).or_default().push(id);
        Ok(())
    }

    fn amend_commit(&self, message: Option<&str>) -> Result<(), VcsError> {
        let mut inner = self.enter(
            VcsOp::Amend,
            None,
            MockOperation::Amend(message.map(str::to_string)),
        )?;
        let branch = inner.current_branch(VcsOp::Amend)?;
        let Some(last) = inner.local.get(&branch).and_then(|h| h.last().cloned()) else {
            return Err(failure(VcsOp::Amend, None, "fatal: nothing to amend"));
        };
        let mut commit = inner.commits[&last].clone();
        commit.files.extend(std::mem::take(&mut inner.staged));
        let message = message.unwrap_or(&commit.message).to_string();
        let id = inner.new_commit(&message, commit.files, None);
        if let Some(history) = inner.local.get_mut(&branch) {
            history.pop();
            history.push(id);
        }
        Ok(())
    }

    fn reset_last_commit(&self) -> Result<(), VcsError> {
        let mut inner = self.enter(VcsOp::Reset, None, MockOperation::Reset)?;
        let branch = inner.current_branch(VcsOp::Reset)?;
        let history = inner.local.get(&branch).cloned().unwrap_or_default();
        if history.len() < 2 {
            return Err(failure(
                VcsOp::Reset,
                Some(&branch),
                "fatal: ambiguous argument 'HEAD~1': unknown revision",
            ));
        }
        let last = &history[history.len() - 1];
        let files = inner.commits[last].files.clone();
        inner.unstaged.extend(files);
        if let Some(history) = inner.local.get_mut(&branch) {
            history.pop();
        }
        Ok(())
    }

    fn fetch(&self, remote: &str) -> Result<(), VcsError> {
        let inner = self.enter(
            VcsOp::Fetch,
            None,
            MockOperation::Fetch(remote.to_string()),
        )?;
        if inner.remote_name.as_deref() != Some(remote) {
            return Err(failure(
                VcsOp::Fetch,
                None,
                &format!("fatal: '{}' does not appear to be a git repository", remote),
            ));
        }
        Ok(())
    }

    fn fast_forward_pull(&self, remote: &str, branch: &BranchName) -> Result<(), VcsError> {
        let mut inner = self.enter(
            VcsOp::Pull,
            Some(branch),
            MockOperation::Pull {
                remote: remote.to_string(),
                branch: branch.clone(),
            },
        )?;
        if inner.remote_name.as_deref() != Some(remote) {
            return Err(failure(
                VcsOp::Pull,
                Some(branch),
                &format!("fatal: '{}' does not appear to be a git repository", remote),
            ));
        }
        let Some(upstream) = inner.remote.get(branch).cloned() else {
            return Err(failure(
                VcsOp::Pull,
                Some(branch),
                &format!("fatal: couldn't find remote ref {}", branch),
            ));
        };
        let local = inner.local.get(branch).cloned().unwrap_or_default();
        if upstream.starts_with(&local) {
            inner.local.insert(branch.clone(), upstream);
            Ok(())
        } else if local.starts_with(&upstream) {
            Ok(())
        } else {
            Err(failure(
                VcsOp::Pull,
                Some(branch),
                "fatal: Not possible to fast-forward, aborting.",
            ))
        }
    }

    fn rebase(&self, onto: &BranchName) -> Result<RebaseOutcome, VcsError> {
        let mut inner = self.lock();
        let current = inner.head.branch().cloned();
        inner.operations.push(MockOperation::Rebase {
            branch: current.clone().unwrap_or_else(|| onto.clone()),
            onto: onto.clone(),
        });
        let hit = inner.fail_on.iter().any(|f| {
            f.op == VcsOp::Rebase && (f.branch.is_none() || f.branch.as_ref() == current.as_ref())
        });
        if hit {
            return Err(failure(VcsOp::Rebase, current.as_ref(), "injected failure"));
        }

        let branch = inner.current_branch(VcsOp::Rebase)?;
        if inner.dirty() {
            return Err(failure(
                VcsOp::Rebase,
                Some(&branch),
                "error: cannot rebase: You have unstaged changes.",
            ));
        }
        if !inner.local.contains_key(onto) {
            return Err(failure(
                VcsOp::Rebase,
                Some(&branch),
                &format!("fatal: invalid upstream '{}'", onto),
            ));
        }
        if inner.conflicts.contains(&branch) {
            let output = format!(
                "CONFLICT (content): Merge conflict in {}.txt\n\
                 error: could not apply commit on {}",
                branch, branch
            );
            inner.rebasing = Some((branch, onto.clone()));
            return Ok(RebaseOutcome::Conflict { output });
        }
        inner.replay(&branch, onto);
        Ok(RebaseOutcome::Success)
    }

    fn rebase_abort(&self) -> Result<(), VcsError> {
        let mut inner = self.enter(VcsOp::RebaseAbort, None, MockOperation::RebaseAbort)?;
        if inner.rebasing.take().is_none() {
            return Err(failure(
                VcsOp::RebaseAbort,
                None,
                "fatal: No rebase in progress?",
            ));
        }
        Ok(())
    }

    fn rebase_continue(&self) -> Result<RebaseOutcome, VcsError> {
        let mut inner = self.enter(VcsOp::RebaseContinue, None, MockOperation::RebaseContinue)?;
        let Some((branch, onto)) = inner.rebasing.clone() else {
            return Err(failure(
                VcsOp::RebaseContinue,
                None,
                "fatal: No rebase in progress?",
            ));
        };
        if inner.conflicts.contains(&branch) {
            return Ok(RebaseOutcome::Conflict {
                output: format!("{}.txt: needs merge", branch),
            });
        }
        inner.rebasing = None;
        inner.replay(&branch, &onto);
        Ok(RebaseOutcome::Success)
    }

    fn rebase_in_progress(&self) -> Result<bool, VcsError> {
        let inner = self.enter(VcsOp::Head, None, MockOperation::RebaseInProgress)?;
        Ok(inner.rebasing.is_some())
    }

    fn push(
        &self,
        remote: &str,
        branch: &BranchName,
        force_with_lease: bool,
    ) -> Result<(), VcsError> {
        let mut inner = self.enter(
            VcsOp::Push,
            Some(branch),
            MockOperation::Push {
                remote: remote.to_string(),
                branch: branch.clone(),
                force_with_lease,
            },
        )?;
        if inner.remote_name.as_deref() != Some(remote) {
            return Err(failure(
                VcsOp::Push,
                Some(branch),
                &format!("fatal: '{}' does not appear to be a git repository", remote),
            ));
        }
        let Some(local) = inner.local.get(branch).cloned() else {
            return Err(failure(
                VcsOp::Push,
                Some(branch),
                &format!("error: src refspec {} does not match any", branch),
            ));
        };
        if let Some(upstream) = inner.remote.get(branch) {
            if !force_with_lease && !local.starts_with(upstream) {
                return Err(failure(
                    VcsOp::Push,
                    Some(branch),
                    " ! [rejected]        (non-fast-forward)",
                ));
            }
        }
        inner.remote.insert(branch.clone(), local);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(name: &str) -> BranchName {
        BranchName::new(name).unwrap()
    }

    #[test]
    fn create_commit_and_reset() {
        let vcs = MockVcs::new(&b("main"));
        vcs.create_branch(&b("feature")).unwrap();
        vcs.write_file("x.rs");
        vcs.stage_all().unwrap();
        vcs.commit("add x").unwrap();

        assert_eq!(vcs.messages(&b("feature")), vec!["initial commit", "add x"]);

        vcs.reset_last_commit().unwrap();
        assert_eq!(vcs.history(&b("feature")), vcs.history(&b("main")));
        assert_eq!(vcs.unstaged(), vec!["x.rs".to_string()]);
    }

    #[test]
    fn commit_without_staged_changes_fails() {
        let vcs = MockVcs::new(&b("main"));
        assert!(vcs.commit("empty").is_err());
    }

    #[test]
    fn rebase_moves_branch_onto_target() {
        let vcs = MockVcs::new(&b("main"));
        vcs.add_branch(&b("feature"), &b("main"), "feature work");
        vcs.commit_on(&b("main"), "trunk moved");

        vcs.checkout(&b("feature")).unwrap();
        assert_eq!(vcs.rebase(&b("main")).unwrap(), RebaseOutcome::Success);

        assert!(vcs.contains(&b("feature"), &b("main")));
        assert_eq!(
            vcs.messages(&b("feature")),
            vec!["initial commit", "trunk moved", "feature work"]
        );
    }

    #[test]
    fn rebase_skips_changes_already_on_target() {
        let vcs = MockVcs::new(&b("main"));
        vcs.add_branch(&b("a"), &b("main"), "a work");
        vcs.add_branch(&b("b"), &b("a"), "b work");
        vcs.commit_on(&b("main"), "trunk moved");

        vcs.checkout(&b("a")).unwrap();
        vcs.rebase(&b("main")).unwrap();
        vcs.checkout(&b("b")).unwrap();
        vcs.rebase(&b("a")).unwrap();

        assert_eq!(
            vcs.messages(&b("b")),
            vec!["initial commit", "trunk moved", "a work", "b work"]
        );
        assert!(vcs.contains(&b("b"), &b("a")));
    }

    #[test]
    fn conflict_leaves_rebase_in_progress_until_abort() {
        let vcs = MockVcs::new(&b("main"));
        vcs.add_branch(&b("feature"), &b("main"), "work");
        vcs.commit_on(&b("main"), "trunk moved");
        vcs.conflict_on_rebase(&b("feature"));

        vcs.checkout(&b("feature")).unwrap();
        let outcome = vcs.rebase(&b("main")).unwrap();
        assert!(matches!(outcome, RebaseOutcome::Conflict { .. }));
        assert!(vcs.rebase_in_progress().unwrap());
        assert!(vcs.checkout(&b("main")).is_err());

        vcs.rebase_abort().unwrap();
        assert!(!vcs.rebase_in_progress().unwrap());
        assert!(!vcs.contains(&b("feature"), &b("main")));
    }

    #[test]
    fn pull_refuses_diverged_history() {
        let vcs = MockVcs::new(&b("main")).with_remote("origin");
        vcs.commit_on(&b("main"), "local only");
        vcs.commit_on_remote(&b("main"), "remote only");
        let before = vcs.history(&b("main"));

        assert!(vcs.fast_forward_pull("origin", &b("main")).is_err());
        assert_eq!(vcs.history(&b("main")), before);
    }

    #[test]
    fn remote_lookup_states() {
        let vcs = MockVcs::new(&b("main"));
        assert_eq!(
            vcs.branch_exists_on_remote("origin", &b("main")).unwrap(),
            RemoteLookup::NotConfigured
        );

        let vcs = vcs.with_remote("origin");
        assert_eq!(
            vcs.branch_exists_on_remote("origin", &b("main")).unwrap(),
            RemoteLookup::Present
        );
        assert_eq!(
            vcs.branch_exists_on_remote("origin", &b("other")).unwrap(),
            RemoteLookup::Absent
        );

        vcs.fail_remote_query(&b("main"));
        assert!(vcs.branch_exists_on_remote("origin", &b("main")).is_err());
    }

    #[test]
    fn safe_delete_refuses_unmerged() {
        let vcs = MockVcs::new(&b("main"));
        vcs.add_branch(&b("feature"), &b("main"), "work");

        assert!(vcs.delete_branch(&b("feature"), false).is_err());
        vcs.delete_branch(&b("feature"), true).unwrap();
        assert!(!vcs.has_local(&b("feature")));
    }

    #[test]
    fn injected_failure_is_recorded() {
        let vcs = MockVcs::new(&b("main"))
            .with_remote("origin")
            .fail_on(VcsOp::Fetch);
        let err = vcs.fetch("origin").unwrap_err();
        assert_eq!(err.output(), Some("injected failure"));
        assert_eq!(
            vcs.operations(),
            vec![MockOperation::Fetch("origin".to_string())]
        );
    }
}
