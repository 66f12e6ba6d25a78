//! engine::lifecycle
//!
//! Single-branch transitions: `create`, `pop`, `modify`.
//!
//! Each one checks its preconditions before touching the repository, so a
//! refused operation leaves both the working copy and the state file as they
//! were.

use thiserror::Error;

use super::{remove_managed, ErrorCategory, StackOptions};
use crate::core::naming::slugify;
use crate::core::stack::StackError;
use crate::core::state::{StateError, StateStore};
use crate::core::types::{BranchName, Head, TypeError};
use crate::git::{RemoteLookup, Vcs, VcsError};

/// Errors from lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("new branches are created from trunk '{trunk}', but HEAD is on {current}")]
    NotOnTrunk { trunk: BranchName, current: Head },

    #[error("cannot pop trunk '{0}'")]
    PopOnTrunk(BranchName),

    #[error("cannot modify trunk '{0}'; create a branch first")]
    ModifyOnTrunk(BranchName),

    #[error("HEAD is detached at {0}; check out a branch first")]
    DetachedHead(String),

    #[error("a branch name or a commit message (-m) is required")]
    MissingName,

    #[error(transparent)]
    InvalidBranchName(#[from] TypeError),

    #[error("branch '{name}' already exists {location}")]
    BranchAlreadyExists {
        name: BranchName,
        location: &'static str,
    },

    #[error("could not check whether '{name}' exists on the remote")]
    RemoteQuery {
        name: BranchName,
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

impl LifecycleError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LifecycleError::NotOnTrunk { .. }
            | LifecycleError::PopOnTrunk(_)
            | LifecycleError::ModifyOnTrunk(_)
            | LifecycleError::DetachedHead(_)
            | LifecycleError::MissingName
            | LifecycleError::InvalidBranchName(_) => ErrorCategory::Precondition,
            LifecycleError::BranchAlreadyExists { .. } | LifecycleError::Stack(_) => {
                ErrorCategory::Conflict
            }
            LifecycleError::RemoteQuery { .. } | LifecycleError::Vcs(_) => {
                ErrorCategory::ExternalToolFailure
            }
            LifecycleError::State(_) => ErrorCategory::StateIntegrity,
        }
    }
}

/// Input to [`create`].
#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    /// Explicit branch name; derived from `message` when absent.
    pub name: Option<String>,
    /// Commit message; defaults to the branch name.
    pub message: Option<String>,
    /// Stage every working-tree change before committing.
    pub stage_all: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOutcome {
    pub branch: BranchName,
    pub parent: BranchName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopOutcome {
    pub branch: BranchName,
    /// Where HEAD was moved.
    pub parent: BranchName,
}

/// Input to [`modify`].
#[derive(Debug, Clone, Default)]
pub struct ModifyRequest {
    pub stage_all: bool,
    /// Replace the commit message (and the branch description).
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyOutcome {
    pub branch: BranchName,
    /// The branch is already on the remote, so the amend needs a force push.
    pub on_remote: bool,
}

fn current_branch<V: Vcs + ?Sized>(vcs: &V) -> Result<BranchName, LifecycleError> {
    match vcs.head()? {
        Head::Branch(branch) => Ok(branch),
        Head::Detached { oid } => Err(LifecycleError::DetachedHead(oid)),
    }
}

/// Branch name and commit message for a create request.
fn resolve_name(request: &CreateRequest) -> Result<(BranchName, String), LifecycleError> {
    let message = request
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());

    match (request.name.as_deref(), message) {
        (Some(name), message) => {
            let branch = BranchName::new(name.trim())?;
            let message = message.unwrap_or(branch.as_str()).to_string();
            Ok((branch, message))
        }
        (None, Some(message)) => Ok((BranchName::new(slugify(message))?, message.to_string())),
        (None, None) => Err(LifecycleError::MissingName),
    }
}

/// Cut a new branch from trunk and commit to it.
///
/// The new branch is recorded with trunk as parent and the commit message as
/// description. If the commit fails the branch is deleted and trunk checked
/// out again.
pub fn create<V: Vcs + ?Sized>(
    vcs: &V,
    store: &StateStore,
    options: &StackOptions,
    request: &CreateRequest,
) -> Result<CreateOutcome, LifecycleError> {
    let mut model = store.load()?;
    let trunk = model.trunk().clone();

    match vcs.head()? {
        Head::Branch(ref current) if current == &trunk => {}
        current => return Err(LifecycleError::NotOnTrunk { trunk, current }),
    }

    let (branch, message) = resolve_name(request)?;

    if vcs.branch_exists_locally(&branch)? {
        return Err(LifecycleError::BranchAlreadyExists {
            name: branch,
            location: "locally",
        });
    }
    match vcs.branch_exists_on_remote(&options.remote, &branch) {
        Ok(RemoteLookup::Present) => {
            return Err(LifecycleError::BranchAlreadyExists {
                name: branch,
                location: "on the remote",
            })
        }
        Ok(RemoteLookup::Absent) | Ok(RemoteLookup::NotConfigured) => {}
        Err(source) => return Err(LifecycleError::RemoteQuery { name: branch, source }),
    }

    if request.stage_all {
        vcs.stage_all()?;
    }
    vcs.create_branch(&branch)?;

    if let Err(e) = vcs.commit(&message) {
        tracing::debug!(%branch, "commit failed, rolling back branch");
        if let Err(undo) = vcs.checkout(&trunk).and_then(|_| vcs.delete_branch(&branch, true)) {
            tracing::warn!(%branch, error = %undo, "could not remove branch after failed commit");
        }
        return Err(e.into());
    }

    model.add_managed(branch.clone(), trunk.clone(), message)?;
    store.save(&model)?;
    tracing::info!(%branch, parent = %trunk, "created");

    Ok(CreateOutcome {
        branch,
        parent: trunk,
    })
}

/// Undo the current branch: uncommit its last change, move to its parent
/// carrying that change, and delete the branch.
pub fn pop<V: Vcs + ?Sized>(
    vcs: &V,
    store: &StateStore,
    options: &StackOptions,
) -> Result<PopOutcome, LifecycleError> {
    let mut model = store.load()?;
    let branch = current_branch(vcs)?;
    if model.is_trunk(&branch) {
        return Err(LifecycleError::PopOnTrunk(branch));
    }

    let recorded = model.resolve_parent(&branch).clone();
    let parent = if model.is_trunk(&recorded) || vcs.branch_exists_locally(&recorded)? {
        recorded
    } else {
        tracing::warn!(%branch, parent = %recorded, "recorded parent is gone, using trunk");
        model.trunk().clone()
    };

    vcs.reset_last_commit()?;
    vcs.checkout(&parent)?;
    vcs.delete_branch(&branch, true)?;

    remove_managed(&mut model, &branch, options.removal)?;
    store.save(&model)?;
    tracing::info!(%branch, %parent, "popped");

    Ok(PopOutcome { branch, parent })
}

/// Amend the last commit on the current branch.
///
/// A new message also replaces the branch's recorded description.
pub fn modify<V: Vcs + ?Sized>(
    vcs: &V,
    store: &StateStore,
    options: &StackOptions,
    request: &ModifyRequest,
) -> Result<ModifyOutcome, LifecycleError> {
    let mut model = store.load()?;
    let branch = current_branch(vcs)?;
    if model.is_trunk(&branch) {
        return Err(LifecycleError::ModifyOnTrunk(branch));
    }

    if request.stage_all {
        vcs.stage_all()?;
    }

    let on_remote = match vcs.branch_exists_on_remote(&options.remote, &branch) {
        Ok(lookup) => lookup == RemoteLookup::Present,
        Err(e) => {
            tracing::debug!(%branch, error = %e, "remote lookup failed");
            false
        }
    };

    let message = request
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());
    vcs.amend_commit(message)?;

    if let Some(message) = message {
        if model.is_managed(&branch) {
            model.set_description(&branch, message)?;
            store.save(&model)?;
        }
    }
    tracing::info!(%branch, on_remote, "amended");

    Ok(ModifyOutcome { branch, on_remote })
}
