//! core::stack
//!
//! In-memory model of the branch stack.
//!
//! # Architecture
//!
//! The stack is a forest rooted at trunk:
//! - Nodes are managed branches
//! - Edges point from child to parent (stored as the `parent` field)
//! - Branches absent from the model are untracked and resolve to trunk
//!
//! # Invariants
//!
//! - The parent chain of every managed branch reaches trunk in at most
//!   `len() + 1` hops; no branch is its own ancestor
//! - Trunk is never itself a managed branch
//! - A parent named at insertion time is trunk or a managed branch
//!
//! A parent can still go missing later: [`RemovalPolicy::Dangle`] removes a
//! branch without touching its children. [`StackModel::dangling`] reports
//! those and the restack pass repairs them.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::BranchName;

/// Errors from stack model operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StackError {
    /// The proposed parent is neither trunk nor a managed branch.
    #[error("invalid parent '{parent}' for '{branch}': not trunk and not a managed branch")]
    InvalidParent {
        branch: BranchName,
        parent: BranchName,
    },

    /// Walking parents revisited a branch.
    #[error("cycle detected in parent chain of '{branch}' at '{revisited}'")]
    CycleDetected {
        branch: BranchName,
        revisited: BranchName,
    },

    /// Removal refused because other branches still point at this one.
    #[error("'{branch}' still has dependent branches: {}", format_names(.children))]
    HasDependents {
        branch: BranchName,
        children: Vec<BranchName>,
    },

    /// The branch is not managed.
    #[error("branch '{0}' is not managed")]
    NotManaged(BranchName),

    /// Trunk cannot be tracked as a managed branch.
    #[error("'{0}' is the trunk branch")]
    IsTrunk(BranchName),

    /// A managed branch cannot become trunk.
    #[error("'{0}' is a managed branch and cannot become trunk")]
    ManagedTrunk(BranchName),
}

fn format_names(names: &[BranchName]) -> String {
    names
        .iter()
        .map(BranchName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A branch whose parent and description are tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedBranch {
    /// Branch name
    pub name: BranchName,
    /// Trunk or another managed branch
    pub parent: BranchName,
    /// Free-text annotation, usually the originating commit message
    #[serde(default)]
    pub description: String,
}

/// What happens to the children of a removed branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemovalPolicy {
    /// Children keep pointing at the removed name until a restack repairs them.
    #[default]
    Dangle,
    /// Children move to the removed branch's parent.
    Reparent,
    /// Removal fails while children exist; callers re-parent them first.
    RequireExplicit,
}

/// The stack: trunk plus every managed branch, keyed by name.
///
/// # Example
///
/// ```
/// use gtstack::core::stack::StackModel;
/// use gtstack::core::types::BranchName;
///
/// let main = BranchName::new("main").unwrap();
/// let a = BranchName::new("a").unwrap();
/// let b = BranchName::new("b").unwrap();
///
/// let mut model = StackModel::new(main.clone());
/// model.add_managed(a.clone(), main.clone(), "first").unwrap();
/// model.add_managed(b.clone(), a.clone(), "second").unwrap();
///
/// assert_eq!(model.ancestors_of(&b).unwrap(), vec![a, main]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackModel {
    trunk: BranchName,
    branches: BTreeMap<BranchName, ManagedBranch>,
}

impl StackModel {
    /// Create an empty model on top of `trunk`.
    pub fn new(trunk: BranchName) -> Self {
        Self {
            trunk,
            branches: BTreeMap::new(),
        }
    }

    /// Build a model from persisted records, validating every chain.
    ///
    /// Unlike [`add_managed`](Self::add_managed), records may arrive in any
    /// order and may already be dangling; only cycles and a managed trunk
    /// are rejected.
    pub fn from_records(
        trunk: BranchName,
        records: impl IntoIterator<Item = ManagedBranch>,
    ) -> Result<Self, StackError> {
        let mut model = Self::new(trunk);
        for record in records {
            if record.name == model.trunk {
                return Err(StackError::IsTrunk(record.name));
            }
            model.branches.insert(record.name.clone(), record);
        }
        model.validate()?;
        Ok(model)
    }

    /// The trunk branch.
    pub fn trunk(&self) -> &BranchName {
        &self.trunk
    }

    /// Check whether `name` is trunk.
    pub fn is_trunk(&self, name: &BranchName) -> bool {
        &self.trunk == name
    }

    /// Look up a managed branch.
    pub fn get(&self, name: &BranchName) -> Option<&ManagedBranch> {
        self.branches.get(name)
    }

    /// Check whether `name` is managed.
    pub fn is_managed(&self, name: &BranchName) -> bool {
        self.branches.contains_key(name)
    }

    /// All managed branches, ordered by name.
    pub fn branches(&self) -> impl Iterator<Item = &ManagedBranch> {
        self.branches.values()
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// The recorded parent, or trunk when `name` is untracked.
    pub fn resolve_parent(&self, name: &BranchName) -> &BranchName {
        self.branches
            .get(name)
            .map(|b| &b.parent)
            .unwrap_or(&self.trunk)
    }

    /// Insert (or replace) a managed branch.
    ///
    /// # Errors
    ///
    /// - [`StackError::IsTrunk`] if `name` is trunk
    /// - [`StackError::InvalidParent`] if `parent` is neither trunk nor managed
    /// - [`StackError::CycleDetected`] if `name` would become its own ancestor
    pub fn add_managed(
        &mut self,
        name: BranchName,
        parent: BranchName,
        description: impl Into<String>,
    ) -> Result<(), StackError> {
        if self.is_trunk(&name) {
            return Err(StackError::IsTrunk(name));
        }
        self.check_parent(&name, &parent)?;
        let record = ManagedBranch {
            name: name.clone(),
            parent,
            description: description.into(),
        };
        self.branches.insert(name, record);
        Ok(())
    }

    /// Point `name` at a different parent.
    pub fn reparent(&mut self, name: &BranchName, parent: BranchName) -> Result<(), StackError> {
        if !self.is_managed(name) {
            return Err(StackError::NotManaged(name.clone()));
        }
        self.check_parent(name, &parent)?;
        if let Some(record) = self.branches.get_mut(name) {
            record.parent = parent;
        }
        Ok(())
    }

    /// Replace the description of a managed branch.
    pub fn set_description(
        &mut self,
        name: &BranchName,
        description: impl Into<String>,
    ) -> Result<(), StackError> {
        let record = self
            .branches
            .get_mut(name)
            .ok_or_else(|| StackError::NotManaged(name.clone()))?;
        record.description = description.into();
        Ok(())
    }

    /// Reconfigure trunk. The new trunk must not be a managed branch.
    pub fn set_trunk(&mut self, trunk: BranchName) -> Result<(), StackError> {
        if self.is_managed(&trunk) {
            return Err(StackError::ManagedTrunk(trunk));
        }
        self.trunk = trunk;
        Ok(())
    }

    /// Delete the record for `name`, handling its children per `policy`.
    ///
    /// Returns the removed record, or `None` if `name` was not managed.
    pub fn remove(
        &mut self,
        name: &BranchName,
        policy: RemovalPolicy,
    ) -> Result<Option<ManagedBranch>, StackError> {
        let Some(parent) = self.branches.get(name).map(|b| b.parent.clone()) else {
            return Ok(None);
        };
        let children = self.children(name);

        match policy {
            RemovalPolicy::Dangle => {}
            RemovalPolicy::Reparent => {
                for child in &children {
                    if let Some(record) = self.branches.get_mut(child) {
                        record.parent = parent.clone();
                    }
                }
            }
            RemovalPolicy::RequireExplicit => {
                if !children.is_empty() {
                    return Err(StackError::HasDependents {
                        branch: name.clone(),
                        children,
                    });
                }
            }
        }

        Ok(self.branches.remove(name))
    }

    /// Managed branches whose recorded parent is `name`, ordered by name.
    pub fn children(&self, name: &BranchName) -> Vec<BranchName> {
        self.branches
            .values()
            .filter(|b| &b.parent == name)
            .map(|b| b.name.clone())
            .collect()
    }

    /// Managed branches whose parent is neither trunk nor managed.
    pub fn dangling(&self) -> Vec<BranchName> {
        self.branches
            .values()
            .filter(|b| !self.is_trunk(&b.parent) && !self.is_managed(&b.parent))
            .map(|b| b.name.clone())
            .collect()
    }

    /// Ancestors of `name`, from its immediate parent up to trunk.
    ///
    /// Untracked names (and dangling parents) resolve to trunk, so the walk
    /// always ends there unless it loops.
    ///
    /// # Errors
    ///
    /// [`StackError::CycleDetected`] if the walk revisits a branch.
    pub fn ancestors_of(&self, name: &BranchName) -> Result<Vec<BranchName>, StackError> {
        let mut result = Vec::new();
        if self.is_trunk(name) {
            return Ok(result);
        }

        let mut visited = HashSet::new();
        visited.insert(name);
        let mut current = name;
        loop {
            let parent = self.resolve_parent(current);
            if !visited.insert(parent) {
                return Err(StackError::CycleDetected {
                    branch: name.clone(),
                    revisited: parent.clone(),
                });
            }
            result.push(parent.clone());
            if self.is_trunk(parent) {
                return Ok(result);
            }
            current = parent;
        }
    }

    /// Every managed branch, parents before children.
    ///
    /// Sorted by distance from trunk, then by name, so the order is
    /// deterministic.
    pub fn restack_order(&self) -> Result<Vec<BranchName>, StackError> {
        let mut by_depth = self
            .branches
            .keys()
            .map(|name| Ok((self.ancestors_of(name)?.len(), name.clone())))
            .collect::<Result<Vec<_>, StackError>>()?;
        by_depth.sort();
        Ok(by_depth.into_iter().map(|(_, name)| name).collect())
    }

    /// Check every chain for cycles.
    pub fn validate(&self) -> Result<(), StackError> {
        for name in self.branches.keys() {
            self.ancestors_of(name)?;
        }
        Ok(())
    }

    fn check_parent(&self, name: &BranchName, parent: &BranchName) -> Result<(), StackError> {
        if !self.is_trunk(parent) && !self.is_managed(parent) {
            return Err(StackError::InvalidParent {
                branch: name.clone(),
                parent: parent.clone(),
            });
        }
        if parent == name {
            return Err(StackError::CycleDetected {
                branch: name.clone(),
                revisited: name.clone(),
            });
        }
        if self.is_managed(name) && self.ancestors_of(parent)?.contains(name) {
            return Err(StackError::CycleDetected {
                branch: name.clone(),
                revisited: name.clone(),
            });
        }
        Ok(())
    }
}
