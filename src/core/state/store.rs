//! core::state::store
//!
//! Load and save the workspace state file.
//!
//! # Durability
//!
//! `save` replaces the file atomically (temp file + rename). An interrupted
//! command leaves either the previous state or the new one on disk.
//!
//! # Corruption
//!
//! A state file that exists but cannot be parsed is reported as
//! [`StateError::CorruptState`] and never replaced with defaults: doing so
//! would silently drop the recorded stack topology.
//!
//! # Concurrency
//!
//! No locking. One command at a time is assumed per working copy; callers
//! that need multi-process safety must lock around [`StateStore::path`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::schema::StateRecord;
use crate::core::atomic::write_atomic;
use crate::core::paths::GtPaths;
use crate::core::stack::StackModel;
use crate::core::types::BranchName;

/// Errors from state storage.
#[derive(Debug, Error)]
pub enum StateError {
    /// No repository encloses the starting directory.
    #[error("not a git working copy: {}", path.display())]
    NotAWorkingCopy { path: PathBuf },

    /// The state file exists but does not parse.
    #[error("workspace state at '{}' is corrupt: {message}", path.display())]
    CorruptState { path: PathBuf, message: String },

    #[error("failed to read workspace state '{}': {source}", path.display())]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write workspace state '{}': {source}", path.display())]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize workspace state: {0}")]
    SerializeError(String),
}

/// File-backed store for one repository's [`StackModel`].
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
    default_trunk: BranchName,
}

impl StateStore {
    /// Store at an explicit file location.
    pub fn at(path: impl Into<PathBuf>, default_trunk: BranchName) -> Self {
        Self {
            path: path.into(),
            default_trunk,
        }
    }

    /// Store for the repository enclosing `start`.
    ///
    /// # Errors
    ///
    /// [`StateError::NotAWorkingCopy`] if no repository is found above `start`.
    pub fn discover(start: &Path, default_trunk: BranchName) -> Result<Self, StateError> {
        Ok(Self::at(Self::locate(start)?.state_path(), default_trunk))
    }

    /// Storage locations of the repository enclosing `start`.
    ///
    /// Callers that need settings before the default trunk is known locate
    /// first and build the store with [`at`](Self::at).
    pub fn locate(start: &Path) -> Result<GtPaths, StateError> {
        GtPaths::discover(start).ok_or_else(|| StateError::NotAWorkingCopy {
            path: start.to_path_buf(),
        })
    }

    /// Location of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Trunk used when no state has been written yet.
    pub fn default_trunk(&self) -> &BranchName {
        &self.default_trunk
    }

    /// Read the model.
    ///
    /// A missing or blank file yields an empty model on the default trunk.
    pub fn load(&self) -> Result<StackModel, StateError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no state file, using defaults");
                return Ok(StackModel::new(self.default_trunk.clone()));
            }
            Err(source) => {
                return Err(StateError::ReadError {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if contents.trim().is_empty() {
            return Ok(StackModel::new(self.default_trunk.clone()));
        }

        let record: StateRecord =
            serde_json::from_str(&contents).map_err(|e| self.corrupt(e.to_string()))?;
        record
            .into_model(&self.default_trunk)
            .map_err(|message| self.corrupt(message))
    }

    /// Write the full model, replacing the previous state atomically.
    pub fn save(&self, model: &StackModel) -> Result<(), StateError> {
        let json = serde_json::to_string_pretty(&StateRecord::from_model(model))
            .map_err(|e| StateError::SerializeError(e.to_string()))?;

        write_atomic(&self.path, json.as_bytes()).map_err(|source| StateError::WriteError {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(
            path = %self.path.display(),
            branches = model.len(),
            "saved workspace state"
        );
        Ok(())
    }

    fn corrupt(&self, message: String) -> StateError {
        StateError::CorruptState {
            path: self.path.clone(),
            message,
        }
    }
}
