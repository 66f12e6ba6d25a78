//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`BranchName`] - Validated Git branch name
//! - [`Head`] - Where the working copy currently points
//!
//! # Examples
//!
//! ```
//! use gtstack::core::types::BranchName;
//!
//! let branch = BranchName::new("feature/my-branch").unwrap();
//! assert_eq!(branch.as_str(), "feature/my-branch");
//!
//! assert!(BranchName::new("invalid..name").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name '{name}': {reason}")]
    InvalidBranchName { name: String, reason: &'static str },
}

/// A validated Git branch name.
///
/// Branch names must conform to Git's refname rules (see `git check-ref-format`):
/// - Cannot be empty or exactly `@`
/// - Cannot start with `.` or `-`
/// - Cannot end with `.lock` or `/`
/// - Cannot contain `..`, `@{`, `//`, whitespace or ASCII control characters
/// - Cannot contain `~`, `^`, `:`, `\`, `?`, `*`, `[`
/// - No path component may start with `.` or end with `.lock`
///
/// # Example
///
/// ```
/// use gtstack::core::types::BranchName;
///
/// let name = BranchName::new("user@feature").unwrap();
/// assert_eq!(name.as_str(), "user@feature");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new(".hidden").is_err());
/// assert!(BranchName::new("branch.lock").is_err());
/// assert!(BranchName::new("has space").is_err());
/// assert!(BranchName::new("@").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::InvalidBranchName`] if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        match Self::violation(&name) {
            Some(reason) => Err(TypeError::InvalidBranchName { name, reason }),
            None => Ok(Self(name)),
        }
    }

    /// Return the first refname rule `name` breaks, if any.
    fn violation(name: &str) -> Option<&'static str> {
        const INVALID_CHARS: [char; 7] = ['~', '^', ':', '\\', '?', '*', '['];

        if name.is_empty() {
            return Some("cannot be empty");
        }
        if name == "@" {
            return Some("'@' is reserved");
        }
        if name.starts_with('.') || name.starts_with('-') {
            return Some("cannot start with '.' or '-'");
        }
        if name.ends_with('/') || name.ends_with(".lock") {
            return Some("cannot end with '/' or '.lock'");
        }
        if name.contains("..") || name.contains("@{") || name.contains("//") {
            return Some("cannot contain '..', '@{' or '//'");
        }
        if name
            .chars()
            .any(|c| c.is_whitespace() || c.is_ascii_control() || INVALID_CHARS.contains(&c))
        {
            return Some("contains a forbidden character");
        }
        if name
            .split('/')
            .any(|part| part.starts_with('.') || part.ends_with(".lock"))
        {
            return Some("path component cannot start with '.' or end with '.lock'");
        }
        None
    }

    /// Wrap a compile-time constant known to be valid.
    pub(crate) fn from_static(name: &'static str) -> Self {
        debug_assert!(Self::violation(name).is_none(), "invalid constant '{name}'");
        Self(name.to_string())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for BranchName {
    type Error = TypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for BranchName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for BranchName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The working copy's current position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// HEAD is attached to a local branch.
    Branch(BranchName),
    /// HEAD points directly at a commit.
    Detached {
        /// Commit id HEAD points at
        oid: String,
    },
}

impl Head {
    /// The attached branch, if any.
    pub fn branch(&self) -> Option<&BranchName> {
        match self {
            Head::Branch(name) => Some(name),
            Head::Detached { .. } => None,
        }
    }

    /// Revision that checks this position out again.
    pub fn revision(&self) -> &str {
        match self {
            Head::Branch(name) => name.as_str(),
            Head::Detached { oid } => oid,
        }
    }
}

impl std::fmt::Display for Head {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Head::Branch(name) => write!(f, "{}", name),
            Head::Detached { oid } => write!(f, "detached HEAD at {}", oid),
        }
    }
}
