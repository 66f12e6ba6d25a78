//! core
//!
//! Core domain types, schemas, and storage for gt.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Head
//! - [`naming`] - Branch-name derivation from commit messages
//! - [`stack`] - Stack model: trunk plus managed branch records
//! - [`state`] - Workspace state store (JSON, atomic writes)
//! - [`config`] - Settings schema and loading
//! - [`paths`] - Centralized path routing for gt storage
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Nothing in `core` mutates the repository; it only reads and writes
//!   gt's own files

pub mod atomic;
pub mod config;
pub mod naming;
pub mod paths;
pub mod stack;
pub mod state;
pub mod types;
