//! gtstack - stacked branches on top of git
//!
//! `gt` records which branch each of your work branches was cut from and keeps
//! that stack consistent as trunk moves: `sync` updates trunk, prunes branches
//! merged upstream and rebases the rest; `create`, `pop` and `modify` are the
//! single-branch transitions.
//!
//! # Architecture
//!
//! - [`cli`] - Argument parsing and command handlers
//! - [`engine`] - Sync, restack and lifecycle operations
//! - [`core`] - Branch names, the stack model, state store and settings
//! - [`git`] - The [`Vcs`](git::Vcs) adapter, its git implementation and a mock
//! - [`ui`] - Output and prompts
//!
//! # Invariants
//!
//! 1. Every managed branch's parent chain ends at trunk
//! 2. The state file is replaced atomically, never written in place
//! 3. A rebase started by `sync` or `restack` never outlives the command

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod ui;
