//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`prompts`] - Confirmation capability and the branch picker
//! - [`output`] - Verbosity-aware message printing
//!
//! Engines never print. They take a [`prompts::Confirm`] when they need an
//! answer and return reports the command handlers render through [`output`].

pub mod output;
pub mod prompts;
