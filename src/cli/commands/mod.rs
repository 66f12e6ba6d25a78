//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! Each handler:
//! 1. Opens the repository through [`Session::open`]
//! 2. Calls the engine
//! 3. Formats and displays the outcome
//!
//! Handlers do NOT perform repository mutations directly.

mod checkout;
mod completion;
mod create;
mod log_cmd;
mod modify;
mod pop;
mod recovery;
mod restack;
mod submit;
mod sync;
mod trunk;

pub use checkout::checkout;
pub use completion::completion;
pub use create::create;
pub use log_cmd::log;
pub use modify::modify;
pub use pop::pop;
pub use recovery::continue_op;
pub use restack::restack;
pub use submit::submit;
pub use sync::sync;
pub use trunk::trunk;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::cli::args::Command;
use crate::core::config::Config;
use crate::core::state::StateStore;
use crate::engine::{Context, StackOptions};
use crate::git::Git;
use crate::ui::output::Verbosity;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Create { name, message, all } => {
            create::create(ctx, name.as_deref(), message.as_deref(), all)
        }
        Command::Pop => pop::pop(ctx),
        Command::Modify { all, message } => modify::modify(ctx, all, message.as_deref()),
        Command::Checkout { branch } => checkout::checkout(ctx, branch.as_deref()),
        Command::Sync => sync::sync(ctx),
        Command::Restack => restack::restack(ctx),
        Command::Submit => submit::submit(ctx),
        Command::Continue => recovery::continue_op(ctx),
        Command::Trunk { set } => trunk::trunk(ctx, set.as_deref()),
        Command::Log => log_cmd::log(ctx),
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Everything a handler needs to run an engine operation.
pub(crate) struct Session {
    pub git: Git,
    pub store: StateStore,
    pub options: StackOptions,
    pub verbosity: Verbosity,
    /// Prompts allowed by both flags and settings.
    pub interactive: bool,
}

impl Session {
    /// Open the repository enclosing the working directory and load its
    /// settings.
    pub fn open(ctx: &Context) -> Result<Self> {
        let cwd = resolve_cwd(ctx)?;
        let paths = StateStore::locate(&cwd)?;
        let config = Config::load(Some(&paths.common_dir)).context("Failed to load settings")?;
        let git = Git::open(&cwd).context("Failed to open repository")?;

        tracing::debug!(
            state = %paths.state_path().display(),
            global = ?config.global_config_loaded_from(),
            repo = ?config.repo_config_loaded_from(),
            "session"
        );

        let store = StateStore::at(paths.state_path(), config.default_trunk());
        let options = StackOptions::from_config(&config);
        Ok(Self {
            git,
            store,
            options,
            verbosity: Verbosity::from_context(ctx),
            interactive: ctx.interactive && config.interactive(),
        })
    }
}

fn resolve_cwd(ctx: &Context) -> Result<PathBuf> {
    match &ctx.cwd {
        Some(cwd) => Ok(cwd.clone()),
        None => std::env::current_dir().context("Failed to read current directory"),
    }
}
