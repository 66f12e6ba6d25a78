//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--no-interactive`: Never prompt
//! - `--quiet` / `-q`: Minimal output

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// gt - keep stacks of dependent branches in line with trunk
#[derive(Parser, Debug)]
#[command(name = "gt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if gt was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; implies --no-interactive
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_interactive: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Prompts are allowed unless disabled by flag or stdin is not a terminal.
    pub fn interactive(&self) -> bool {
        !(self.no_interactive || self.quiet) && std::io::stdin().is_terminal()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a stacked branch from trunk and commit to it
    #[command(
        name = "create",
        visible_alias = "c",
        long_about = "Create a new branch from trunk and commit the staged changes to it.\n\n\
            The branch name is taken from the argument, or derived from the commit \
            message: lower-cased, runs of other characters replaced by '-', at most \
            50 characters. The commit message defaults to the branch name.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Name derived from the message: fix-login-redirect
    gt create -a -m \"Fix login redirect\"

    # Explicit name, message defaults to the name
    gt create my-branch"
    )]
    Create {
        /// Branch name (derived from --message when omitted)
        name: Option<String>,

        /// Commit message
        #[arg(short, long)]
        message: Option<String>,

        /// Stage all changes before committing
        #[arg(short, long)]
        all: bool,
    },

    /// Undo the current branch, keeping its changes uncommitted
    #[command(
        name = "pop",
        long_about = "Remove the current branch's last commit, switch to its parent with \
            those changes left in the working tree, and delete the branch."
    )]
    Pop,

    /// Amend the last commit on the current branch
    #[command(name = "modify", visible_alias = "m")]
    Modify {
        /// Stage all changes before amending
        #[arg(short, long)]
        all: bool,

        /// Replace the commit message and branch description
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Check out a branch
    #[command(
        name = "checkout",
        visible_alias = "co",
        long_about = "Switch to a branch. Without a name, pick one from a list of local \
            branches (trunk last)."
    )]
    Checkout {
        /// Branch to check out
        branch: Option<String>,
    },

    /// Update trunk from the remote, prune merged branches and restack
    #[command(
        name = "sync",
        long_about = "Bring the stack up to date with the remote trunk.\n\n\
            Fetches, fast-forwards trunk, then looks at every managed branch. \
            Branches gone from the remote are offered for deletion; the rest are \
            rebased. A conflicting rebase is aborted and reported, and the other \
            branches are still processed. You end up back where you started.",
        after_help = "\
FAILURE MODES:
    Trunk diverged from the remote    sync stops before touching any branch
    Rebase conflict on a branch       rebase aborted, branch listed as failed
    Rebase already in progress        resolve it first (gt continue)"
    )]
    Sync,

    /// Rebase managed branches without fetching
    #[command(name = "restack")]
    Restack,

    /// Push the current branch and its managed ancestors
    #[command(name = "submit", visible_alias = "s")]
    Submit,

    /// Continue a rebase after resolving conflicts
    #[command(name = "continue")]
    Continue,

    /// Display or set the trunk branch
    #[command(name = "trunk")]
    Trunk {
        /// Set trunk to this branch
        #[arg(long)]
        set: Option<String>,
    },

    /// Display managed branches as a tree rooted at trunk
    #[command(name = "log", visible_alias = "ls")]
    Log,

    /// Generate shell completion scripts
    #[command(name = "completion")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
