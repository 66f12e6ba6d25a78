//! checkout command - Check out a branch, by name or from a picker

use anyhow::{bail, Context as _, Result};

use super::Session;
use crate::core::types::{BranchName, Head};
use crate::engine::Context;
use crate::git::Vcs;
use crate::ui::{output, prompts};

/// Check out `branch`, or pick one interactively.
pub fn checkout(ctx: &Context, branch: Option<&str>) -> Result<()> {
    let session = Session::open(ctx)?;

    let target = match branch {
        Some(name) => BranchName::new(name).context("Invalid branch name")?,
        None => {
            if !session.interactive {
                bail!("no branch given; pass a branch name or run interactively");
            }
            let trunk = session.store.load()?.trunk().clone();
            let candidates = picker_order(session.git.list_local_branches()?, &trunk);
            if candidates.is_empty() {
                bail!("No branches found");
            }
            let default = match session.git.head()? {
                Head::Branch(current) => candidates.iter().position(|b| *b == current),
                Head::Detached { .. } => None,
            }
            .unwrap_or(0);
            let index = prompts::select("Checkout a branch", &candidates, default, true)?;
            candidates[index].clone()
        }
    };

    session.git.checkout(&target)?;
    output::success(format!("Checked out '{}'", target), session.verbosity);
    Ok(())
}

/// Branches in name order with trunk moved to the bottom.
fn picker_order(mut branches: Vec<BranchName>, trunk: &BranchName) -> Vec<BranchName> {
    branches.sort();
    if let Some(pos) = branches.iter().position(|b| b == trunk) {
        let trunk = branches.remove(pos);
        branches.push(trunk);
    }
    branches
}
