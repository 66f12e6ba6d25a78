//! trunk command - Display or set the trunk branch

use anyhow::{bail, Result};

use super::Session;
use crate::core::types::BranchName;
use crate::engine::Context;
use crate::git::Vcs;
use crate::ui::output;

/// Display or set the trunk branch.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `set` - If provided, set trunk to this branch
pub fn trunk(ctx: &Context, set: Option<&str>) -> Result<()> {
    let session = Session::open(ctx)?;
    let mut model = session.store.load()?;

    let Some(new_trunk) = set else {
        println!("{}", model.trunk());
        return Ok(());
    };

    let new_trunk = BranchName::new(new_trunk)?;
    if !session.git.branch_exists_locally(&new_trunk)? {
        bail!("branch '{}' does not exist locally", new_trunk);
    }
    model.set_trunk(new_trunk.clone())?;
    session.store.save(&model)?;
    output::success(format!("Trunk set to '{}'", new_trunk), session.verbosity);
    Ok(())
}
