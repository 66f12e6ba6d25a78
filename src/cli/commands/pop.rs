//! pop command - Undo the current branch, keeping its changes

use anyhow::Result;

use super::Session;
use crate::engine::{lifecycle, Context};
use crate::ui::output;

pub fn pop(ctx: &Context) -> Result<()> {
    let session = Session::open(ctx)?;
    let outcome = lifecycle::pop(&session.git, &session.store, &session.options)?;
    output::success(
        format!(
            "Popped '{}'; its changes are uncommitted on '{}'",
            outcome.branch, outcome.parent
        ),
        session.verbosity,
    );
    Ok(())
}
