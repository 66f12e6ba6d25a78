//! continue command - Resume a rebase after conflicts were resolved

use anyhow::Result;

use super::Session;
use crate::engine::{recovery, Context};
use crate::ui::output;

pub fn continue_op(ctx: &Context) -> Result<()> {
    let session = Session::open(ctx)?;
    recovery::continue_rebase(&session.git)?;
    output::success("Rebase completed", session.verbosity);
    output::info(
        "Run 'gt restack' to bring the remaining branches up to date.",
        session.verbosity,
    );
    Ok(())
}
