//! submit command - Push the current branch and its managed ancestors

use anyhow::Result;

use super::Session;
use crate::engine::{recovery, Context};
use crate::ui::output;

pub fn submit(ctx: &Context) -> Result<()> {
    let session = Session::open(ctx)?;
    let outcome = recovery::submit(&session.git, &session.store, &session.options)?;

    for branch in &outcome.skipped {
        output::warn(
            format!("'{}' is not present locally and was not pushed", branch),
            session.verbosity,
        );
    }
    for branch in &outcome.pushed {
        output::success(
            format!("Pushed '{}' to '{}'", branch, session.options.remote),
            session.verbosity,
        );
    }
    Ok(())
}
