//! modify command - Amend the last commit on the current branch

use anyhow::Result;

use super::Session;
use crate::engine::{lifecycle, Context, ModifyRequest};
use crate::ui::output;

/// Amend the current branch's last commit.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `all` - Stage all changes first
/// * `message` - Replacement commit message
pub fn modify(ctx: &Context, all: bool, message: Option<&str>) -> Result<()> {
    let session = Session::open(ctx)?;
    let request = ModifyRequest {
        stage_all: all,
        message: message.map(str::to_string),
    };

    let outcome = lifecycle::modify(&session.git, &session.store, &session.options, &request)?;
    if outcome.on_remote {
        output::warn(
            format!(
                "'{}' is already on '{}'; the amended history needs a force push (gt submit)",
                outcome.branch, session.options.remote
            ),
            session.verbosity,
        );
    }
    output::success(format!("Amended '{}'", outcome.branch), session.verbosity);
    Ok(())
}
