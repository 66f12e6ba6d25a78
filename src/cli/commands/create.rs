//! create command - Cut a stacked branch from trunk

use anyhow::Result;

use super::Session;
use crate::engine::{lifecycle, Context, CreateRequest};
use crate::ui::output;

/// Create a branch from trunk and commit to it.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `name` - Branch name; derived from `message` when absent
/// * `message` - Commit message
/// * `all` - Stage all changes first
pub fn create(ctx: &Context, name: Option<&str>, message: Option<&str>, all: bool) -> Result<()> {
    let session = Session::open(ctx)?;
    let request = CreateRequest {
        name: name.map(str::to_string),
        message: message.map(str::to_string),
        stage_all: all,
    };

    let outcome = lifecycle::create(&session.git, &session.store, &session.options, &request)?;
    output::success(
        format!("Created '{}' on top of '{}'", outcome.branch, outcome.parent),
        session.verbosity,
    );
    Ok(())
}
