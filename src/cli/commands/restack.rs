//! restack command - Rebase managed branches without fetching

use anyhow::Result;

use super::sync::{finish, render_report};
use super::Session;
use crate::engine::{restack as engine_restack, Context};
use crate::ui::output;

pub fn restack(ctx: &Context) -> Result<()> {
    let session = Session::open(ctx)?;
    let report =
        engine_restack::restack(&session.git, &session.store, session.options.restack)?;

    if report.rebased.is_empty() && report.failed.is_empty() {
        output::info("Nothing to restack", session.verbosity);
    }
    render_report(&report, session.verbosity);
    finish(&report)
}
