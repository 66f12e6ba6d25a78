//! sync command - Update trunk, prune merged branches, restack

use anyhow::{bail, Result};

use super::Session;
use crate::engine::{Context, FinalPosition, SyncEngine, SyncReport};
use crate::ui::output::{self, Verbosity};
use crate::ui::prompts::{Confirm, LineConfirm};

pub fn sync(ctx: &Context) -> Result<()> {
    let session = Session::open(ctx)?;
    let engine = SyncEngine::new(&session.git, &session.store, &session.options);

    let report = if session.interactive {
        let mut prompt = LineConfirm::stdio();
        engine.run(Some(&mut prompt as &mut dyn Confirm))?
    } else {
        engine.run(None)?
    };

    render_report(&report, session.verbosity);
    finish(&report)
}

/// Print what a sync or restack run did.
pub(super) fn render_report(report: &SyncReport, verbosity: Verbosity) {
    for branch in &report.deleted {
        output::success(format!("Deleted '{}'", branch), verbosity);
    }
    for branch in &report.rebased {
        output::success(format!("Restacked '{}'", branch), verbosity);
    }
    for branch in &report.repaired {
        output::info(format!("Re-parented '{}' onto trunk", branch), verbosity);
    }
    for branch in &report.kept {
        output::info(format!("Kept '{}'", branch), verbosity);
    }
    if !report.skipped.is_empty() {
        output::info(
            format!("Skipped:\n{}", output::format_list(&report.skipped, "  ")),
            verbosity,
        );
    }
    for warning in &report.warnings {
        output::warn(warning, verbosity);
    }
    for failure in &report.failed {
        output::error(format!("could not restack {}", failure));
    }

    match &report.position {
        FinalPosition::Restored(head) => output::debug(format!("back on {}", head), verbosity),
        FinalPosition::FellBackToTrunk(trunk) => {
            output::info(format!("Now on '{}'", trunk), verbosity)
        }
        FinalPosition::Unchanged => {}
    }
}

/// Per-branch failures still fail the command once everything else is done.
pub(super) fn finish(report: &SyncReport) -> Result<()> {
    if !report.is_clean() {
        bail!(
            "{} branch(es) could not be restacked; resolve them manually",
            report.failed.len()
        );
    }
    Ok(())
}
