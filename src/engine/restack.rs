//! engine::restack
//!
//! Rebase managed branches after their base moved.
//!
//! The pass is shared by `sync` (after trunk is updated) and the standalone
//! `restack` command (which leaves trunk alone).
//!
//! # Strategies
//!
//! - [`RestackStrategy::Trunk`]: each branch is rebased directly onto trunk.
//!   Rebases are independent, so one failure affects only that branch.
//! - [`RestackStrategy::Parent`]: branches are rebased onto their recorded
//!   parent, parents first. A branch whose parent failed or was skipped is
//!   skipped too, since its base is stale.
//!
//! Under either strategy a branch whose parent is no longer managed is
//! re-parented to trunk before rebasing.
//!
//! # Conflicts
//!
//! A conflicting rebase is aborted immediately; the working copy is never
//! left mid-rebase when the pass returns.

use std::collections::BTreeSet;

use super::report::{FinalPosition, SyncReport};
use super::sync::SyncError;
use crate::core::config::RestackStrategy;
use crate::core::stack::StackModel;
use crate::core::state::StateStore;
use crate::core::types::{BranchName, Head};
use crate::git::{RebaseOutcome, Vcs, VcsError};

/// Rebase every branch in `candidates`, in parent-first order.
///
/// Per-branch failures land in `report`; only a failed rebase abort (which
/// would leave the working copy mid-rebase) is returned as an error.
pub fn restack_pass<V: Vcs + ?Sized>(
    vcs: &V,
    model: &mut StackModel,
    strategy: RestackStrategy,
    candidates: &[BranchName],
    report: &mut SyncReport,
) -> Result<(), SyncError> {
    let candidates: BTreeSet<&BranchName> = candidates.iter().collect();
    let trunk = model.trunk().clone();

    for branch in model.restack_order()? {
        if !candidates.contains(&branch) {
            continue;
        }

        let mut parent = model.resolve_parent(&branch).clone();
        if !model.is_trunk(&parent) && !model.is_managed(&parent) {
            report.warn(format!(
                "'{}' pointed at missing parent '{}'; re-parented onto '{}'",
                branch, parent, trunk
            ));
            model.reparent(&branch, trunk.clone())?;
            report.repaired.push(branch.clone());
            parent = trunk.clone();
        }

        let onto = match strategy {
            RestackStrategy::Trunk => trunk.clone(),
            RestackStrategy::Parent => {
                if report.skipped.contains(&parent) || report.has_failed(&parent) {
                    report.warn(format!(
                        "skipped '{}': parent '{}' was not restacked",
                        branch, parent
                    ));
                    report.skipped.push(branch);
                    continue;
                }
                parent
            }
        };

        rebase_onto(vcs, &branch, &onto, report)?;
    }
    Ok(())
}

/// Check out `branch` and rebase it onto `onto`, aborting on conflict.
fn rebase_onto<V: Vcs + ?Sized>(
    vcs: &V,
    branch: &BranchName,
    onto: &BranchName,
    report: &mut SyncReport,
) -> Result<(), VcsError> {
    tracing::debug!(%branch, %onto, "rebasing");

    if let Err(e) = vcs.checkout(branch) {
        report.fail(branch, e.to_string());
        return Ok(());
    }

    match vcs.rebase(onto) {
        Ok(RebaseOutcome::Success) => {
            tracing::info!(%branch, %onto, "rebased");
            report.rebased.push(branch.clone());
        }
        Ok(RebaseOutcome::Conflict { output }) => {
            vcs.rebase_abort()?;
            report.fail(branch, output);
        }
        Err(e) => {
            if vcs.rebase_in_progress()? {
                vcs.rebase_abort()?;
            }
            report.fail(branch, e.to_string());
        }
    }
    Ok(())
}

/// Return to `origin`, or to trunk when the origin branch is gone.
///
/// Never fails: a checkout that does not go through is reported as a
/// warning so the caller can still save and print what the run did.
pub fn restore_position<V: Vcs + ?Sized>(
    vcs: &V,
    origin: &Head,
    trunk: &BranchName,
    report: &mut SyncReport,
) {
    let returned = match origin {
        Head::Branch(branch) => match vcs.branch_exists_locally(branch) {
            Ok(false) => {
                report.warn(format!(
                    "'{}' no longer exists; checking out '{}' instead",
                    branch, trunk
                ));
                None
            }
            _ => Some(vcs.checkout(branch)),
        },
        Head::Detached { oid } => Some(vcs.checkout_detached(oid)),
    };

    report.position = match returned {
        Some(Ok(())) => FinalPosition::Restored(origin.clone()),
        Some(Err(e)) => {
            report.warn(format!(
                "could not return to {}; checking out '{}' instead: {}",
                origin, trunk, e
            ));
            fall_back_to_trunk(vcs, trunk, report)
        }
        None => fall_back_to_trunk(vcs, trunk, report),
    };
}

fn fall_back_to_trunk<V: Vcs + ?Sized>(
    vcs: &V,
    trunk: &BranchName,
    report: &mut SyncReport,
) -> FinalPosition {
    match vcs.checkout(trunk) {
        Ok(()) => FinalPosition::FellBackToTrunk(trunk.clone()),
        Err(e) => {
            report.warn(format!("could not check out '{}': {}", trunk, e));
            FinalPosition::Unchanged
        }
    }
}

/// Fail when the working copy is already mid-rebase.
pub(crate) fn ensure_no_rebase<V: Vcs + ?Sized>(vcs: &V) -> Result<(), SyncError> {
    if vcs.rebase_in_progress()? {
        return Err(SyncError::RebaseInProgress);
    }
    Ok(())
}

/// Restack the whole stack without fetching or touching trunk.
///
/// Branches missing locally are skipped. The model is saved at the end
/// (parent repairs are the only change it can carry), even when the pass
/// stops early.
pub fn restack<V: Vcs + ?Sized>(
    vcs: &V,
    store: &StateStore,
    strategy: RestackStrategy,
) -> Result<SyncReport, SyncError> {
    ensure_no_rebase(vcs)?;
    let origin = vcs.head()?;
    let mut model = store.load()?;
    let mut report = SyncReport::default();

    let mut candidates = Vec::new();
    for branch in model.restack_order()? {
        match vcs.branch_exists_locally(&branch) {
            Ok(true) => candidates.push(branch),
            Ok(false) => {
                tracing::debug!(%branch, "not present locally, skipping");
                report.skipped.push(branch);
            }
            Err(e) => {
                report.warn(format!("could not look up '{}': {}", branch, e));
                candidates.push(branch);
            }
        }
    }

    let pass = restack_pass(vcs, &mut model, strategy, &candidates, &mut report);
    restore_position(vcs, &origin, model.trunk(), &mut report);
    store.save(&model)?;
    pass?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::mock::MockVcs;
    use crate::git::VcsOp;

    fn b(name: &str) -> BranchName {
        BranchName::new(name).unwrap()
    }

    /// main -> a -> b, main -> c; trunk moved after branching.
    fn setup() -> (MockVcs, StackModel) {
        let vcs = MockVcs::new(&b("main"));
        vcs.add_branch(&b("a"), &b("main"), "a work");
        vcs.add_branch(&b("b"), &b("a"), "b work");
        vcs.add_branch(&b("c"), &b("main"), "c work");
        vcs.commit_on(&b("main"), "trunk moved");

        let mut model = StackModel::new(b("main"));
        model.add_managed(b("a"), b("main"), "").unwrap();
        model.add_managed(b("b"), b("a"), "").unwrap();
        model.add_managed(b("c"), b("main"), "").unwrap();
        (vcs, model)
    }

    fn all() -> Vec<BranchName> {
        vec![b("a"), b("b"), b("c")]
    }

    #[test]
    fn trunk_strategy_rebases_everything_onto_trunk() {
        let (vcs, mut model) = setup();
        let mut report = SyncReport::default();

        restack_pass(&vcs, &mut model, RestackStrategy::Trunk, &all(), &mut report).unwrap();

        assert_eq!(report.rebased, vec![b("a"), b("c"), b("b")]);
        for branch in all() {
            assert!(vcs.contains(&branch, &b("main")));
        }
    }

    #[test]
    fn parent_strategy_keeps_child_on_parent() {
        let (vcs, mut model) = setup();
        let mut report = SyncReport::default();

        restack_pass(&vcs, &mut model, RestackStrategy::Parent, &all(), &mut report).unwrap();

        assert!(report.is_clean());
        assert!(vcs.contains(&b("a"), &b("main")));
        assert!(vcs.contains(&b("b"), &b("a")));
    }

    #[test]
    fn conflict_is_aborted_and_isolated() {
        let (vcs, mut model) = setup();
        vcs.conflict_on_rebase(&b("a"));
        let mut report = SyncReport::default();

        restack_pass(&vcs, &mut model, RestackStrategy::Trunk, &all(), &mut report).unwrap();

        assert!(!vcs.rebase_in_progress().unwrap());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].branch, b("a"));
        assert!(report.failed[0].diagnostic.contains("CONFLICT"));
        assert_eq!(report.rebased, vec![b("c"), b("b")]);
    }

    #[test]
    fn parent_strategy_skips_children_of_failed_parent() {
        let (vcs, mut model) = setup();
        vcs.conflict_on_rebase(&b("a"));
        let mut report = SyncReport::default();

        restack_pass(&vcs, &mut model, RestackStrategy::Parent, &all(), &mut report).unwrap();

        assert_eq!(report.skipped, vec![b("b")]);
        assert_eq!(report.rebased, vec![b("c")]);
    }

    #[test]
    fn parent_strategy_repairs_dangling_parent() {
        let (vcs, mut model) = setup();
        model
            .remove(&b("a"), crate::core::stack::RemovalPolicy::Dangle)
            .unwrap();
        let mut report = SyncReport::default();

        restack_pass(
            &vcs,
            &mut model,
            RestackStrategy::Parent,
            &[b("b"), b("c")],
            &mut report,
        )
        .unwrap();

        assert_eq!(report.repaired, vec![b("b")]);
        assert_eq!(model.resolve_parent(&b("b")), &b("main"));
        assert!(vcs.contains(&b("b"), &b("main")));
    }

    #[test]
    fn trunk_strategy_repairs_dangling_parent() {
        let (vcs, mut model) = setup();
        model
            .remove(&b("a"), crate::core::stack::RemovalPolicy::Dangle)
            .unwrap();
        let mut report = SyncReport::default();

        restack_pass(
            &vcs,
            &mut model,
            RestackStrategy::Trunk,
            &[b("b"), b("c")],
            &mut report,
        )
        .unwrap();

        assert_eq!(report.repaired, vec![b("b")]);
        assert_eq!(model.resolve_parent(&b("b")), &b("main"));
        assert!(model.dangling().is_empty());
        assert!(vcs.contains(&b("b"), &b("main")));
    }

    #[test]
    fn restack_saves_repairs_when_return_checkout_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = StateStore::at(dir.path().join("gt/config.json"), b("main"));
        let (vcs, mut model) = setup();
        model
            .remove(&b("a"), crate::core::stack::RemovalPolicy::Dangle)
            .unwrap();
        store.save(&model).unwrap();
        vcs.add_branch(&b("o"), &b("main"), "o work");
        vcs.checkout(&b("o")).unwrap();
        let vcs = vcs.fail_on_branch(VcsOp::Checkout, &b("o"));

        let report = restack(&vcs, &store, RestackStrategy::Trunk).unwrap();

        assert_eq!(report.position, FinalPosition::FellBackToTrunk(b("main")));
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("could not return to o") && w.contains("injected failure")));
        assert_eq!(vcs.head().unwrap(), Head::Branch(b("main")));
        assert_eq!(store.load().unwrap().resolve_parent(&b("b")), &b("main"));
    }

    #[test]
    fn restore_reports_unchanged_when_trunk_checkout_fails() {
        let (vcs, _) = setup();
        vcs.checkout(&b("c")).unwrap();
        let vcs = vcs
            .fail_on_branch(VcsOp::Checkout, &b("a"))
            .fail_on_branch(VcsOp::Checkout, &b("main"));
        let mut report = SyncReport::default();

        restore_position(&vcs, &Head::Branch(b("a")), &b("main"), &mut report);

        assert_eq!(report.position, FinalPosition::Unchanged);
        assert_eq!(report.warnings.len(), 2);
        assert_eq!(vcs.head().unwrap(), Head::Branch(b("c")));
    }

    #[test]
    fn restore_falls_back_to_trunk() {
        let (vcs, _) = setup();
        vcs.checkout(&b("c")).unwrap();
        let origin = Head::Branch(b("gone"));
        let mut report = SyncReport::default();

        restore_position(&vcs, &origin, &b("main"), &mut report);

        assert_eq!(report.position, FinalPosition::FellBackToTrunk(b("main")));
        assert_eq!(vcs.head().unwrap(), Head::Branch(b("main")));
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn restore_detached_head() {
        let (vcs, _) = setup();
        vcs.detach_head();
        let origin = vcs.head().unwrap();
        vcs.checkout(&b("a")).unwrap();
        let mut report = SyncReport::default();

        restore_position(&vcs, &origin, &b("main"), &mut report);

        assert_eq!(report.position, FinalPosition::Restored(origin.clone()));
        assert_eq!(vcs.head().unwrap(), origin);
    }
}
