//! Integration tests for the sync engine and branch lifecycle.
//!
//! Engines run against `MockVcs` with a state file in a temp directory, so
//! every scenario checks both the repository effects and what was persisted.

use tempfile::TempDir;

use gtstack::core::config::RestackStrategy;
use gtstack::core::stack::{RemovalPolicy, StackModel};
use gtstack::core::state::StateStore;
use gtstack::core::types::{BranchName, Head};
use gtstack::engine::{
    lifecycle, CreateRequest, ErrorCategory, LifecycleError, ModifyRequest, StackOptions,
    SyncEngine, SyncError,
};
use gtstack::git::mock::{MockOperation, MockVcs};
use gtstack::git::{Vcs, VcsOp};
use gtstack::ui::prompts::{Confirm, LineConfirm};

// =============================================================================
// Test Fixtures
// =============================================================================

fn b(name: &str) -> BranchName {
    BranchName::new(name).unwrap()
}

/// Repository with a remote, a state file, and a stack:
///
/// ```text
/// main
/// ├─ published   (on the remote)
/// └─ merged      (deleted from the remote)
/// ```
///
/// The remote trunk has one commit the local trunk lacks.
struct Fixture {
    _dir: TempDir,
    store: StateStore,
    vcs: MockVcs,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = StateStore::at(dir.path().join("gt/config.json"), b("main"));
        let vcs = MockVcs::new(&b("main")).with_remote("origin");

        vcs.add_branch(&b("published"), &b("main"), "published work");
        vcs.publish(&b("published"));
        vcs.add_branch(&b("merged"), &b("main"), "merged work");
        vcs.commit_on_remote(&b("main"), "upstream work");

        let mut model = StackModel::new(b("main"));
        model.add_managed(b("published"), b("main"), "published work").unwrap();
        model.add_managed(b("merged"), b("main"), "merged work").unwrap();
        store.save(&model).unwrap();

        Self {
            _dir: dir,
            store,
            vcs,
        }
    }

    fn sync(&self, answers: &str) -> Result<gtstack::engine::SyncReport, SyncError> {
        let options = StackOptions::default();
        let mut prompt = LineConfirm::new(answers.as_bytes(), Vec::new());
        SyncEngine::new(&self.vcs, &self.store, &options).run(Some(&mut prompt as &mut dyn Confirm))
    }

    fn model(&self) -> StackModel {
        self.store.load().unwrap()
    }
}

// =============================================================================
// Sync
// =============================================================================

mod sync {
    use super::*;

    #[test]
    fn declined_deletion_is_rebased_and_kept() {
        let fx = Fixture::new();

        let report = fx.sync("n\n").unwrap();

        assert_eq!(report.kept, vec![b("merged")]);
        assert!(report.rebased.contains(&b("merged")));
        assert!(fx.vcs.contains(&b("merged"), &b("main")));
        assert!(fx.model().is_managed(&b("merged")));
    }

    #[test]
    fn confirmed_deletion_removes_branch_and_record() {
        let fx = Fixture::new();

        let report = fx.sync("yes\n").unwrap();

        assert_eq!(report.deleted, vec![b("merged")]);
        assert!(!fx.vcs.has_local(&b("merged")));
        assert!(!fx.model().is_managed(&b("merged")));
        assert!(fx.model().is_managed(&b("published")));
        assert!(fx.vcs.contains(&b("published"), &b("main")));
    }

    #[test]
    fn confirmed_deletion_survives_later_fatal_failure() {
        let fx = Fixture::new();
        fx.vcs.conflict_on_rebase(&b("published"));
        let fx = Fixture {
            vcs: fx.vcs.fail_on(VcsOp::RebaseAbort),
            ..fx
        };

        assert!(fx.sync("y\n").is_err());

        assert!(!fx.model().is_managed(&b("merged")));
        assert!(fx.model().is_managed(&b("published")));
    }

    #[test]
    fn conflict_on_one_branch_does_not_block_others() {
        let fx = Fixture::new();
        fx.vcs.conflict_on_rebase(&b("published"));

        let report = fx.sync("n\n").unwrap();

        assert!(report.has_failed(&b("published")));
        assert!(report.failed[0].diagnostic.contains("CONFLICT"));
        assert!(report.rebased.contains(&b("merged")));
        assert!(!fx.vcs.rebase_in_progress().unwrap());
    }

    #[test]
    fn diverged_trunk_is_fatal_and_untouched() {
        let fx = Fixture::new();
        fx.vcs.commit_on(&b("main"), "local only");
        let before = fx.vcs.tip(&b("main"));

        let err = fx.sync("y\n").unwrap_err();

        assert!(matches!(err, SyncError::TrunkNotFastForward { .. }));
        assert_eq!(err.category(), ErrorCategory::ExternalToolFailure);
        assert_eq!(fx.vcs.tip(&b("main")), before);
        assert!(fx.vcs.has_local(&b("merged")));
        assert!(!fx
            .vcs
            .operations()
            .iter()
            .any(|op| matches!(op, MockOperation::Rebase { .. })));
    }

    #[test]
    fn fetch_failure_is_fatal() {
        let fx = Fixture::new();
        let fx = Fixture {
            vcs: fx.vcs.fail_on(VcsOp::Fetch),
            ..fx
        };

        let err = fx.sync("y\n").unwrap_err();

        assert!(matches!(err, SyncError::FetchFailed { .. }));
        assert!(fx.model().is_managed(&b("merged")));
    }

    #[test]
    fn non_interactive_keeps_missing_branches() {
        let fx = Fixture::new();
        let options = StackOptions::default();

        let report = SyncEngine::new(&fx.vcs, &fx.store, &options)
            .run(None)
            .unwrap();

        assert_eq!(report.kept, vec![b("merged")]);
        assert!(report.warnings.iter().any(|w| w.contains("non-interactive")));
        assert!(fx.vcs.has_local(&b("merged")));
    }

    #[test]
    fn returns_to_starting_branch() {
        let fx = Fixture::new();
        fx.vcs.checkout(&b("published")).unwrap();

        fx.sync("n\n").unwrap();

        assert_eq!(fx.vcs.head().unwrap(), Head::Branch(b("published")));
    }

    #[test]
    fn deleting_starting_branch_falls_back_to_trunk() {
        let fx = Fixture::new();
        fx.vcs.checkout(&b("merged")).unwrap();

        let report = fx.sync("y\n").unwrap();

        assert_eq!(fx.vcs.head().unwrap(), Head::Branch(b("main")));
        assert_eq!(
            report.position,
            gtstack::engine::FinalPosition::FellBackToTrunk(b("main"))
        );
    }

    #[test]
    fn parent_strategy_with_reparent_policy_restacks_chain() {
        let fx = Fixture::new();
        fx.vcs.add_branch(&b("child"), &b("merged"), "child work");
        fx.vcs.publish(&b("child"));
        let mut model = fx.model();
        model.add_managed(b("child"), b("merged"), "").unwrap();
        fx.store.save(&model).unwrap();

        let options = StackOptions {
            restack: RestackStrategy::Parent,
            removal: RemovalPolicy::Reparent,
            ..StackOptions::default()
        };
        let mut prompt = LineConfirm::new("y\n".as_bytes(), Vec::new());
        let report = SyncEngine::new(&fx.vcs, &fx.store, &options)
            .run(Some(&mut prompt as &mut dyn Confirm))
            .unwrap();

        assert_eq!(report.deleted, vec![b("merged")]);
        assert_eq!(fx.model().resolve_parent(&b("child")), &b("main"));
        assert!(fx.vcs.contains(&b("child"), &b("main")));
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

mod lifecycle_ops {
    use super::*;

    fn setup() -> (TempDir, StateStore, MockVcs) {
        let dir = TempDir::new().unwrap();
        let store = StateStore::at(dir.path().join("gt/config.json"), b("main"));
        (dir, store, MockVcs::new(&b("main")))
    }

    fn fix_bug() -> CreateRequest {
        CreateRequest {
            name: None,
            message: Some("fix bug".to_string()),
            stage_all: true,
        }
    }

    #[test]
    fn create_then_pop_round_trip() {
        let (_dir, store, vcs) = setup();
        let options = StackOptions::default();
        vcs.write_file("bug.rs");

        let created = lifecycle::create(&vcs, &store, &options, &fix_bug()).unwrap();
        assert_eq!(created.branch, b("fix-bug"));

        let json = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["trunk_branch"], "main");
        assert_eq!(value["managed_branches"]["fix-bug"]["parent"], "main");
        assert_eq!(value["managed_branches"]["fix-bug"]["description"], "fix bug");

        let popped = lifecycle::pop(&vcs, &store, &options).unwrap();
        assert_eq!(popped.parent, b("main"));
        assert_eq!(vcs.head().unwrap(), Head::Branch(b("main")));
        assert_eq!(vcs.unstaged(), vec!["bug.rs".to_string()]);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn create_again_is_a_collision() {
        let (_dir, store, vcs) = setup();
        let options = StackOptions::default();
        vcs.write_file("bug.rs");
        lifecycle::create(&vcs, &store, &options, &fix_bug()).unwrap();
        vcs.checkout(&b("main")).unwrap();

        let err = lifecycle::create(&vcs, &store, &options, &fix_bug()).unwrap_err();

        assert!(matches!(err, LifecycleError::BranchAlreadyExists { .. }));
    }

    #[test]
    fn modify_on_trunk_never_amends() {
        let (_dir, store, vcs) = setup();

        let err = lifecycle::modify(&vcs, &store, &StackOptions::default(), &ModifyRequest::default())
            .unwrap_err();

        assert!(matches!(err, LifecycleError::ModifyOnTrunk(_)));
        assert!(!vcs
            .operations()
            .iter()
            .any(|op| matches!(op, MockOperation::Amend(_))));
    }

    #[test]
    fn pop_with_reparent_policy_moves_children() {
        let (_dir, store, vcs) = setup();
        vcs.add_branch(&b("a"), &b("main"), "a");
        vcs.add_branch(&b("b"), &b("a"), "b");
        let mut model = StackModel::new(b("main"));
        model.add_managed(b("a"), b("main"), "").unwrap();
        model.add_managed(b("b"), b("a"), "").unwrap();
        store.save(&model).unwrap();
        vcs.checkout(&b("a")).unwrap();

        let options = StackOptions {
            removal: RemovalPolicy::Reparent,
            ..StackOptions::default()
        };
        lifecycle::pop(&vcs, &store, &options).unwrap();

        let model = store.load().unwrap();
        assert!(!model.is_managed(&b("a")));
        assert_eq!(model.resolve_parent(&b("b")), &b("main"));
        assert!(model.dangling().is_empty());
    }
}
