//! End-to-end tests of the `gt` binary in temporary repositories.

use std::path::Path;
use std::process::Command as StdCommand;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct TestRepo {
    dir: TempDir,
    home: TempDir,
}

impl TestRepo {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp home");
        let repo = Self { dir, home };

        repo.git(&["init", "-q", "-b", "main"]);
        repo.git(&["config", "user.email", "test@example.com"]);
        repo.git(&["config", "user.name", "Test User"]);
        repo.git(&["config", "commit.gpgsign", "false"]);
        repo.write("README.md", "# Test Repo\n");
        repo.git(&["add", "README.md"]);
        repo.git(&["commit", "-q", "-m", "Initial commit"]);
        repo
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, file: &str, contents: &str) {
        std::fs::write(self.path().join(file), contents).unwrap();
    }

    fn git(&self, args: &[&str]) -> String {
        let out = StdCommand::new("git")
            .args(args)
            .current_dir(self.path())
            .output()
            .expect("failed to run git");
        assert!(out.status.success(), "git {:?} failed", args);
        String::from_utf8_lossy(&out.stdout).trim().to_string()
    }

    fn current_branch(&self) -> String {
        self.git(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    /// `gt` running in this repository with user settings isolated.
    fn gt(&self) -> Command {
        let mut cmd = Command::cargo_bin("gt").unwrap();
        cmd.current_dir(self.path())
            .env_remove("GT_CONFIG")
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.home.path())
            .arg("--no-interactive");
        cmd
    }
}

#[test]
fn help_lists_commands() {
    Command::cargo_bin("gt")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("create"));
}

#[test]
fn trunk_defaults_to_main() {
    let repo = TestRepo::new();
    repo.gt()
        .arg("trunk")
        .assert()
        .success()
        .stdout("main\n");
}

#[test]
fn create_log_pop() {
    let repo = TestRepo::new();
    repo.write("fix.txt", "fix\n");

    repo.gt()
        .args(["create", "-a", "-m", "Fix the bug"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fix-the-bug"));
    assert_eq!(repo.current_branch(), "fix-the-bug");
    assert_eq!(repo.git(&["log", "-1", "--format=%s"]), "Fix the bug");
    assert!(repo.path().join(".git/gt/config.json").exists());

    repo.gt()
        .arg("log")
        .assert()
        .success()
        .stdout(predicate::str::contains("└─ * fix-the-bug  Fix the bug"));

    repo.gt().arg("pop").assert().success();
    assert_eq!(repo.current_branch(), "main");
    assert!(repo.path().join("fix.txt").exists());
    assert!(repo.git(&["status", "--porcelain"]).contains("fix.txt"));
    assert_eq!(repo.git(&["branch", "--list", "fix-the-bug"]), "");
}

#[test]
fn create_off_trunk_fails() {
    let repo = TestRepo::new();
    repo.git(&["checkout", "-q", "-b", "side"]);

    repo.gt()
        .args(["create", "other"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("created from trunk 'main'"));
}

#[test]
fn create_without_name_or_message_fails() {
    let repo = TestRepo::new();
    repo.gt()
        .arg("create")
        .assert()
        .failure()
        .stderr(predicate::str::contains("commit message (-m) is required"));
}

#[test]
fn modify_on_trunk_fails_without_amending() {
    let repo = TestRepo::new();
    let before = repo.git(&["rev-parse", "HEAD"]);

    repo.gt()
        .arg("modify")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot modify trunk 'main'"));
    assert_eq!(repo.git(&["rev-parse", "HEAD"]), before);
}

#[test]
fn modify_amends_current_branch() {
    let repo = TestRepo::new();
    repo.write("a.txt", "a\n");
    repo.gt().args(["create", "-a", "-m", "add a"]).assert().success();
    repo.write("a.txt", "a2\n");

    repo.gt()
        .args(["modify", "-a", "-m", "add a, revised"])
        .assert()
        .success();

    assert_eq!(repo.git(&["log", "-1", "--format=%s"]), "add a, revised");
    assert_eq!(repo.git(&["rev-list", "--count", "HEAD"]), "2");
}

#[test]
fn continue_without_rebase_fails() {
    let repo = TestRepo::new();
    repo.gt()
        .arg("continue")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no rebase in progress"));
}

#[test]
fn sync_without_remote_fails_on_fetch() {
    let repo = TestRepo::new();
    repo.gt()
        .arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to fetch from 'origin'"));
    assert_eq!(repo.current_branch(), "main");
}

#[test]
fn sync_against_local_remote() {
    let upstream = TestRepo::new();
    let repo = TestRepo::new();
    repo.git(&["remote", "add", "origin", upstream.path().to_str().unwrap()]);
    repo.git(&["fetch", "-q", "origin"]);
    repo.git(&["reset", "-q", "--hard", "origin/main"]);
    repo.write("feature.txt", "feature\n");
    repo.gt().args(["create", "-a", "-m", "feature"]).assert().success();
    upstream.write("upstream.txt", "upstream\n");
    upstream.git(&["add", "upstream.txt"]);
    upstream.git(&["commit", "-q", "-m", "upstream change"]);

    repo.gt()
        .arg("sync")
        .assert()
        .success()
        .stderr(predicate::str::contains("keeping it (non-interactive)"));

    assert_eq!(repo.current_branch(), "feature");
    assert!(repo.path().join("upstream.txt").exists());
}

#[test]
fn sync_conflict_is_aborted_and_other_branches_restacked() {
    let upstream = TestRepo::new();
    let repo = TestRepo::new();
    repo.git(&["remote", "add", "origin", upstream.path().to_str().unwrap()]);
    repo.git(&["fetch", "-q", "origin"]);
    repo.git(&["reset", "-q", "--hard", "origin/main"]);

    repo.write("README.md", "# Local edit\n");
    repo.gt().args(["create", "-a", "-m", "clash"]).assert().success();
    repo.git(&["checkout", "-q", "main"]);
    repo.write("other.txt", "other\n");
    repo.gt().args(["create", "-a", "-m", "other"]).assert().success();
    repo.git(&["checkout", "-q", "main"]);
    let clash_before = repo.git(&["rev-parse", "clash"]);

    upstream.write("README.md", "# Upstream edit\n");
    upstream.git(&["commit", "-q", "-am", "upstream readme"]);

    repo.gt()
        .arg("sync")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("could not restack clash"))
        .stderr(predicate::str::contains("1 branch(es) could not be restacked"));

    assert!(!repo.path().join(".git/rebase-merge").exists());
    assert!(!repo.path().join(".git/rebase-apply").exists());
    assert_eq!(repo.current_branch(), "main");
    assert_eq!(repo.git(&["rev-parse", "clash"]), clash_before);
    repo.git(&["merge-base", "--is-ancestor", "origin/main", "other"]);
    assert!(repo.path().join(".git/gt/config.json").exists());
}

#[test]
fn restack_with_nothing_managed() {
    let repo = TestRepo::new();
    repo.gt()
        .arg("restack")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to restack"));
}

#[test]
fn outside_a_repository_is_reported() {
    let dir = TempDir::new().unwrap();
    if git2::Repository::discover(dir.path()).is_ok() {
        // The temp dir sits inside some other repository; nothing to check.
        return;
    }

    Command::cargo_bin("gt")
        .unwrap()
        .current_dir(dir.path())
        .args(["--no-interactive", "log"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not a git working copy"));
}

#[test]
fn invalid_settings_are_reported() {
    let repo = TestRepo::new();
    std::fs::create_dir_all(repo.path().join(".git/gt")).unwrap();
    std::fs::write(repo.path().join(".git/gt/settings.toml"), "bogus = 1\n").unwrap();

    repo.gt()
        .arg("trunk")
        .assert()
        .failure()
        .stderr(predicate::str::contains("settings"));
}
