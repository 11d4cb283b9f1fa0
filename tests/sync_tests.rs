//! Repository synchronization tests against local git fixtures

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;
use steward::config::RepositoryConfig;
use steward::error::StewardError;
use steward::sync::Worktree;
use tempfile::TempDir;

/// Run git in `dir`, asserting success
fn git(dir: &Path, args: &[&str]) -> String {
    let output = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_owned()
}

/// Create an origin with two commits on main and a tag on the first
fn create_origin() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let repo = temp_dir.path();

    git(repo, &["init"]);
    git(repo, &["config", "user.email", "test@test.com"]);
    git(repo, &["config", "user.name", "Test User"]);

    fs::write(repo.join("service.conf"), "mode = primary\n").unwrap();
    git(repo, &["add", "."]);
    git(repo, &["commit", "-m", "Initial commit"]);
    git(repo, &["branch", "-M", "main"]);
    git(repo, &["tag", "v1.0.0"]);

    fs::write(repo.join("service.conf"), "mode = secondary\n").unwrap();
    git(repo, &["add", "."]);
    git(repo, &["commit", "-m", "Switch to secondary"]);

    let abs = repo.canonicalize().unwrap();
    (temp_dir, abs)
}

fn repository(origin: &Path, reference: &str, dest: &Path) -> RepositoryConfig {
    RepositoryConfig {
        url: format!("file://{}", origin.display()),
        reference: reference.to_owned(),
        dest: dest.to_str().unwrap().to_owned(),
    }
}

#[test]
fn clones_and_pins_a_branch() {
    let (_origin_dir, origin) = create_origin();
    let work = TempDir::new().unwrap();
    let dest = work.path().join("repos/app");

    let config = repository(&origin, "main", &dest);
    Worktree::new(&config).unwrap().sync().unwrap();

    // HEAD matches the branch tip, detached
    assert_eq!(git(&dest, &["rev-parse", "HEAD"]), git(&origin, &["rev-parse", "main"]));
    assert_eq!(
        fs::read_to_string(dest.join("service.conf")).unwrap(),
        "mode = secondary\n"
    );
}

#[test]
fn pins_a_tag_to_its_commit() {
    let (_origin_dir, origin) = create_origin();
    let work = TempDir::new().unwrap();
    let dest = work.path().join("app");

    let config = repository(&origin, "v1.0.0", &dest);
    Worktree::new(&config).unwrap().sync().unwrap();

    assert_eq!(
        git(&dest, &["rev-parse", "HEAD"]),
        git(&origin, &["rev-parse", "v1.0.0^{commit}"])
    );
    assert_eq!(
        fs::read_to_string(dest.join("service.conf")).unwrap(),
        "mode = primary\n"
    );
}

#[test]
fn pins_an_exact_commit() {
    let (_origin_dir, origin) = create_origin();
    let first_commit = git(&origin, &["rev-parse", "HEAD~1"]);
    let work = TempDir::new().unwrap();
    let dest = work.path().join("app");

    let config = repository(&origin, &first_commit, &dest);
    Worktree::new(&config).unwrap().sync().unwrap();

    assert_eq!(git(&dest, &["rev-parse", "HEAD"]), first_commit);
}

#[test]
fn resync_discards_local_drift() {
    let (_origin_dir, origin) = create_origin();
    let work = TempDir::new().unwrap();
    let dest = work.path().join("app");

    let config = repository(&origin, "main", &dest);
    let worktree = Worktree::new(&config).unwrap();
    worktree.sync().unwrap();

    // Tamper with a tracked file between runs
    fs::write(dest.join("service.conf"), "mode = tampered\n").unwrap();

    worktree.sync().unwrap();
    assert_eq!(
        fs::read_to_string(dest.join("service.conf")).unwrap(),
        "mode = secondary\n"
    );
}

#[test]
fn resync_follows_branch_updates() {
    let (_origin_dir, origin) = create_origin();
    let work = TempDir::new().unwrap();
    let dest = work.path().join("app");

    let config = repository(&origin, "main", &dest);
    let worktree = Worktree::new(&config).unwrap();
    worktree.sync().unwrap();

    fs::write(origin.join("service.conf"), "mode = tertiary\n").unwrap();
    git(&origin, &["add", "."]);
    git(&origin, &["commit", "-m", "Third mode"]);

    worktree.sync().unwrap();
    assert_eq!(git(&dest, &["rev-parse", "HEAD"]), git(&origin, &["rev-parse", "main"]));
    assert_eq!(
        fs::read_to_string(dest.join("service.conf")).unwrap(),
        "mode = tertiary\n"
    );
}

#[test]
fn repin_moves_head_backwards() {
    let (_origin_dir, origin) = create_origin();
    let work = TempDir::new().unwrap();
    let dest = work.path().join("app");

    Worktree::new(&repository(&origin, "main", &dest))
        .unwrap()
        .sync()
        .unwrap();

    // Same destination, older ref: the working copy follows
    Worktree::new(&repository(&origin, "v1.0.0", &dest))
        .unwrap()
        .sync()
        .unwrap();

    assert_eq!(
        fs::read_to_string(dest.join("service.conf")).unwrap(),
        "mode = primary\n"
    );
}

#[test]
fn missing_ref_fails_and_recovers() {
    let (_origin_dir, origin) = create_origin();
    let work = TempDir::new().unwrap();
    let dest = work.path().join("app");

    let err = Worktree::new(&repository(&origin, "does-not-exist", &dest))
        .unwrap()
        .sync()
        .unwrap_err();

    let steward_err = err.downcast_ref::<StewardError>().unwrap();
    assert_eq!(steward_err.exit_code(), 5);
    assert!(err.to_string().contains("Ref 'does-not-exist' not found"));

    // The clone itself survives the failed pin
    assert!(dest.join(".git").is_dir());

    // A corrected ref on the next run succeeds without a re-clone
    Worktree::new(&repository(&origin, "main", &dest))
        .unwrap()
        .sync()
        .unwrap();
    assert_eq!(git(&dest, &["rev-parse", "HEAD"]), git(&origin, &["rev-parse", "main"]));
}

#[test]
fn test_sync_only_flag() {
    let (_origin_dir, origin) = create_origin();
    let work = TempDir::new().unwrap();
    let dest = work.path().join("repos/app");

    let config = format!(
        "repositories:\n  - url: \"file://{}\"\n    ref: main\n    dest: \"{}\"\n",
        origin.display(),
        dest.display()
    );
    fs::write(work.path().join("steward.yaml"), config).unwrap();

    let mut cmd = Command::cargo_bin("steward").unwrap();
    cmd.arg("--config")
        .arg(work.path().join("steward.yaml"))
        .arg("--sync-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("pinned to 'main'"));

    assert!(dest.join(".git").is_dir());
}

#[test]
fn test_sync_missing_ref_exit_code() {
    let (_origin_dir, origin) = create_origin();
    let work = TempDir::new().unwrap();
    let dest = work.path().join("app");

    let config = format!(
        "repositories:\n  - url: \"file://{}\"\n    ref: ghost\n    dest: \"{}\"\n",
        origin.display(),
        dest.display()
    );
    fs::write(work.path().join("steward.yaml"), config).unwrap();

    let mut cmd = Command::cargo_bin("steward").unwrap();
    cmd.arg("--config")
        .arg(work.path().join("steward.yaml"))
        .arg("--sync-only")
        .assert()
        .failure()
        .code(5) // Ref not found
        .stdout(predicate::str::contains("Ref 'ghost' not found"));
}
