//! Repo overview tests against local git fixtures

use std::fs;
use std::path::Path;
use std::process::Command as StdCommand;
use std::sync::Arc;
use steward::features::Feature;
use steward::features::repo_overview::{OverviewSettings, RepoOverview};
use steward::notes::NotesSettings;
use steward::system::{RealSystem, System};
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

/// Initialize a repository with a single commit on main
fn init_repo(path: &Path) {
    fs::create_dir_all(path).unwrap();
    git(path, &["init"]);
    git(path, &["config", "user.email", "test@test.com"]);
    git(path, &["config", "user.name", "Test User"]);
    fs::write(path.join("README.md"), "fixture\n").unwrap();
    git(path, &["add", "."]);
    git(path, &["commit", "-m", "Initial commit"]);
    git(path, &["branch", "-M", "main"]);
}

fn overview_into(root: &Path, vault: &Path, settings: OverviewSettings) -> RepoOverview {
    let settings = OverviewSettings {
        root: root.to_str().unwrap().to_owned(),
        notes: NotesSettings {
            enabled: true,
            vault: Some(vault.to_str().unwrap().to_owned()),
            note: Some("overview.md".to_owned()),
            ..NotesSettings::default()
        },
        ..settings
    };
    RepoOverview::new(settings, Arc::new(RealSystem::new()) as Arc<dyn System>).unwrap()
}

fn read_note(vault: &Path) -> String {
    fs::read_to_string(vault.join("overview.md")).unwrap()
}

#[test]
fn discovers_and_renders_repositories() {
    let root = TempDir::new().unwrap();
    let vault = TempDir::new().unwrap();

    init_repo(&root.path().join("alpha"));
    init_repo(&root.path().join("tools/beta"));
    fs::write(root.path().join("tools/beta/untracked.txt"), "wip\n").unwrap();
    fs::create_dir_all(root.path().join("not_a_repo")).unwrap();
    init_repo(&root.path().join("node_modules/hidden"));

    let mut overview = overview_into(root.path(), vault.path(), OverviewSettings::default());
    overview.run_once().unwrap();

    let note = read_note(vault.path());
    assert!(note.starts_with("## Repo Overview ("));
    assert!(note.contains("| Project | Branch | Last Push | Uncommitted Changes | Flag |"));

    // Without an upstream every column is deterministic
    assert!(note.contains("| [[alpha]] | main | no upstream | no | - |"));
    assert!(note.contains("| [[beta]] | main | no upstream | yes (1) | - |"));

    // Ignored directories are never descended into
    assert!(!note.contains("hidden"));
    assert!(!note.contains("not_a_repo"));
}

#[test]
fn nested_repositories_are_reported_once() {
    let root = TempDir::new().unwrap();
    let vault = TempDir::new().unwrap();

    init_repo(&root.path().join("outer"));
    init_repo(&root.path().join("outer/vendor/inner"));

    let mut overview = overview_into(root.path(), vault.path(), OverviewSettings::default());
    overview.run_once().unwrap();

    let note = read_note(vault.path());
    assert!(note.contains("[[outer]]"));
    assert!(!note.contains("inner"));
}

#[test]
fn max_depth_limits_discovery() {
    let root = TempDir::new().unwrap();
    let vault = TempDir::new().unwrap();

    init_repo(&root.path().join("alpha"));
    init_repo(&root.path().join("tools/beta"));

    let settings = OverviewSettings {
        max_depth: 1,
        ..OverviewSettings::default()
    };
    let mut overview = overview_into(root.path(), vault.path(), settings);
    overview.run_once().unwrap();

    let note = read_note(vault.path());
    assert!(note.contains("[[alpha]]"));
    assert!(!note.contains("beta"));
}

#[test]
fn note_is_replaced_on_every_pass() {
    let root = TempDir::new().unwrap();
    let vault = TempDir::new().unwrap();
    init_repo(&root.path().join("alpha"));

    let mut overview = overview_into(root.path(), vault.path(), OverviewSettings::default());
    overview.run_once().unwrap();
    overview.run_once().unwrap();

    let note = read_note(vault.path());
    assert_eq!(note.matches("## Repo Overview (").count(), 1);
}

#[test]
fn empty_root_renders_a_placeholder_row() {
    let root = TempDir::new().unwrap();
    let vault = TempDir::new().unwrap();

    let mut overview = overview_into(root.path(), vault.path(), OverviewSettings::default());
    overview.run_once().unwrap();

    let note = read_note(vault.path());
    assert!(note.contains("| - | - | - | - | - |"));
}

#[test]
fn missing_root_skips_publication() {
    let root = TempDir::new().unwrap();
    let vault = TempDir::new().unwrap();
    let absent = root.path().join("absent");

    let mut overview = overview_into(&absent, vault.path(), OverviewSettings::default());
    overview.run_once().unwrap();

    assert!(!vault.path().join("overview.md").exists());
}

#[test]
fn pushed_repo_shows_a_push_time() {
    let bare_dir = TempDir::new().unwrap();
    git(bare_dir.path(), &["init", "--bare", "origin.git"]);
    let bare = bare_dir.path().join("origin.git");

    let root = TempDir::new().unwrap();
    let vault = TempDir::new().unwrap();
    git(root.path(), &["clone", bare.to_str().unwrap(), "pusher"]);

    let pusher = root.path().join("pusher");
    git(&pusher, &["config", "user.email", "test@test.com"]);
    git(&pusher, &["config", "user.name", "Test User"]);
    fs::write(pusher.join("file.txt"), "x\n").unwrap();
    git(&pusher, &["add", "."]);
    git(&pusher, &["commit", "-m", "Initial commit"]);
    git(&pusher, &["branch", "-M", "main"]);
    git(&pusher, &["push", "-u", "origin", "main"]);

    let mut overview = overview_into(root.path(), vault.path(), OverviewSettings::default());
    overview.run_once().unwrap();

    let note = read_note(vault.path());
    let row = note
        .lines()
        .find(|line| line.contains("[[pusher]]"))
        .unwrap();

    // A freshly pushed, clean repository carries a timestamp and no flags
    assert!(row.contains("| main |"));
    assert!(!row.contains("no upstream"));
    assert!(row.ends_with("| no | - |"));
}
