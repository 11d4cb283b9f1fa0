//! Git repository status overview
//!
//! Walks a projects root looking for git working copies and publishes
//! a markdown status table: current branch, last push time, dirty
//! state and attention flags.

use crate::config::Config;
use crate::error::StewardError;
use crate::notes::{NotesSettings, NotesSink, PublishMode};
use crate::system::System;
use crate::utils::path::expand_tilde;
use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use walkdir::WalkDir;

use super::Feature;

/// Settings table for the repo overview
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewSettings {
    /// Directory scanned for git working copies
    pub root: String,
    /// Seconds between two passes
    pub scan_interval_seconds: u64,
    /// Maximum scan depth below the root, negative for unlimited
    pub max_depth: i64,
    /// Directory names never descended into
    pub ignore_dirs: Vec<String>,
    /// Section title of the published note
    pub title: String,
    /// Notes sink for the status table
    pub notes: NotesSettings,
}

impl Default for OverviewSettings {
    fn default() -> Self {
        Self {
            root: "/projects".to_owned(),
            scan_interval_seconds: 900,
            max_depth: 6,
            ignore_dirs: vec![
                "node_modules".to_owned(),
                "target".to_owned(),
                ".venv".to_owned(),
                "venv".to_owned(),
                "__pycache__".to_owned(),
            ],
            title: "Repo Overview".to_owned(),
            notes: NotesSettings::default(),
        }
    }
}

/// Status of one discovered repository
#[derive(Debug, Clone)]
struct RepoStatus {
    project: String,
    branch: String,
    last_push: String,
    last_push_at: Option<DateTime<Utc>>,
    dirty_count: usize,
}

/// Publishes a status table of all repositories under a root
pub struct RepoOverview {
    system: Arc<dyn System>,
    settings: OverviewSettings,
    root: PathBuf,
    sink: Option<NotesSink>,
}

impl RepoOverview {
    pub const KEY: &'static str = "repo_overview";

    pub fn from_config(config: &Config, system: Arc<dyn System>) -> Result<Self> {
        let settings = super::settings_from_config(config, Self::KEY)?;
        Self::new(settings, system)
    }

    pub fn new(settings: OverviewSettings, system: Arc<dyn System>) -> Result<Self> {
        if settings.scan_interval_seconds == 0 {
            return Err(StewardError::validation(format!(
                "features.{}: scan_interval_seconds must be at least 1",
                Self::KEY
            ))
            .into());
        }

        let root = expand_tilde(system.as_ref(), &settings.root);
        let sink = settings.notes.resolve(system.as_ref(), Self::KEY);

        Ok(Self {
            system,
            settings,
            root,
            sink,
        })
    }

    /// Find git working copies under the root
    ///
    /// A directory containing `.git` is recorded and not descended
    /// into, so nested repositories are reported once.
    fn discover(&self) -> Vec<PathBuf> {
        let mut repos = Vec::new();
        let mut walker = WalkDir::new(&self.root).into_iter();

        loop {
            let entry = match walker.next() {
                Some(Ok(entry)) => entry,
                Some(Err(e)) => {
                    debug!("Skipping unreadable entry: {e}");
                    continue;
                }
                None => break,
            };

            if !entry.file_type().is_dir() || entry.depth() == 0 {
                continue;
            }
            if self.settings.max_depth >= 0 && entry.depth() as i64 > self.settings.max_depth {
                walker.skip_current_dir();
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if self.settings.ignore_dirs.iter().any(|ignored| ignored == name.as_ref()) {
                walker.skip_current_dir();
                continue;
            }

            if entry.path().join(".git").is_dir() {
                repos.push(entry.path().to_path_buf());
                walker.skip_current_dir();
            }
        }

        repos
    }

    fn publish(&self, statuses: &[RepoStatus]) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };

        let lines = build_table_lines(statuses, Utc::now());
        if let Err(e) = sink.publish(
            self.system.as_ref(),
            &self.settings.title,
            &lines.join("\n"),
            PublishMode::Replace,
        ) {
            error!("Failed to publish overview note: {e}");
        }
    }
}

impl Feature for RepoOverview {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(self.settings.scan_interval_seconds)
    }

    fn run_once(&mut self) -> Result<()> {
        if !self.root.is_dir() {
            error!("Overview root does not exist: {}", self.root.display());
            return Ok(());
        }

        let repos = self.discover();
        let mut statuses: Vec<RepoStatus> =
            repos.iter().filter_map(|path| inspect_repo(path)).collect();
        statuses.sort_by_key(|status| status.project.to_lowercase());

        info!("Overview pass done: repos={}", statuses.len());
        self.publish(&statuses);
        Ok(())
    }
}

/// Run git in a repository, `None` on any failure
fn run_git(repo_path: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo_path)
        .args(args)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}

fn inspect_repo(repo_path: &Path) -> Option<RepoStatus> {
    let branch = run_git(repo_path, &["rev-parse", "--abbrev-ref", "HEAD"])?;

    let status_output = run_git(repo_path, &["status", "--porcelain"]).unwrap_or_default();
    let dirty_count = status_output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .count();

    let (last_push, last_push_at) = resolve_last_push(repo_path);

    let project = repo_path.file_name().map_or_else(
        || repo_path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    );

    Some(RepoStatus {
        project,
        branch,
        last_push,
        last_push_at,
        dirty_count,
    })
}

/// Last push time of the upstream branch
///
/// The upstream reflog is searched for the newest push entry; without
/// one, the upstream tip's commit date stands in.
fn resolve_last_push(repo_path: &Path) -> (String, Option<DateTime<Utc>>) {
    let Some(upstream) = run_git(
        repo_path,
        &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"],
    ) else {
        return ("no upstream".to_owned(), None);
    };
    if upstream.is_empty() {
        return ("no upstream".to_owned(), None);
    }

    if let Some(reflog) = run_git(
        repo_path,
        &[
            "reflog",
            "show",
            "--date=iso-strict",
            "--format=%cd|%gs",
            &upstream,
            "-n",
            "100",
        ],
    ) {
        for line in reflog.lines() {
            let Some((when, message)) = line.split_once('|') else {
                continue;
            };
            if message.to_lowercase().contains("update by push") {
                return (when.to_owned(), parse_git_datetime(when));
            }
        }
    }

    if let Some(date) = run_git(
        repo_path,
        &["log", "-1", "--date=iso-strict", "--format=%cd", "@{u}"],
    ) {
        if !date.is_empty() {
            let parsed = parse_git_datetime(&date);
            return (date, parsed);
        }
    }

    ("unknown".to_owned(), None)
}

/// Parse a git iso-strict date, with a plain-naive fallback
fn parse_git_datetime(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn build_table_lines(statuses: &[RepoStatus], now: DateTime<Utc>) -> Vec<String> {
    let mut lines = vec![
        "| Project | Branch | Last Push | Uncommitted Changes | Flag |".to_owned(),
        "|---|---|---|---|---|".to_owned(),
    ];

    if statuses.is_empty() {
        lines.push("| - | - | - | - | - |".to_owned());
        return lines;
    }

    for status in statuses {
        let uncommitted = if status.dirty_count > 0 {
            format!("yes ({})", status.dirty_count)
        } else {
            "no".to_owned()
        };

        lines.push(format!(
            "| {} | {} | {} | {} | {} |",
            md_cell(&format!("[[{}]]", status.project)),
            md_cell(&status.branch),
            md_cell(&status.last_push),
            md_cell(&uncommitted),
            md_cell(&build_flags(status, now)),
        ));
    }

    lines
}

/// Attention flags for one repository row
fn build_flags(status: &RepoStatus, now: DateTime<Utc>) -> String {
    let Some(last_push_at) = status.last_push_at else {
        return "-".to_owned();
    };

    let age = now.signed_duration_since(last_push_at);
    let mut flags = Vec::new();

    if age > chrono::Duration::days(7) {
        flags.push("stale>7d");
    }
    if age > chrono::Duration::hours(24) && status.dirty_count > 0 {
        flags.push("dirty+24h");
    }

    if flags.is_empty() {
        "-".to_owned()
    } else {
        flags.join(", ")
    }
}

/// Escape a value for use inside a markdown table cell
fn md_cell(value: &str) -> String {
    let escaped = value.replace('|', "\\|");
    let trimmed = escaped.trim();
    if trimmed.is_empty() {
        "-".to_owned()
    } else {
        trimmed.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(project: &str, pushed_hours_ago: Option<i64>, dirty: usize) -> RepoStatus {
        let now = Utc::now();
        let last_push_at = pushed_hours_ago.map(|hours| now - chrono::Duration::hours(hours));
        RepoStatus {
            project: project.to_owned(),
            branch: "main".to_owned(),
            last_push: last_push_at
                .map_or_else(|| "no upstream".to_owned(), |at| at.to_rfc3339()),
            last_push_at,
            dirty_count: dirty,
        }
    }

    #[test]
    fn escapes_pipes_in_cells() {
        assert_eq!(md_cell("a|b"), "a\\|b");
        assert_eq!(md_cell("  plain  "), "plain");
        assert_eq!(md_cell("   "), "-");
    }

    #[test]
    fn flags_stale_and_dirty_repos() {
        let now = Utc::now();
        assert_eq!(build_flags(&status("a", Some(8 * 24), 0), now), "stale>7d");
        assert_eq!(build_flags(&status("b", Some(30), 3), now), "dirty+24h");
        assert_eq!(
            build_flags(&status("c", Some(8 * 24), 1), now),
            "stale>7d, dirty+24h"
        );
        assert_eq!(build_flags(&status("d", Some(1), 5), now), "-");
        assert_eq!(build_flags(&status("e", None, 5), now), "-");
    }

    #[test]
    fn renders_placeholder_row_when_empty() {
        let lines = build_table_lines(&[], Utc::now());
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "| - | - | - | - | - |");
    }

    #[test]
    fn renders_project_links_and_dirty_counts() {
        let statuses = vec![status("steward", Some(2), 4)];
        let lines = build_table_lines(&statuses, Utc::now());
        assert!(lines[2].contains("[[steward]]"));
        assert!(lines[2].contains("yes (4)"));
    }

    #[test]
    fn parses_iso_strict_and_naive_dates() {
        assert!(parse_git_datetime("2025-03-01T10:00:00+02:00").is_some());
        assert!(parse_git_datetime("2025-03-01 10:00:00").is_some());
        assert!(parse_git_datetime("last week").is_none());
    }
}
