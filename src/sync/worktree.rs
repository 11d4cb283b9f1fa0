//! Clone-or-update logic for configured working copies

use crate::config::RepositoryConfig;
use crate::error::StewardError;
use crate::sync::repository::{RetryPolicy, is_transport_error, normalize_url};
use anyhow::{Context as _, Result};
use std::path::Path;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::thread;
use tracing::{debug, info, warn};

/// A local working copy pinned to a configured ref
pub struct Worktree {
    display_url: String,
    remote_url: String,
    reference: String,
    dest: PathBuf,
    retry: RetryPolicy,
}

impl Worktree {
    /// Create a worktree from its configuration entry
    pub fn new(config: &RepositoryConfig) -> Result<Self> {
        let remote_url = normalize_url(&config.url)?;

        Ok(Self {
            display_url: config.url.clone(),
            remote_url,
            reference: config.reference.clone(),
            dest: PathBuf::from(&config.dest),
            retry: RetryPolicy::default(),
        })
    }

    /// Override the default retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        return self;
    }

    /// Bring the working copy to the requested ref
    ///
    /// Clones when no working copy exists, otherwise fetches, then
    /// force-checks-out the resolved commit with a detached HEAD.
    pub fn sync(&self) -> Result<()> {
        if self.dest.join(".git").is_dir() {
            info!("Updating {} in {}", self.display_url, self.dest.display());
            self.fetch()?;
        } else {
            info!("Cloning {} into {}", self.display_url, self.dest.display());
            self.clone_repository()?;
        }

        let commit = self.resolve_reference()?;
        self.checkout(&commit)?;
        self.verify_head(&commit)?;

        info!(
            "{} pinned to '{}' ({})",
            self.dest.display(),
            self.reference,
            short_id(&commit)
        );
        Ok(())
    }

    fn clone_repository(&self) -> Result<()> {
        if let Some(parent) = self.dest.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| StewardError::io(parent.display().to_string(), e.to_string()))?;
        }

        let dest = self.dest.to_str().ok_or_else(|| {
            StewardError::io(
                self.dest.display().to_string(),
                "destination path is not valid UTF-8",
            )
        })?;

        // Only clean up a destination this clone itself created
        let created_by_clone = !self.dest.exists();

        self.transport_op(
            "clone",
            &["clone", "--no-checkout", &self.remote_url, dest],
            None,
            || {
                if created_by_clone {
                    self.remove_partial_clone();
                }
            },
        )
    }

    fn fetch(&self) -> Result<()> {
        self.transport_op(
            "fetch",
            &["fetch", "--prune", "--tags", "origin"],
            Some(&self.dest),
            || (),
        )
    }

    /// Resolve the configured ref to a commit id
    ///
    /// Remote branches win over tags and raw commit ids so that a
    /// moved branch follows the remote after a fetch.
    fn resolve_reference(&self) -> Result<String> {
        let candidates = [
            format!("refs/remotes/origin/{}", self.reference),
            format!("{}^{{commit}}", self.reference),
        ];

        for candidate in &candidates {
            let output = run_git(
                &["rev-parse", "--verify", "--quiet", candidate],
                Some(&self.dest),
            )?;
            if output.status.success() {
                let commit = String::from_utf8_lossy(&output.stdout).trim().to_owned();
                if !commit.is_empty() {
                    debug!("Resolved '{}' to {} via {}", self.reference, commit, candidate);
                    return Ok(commit);
                }
            }
        }

        Err(StewardError::ref_not_found(self.display_url.clone(), self.reference.clone()).into())
    }

    fn checkout(&self, commit: &str) -> Result<()> {
        let output = run_git(
            &["checkout", "--force", "--detach", commit],
            Some(&self.dest),
        )?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StewardError::sync(
                self.display_url.clone(),
                format!(
                    "checkout of '{}' failed: {}",
                    self.reference,
                    stderr.trim()
                ),
            )
            .into());
        }

        Ok(())
    }

    fn verify_head(&self, commit: &str) -> Result<()> {
        let output = run_git(&["rev-parse", "HEAD"], Some(&self.dest))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StewardError::sync(
                self.display_url.clone(),
                format!("could not verify HEAD after checkout: {}", stderr.trim()),
            )
            .into());
        }

        let head = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        if head != commit {
            return Err(StewardError::sync(
                self.display_url.clone(),
                format!("HEAD is {head} after checkout, expected {commit}"),
            )
            .into());
        }

        Ok(())
    }

    /// Run a network-facing git operation with bounded retries
    ///
    /// Only transport-looking failures are retried; everything else
    /// surfaces immediately. `cleanup` runs after every failed attempt.
    fn transport_op<F>(
        &self,
        operation: &str,
        args: &[&str],
        cwd: Option<&Path>,
        cleanup: F,
    ) -> Result<()>
    where
        F: Fn(),
    {
        let mut attempt = 1;
        loop {
            let output = run_git(args, cwd)?;
            if output.status.success() {
                return Ok(());
            }

            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            cleanup();

            if attempt >= self.retry.max_attempts || !is_transport_error(&stderr) {
                return Err(StewardError::sync(
                    self.display_url.clone(),
                    format!("git {operation} failed: {stderr}"),
                )
                .into());
            }

            let delay = self.retry.backoff(attempt);
            warn!(
                "git {} for {} failed (attempt {}/{}), retrying in {} ms: {}",
                operation,
                self.display_url,
                attempt,
                self.retry.max_attempts,
                delay.as_millis(),
                stderr
            );
            thread::sleep(delay);
            attempt += 1;
        }
    }

    fn remove_partial_clone(&self) {
        if self.dest.exists() && !self.dest.join(".git").is_dir() {
            debug!("Removing partial clone at {}", self.dest.display());
            if let Err(e) = std::fs::remove_dir_all(&self.dest) {
                warn!(
                    "Failed to remove partial clone at {}: {e}",
                    self.dest.display()
                );
            }
        }
    }
}

fn run_git(args: &[&str], cwd: Option<&Path>) -> Result<Output> {
    let mut command = Command::new("git");
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    command
        .output()
        .with_context(|| format!("Failed to execute git {}", args.first().unwrap_or(&"")))
}

fn short_id(commit: &str) -> &str {
    commit.get(..12).unwrap_or(commit)
}

/// Check that the git binary is available
///
/// # Errors
///
/// Returns an error if:
/// - The git command is not found
/// - The git command failed to execute properly
#[inline]
pub fn check_git_availability() -> Result<()> {
    let output = Command::new("git")
        .args(["--version"])
        .output()
        .context("Git command not found. Please ensure Git is installed and available in PATH")?;

    if !output.status.success() {
        return Err(StewardError::sync(
            "git".to_owned(),
            "git command failed to execute properly".to_owned(),
        )
        .into());
    }

    debug!("Using {}", String::from_utf8_lossy(&output.stdout).trim());
    Ok(())
}
