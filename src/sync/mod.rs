//! Repository synchronization
//!
//! Keeps configured git working copies pinned to their refs. Git runs
//! as a subprocess; the binary is part of the runtime environment, not
//! a library dependency.

pub mod repository;
pub mod worktree;

pub use repository::RetryPolicy;
pub use worktree::{Worktree, check_git_availability};

use crate::config::RepositoryConfig;
use anyhow::Result;
use tracing::debug;

/// Synchronize every configured repository, in declaration order
///
/// The first failure aborts the remaining entries. With nothing to
/// sync, git is never invoked at all.
pub fn sync_all(repositories: &[RepositoryConfig]) -> Result<()> {
    if repositories.is_empty() {
        debug!("No repositories configured; skipping synchronization");
        return Ok(());
    }

    check_git_availability()?;

    for repository in repositories {
        let worktree = Worktree::new(repository)?;
        worktree.sync()?;
    }

    Ok(())
}
