//! Repository URL normalization and retry policy

use crate::error::StewardError;
use anyhow::Result;
use std::time::Duration;

/// Normalize a repository URL to a form accepted by the git remote
///
/// Short `org/repo` names expand to their GitHub HTTPS form. `file:`
/// URLs resolve to the underlying local path so git clones them as
/// plain directories.
pub fn normalize_url(url: &str) -> Result<String> {
    if let Some(stripped) = url.strip_prefix("file://") {
        return Ok(stripped.to_owned());
    }
    if let Some(stripped) = url.strip_prefix("file:") {
        return Ok(stripped.to_owned());
    }

    if url.starts_with("https://") || url.starts_with("http://") {
        // Full HTTP/HTTPS URLs only gain the .git suffix when missing
        if url.ends_with(".git") {
            return Ok(url.to_owned());
        }
        return Ok(format!("{url}.git"));
    }

    if url.starts_with("git@") || url.starts_with("ssh://") || url.starts_with("git://") {
        // SSH and protocol URLs are used as-is
        return Ok(url.to_owned());
    }

    if url.contains('/') && !url.contains(':') {
        // Short format: myorg/repo -> https://github.com/myorg/repo.git
        if url.matches('/').count() == 1 {
            return Ok(format!("https://github.com/{url}.git"));
        }
        return Err(StewardError::validation(format!(
            "Invalid repository format: '{url}'. Expected format: 'org/repo'"
        ))
        .into());
    }

    Err(StewardError::validation(format!(
        "Unsupported repository URL format: '{url}'\n\
        Supported formats:\n\
        - Short: myorg/repo\n\
        - HTTPS: https://github.com/myorg/repo.git\n\
        - SSH: git@github.com:myorg/repo.git\n\
        - Local: file:/path/to/repo or file:///path/to/repo"
    ))
    .into())
}

/// Check whether a git failure looks like a transient transport problem
///
/// Only these failures are worth retrying; everything else (bad refs,
/// auth rejections, local state) fails the same way on every attempt.
#[must_use]
pub fn is_transport_error(stderr: &str) -> bool {
    const TRANSPORT_MARKERS: &[&str] = &[
        "could not resolve host",
        "connection timed out",
        "connection refused",
        "connection reset",
        "operation timed out",
        "early eof",
        "the remote end hung up",
        "rpc failed",
        "unable to access",
    ];

    let lowered = stderr.to_lowercase();
    TRANSPORT_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Bounded exponential backoff for transient transport failures
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub base_delay_ms: u64,
    /// Upper bound on any single delay
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 5_000,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-based)
    #[must_use]
    pub fn backoff(&self, failed_attempt: u32) -> Duration {
        // Cap the exponent so the shift cannot overflow
        let exponent = failed_attempt.saturating_sub(1).min(6);
        let multiplier = 1_u64 << exponent;
        let delay = self
            .base_delay_ms
            .saturating_mul(multiplier)
            .min(self.max_delay_ms);
        Duration::from_millis(delay)
    }
}
