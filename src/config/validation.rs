//! Configuration validation logic

use crate::config::{Config, RepositoryConfig};
use crate::error::StewardError;
use crate::features;
use anyhow::Result;
use regex::Regex;
use std::collections::HashSet;

/// Validate a complete configuration
///
/// # Errors
///
/// Returns an error if:
/// - An enabled feature is unknown or listed twice
/// - A repository URL has an unsupported format
/// - A repository ref or destination is malformed
/// - Two repositories share a destination
#[inline]
pub fn validate_config(config: &Config) -> Result<()> {
    let mut seen = HashSet::new();
    for name in &config.enabled_features {
        if !features::FEATURE_NAMES.contains(&name.as_str()) {
            return Err(StewardError::validation(format!(
                "Unknown feature '{}'. Known features: {}",
                name,
                features::FEATURE_NAMES.join(", ")
            ))
            .into());
        }
        if !seen.insert(name.as_str()) {
            return Err(StewardError::validation(format!(
                "Feature '{name}' is enabled more than once"
            ))
            .into());
        }
    }

    let mut destinations = HashSet::new();
    for (index, repository) in config.repositories.iter().enumerate() {
        validate_repository(repository, index)?;
        if !destinations.insert(repository.dest.as_str()) {
            return Err(StewardError::validation(format!(
                "Repository #{}: destination '{}' is used by an earlier repository",
                index + 1,
                repository.dest
            ))
            .into());
        }
    }

    Ok(())
}

/// Validate a single repository entry
fn validate_repository(repository: &RepositoryConfig, index: usize) -> Result<()> {
    let context = format!("Repository #{}", index + 1);

    if !is_valid_repository_url(&repository.url) {
        return Err(StewardError::validation(format!(
            "{}: Invalid repository URL format: '{}'\n\
            Supported formats:\n\
            - Short format: my_organization/repo\n\
            - HTTPS: https://github.com/my_organization/repo.git\n\
            - SSH: git@github.com:my_organization/repo.git\n\
            - Local: file:/path/to/repo or file:///path/to/repo",
            context, repository.url
        ))
        .into());
    }

    if repository.reference.trim().is_empty() {
        return Err(StewardError::validation(format!(
            "{context}: Ref cannot be empty"
        ))
        .into());
    }

    if repository.reference.chars().any(char::is_whitespace) {
        return Err(StewardError::validation(format!(
            "{}: Ref '{}' must not contain whitespace",
            context, repository.reference
        ))
        .into());
    }

    if repository.dest.trim().is_empty() {
        return Err(StewardError::validation(format!(
            "{context}: Destination path cannot be empty"
        ))
        .into());
    }

    Ok(())
}

/// Check a repository URL against the supported formats
#[must_use]
#[inline]
pub fn is_valid_repository_url(url: &str) -> bool {
    // "file:" prefixed local paths are resolved when the repository is opened
    if url.starts_with("file:") {
        return true;
    }

    // Patterns for valid Git repository URLs
    let patterns = [
        r"^https?://\S+$",       // HTTPS: https://github.com/user/repo.git
        r"^(ssh|git)://\S+$",    // Protocol URLs: ssh://git@host/repo.git
        r"^git@[\w.-]+:\S+$",    // SSH: git@github.com:user/repo.git
        r"^[\w.-]+/[\w.-]+$",    // Short: user/repo
    ];

    for pattern in &patterns {
        if let Ok(regex) = Regex::new(pattern)
            && regex.is_match(url)
        {
            return true;
        }
    }

    false
}
