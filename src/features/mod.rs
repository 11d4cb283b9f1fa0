//! Periodic maintenance features
//!
//! Each feature runs a pass on its own interval. Features are built
//! from their settings table under `features.<key>` by a registry
//! keyed by feature name.

pub mod janitor;
pub mod repo_overview;

pub use janitor::DownloadsJanitor;
pub use repo_overview::RepoOverview;

use crate::config::Config;
use crate::error::StewardError;
use crate::system::System;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

/// Names of all features the registry can build
pub const FEATURE_NAMES: &[&str] = &[DownloadsJanitor::KEY, RepoOverview::KEY];

/// A periodic maintenance feature
///
/// `run_once` executes a single pass. Workers repeat passes on the
/// `interval` until the first error.
pub trait Feature: Send {
    /// Stable feature key used in configuration
    fn key(&self) -> &'static str;

    /// Pause between two passes
    fn interval(&self) -> Duration;

    /// Execute a single pass
    fn run_once(&mut self) -> Result<()>;
}

/// Build a feature from its settings table
///
/// Construction only parses and validates; no feature touches the
/// filesystem before its first pass.
pub fn build_feature(
    name: &str,
    config: &Config,
    system: Arc<dyn System>,
) -> Result<Box<dyn Feature>> {
    match name {
        DownloadsJanitor::KEY => Ok(Box::new(DownloadsJanitor::from_config(config, system)?)),
        RepoOverview::KEY => Ok(Box::new(RepoOverview::from_config(config, system)?)),
        _ => Err(StewardError::validation(format!(
            "Unknown feature '{name}'. Known features: {}",
            FEATURE_NAMES.join(", ")
        ))
        .into()),
    }
}

/// Parse a feature's settings table, falling back to defaults
pub(crate) fn settings_from_config<T>(config: &Config, key: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    match config.settings_table(key) {
        Some(table) => serde_json::from_value(table.clone())
            .map_err(|e| StewardError::validation(format!("features.{key}: {e}")).into()),
        None => Ok(T::default()),
    }
}
