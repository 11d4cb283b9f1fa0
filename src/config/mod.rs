//! Configuration management module
//!
//! Handles YAML configuration parsing, fragment merging, JSON schema
//! validation, and semantic validation.

pub mod loader;
pub mod schema;
pub mod validation;

use crate::system::System;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Main configuration structure
///
/// An empty configuration is valid: no features run and no
/// repositories are synchronized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Feature keys to run, in activation order
    #[serde(default)]
    pub enabled_features: Vec<String>,

    /// Git working copies to synchronize before features start
    #[serde(default)]
    pub repositories: Vec<RepositoryConfig>,

    /// Per-feature settings tables keyed by feature name
    #[serde(default)]
    pub features: BTreeMap<String, Value>,
}

/// A single repository to keep in sync
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Repository location: org/repo, https://, git@, or file: URL
    pub url: String,

    /// Branch, tag, or commit id to check out
    #[serde(rename = "ref", default = "default_reference")]
    pub reference: String,

    /// Local working copy path
    pub dest: String,
}

fn default_reference() -> String {
    "main".to_owned()
}

impl Config {
    /// Load configuration from a file or a directory of fragments
    pub fn load(system: &dyn System, path: &Path) -> anyhow::Result<Self> {
        loader::load_config(system, path)
    }

    /// Get the settings table for a feature, if one was configured
    #[must_use]
    pub fn settings_table(&self, feature: &str) -> Option<&Value> {
        self.features.get(feature)
    }
}
