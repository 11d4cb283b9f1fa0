//! Markdown note publication into a notes vault
//!
//! Features publish their results as timestamped markdown sections.
//! Publication failures are reported to the caller but are documented
//! as non-fatal: a broken vault must never stop a maintenance pass.

use crate::system::System;
use crate::utils::fs::ensure_dir_exists;
use crate::utils::path::expand_tilde;
use anyhow::{Context as _, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// How a published section lands in the note file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishMode {
    /// Add the section to the end of the note
    Append,
    /// Replace the whole note with the section
    Replace,
}

/// Notes block shared by all feature settings tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotesSettings {
    /// Whether publication is active
    #[serde(default)]
    pub enabled: bool,

    /// Vault root; `~` is expanded via the home directory
    #[serde(default)]
    pub vault: Option<String>,

    /// Vault-relative note path; takes precedence over `notes_dir`
    #[serde(default)]
    pub note: Option<String>,

    /// Vault-relative directory for per-feature notes
    #[serde(default)]
    pub notes_dir: Option<String>,

    /// File name inside `notes_dir`; defaults to `<feature key>.md`
    #[serde(default)]
    pub filename: Option<String>,
}

impl NotesSettings {
    /// Resolve the configured publication target for `feature_key`
    ///
    /// Returns `None` when publication is disabled or the block does not
    /// name a usable target. Misconfiguration is logged and skipped, it
    /// never fails the feature.
    pub fn resolve(&self, system: &dyn System, feature_key: &str) -> Option<NotesSink> {
        if !self.enabled {
            return None;
        }

        let Some(vault) = self.vault.as_deref() else {
            warn!("Notes enabled for '{feature_key}' but no vault is configured; skipping");
            return None;
        };
        let vault = expand_tilde(system, vault);

        let relative = if let Some(note) = self.note.as_deref() {
            PathBuf::from(note)
        } else if let Some(dir) = self.notes_dir.as_deref() {
            let filename = self
                .filename
                .clone()
                .unwrap_or_else(|| format!("{feature_key}.md"));
            PathBuf::from(dir).join(filename)
        } else {
            warn!(
                "Notes enabled for '{feature_key}' but neither 'note' nor 'notes_dir' is set; skipping"
            );
            return None;
        };

        Some(NotesSink {
            path: vault.join(relative),
        })
    }
}

/// A resolved publication target inside a notes vault
#[derive(Debug, Clone)]
pub struct NotesSink {
    path: PathBuf,
}

impl NotesSink {
    /// Path of the note file this sink writes to
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Publish a section titled `title` with the given body
    pub fn publish(
        &self,
        system: &dyn System,
        title: &str,
        body: &str,
        mode: PublishMode,
    ) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            ensure_dir_exists(system, parent)?;
        }

        let section = format_section(title, body);
        match mode {
            PublishMode::Append => system.append(&self.path, section.as_bytes()),
            PublishMode::Replace => system.write(&self.path, section.as_bytes()),
        }
        .with_context(|| format!("Failed to publish note: {}", self.path.display()))?;

        debug!("Published note: {}", self.path.display());
        Ok(())
    }
}

fn format_section(title: &str, body: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let body = body.trim_end_matches('\n');
    if body.is_empty() {
        return format!("## {title} ({timestamp})\n");
    }
    format!("## {title} ({timestamp})\n{body}\n")
}
