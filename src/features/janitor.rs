//! Downloads folder janitor
//!
//! Sorts loose files at the top level of a downloads directory into
//! category folders. Files that are too young, ignored by pattern or
//! named like a protected folder stay where they are.

use crate::config::Config;
use crate::error::StewardError;
use crate::notes::{NotesSettings, NotesSink, PublishMode};
use crate::system::System;
use crate::utils::fs::{ensure_dir_exists, file_age, unique_target_path};
use crate::utils::path::{expand_tilde, matches_any};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use super::Feature;

/// Settings table for the downloads janitor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JanitorSettings {
    /// Directory to keep sorted
    pub root: String,
    /// Seconds between two passes
    pub scan_interval_seconds: u64,
    /// Files younger than this are left alone
    pub min_file_age_seconds: u64,
    /// Log intended moves without renaming anything
    pub dry_run: bool,
    /// Glob patterns for names that are never moved
    pub ignore: Vec<String>,
    /// Category name to folder name
    pub folders: BTreeMap<String, String>,
    /// Names that are never moved even when they are files. Defaults
    /// to the configured folder names.
    pub protected_folders: Option<Vec<String>>,
    /// Notes sink for per-pass summaries
    pub notes: NotesSettings,
}

impl Default for JanitorSettings {
    fn default() -> Self {
        Self {
            root: "/downloads".to_owned(),
            scan_interval_seconds: 120,
            min_file_age_seconds: 60,
            dry_run: false,
            ignore: vec![
                ".DS_Store".to_owned(),
                ".*".to_owned(),
                "*.crdownload".to_owned(),
                "*.part".to_owned(),
                "*.download".to_owned(),
            ],
            folders: default_folders(),
            protected_folders: None,
            notes: NotesSettings::default(),
        }
    }
}

fn default_folders() -> BTreeMap<String, String> {
    [
        ("images", "Images"),
        ("videos", "Videos"),
        ("audio", "Audio"),
        ("docs", "Docs"),
        ("archives", "Archives"),
        ("code", "Code"),
        ("apps", "Apps"),
        ("other", "Other"),
    ]
    .into_iter()
    .map(|(key, folder)| (key.to_owned(), folder.to_owned()))
    .collect()
}

/// Outcome of a single janitor pass
#[derive(Debug, Default)]
struct PassSummary {
    moves: Vec<(PathBuf, PathBuf)>,
    skipped: usize,
}

impl PassSummary {
    fn record_move(&mut self, src: PathBuf, dest: PathBuf) {
        self.moves.push((src, dest));
    }

    fn moved(&self) -> usize {
        self.moves.len()
    }
}

/// Sorts downloads into category folders on a fixed interval
pub struct DownloadsJanitor {
    system: Arc<dyn System>,
    settings: JanitorSettings,
    root: PathBuf,
    protected: HashSet<String>,
    other_folder: String,
    sink: Option<NotesSink>,
    bootstrapped: bool,
}

impl std::fmt::Debug for DownloadsJanitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadsJanitor")
            .field("settings", &self.settings)
            .field("root", &self.root)
            .field("protected", &self.protected)
            .field("other_folder", &self.other_folder)
            .field("sink", &self.sink)
            .field("bootstrapped", &self.bootstrapped)
            .finish_non_exhaustive()
    }
}

impl DownloadsJanitor {
    pub const KEY: &'static str = "downloads_janitor";

    pub fn from_config(config: &Config, system: Arc<dyn System>) -> Result<Self> {
        let settings = super::settings_from_config(config, Self::KEY)?;
        Self::new(settings, system)
    }

    pub fn new(settings: JanitorSettings, system: Arc<dyn System>) -> Result<Self> {
        if settings.scan_interval_seconds == 0 {
            return Err(StewardError::validation(format!(
                "features.{}: scan_interval_seconds must be at least 1",
                Self::KEY
            ))
            .into());
        }
        let Some(other_folder) = settings.folders.get("other").cloned() else {
            return Err(StewardError::validation(format!(
                "features.{}: folders must contain an 'other' entry",
                Self::KEY
            ))
            .into());
        };

        let root = expand_tilde(system.as_ref(), &settings.root);
        let protected: HashSet<String> = match settings.protected_folders.as_ref() {
            Some(names) => names.iter().cloned().collect(),
            None => settings.folders.values().cloned().collect(),
        };
        let sink = settings.notes.resolve(system.as_ref(), Self::KEY);

        Ok(Self {
            system,
            settings,
            root,
            protected,
            other_folder,
            sink,
            bootstrapped: false,
        })
    }

    /// Create the root and category folders
    fn bootstrap(&self) -> Result<()> {
        ensure_dir_exists(self.system.as_ref(), &self.root)?;
        for folder in self.settings.folders.values() {
            ensure_dir_exists(self.system.as_ref(), &self.root.join(folder))?;
        }
        info!(
            "Downloads janitor ready (root={}, interval={}s, dry_run={})",
            self.root.display(),
            self.settings.scan_interval_seconds,
            self.settings.dry_run
        );
        Ok(())
    }

    fn scan_once(&self) -> Result<PassSummary> {
        let entries = self
            .system
            .read_dir(&self.root)
            .map_err(|e| StewardError::io(self.root.display().to_string(), e.to_string()))?;

        let mut summary = PassSummary::default();

        for entry in entries {
            if !self.system.is_file(&entry) {
                continue;
            }
            let Some(name) = entry.file_name().and_then(|n| n.to_str()).map(str::to_owned)
            else {
                summary.skipped += 1;
                continue;
            };

            if matches_any(&name, &self.settings.ignore) {
                summary.skipped += 1;
                continue;
            }
            if self.is_recent(&entry) {
                summary.skipped += 1;
                continue;
            }
            if self.protected.contains(&name) {
                summary.skipped += 1;
                continue;
            }

            let category = category_for(&entry);
            let folder = self.settings.folders.get(category).unwrap_or(&self.other_folder);
            let dest = unique_target_path(self.system.as_ref(), self.root.join(folder).join(&name));

            if self.settings.dry_run {
                info!("DRY RUN move: {} -> {}", entry.display(), dest.display());
                summary.record_move(entry, dest);
                continue;
            }

            match self.move_file(&entry, &dest) {
                Ok(()) => {
                    info!("Moved: {} -> {}", entry.display(), dest.display());
                    summary.record_move(entry, dest);
                }
                Err(e) => {
                    error!(
                        "Move failed: {} -> {} | {e}",
                        entry.display(),
                        dest.display()
                    );
                }
            }
        }

        info!(
            "Janitor pass done: moved={}, skipped={}",
            summary.moved(),
            summary.skipped
        );
        Ok(summary)
    }

    fn move_file(&self, src: &Path, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            ensure_dir_exists(self.system.as_ref(), parent)?;
        }
        self.system
            .rename(src, dest)
            .map_err(|e| StewardError::io(src.display().to_string(), e.to_string()))?;
        Ok(())
    }

    fn is_recent(&self, path: &Path) -> bool {
        match file_age(self.system.as_ref(), path) {
            Ok(age) => age < Duration::from_secs(self.settings.min_file_age_seconds),
            // A file that vanished mid-pass is treated as too recent
            Err(_) => true,
        }
    }

    fn publish(&self, summary: &PassSummary) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        if summary.moves.is_empty() {
            return;
        }

        let mut lines = vec![format!(
            "- moved: **{}**, skipped: **{}**",
            summary.moved(),
            summary.skipped
        )];
        lines.push(String::new());
        for (src, dest) in &summary.moves {
            lines.push(format!(
                "- `{}` -> `{}`",
                display_relative(src, &self.root),
                display_relative(dest, &self.root)
            ));
        }

        if let Err(e) = sink.publish(
            self.system.as_ref(),
            "Downloads Janitor",
            &lines.join("\n"),
            PublishMode::Append,
        ) {
            error!("Failed to publish janitor note: {e}");
        }
    }
}

impl Feature for DownloadsJanitor {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(self.settings.scan_interval_seconds)
    }

    fn run_once(&mut self) -> Result<()> {
        if !self.bootstrapped {
            self.bootstrap()?;
            self.bootstrapped = true;
        }
        let summary = self.scan_once()?;
        self.publish(&summary);
        Ok(())
    }
}

/// Category key for a file, by extension
fn category_for(path: &Path) -> &'static str {
    const IMAGES: &[&str] = &[
        "png", "jpg", "jpeg", "gif", "webp", "svg", "heic", "tiff", "bmp",
    ];
    const VIDEOS: &[&str] = &["mp4", "mov", "mkv", "avi", "webm", "m4v"];
    const AUDIO: &[&str] = &["mp3", "m4a", "aac", "wav", "flac", "ogg"];
    const DOCS: &[&str] = &[
        "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "md", "rtf", "csv", "mdx",
    ];
    const ARCHIVES: &[&str] = &["zip", "rar", "7z", "tar", "gz", "bz2", "xz"];
    const CODE: &[&str] = &[
        "js", "jsx", "ts", "tsx", "py", "json", "yml", "yaml", "toml", "ini", "sql", "sh",
    ];
    const APPS: &[&str] = &["dmg", "pkg"];

    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return "other";
    };
    let ext = ext.to_lowercase();
    let ext = ext.as_str();

    if IMAGES.contains(&ext) {
        return "images";
    }
    if VIDEOS.contains(&ext) {
        return "videos";
    }
    if AUDIO.contains(&ext) {
        return "audio";
    }
    if DOCS.contains(&ext) {
        return "docs";
    }
    if ARCHIVES.contains(&ext) {
        return "archives";
    }
    if CODE.contains(&ext) {
        return "code";
    }
    if APPS.contains(&ext) {
        return "apps";
    }
    "other"
}

/// Path relative to the janitor root, for note bodies
fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).map_or_else(
        |_| {
            path.file_name().map_or_else(
                || path.display().to_string(),
                |name| name.to_string_lossy().into_owned(),
            )
        },
        |rel| rel.display().to_string(),
    )
}
