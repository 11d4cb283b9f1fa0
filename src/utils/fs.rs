//! File system utilities

use crate::system::System;
use anyhow::{Context as _, Result};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir_exists(system: &dyn System, dir_path: &Path) -> Result<()> {
    if !system.exists(dir_path) {
        system
            .create_dir_all(dir_path)
            .with_context(|| format!("Failed to create directory: {}", dir_path.display()))?;
    } else if !system.is_dir(dir_path) {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Path exists but is not a directory: {}", dir_path.display()),
        )
        .into());
    }
    Ok(())
}

/// Get the age of a file since its last modification
///
/// Files with a modification time in the future count as age zero.
pub fn file_age(system: &dyn System, path: &Path) -> Result<Duration> {
    let modified = system
        .modified(path)
        .with_context(|| format!("Failed to read modification time: {}", path.display()))?;
    Ok(modified.elapsed().unwrap_or(Duration::ZERO))
}

/// Get a target path that does not collide with an existing file
///
/// On collision, ` (2)`, ` (3)` and so on are inserted before the
/// extension until a free name is found.
#[must_use]
pub fn unique_target_path(system: &dyn System, path: PathBuf) -> PathBuf {
    if !system.exists(&path) {
        return path;
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file")
        .to_owned();
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| return s.to_owned());
    let parent = path.parent().unwrap_or(Path::new("")).to_path_buf();

    let mut counter = 2;
    loop {
        let filename = if let Some(ref ext) = extension {
            format!("{stem} ({counter}).{ext}")
        } else {
            format!("{stem} ({counter})")
        };

        let candidate = parent.join(filename);
        if !system.exists(&candidate) {
            return candidate;
        }
        counter += 1;

        // Prevent infinite loops
        if counter > 10000 {
            return parent.join(format!("{stem} (overflow)"));
        }
    }
}
