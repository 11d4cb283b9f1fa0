//! Path manipulation and pattern matching utilities

use crate::system::System;
use glob::Pattern;
use std::path::PathBuf;

/// Expand a leading `~` to the user's home directory
///
/// Paths without a leading tilde are returned unchanged. If no home
/// directory can be determined the tilde is left in place.
#[must_use]
pub fn expand_tilde(system: &dyn System, raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = home_of(system) {
            return home;
        }
    } else if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = home_of(system)
    {
        return home.join(rest);
    }

    PathBuf::from(raw)
}

fn home_of(system: &dyn System) -> Option<PathBuf> {
    system
        .home_dir()
        .or_else(|| system.env_var("HOME").ok().map(PathBuf::from))
}

/// Check if a file name matches any of the given glob patterns
///
/// Invalid patterns never match.
#[must_use]
pub fn matches_any(name: &str, patterns: &[String]) -> bool {
    for pattern in patterns {
        if let Ok(glob) = Pattern::new(pattern)
            && glob.matches(name)
        {
            return true;
        }
    }
    false
}
