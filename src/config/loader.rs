//! YAML configuration loading and fragment merging

use crate::config::Config;
use crate::error::StewardError;
use crate::system::System;
use anyhow::Result;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File extensions recognized as configuration fragments
const CONFIG_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Load, merge, and validate the configuration at `path`
///
/// `path` may be a single YAML file or a directory of fragments. The
/// result is immutable for the rest of the run.
pub fn load_config(system: &dyn System, path: &Path) -> Result<Config> {
    let merged = load_value(system, path)?;

    let json = serde_json::to_value(&merged).map_err(|e| {
        StewardError::validation(format!("Configuration is not representable as JSON: {e}"))
    })?;

    crate::config::schema::validate_against_schema(&json)?;

    let config: Config = serde_json::from_value(json).map_err(|e| {
        StewardError::validation(format!("Configuration has an unexpected shape: {e}"))
    })?;

    crate::config::validation::validate_config(&config)?;

    Ok(config)
}

/// Load the raw merged mapping without schema or semantic validation
///
/// Fragments are merged in byte-wise order of their file names, later
/// files winning key by key.
pub fn load_value(system: &dyn System, path: &Path) -> Result<Value> {
    if system.is_file(path) {
        let mapping = parse_fragment(system, path)?;
        return Ok(Value::Mapping(mapping));
    }

    if system.is_dir(path) {
        let files = fragment_files(system, path)?;
        debug!("Merging {} configuration fragments", files.len());

        let mut merged = Mapping::new();
        for file in files {
            let overlay = parse_fragment(system, &file)?;
            merge_mappings(&mut merged, overlay);
        }
        return Ok(Value::Mapping(merged));
    }

    Err(StewardError::io(
        path.display().to_string(),
        "configuration path not found",
    )
    .into())
}

/// Merge `overlay` into `base`, replacing values key by key
///
/// Replacement is wholesale at the top level. Nested mappings are not
/// merged recursively.
pub fn merge_mappings(base: &mut Mapping, overlay: Mapping) {
    for (key, value) in overlay {
        base.insert(key, value);
    }
}

fn fragment_files(system: &dyn System, dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = system
        .read_dir(dir)
        .map_err(|e| StewardError::io(dir.display().to_string(), e.to_string()))?;

    let mut files: Vec<PathBuf> = entries
        .into_iter()
        .filter(|p| system.is_file(p) && has_config_extension(p))
        .collect();

    files.sort_by_key(|p| p.file_name().map(std::ffi::OsStr::to_owned));
    Ok(files)
}

fn has_config_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| CONFIG_EXTENSIONS.contains(&ext))
}

fn parse_fragment(system: &dyn System, path: &Path) -> Result<Mapping> {
    let content = system
        .read_to_string(path)
        .map_err(|e| StewardError::io(path.display().to_string(), e.to_string()))?;

    let doc: Value = serde_yaml::from_str(&content)
        .map_err(|e| StewardError::parse(path.display().to_string(), e.to_string()))?;

    debug!("Loaded configuration fragment: {}", path.display());

    match doc {
        // An empty document contributes nothing
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(mapping) => Ok(mapping),
        other => Err(StewardError::parse(
            path.display().to_string(),
            format!(
                "top-level value must be a mapping, found {}",
                value_kind(&other)
            ),
        )
        .into()),
    }
}

const fn value_kind(value: &Value) -> &'static str {
    match *value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
