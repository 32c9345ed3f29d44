//! Permanent `PATH` registration in the Windows (or wine) registry.
//!
//! `release --winpath P` appends `P` to the user `PATH` stored under
//! `HKCU\Environment` and exits. Entries already present are left alone;
//! comparison ignores ASCII case and a trailing backslash, as Windows does.

use crate::tools::{Registry, ToolError};
use thiserror::Error;

const SEPARATOR: char = ';';

#[derive(Error, Debug)]
pub enum WinPathError {
    #[error("Refusing to add an empty entry to PATH")]
    EmptyEntry,
    #[error("{0:?} contains ';' and would become several PATH entries")]
    Separator(String),
    #[error("Registry access failed: {0}")]
    Registry(#[from] ToolError),
}

fn normalize(entry: &str) -> String {
    entry.trim().trim_end_matches('\\').to_ascii_lowercase()
}

/// Whether `path` (a `;`-separated list) already contains `entry`.
pub fn contains_entry(path: &str, entry: &str) -> bool {
    let wanted = normalize(entry);
    path.split(SEPARATOR).any(|e| normalize(e) == wanted)
}

/// `path` with `entry` appended.
pub fn appended(path: &str, entry: &str) -> String {
    let trimmed = path.trim_end_matches(SEPARATOR);
    if trimmed.is_empty() {
        entry.to_string()
    } else {
        format!("{trimmed}{SEPARATOR}{entry}")
    }
}

/// Append `entry` to the user `PATH`.
///
/// Returns `false` if the entry was already registered and nothing was
/// written.
pub fn append_to_path(registry: &impl Registry, entry: &str) -> Result<bool, WinPathError> {
    let entry = entry.trim();
    if entry.is_empty() {
        return Err(WinPathError::EmptyEntry);
    }
    if entry.contains(SEPARATOR) {
        return Err(WinPathError::Separator(entry.to_string()));
    }
    let current = registry.read_user_path()?.unwrap_or_default();
    if contains_entry(&current, entry) {
        tracing::info!("{entry} is already in PATH");
        return Ok(false);
    }
    let value = appended(&current, entry);
    tracing::debug!(path = %value, "writing user PATH");
    registry.write_user_path(&value)?;
    Ok(true)
}
