//! Release archives.
//!
//! Each requested format is packaged by its own utility, run in the parent of
//! the tree being archived so the archive holds a single top-level folder:
//!
//! ```text
//! build/
//! ├── dil.1.123/            the tree
//! ├── dil.1.123.tar.gz
//! ├── dil.1.123.zip
//! └── SHA256SUMS            with --checksums
//! ```
//!
//! A format whose utility is not on `PATH` is skipped with a warning. A
//! utility that runs and fails aborts the packaging.

use crate::tools::{ArchiveFormat, ArchiveParams, Archiver, Locator, ToolError};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CHECKSUMS_FILE: &str = "SHA256SUMS";

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Cannot archive {0}: it has no parent directory or name")]
    BadTree(PathBuf),
    #[error("Failed to create {format} archive: {source}")]
    Tool {
        format: ArchiveFormat,
        #[source]
        source: ToolError,
    },
    #[error("Failed to checksum {path}: {source}")]
    Checksum {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result of one requested format.
#[derive(Debug, Clone, PartialEq)]
pub enum ArchiveOutcome {
    Created(PathBuf),
    Skipped {
        format: ArchiveFormat,
        utility: &'static str,
    },
}

/// Archive `tree` in every requested format, in [`ArchiveFormat::ALL`] order.
///
/// The archives are named after the tree's folder and created next to it.
pub fn create_archives<T: Locator + Archiver>(
    tools: &T,
    tree: &Path,
    formats: &BTreeSet<ArchiveFormat>,
) -> Result<Vec<ArchiveOutcome>, ArchiveError> {
    let name = tree
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ArchiveError::BadTree(tree.to_path_buf()))?;
    create_named_archives(tools, tree, &name, formats)
}

/// Like [`create_archives`], with an explicit archive base name.
pub fn create_named_archives<T: Locator + Archiver>(
    tools: &T,
    tree: &Path,
    name: &str,
    formats: &BTreeSet<ArchiveFormat>,
) -> Result<Vec<ArchiveOutcome>, ArchiveError> {
    let bad_tree = || ArchiveError::BadTree(tree.to_path_buf());
    let work_dir = tree.parent().ok_or_else(bad_tree)?;
    let src = tree.file_name().map(PathBuf::from).ok_or_else(bad_tree)?;

    let mut outcomes = Vec::new();
    for format in ArchiveFormat::ALL.into_iter().filter(|f| formats.contains(f)) {
        let utility = format.utility();
        if tools.locate(utility).is_none() {
            tracing::warn!("{utility} not found on PATH, skipping the {format} archive");
            outcomes.push(ArchiveOutcome::Skipped { format, utility });
            continue;
        }
        let params = ArchiveParams {
            format,
            work_dir: work_dir.to_path_buf(),
            name: name.to_string(),
            src: src.clone(),
        };
        let path = tools
            .archive(&params)
            .map_err(|source| ArchiveError::Tool { format, source })?;
        outcomes.push(ArchiveOutcome::Created(path));
    }
    Ok(outcomes)
}

/// Paths of the archives that were actually created.
pub fn created(outcomes: &[ArchiveOutcome]) -> Vec<&Path> {
    outcomes
        .iter()
        .filter_map(|o| match o {
            ArchiveOutcome::Created(p) => Some(p.as_path()),
            ArchiveOutcome::Skipped { .. } => None,
        })
        .collect()
}

/// SHA-256 of a file as lowercase hex.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect())
}

/// Write `SHA256SUMS` into `dir` in `sha256sum` format.
pub fn write_checksums(dir: &Path, archives: &[&Path]) -> Result<PathBuf, ArchiveError> {
    let mut lines = String::new();
    for archive in archives {
        let digest = sha256_file(archive).map_err(|source| ArchiveError::Checksum {
            path: archive.to_path_buf(),
            source,
        })?;
        let name = archive.file_name().unwrap_or(archive.as_os_str());
        lines.push_str(&format!("{digest}  {}\n", name.to_string_lossy()));
    }
    let out = dir.join(CHECKSUMS_FILE);
    fs::write(&out, lines).map_err(|source| ArchiveError::Checksum {
        path: out.clone(),
        source,
    })?;
    Ok(out)
}
