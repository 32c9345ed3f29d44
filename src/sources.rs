//! Source module discovery.
//!
//! Walks a D source tree and returns the module files worth documenting.
//! A file is kept when:
//!
//! - its name ends in one of the configured suffixes (`.d`, `.di`),
//! - its path does not end in `<sep><name>` for any ignore-listed name,
//! - it does not live under `<root>/<internal_dir>`.
//!
//! The result is always sorted so the generated index and the generator's
//! input order are stable across runs.

use std::fs;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to walk {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("{path} is not inside {prefix}")]
    OutsidePrefix { path: PathBuf, prefix: PathBuf },
}

/// Filter applied while collecting source modules.
#[derive(Debug, Clone, Default)]
pub struct SourceFilter {
    pub suffixes: Vec<String>,
    /// File names excluded wherever they appear.
    pub ignore: Vec<String>,
    /// Subtree of the root excluded entirely (e.g. `internal`).
    pub internal_dir: Option<String>,
}

impl SourceFilter {
    /// Suffix-only filter, used for compiler sources.
    pub fn suffixes(suffixes: &[&str]) -> Self {
        Self {
            suffixes: suffixes.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    fn has_suffix(&self, path: &Path) -> bool {
        let name = path.to_string_lossy();
        self.suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }

    fn is_ignored(&self, path: &Path) -> bool {
        let name = path.to_string_lossy();
        self.ignore
            .iter()
            .any(|i| name.ends_with(&format!("{MAIN_SEPARATOR}{i}")))
    }

    fn is_internal(&self, root: &Path, path: &Path) -> bool {
        self.internal_dir
            .as_ref()
            .is_some_and(|dir| path.starts_with(root.join(dir)))
    }
}

/// Collect and sort the source files under `root` accepted by `filter`.
pub fn collect_sources(root: &Path, filter: &SourceFilter) -> Result<Vec<PathBuf>, SourceError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|source| SourceError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if filter.has_suffix(path) && !filter.is_ignored(path) && !filter.is_internal(root, path) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Fully-qualified module name of `path` relative to `prefix`.
///
/// `phobos/std/c/stdio.d` under `phobos` → `std.c.stdio`.
pub fn module_fqn(prefix: &Path, path: &Path) -> Result<String, SourceError> {
    let rel = path
        .strip_prefix(prefix)
        .map_err(|_| SourceError::OutsidePrefix {
            path: path.to_path_buf(),
            prefix: prefix.to_path_buf(),
        })?;
    let rel = rel.with_extension("");
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("."))
}

/// Render the Ddoc index module listing every module page.
pub fn index_document(prefix: &Path, files: &[PathBuf]) -> Result<String, SourceError> {
    let mut items = String::new();
    for file in files {
        let fqn = module_fqn(prefix, file)?;
        items.push_str(&format!("  <li><a href=\"{fqn}.html\">{fqn}.html</a></li>\n"));
    }
    Ok(format!("Ddoc\n<ul>\n{items}\n</ul>\nMacros:\nTITLE = Index"))
}

/// Write the index module to `path`.
pub fn write_index_file(path: &Path, prefix: &Path, files: &[PathBuf]) -> Result<(), SourceError> {
    fs::write(path, index_document(prefix, files)?)?;
    Ok(())
}
