//! Tool configuration.
//!
//! Handles loading, validating, and merging `dil-release.toml`. Every key is
//! optional: a config file overrides the stock defaults key by key, and CLI
//! flags override the config file.
//!
//! ## Config File Location
//!
//! The file is looked up at the project root (`--root`, default `.`), or
//! read from the path given with `--config`:
//!
//! ```text
//! dil/
//! ├── dil-release.toml     # optional
//! ├── src/
//! ├── data/
//! └── kandil/
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! [tools]
//! compiler = "dmd"          # D compiler used for release binaries
//! git = "git"
//! wine = "wine"             # Compatibility layer for Windows builds
//! pdf_helper = "html2pdf"   # HTML → PDF renderer
//!
//! [docs]
//! base_url = "http://www.digitalmars.com/d/"
//! symbol_link_base = "http://dil.googlecode.com/svn/doc/"
//! source_suffixes = [".d", ".di"]
//! ignore = ["phobos.d", "cast.d", "invariant.d", "switch.d", "unittest.d"]
//! internal_dir = "internal"
//! pdf_ignore = ["phobos.html", "std.c.windows.windows.html"]
//! destination = "phobosdoc"
//!
//! [release]
//! build_dir = "build"
//! source_suffixes = [".d"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up at the project root.
pub const CONFIG_FILENAME: &str = "dil-release.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `dil-release.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    /// External executables.
    pub tools: ExecutablesConfig,
    /// Phobos documentation settings.
    pub docs: DocsConfig,
    /// Release packaging settings.
    pub release: ReleaseConfig,
}

impl ToolsConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("tools.compiler", &self.tools.compiler),
            ("tools.git", &self.tools.git),
            ("tools.wine", &self.tools.wine),
            ("tools.pdf_helper", &self.tools.pdf_helper),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        for (key, url) in [
            ("docs.base_url", &self.docs.base_url),
            ("docs.symbol_link_base", &self.docs.symbol_link_base),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Validation(format!(
                    "{key} must be an http(s) URL, got {url:?}"
                )));
            }
        }
        for (key, suffixes) in [
            ("docs.source_suffixes", &self.docs.source_suffixes),
            ("release.source_suffixes", &self.release.source_suffixes),
        ] {
            if suffixes.is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
            if let Some(bad) = suffixes.iter().find(|s| !s.starts_with('.') || s.len() < 2) {
                return Err(ConfigError::Validation(format!(
                    "{key} entries must look like \".d\", got {bad:?}"
                )));
            }
        }
        if self.docs.ignore.iter().any(|i| i.contains(['/', '\\'])) {
            return Err(ConfigError::Validation(
                "docs.ignore entries must be file names, not paths".into(),
            ));
        }
        Ok(())
    }
}

/// External executables, resolved on `PATH` unless given as paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutablesConfig {
    pub compiler: String,
    pub git: String,
    pub wine: String,
    pub pdf_helper: String,
}

impl Default for ExecutablesConfig {
    fn default() -> Self {
        Self {
            compiler: "dmd".to_string(),
            git: "git".to_string(),
            wine: "wine".to_string(),
            pdf_helper: "html2pdf".to_string(),
        }
    }
}

/// Phobos documentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocsConfig {
    /// Site prefix for `../` links; the D version (`1.0`, `2.0`) is appended.
    pub base_url: String,
    /// Prefix of the symbol links embedded in PDFs.
    pub symbol_link_base: String,
    pub source_suffixes: Vec<String>,
    /// Module file names never documented.
    pub ignore: Vec<String>,
    /// Source subtree never documented.
    pub internal_dir: String,
    /// HTML pages left out of the PDF.
    pub pdf_ignore: Vec<String>,
    /// Default destination folder, relative to the project root.
    pub destination: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://www.digitalmars.com/d/".to_string(),
            symbol_link_base: "http://dil.googlecode.com/svn/doc/".to_string(),
            source_suffixes: vec![".d".to_string(), ".di".to_string()],
            ignore: ["phobos.d", "cast.d", "invariant.d", "switch.d", "unittest.d"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            internal_dir: "internal".to_string(),
            pdf_ignore: vec![
                "phobos.html".to_string(),
                "std.c.windows.windows.html".to_string(),
            ],
            destination: "phobosdoc".to_string(),
        }
    }
}

/// Release packaging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseConfig {
    /// Where release trees and archives are built, relative to the project root.
    pub build_dir: String,
    /// Suffixes of the compiler's own source files.
    pub source_suffixes: Vec<String>,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            build_dir: "build".to_string(),
            source_suffixes: vec![".d".to_string()],
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ToolsConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

fn read_toml(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto the defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ToolsConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(stock_defaults_value(), ov),
        None => stock_defaults_value(),
    };
    let config: ToolsConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the configuration for a project.
///
/// An explicit path must exist. Without one, `<root>/dil-release.toml` is
/// used when present and the stock defaults otherwise.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<ToolsConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => {
            if !path.is_file() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Some(read_toml(path)?)
        }
        None => {
            let path = root.join(CONFIG_FILENAME);
            if path.is_file() {
                Some(read_toml(&path)?)
            } else {
                None
            }
        }
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `dil-release.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# dil-release configuration
# ==========================
# All settings are optional. Values shown below are the defaults.
# Place this file at the project root as dil-release.toml, or pass
# --config <FILE>. Command-line flags take precedence over this file.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# External tools (names are looked up on PATH)
# ---------------------------------------------------------------------------
[tools]
# D compiler used to build release binaries and a missing dil executable.
compiler = "dmd"
git = "git"
# Compatibility layer used to build Windows binaries on other hosts.
wine = "wine"
# HTML to PDF renderer invoked for --pdf.
pdf_helper = "html2pdf"

# ---------------------------------------------------------------------------
# Phobos documentation (phobos-doc)
# ---------------------------------------------------------------------------
[docs]
# Prefix for "../" links; the D version (1.0 or 2.0) and a slash are appended.
base_url = "http://www.digitalmars.com/d/"
# Prefix of symbol links embedded in generated PDFs.
symbol_link_base = "http://dil.googlecode.com/svn/doc/"
source_suffixes = [".d", ".di"]
# Module files that are never documented.
ignore = ["phobos.d", "cast.d", "invariant.d", "switch.d", "unittest.d"]
# Source subtree that is never documented.
internal_dir = "internal"
# Pages left out of the PDF.
pdf_ignore = ["phobos.html", "std.c.windows.windows.html"]
# Destination folder when DESTINATION_DIR is omitted.
destination = "phobosdoc"

# ---------------------------------------------------------------------------
# Release packaging (release)
# ---------------------------------------------------------------------------
[release]
# Where release trees and archives are built (--builddir overrides).
build_dir = "build"
source_suffixes = [".d"]
"##
}
