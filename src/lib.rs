//! # dil-release
//!
//! Release engineering and Phobos documentation tooling for the dil D
//! compiler. Two commands, both one-shot batch pipelines:
//!
//! ```text
//! phobos-doc  Phobos sources  →  HTML docs (+ PDF, + 7z)
//! release     dil checkout    →  build/dil.<VERSION>/ (+ tar.gz, tar.bz2, zip, 7z)
//! ```
//!
//! The heavy lifting is done by external programs: the dil documentation
//! generator, `dmd`, `wine`, `git`, the archivers and an HTML → PDF helper.
//! This crate decides what to run, prepares the inputs, post-processes the
//! outputs and assembles the result.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`phobos_doc`] | The `phobos-doc` pipeline |
//! | [`release`] | The `release` pipeline: checkout, version patch, build plan, packaging |
//! | [`docgen`] | Steps shared by both: generator bootstrap, scratch dirs, progress events |
//! | [`ddoc`] | `std.ddoc` → `phobos.ddoc` rewriting, `phobos.html` fix-up, auxiliary macro files |
//! | [`rewrite`] | Ordered regex rule lists with per-rule match reports |
//! | [`sources`] | Module collection and the Ddoc index page |
//! | [`assets`] | Static files copied next to the generated HTML |
//! | [`pdf`] | PDF export through the external renderer |
//! | [`archive`] | Archive creation and `SHA256SUMS` |
//! | [`version`] | Version parsing and `Version.d` patching |
//! | [`winpath`] | `--winpath`: user `PATH` registration |
//! | [`layout`] | Project, Phobos and destination directory layouts |
//! | [`tools`] | Capability traits for external programs, with subprocess and mock implementations |
//! | [`config`] | `dil-release.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Tools Behind Traits
//!
//! Pipelines never spawn processes. They receive a [`tools::Tools`]
//! implementation: [`tools::SystemTools`] in the binary, a recording mock in
//! tests. Every stage can therefore be tested end to end on a temp directory
//! without `dmd` or `wine` installed.
//!
//! ## Explicit Roots
//!
//! The project root is passed to every pipeline as a [`layout::ProjectLayout`].
//! Nothing changes the process working directory.
//!
//! ## Ordered Rewrite Rules
//!
//! HTML and macro fix-ups are data: a [`rewrite::RuleSet`] of named rules
//! applied in order. Each run returns a report of how often every rule matched,
//! and a rule can be guarded so it is skipped once its output is present.
//!
//! ## Scoped Scratch Directories
//!
//! Intermediate macro files and the module list live in a
//! [`tempfile::TempDir`] inside the destination. It is removed when the
//! pipeline returns, on success and on error alike.

pub mod archive;
pub mod assets;
pub mod config;
pub mod ddoc;
pub mod docgen;
pub mod layout;
pub mod output;
pub mod pdf;
pub mod phobos_doc;
pub mod release;
pub mod rewrite;
pub mod sources;
pub mod tools;
pub mod version;
pub mod winpath;

#[cfg(test)]
pub(crate) mod test_helpers;
