//! CLI output formatting for both commands.
//!
//! # Output Format
//!
//! ## Progress
//!
//! ```text
//! ==> Documenting 112 Phobos modules
//!     phobos.ddoc
//!         icon: 1
//!         local-assets: 2
//!         absolute-links: 14
//! ==> Generating documentation
//! Warning: can only create a PDF document from kandil HTML files
//! ```
//!
//! ## phobos-doc summary
//!
//! ```text
//! Documentation → phobosdoc
//!     Modules: 112
//!     Assets: 5
//!     PDF: phobosdoc/Phobos.2.031.API.pdf
//! Archives
//!     Phobos.2.031_doc.7z
//! ```
//!
//! ## release summary
//!
//! ```text
//! Release → build/dil.1.123
//! Binaries
//!     Linux
//!         dil2_d      debug   -version=D2
//!     Windows (wine)
//!         dil.exe     release
//! Archives
//!     dil.1.123.tar.gz
//!     skipped 7z (7zr not found)
//! Checksums: build/SHA256SUMS
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::archive::ArchiveOutcome;
use crate::docgen::PipelineEvent;
use crate::phobos_doc::DocSummary;
use crate::release::{BuildPlan, BuildTarget, Platform, ReleaseSummary};
use crate::rewrite::{RewriteReport, RuleOutcome};
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Progress
// ============================================================================

/// Per-rule lines of a rewrite report.
pub fn format_rewrite_report(report: &RewriteReport, depth: usize) -> Vec<String> {
    report
        .outcomes
        .iter()
        .map(|outcome| match outcome {
            RuleOutcome::Applied { rule, matches } => format!("{}{rule}: {matches}", indent(depth)),
            RuleOutcome::AlreadyApplied { rule } => {
                format!("{}{rule}: already applied", indent(depth))
            }
        })
        .collect()
}

pub fn format_event(event: &PipelineEvent) -> Vec<String> {
    match event {
        PipelineEvent::Stage(title) => vec![format!("==> {title}")],
        PipelineEvent::Warning(message) => vec![format!("Warning: {message}")],
        PipelineEvent::Rewritten { file, report } => {
            let mut lines = vec![format!("{}{}", indent(1), file_name(file))];
            lines.extend(format_rewrite_report(report, 2));
            lines
        }
    }
}

pub fn print_event(event: &PipelineEvent) {
    for line in format_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Archives
// ============================================================================

pub fn format_archives(outcomes: &[ArchiveOutcome]) -> Vec<String> {
    if outcomes.is_empty() {
        return Vec::new();
    }
    let mut lines = vec!["Archives".to_string()];
    for outcome in outcomes {
        lines.push(match outcome {
            ArchiveOutcome::Created(path) => format!("{}{}", indent(1), file_name(path)),
            ArchiveOutcome::Skipped { format, utility } => {
                format!("{}skipped {format} ({utility} not found)", indent(1))
            }
        });
    }
    lines
}

// ============================================================================
// phobos-doc
// ============================================================================

pub fn format_doc_summary(summary: &DocSummary) -> Vec<String> {
    let mut lines = vec![format!("Documentation → {}", summary.dest.display())];
    if summary.built_generator {
        lines.push(format!("{}Generator: built", indent(1)));
    }
    lines.push(format!("{}Modules: {}", indent(1), summary.modules));
    lines.push(format!("{}Assets: {}", indent(1), summary.assets));
    if let Some(pdf) = &summary.pdf {
        lines.push(format!("{}PDF: {}", indent(1), pdf.display()));
    }
    lines.extend(format_archives(&summary.archives));
    lines
}

pub fn print_doc_summary(summary: &DocSummary) {
    for line in format_doc_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// release
// ============================================================================

fn target_line(target: &BuildTarget, width: usize) -> String {
    let mut line = format!(
        "{}{:<width$}  {:<7}",
        indent(2),
        target.name,
        target.profile.to_string()
    );
    for v in &target.versions {
        line.push_str(&format!(" -version={v}"));
    }
    line.trim_end().to_string()
}

/// The binaries of a release, grouped by platform.
///
/// An empty plan yields a single `Binaries: none` line.
pub fn format_build_plan(plan: &BuildPlan) -> Vec<String> {
    if plan.targets.is_empty() {
        return vec!["Binaries: none".to_string()];
    }
    let width = plan.targets.iter().map(|t| t.name.len()).max().unwrap_or(0);
    let mut lines = vec!["Binaries".to_string()];
    for platform in plan.platforms() {
        let targets: Vec<&BuildTarget> = plan
            .targets
            .iter()
            .filter(|t| t.platform == platform)
            .collect();
        let via_wine = platform == Platform::Windows && targets.iter().any(|t| t.use_wine);
        lines.push(if via_wine {
            format!("{}{platform} (wine)", indent(1))
        } else {
            format!("{}{platform}", indent(1))
        });
        lines.extend(targets.into_iter().map(|t| target_line(t, width)));
    }
    lines
}

pub fn format_release_summary(summary: &ReleaseSummary) -> Vec<String> {
    let mut lines = vec![format!("Release → {}", summary.dest.display())];
    lines.extend(format_build_plan(&summary.plan));
    if let Some(pdf) = &summary.pdf {
        lines.push(format!("PDF: {}", pdf.display()));
    }
    lines.extend(format_archives(&summary.archives));
    if let Some(sums) = &summary.checksums {
        lines.push(format!("Checksums: {}", sums.display()));
    }
    lines
}

pub fn print_release_summary(summary: &ReleaseSummary) {
    for line in format_release_summary(summary) {
        println!("{}", line);
    }
}
