//! Ddoc macro and HTML post-processing.
//!
//! Two rule lists live here:
//!
//! - [`std_ddoc_rules`] turns Phobos' stock `std.ddoc` into the `phobos.ddoc`
//!   macro file handed to the generator.
//! - [`phobos_html_rules`] fixes up the generated top-level `phobos.html`.
//!
//! ## Rule order in `std_ddoc_rules`
//!
//! | # | Rule | Depends on |
//! |---|------|------------|
//! | 1 | `icon` | (guarded: skipped if the icon link is present) |
//! | 2 | `local-assets` | must precede 3, which would otherwise absolutize `../style.css` |
//! | 3 | `absolute-links` | 2 |
//! | 4 | `generated-by` | |
//! | 5 | `dotted-hrefs` | |
//! | 6 | `linkify-title` | |
//! | 7 | `index-link` | |
//!
//! The auxiliary macro files (`missing.ddoc`, `overrides.ddoc`) are static
//! text and are written by the `write_*` functions below.

use crate::rewrite::{Replacement, RewriteReport, Rule, RuleSet, literal, pattern};
use regex::Captures;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DdocError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Favicon link injected into every page head.
pub const ICON_LINK: &str = r#"<link rel="icon" type="image/gif" href="./holy.gif">"#;

/// Undefined macros used by Phobos sources but absent from `std.ddoc`.
pub const MISSING_MACROS: &str = "WIKI =
COMMENT = <!-- -->
DOLLAR = $
_PI = &pi;
POW = $1<sup>$2</sup>
TABLE_DOMRG = $(TABLE_SV $0)
std_boilerplate = <!-- undefined macro in std/outbuffer.d -->
DOMAIN = <!-- undefined macro in std/math.d -->
RANGE = <!-- undefined macro in std/math.d -->";

/// Overrides for the classic front-end: footer, source link and symbol anchors.
pub const CLASSIC_OVERRIDES: &str = r#"
GENERATED_BY = Page generated by $(LINK2 http://code.google.com/p/dil, dil) on $(DATETIME)
SRCFILE = ./htmlsrc/$(DIL_MODFQN).html
DIL_SYMBOL = <a href="$(SRCFILE)#L$4" class="sym$3" name="$2" title="At line $4.">$1</a>
"#;

/// Overrides for the kandil front-end.
pub const KANDIL_OVERRIDES: &str = "
COPYRIGHT = Copyright © 1999-2009 by Digital Mars ®, All Rights Reserved.
";

/// The versioned digitalmars.com prefix replacing `../` links.
pub fn absolute_prefix(base_url: &str, d_version: &str) -> String {
    format!("{}/{}/", base_url.trim_end_matches('/'), d_version)
}

fn dot_underscores(caps: &Captures) -> String {
    caps[0].replace('_', ".")
}

fn insert_index_link(caps: &Captures) -> String {
    format!(
        "{}\r\n$(UL\r\n$(LI<a href=\"index.html\" title=\"Index of all HTML files\">Index</a>)\r\n)",
        &caps[1]
    )
}

/// Rules turning `std.ddoc` into `phobos.ddoc`, in application order.
pub fn std_ddoc_rules(base_url: &str, d_version: &str) -> RuleSet {
    RuleSet::new(vec![
        Rule::new(
            "icon",
            pattern("</head>"),
            Replacement::Literal(format!("{ICON_LINK}\r\n</head>")),
        )
        .unless_present(ICON_LINK),
        Rule::new(
            "local-assets",
            pattern(r"\.\./(style\.css|dmlogo\.gif)"),
            Replacement::Template("./$1".into()),
        ),
        Rule::new(
            "absolute-links",
            literal("../"),
            Replacement::Literal(absolute_prefix(base_url, d_version)),
        ),
        Rule::new(
            "generated-by",
            pattern("Page generated by.+"),
            Replacement::Literal("$(GENERATED_BY)".into()),
        ),
        Rule::new(
            "dotted-hrefs",
            pattern(r#"href="std_.+?""#),
            Replacement::With(dot_underscores),
        ),
        Rule::new(
            "linkify-title",
            pattern(r"<h1>\$\(TITLE\)</h1>"),
            Replacement::Literal(r#"<h1><a href="$(SRCFILE)">$(TITLE)</a></h1>"#.into()),
        ),
        Rule::new(
            "index-link",
            pattern("(NAVIGATION_PHOBOS=\r\n<div class=\"navblock\">)"),
            Replacement::With(insert_index_link),
        ),
    ])
}

/// Rules fixing the generated `phobos.html`, in application order.
pub fn phobos_html_rules(base_url: &str, d_version: &str) -> RuleSet {
    RuleSet::new(vec![
        Rule::new(
            "absolute-links",
            literal("../"),
            Replacement::Literal(absolute_prefix(base_url, d_version)),
        ),
        Rule::new(
            "dotted-hrefs",
            pattern(r#"href="std_[^"]+""#),
            Replacement::With(dot_underscores),
        ),
        Rule::new(
            "delinkify-title",
            pattern(r"<h1><a[^>]+>(.+?)</a></h1>"),
            Replacement::Template("<h1>$1</h1>".into()),
        ),
    ])
}

fn read(path: &Path) -> Result<String, DdocError> {
    fs::read_to_string(path).map_err(|source| DdocError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, contents: &str) -> Result<(), DdocError> {
    fs::write(path, contents).map_err(|source| DdocError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Rewrite `std_ddoc` into a new macro file at `phobos_ddoc`.
pub fn transform_std_ddoc(
    std_ddoc: &Path,
    phobos_ddoc: &Path,
    base_url: &str,
    d_version: &str,
) -> Result<RewriteReport, DdocError> {
    let text = read(std_ddoc)?;
    let (out, report) = std_ddoc_rules(base_url, d_version).apply(&text);
    write(phobos_ddoc, &out)?;
    Ok(report)
}

/// Fix the generated `phobos.html` in place.
pub fn fix_phobos_html(
    phobos_html: &Path,
    base_url: &str,
    d_version: &str,
) -> Result<RewriteReport, DdocError> {
    let text = read(phobos_html)?;
    let (out, report) = phobos_html_rules(base_url, d_version).apply(&text);
    write(phobos_html, &out)?;
    Ok(report)
}

pub fn write_missing_macros(path: &Path) -> Result<(), DdocError> {
    write(path, MISSING_MACROS)
}

/// Write the `overrides.ddoc` matching the chosen front-end.
pub fn write_overrides(path: &Path, kandil: bool) -> Result<(), DdocError> {
    write(path, if kandil { KANDIL_OVERRIDES } else { CLASSIC_OVERRIDES })
}
