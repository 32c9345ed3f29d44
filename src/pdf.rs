//! PDF export of generated HTML documentation.
//!
//! The rendering itself is delegated to an external helper through
//! [`DocumentRenderer`]. This module picks the pages, stages what the helper
//! needs in the scratch directory, and writes the metadata it reads:
//!
//! ```text
//! <scratch>/
//! ├── erf.gif, erfc.gif        Phobos only, referenced by std.math pages
//! └── pdf_metadata.json        PdfMetadata
//! ```
//!
//! The document lands next to the pages as `<Project>.<version>.API.pdf`.

use crate::tools::{DocumentRenderer, RenderParams, ToolError};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const METADATA_FILE: &str = "pdf_metadata.json";

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to list HTML pages in {dir}: {source}")]
    List {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No HTML pages to render in {0}")]
    NoPages(PathBuf),
    #[error("Failed to stage {path}: {source}")]
    Stage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode PDF metadata: {0}")]
    Json(#[from] serde_json::Error),
    #[error("PDF rendering failed: {0}")]
    Render(#[from] ToolError),
}

/// Document properties passed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdfMetadata {
    pub pdf_title: String,
    /// HTML fragment shown on the cover page.
    pub cover_title: String,
    pub author: String,
    pub subject: String,
    pub keywords: String,
    /// Markup flavour of the input pages when it is not plain HTML.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_html: Option<String>,
    pub nested_toc: bool,
    /// Base of the links symbol anchors are rewritten to.
    pub symlink: String,
}

impl PdfMetadata {
    pub fn phobos(version: &str, symbol_link_base: &str) -> Self {
        Self {
            pdf_title: format!("Phobos {version} API"),
            cover_title: format!("Phobos {version}<br/><b>API</b>"),
            author: "Walter Bright".to_string(),
            subject: "Programming API".to_string(),
            keywords: "Phobos D Standard Library".to_string(),
            x_html: None,
            nested_toc: true,
            symlink: format!("{symbol_link_base}Phobos_{version}"),
        }
    }

    pub fn dil(version: &str, symbol_link_base: &str) -> Self {
        Self {
            pdf_title: format!("dil {version} API"),
            cover_title: format!("dil {version}<br/><b>API</b>"),
            author: "Aziz Köksal".to_string(),
            subject: "Compiler API".to_string(),
            keywords: "dil D compiler API documentation".to_string(),
            x_html: Some("XHTML".to_string()),
            nested_toc: true,
            symlink: format!("{symbol_link_base}dil_{version}"),
        }
    }
}

/// Everything needed to render one API document.
#[derive(Debug, Clone)]
pub struct PdfJob {
    /// `Phobos` or `dil`; the first part of the output name.
    pub project: String,
    pub version: String,
    pub doc_dir: PathBuf,
    pub scratch: PathBuf,
    pub metadata: PdfMetadata,
    /// Page file names left out of the document.
    pub ignore: Vec<String>,
    /// Files of `doc_dir` copied into the scratch directory first.
    pub stage: Vec<String>,
}

impl PdfJob {
    pub fn output(&self) -> PathBuf {
        self.doc_dir
            .join(format!("{}.{}.API.pdf", self.project, self.version))
    }
}

/// Sorted `*.html` files of `dir` whose names are not in `ignore`.
pub fn collect_pages(dir: &Path, ignore: &[String]) -> Result<Vec<PathBuf>, PdfError> {
    let list_err = |source| PdfError::List {
        dir: dir.to_path_buf(),
        source,
    };
    let mut pages = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_err)? {
        let path = entry.map_err(list_err)?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.is_file() && name.ends_with(".html") && !ignore.iter().any(|i| i == name) {
            pages.push(path);
        }
    }
    pages.sort();
    Ok(pages)
}

/// Render `job` and return the path of the written PDF.
pub fn export_pdf(renderer: &impl DocumentRenderer, job: &PdfJob) -> Result<PathBuf, PdfError> {
    let pages = collect_pages(&job.doc_dir, &job.ignore)?;
    if pages.is_empty() {
        return Err(PdfError::NoPages(job.doc_dir.clone()));
    }

    for name in &job.stage {
        let from = job.doc_dir.join(name);
        fs::copy(&from, job.scratch.join(name))
            .map_err(|source| PdfError::Stage { path: from, source })?;
    }

    let metadata = job.scratch.join(METADATA_FILE);
    let json = serde_json::to_string_pretty(&job.metadata)?;
    fs::write(&metadata, json).map_err(|source| PdfError::Stage {
        path: metadata.clone(),
        source,
    })?;

    let output = job.output();
    tracing::info!(pages = pages.len(), output = %output.display(), "rendering PDF");
    renderer.render(&RenderParams {
        html_files: pages,
        output: output.clone(),
        work_dir: job.scratch.clone(),
        metadata,
    })?;
    Ok(output)
}
