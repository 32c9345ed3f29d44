//! The `phobos-doc` command: HTML (and optionally PDF) documentation of the
//! Phobos standard library.
//!
//! ## Stages
//!
//! ```text
//! 1. bootstrap   build bin/dil if it is missing
//! 2. prepare     <dest>/, htmlsrc/ (+ css/ js/ img/ for kandil), scratch dir
//! 3. collect     Phobos modules, minus ignore list and internal/
//! 4. macros      std.ddoc → phobos.ddoc, missing.ddoc, overrides.ddoc (+ index.d)
//! 5. generate    dil ddoc <dest> …
//! 6. fix         phobos.html links and title
//! 7. assets      images, stylesheets, scripts
//! 8. pdf         kandil only
//! 9. archive     Phobos.<VERSION>_doc.7z with --zip
//! ```
//!
//! The scratch directory lives inside the destination and disappears when the
//! run returns, whether it succeeded or not.
//!
//! ## Generator input order
//!
//! The generator reads macro files in order, later definitions overriding
//! earlier ones:
//!
//! | Front-end | Files |
//! |---|---|
//! | kandil | `phobos.ddoc`, `kandil.ddoc`, `missing.ddoc`, `overrides.ddoc`, `phobos.d`, modules |
//! | classic | modules, `phobos.d`, `index.d`, `phobos.ddoc`, `missing.ddoc`, `overrides.ddoc` |

use crate::archive::{ArchiveOutcome, create_named_archives};
use crate::assets::{FrontEnd, copy_assets, phobos_plan};
use crate::config::ToolsConfig;
use crate::ddoc;
use crate::docgen::{
    MODULE_LIST, PipelineError, PipelineEvent, ensure_generator, generate_docs, scratch_dir,
};
use crate::layout::{DocLayout, PhobosLayout, ProjectLayout};
use crate::pdf::{PdfJob, PdfMetadata, export_pdf};
use crate::sources::{SourceFilter, collect_sources, write_index_file};
use crate::tools::{ArchiveFormat, DocGenParams, Tools};
use crate::version::Version;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Options of one `phobos-doc` run.
#[derive(Debug, Clone)]
pub struct DocOptions {
    pub version: Version,
    /// Phobos source folder (the one holding `std.ddoc` and `phobos.d`).
    pub phobos_src: PathBuf,
    pub dest: PathBuf,
    pub zip: bool,
    pub pdf: bool,
    pub kandil: bool,
}

impl DocOptions {
    fn front_end(&self) -> FrontEnd {
        if self.kandil {
            FrontEnd::Kandil
        } else {
            FrontEnd::Classic
        }
    }

    /// Name of the `--zip` archive, without extension.
    pub fn archive_name(&self) -> String {
        format!("Phobos.{}_doc", self.version)
    }
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DocSummary {
    pub dest: PathBuf,
    pub modules: usize,
    pub assets: usize,
    pub built_generator: bool,
    pub pdf: Option<PathBuf>,
    pub archives: Vec<ArchiveOutcome>,
}

pub(crate) fn doc_filter(config: &ToolsConfig) -> SourceFilter {
    SourceFilter {
        suffixes: config.docs.source_suffixes.clone(),
        ignore: config.docs.ignore.clone(),
        internal_dir: Some(config.docs.internal_dir.clone()),
    }
}

/// Generate the Phobos documentation described by `opts`.
pub fn run<T: Tools>(
    tools: &T,
    config: &ToolsConfig,
    project: &ProjectLayout,
    opts: &DocOptions,
    mut on_event: impl FnMut(PipelineEvent),
) -> Result<DocSummary, PipelineError> {
    let phobos = PhobosLayout::new(&opts.phobos_src);
    if !phobos.src.is_dir() {
        return Err(PipelineError::PhobosNotFound(phobos.src));
    }
    let d_version = opts.version.d_version();
    let base_url = config.docs.base_url.as_str();

    let built_generator = ensure_generator(tools, project, &config.tools.compiler)?;

    let dest = DocLayout::new(&opts.dest);
    dest.create(opts.kandil).map_err(|source| PipelineError::Io {
        path: dest.root.clone(),
        source,
    })?;
    let scratch = scratch_dir(&dest.root)?;
    let tmp = scratch.path();

    let modules = collect_sources(&phobos.src, &doc_filter(config))?;
    on_event(PipelineEvent::Stage(format!(
        "Documenting {} Phobos modules",
        modules.len()
    )));

    let phobos_ddoc = tmp.join("phobos.ddoc");
    let missing_ddoc = tmp.join("missing.ddoc");
    let overrides_ddoc = tmp.join("overrides.ddoc");
    let report = ddoc::transform_std_ddoc(&phobos.std_ddoc(), &phobos_ddoc, base_url, &d_version)?;
    on_event(PipelineEvent::Rewritten {
        file: phobos_ddoc.clone(),
        report,
    });
    ddoc::write_missing_macros(&missing_ddoc)?;
    ddoc::write_overrides(&overrides_ddoc, opts.kandil)?;

    let mut options: Vec<String> = ["-v", "-i", "-hl"].map(String::from).to_vec();
    let files = if opts.kandil {
        options.push("--kandil".to_string());
        let mut files = vec![
            phobos_ddoc,
            project.kandil.ddoc.clone(),
            missing_ddoc,
            overrides_ddoc,
            phobos.phobos_d(),
        ];
        files.extend(modules.iter().cloned());
        files
    } else {
        let index_d = tmp.join("index.d");
        write_index_file(&index_d, &phobos.src, &modules)?;
        let mut files = modules.clone();
        files.extend([phobos.phobos_d(), index_d, phobos_ddoc, missing_ddoc, overrides_ddoc]);
        files
    };

    on_event(PipelineEvent::Stage("Generating documentation".to_string()));
    generate_docs(
        tools,
        &DocGenParams {
            exe: project.exe.clone(),
            dest: dest.root.clone(),
            module_list: tmp.join(MODULE_LIST),
            files,
            versions: vec!["DDoc".to_string()],
            options,
        },
    )?;

    let phobos_html = dest.root.join("phobos.html");
    let report = ddoc::fix_phobos_html(&phobos_html, base_url, &d_version)?;
    on_event(PipelineEvent::Rewritten {
        file: phobos_html,
        report,
    });

    on_event(PipelineEvent::Stage("Copying files".to_string()));
    let plan = phobos_plan(opts.front_end(), project, &phobos, &dest)?;
    let assets = copy_assets(&plan)?;

    let pdf = match (opts.pdf, opts.kandil) {
        (true, true) => {
            on_event(PipelineEvent::Stage("Rendering PDF".to_string()));
            let version = opts.version.to_string();
            let job = PdfJob {
                project: "Phobos".to_string(),
                metadata: PdfMetadata::phobos(&version, &config.docs.symbol_link_base),
                version,
                doc_dir: dest.root.clone(),
                scratch: tmp.to_path_buf(),
                ignore: config.docs.pdf_ignore.clone(),
                stage: vec!["erf.gif".to_string(), "erfc.gif".to_string()],
            };
            Some(export_pdf(tools, &job)?)
        }
        (true, false) => {
            on_event(PipelineEvent::Warning(
                "can only create a PDF document from kandil HTML files".to_string(),
            ));
            None
        }
        (false, _) => None,
    };

    scratch.close().map_err(|source| PipelineError::Io {
        path: dest.root.clone(),
        source,
    })?;

    let archives = if opts.zip {
        let formats = BTreeSet::from([ArchiveFormat::SevenZip]);
        create_named_archives(tools, &dest.root, &opts.archive_name(), &formats)?
    } else {
        Vec::new()
    };

    Ok(DocSummary {
        dest: dest.root,
        modules: modules.len(),
        assets,
        built_generator,
        pdf,
        archives,
    })
}
