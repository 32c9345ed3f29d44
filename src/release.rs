//! The `release` command: a distributable dil tree plus archives.
//!
//! ## Stages
//!
//! ```text
//! 1. validate   --src exists, git or --src, compiler on PATH
//! 2. checkout   <builddir>/dil.<VERSION>: --src copy, or git clone (+ -m overlay)
//! 3. prepare    bin/, doc/{htmlsrc,css,js,img}/, scratch dir
//! 4. version    patch src/dil/Version.d
//! 5. docs       --docs: dil ddoc --kandil into doc/ (+ --pdf)
//! 6. build      debug and release binaries per platform
//! 7. copy       dilconf.d, stylesheets, scripts, images
//! 8. package    drop doc/ unless --docs, archives, SHA256SUMS
//! ```
//!
//! Every planned build is attempted. If any of them fail the run stops after
//! the last build and nothing is packaged.

use crate::archive::{ArchiveOutcome, create_archives, created, write_checksums};
use crate::assets::{AssetError, copy_assets, release_plan};
use crate::config::ToolsConfig;
use crate::docgen::{
    MODULE_LIST, PipelineError, PipelineEvent, ensure_generator, generate_docs, locate_compiler,
    scratch_dir,
};
use crate::layout::{DocLayout, ProjectLayout, copy_dir_excluding, remove_tree};
use crate::pdf::{PdfError, PdfJob, PdfMetadata, export_pdf};
use crate::sources::{SourceError, SourceFilter, collect_sources};
use crate::tools::{ArchiveFormat, BuildParams, BuildProfile, DocGenParams, ToolError, Tools};
use crate::version::{Version, VersionError, patch_version_file};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("the given SRC path ({0}) doesn't exist")]
    SourceMissing(PathBuf),
    #[error("git is not in your PATH; specify --src instead")]
    GitMissing,
    #[error("Failed to check out a clean copy: {0}")]
    Checkout(#[source] ToolError),
    #[error(
        "{count} of {attempted} builds failed: {names}",
        count = .failures.len(),
        names = failed_names(.failures)
    )]
    Builds {
        attempted: usize,
        failures: Vec<BuildFailure>,
    },
    #[error("Failed to prepare {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Version(#[from] VersionError),
    #[error(transparent)]
    Sources(#[from] SourceError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Pdf(#[from] PdfError),
    #[error(transparent)]
    Archive(#[from] crate::archive::ArchiveError),
}

fn failed_names(failures: &[BuildFailure]) -> String {
    failures
        .iter()
        .map(|f| f.target.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A build that ran and failed.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildFailure {
    pub target: String,
    pub message: String,
}

/// Options of one `release` run.
#[derive(Debug, Clone)]
pub struct ReleaseOptions {
    pub version: Version,
    pub debug_symbols: bool,
    pub docs: bool,
    pub no_binaries: bool,
    pub pdf: bool,
    /// Overlay files modified in the working tree onto the clean checkout.
    pub copy_modified: bool,
    /// Use this folder instead of a git checkout.
    pub src: Option<PathBuf>,
    /// D compiler, by name or path.
    pub compiler: String,
    pub build_dir: PathBuf,
    pub formats: BTreeSet<ArchiveFormat>,
    pub checksums: bool,
}

impl ReleaseOptions {
    /// `<builddir>/dil.<VERSION>`
    pub fn dest(&self) -> PathBuf {
        self.build_dir.join(format!("dil.{}", self.version))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Windows,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Linux => f.write_str("Linux"),
            Platform::Windows => f.write_str("Windows"),
        }
    }
}

/// One binary of the release.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildTarget {
    pub platform: Platform,
    /// Output file name inside `bin/`.
    pub name: String,
    pub profile: BuildProfile,
    pub versions: Vec<String>,
    pub use_wine: bool,
}

/// The binaries a release will contain.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuildPlan {
    pub targets: Vec<BuildTarget>,
    /// Windows binaries were wanted but wine could not be found.
    pub wine_missing: bool,
}

impl BuildPlan {
    pub fn platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = Vec::new();
        for t in &self.targets {
            if !platforms.contains(&t.platform) {
                platforms.push(t.platform);
            }
        }
        platforms
    }
}

fn platform_targets(platform: Platform, debug_symbols: bool, use_wine: bool) -> Vec<BuildTarget> {
    let suffix = match platform {
        Platform::Linux => "",
        Platform::Windows => ".exe",
    };
    let debug = BuildProfile::Debug {
        symbols: debug_symbols,
    };
    [
        ("dil_d", debug, false),
        ("dil2_d", debug, true),
        ("dil", BuildProfile::Release, false),
        ("dil2", BuildProfile::Release, true),
    ]
    .into_iter()
    .map(|(name, profile, d2)| BuildTarget {
        platform,
        name: format!("{name}{suffix}"),
        profile,
        versions: if d2 { vec!["D2".to_string()] } else { vec![] },
        use_wine,
    })
    .collect()
}

/// Decide which binaries to build.
///
/// Windows hosts build Windows binaries only; other hosts build Linux
/// binaries, plus Windows binaries through wine when it is available.
pub fn plan_builds(
    host_is_windows: bool,
    wine_available: bool,
    no_binaries: bool,
    debug_symbols: bool,
) -> BuildPlan {
    if no_binaries {
        return BuildPlan::default();
    }
    if host_is_windows {
        return BuildPlan {
            targets: platform_targets(Platform::Windows, debug_symbols, false),
            wine_missing: false,
        };
    }
    let mut targets = platform_targets(Platform::Linux, debug_symbols, false);
    if wine_available {
        targets.extend(platform_targets(Platform::Windows, debug_symbols, true));
    }
    BuildPlan {
        targets,
        wine_missing: !wine_available,
    }
}

/// What a release run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseSummary {
    pub dest: PathBuf,
    pub plan: BuildPlan,
    pub pdf: Option<PathBuf>,
    pub archives: Vec<ArchiveOutcome>,
    pub checksums: Option<PathBuf>,
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ReleaseError + '_ {
    move |source| ReleaseError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Put a clean copy of the sources at `dest`.
fn checkout<T: Tools>(
    tools: &T,
    project: &ProjectLayout,
    opts: &ReleaseOptions,
    dest: &Path,
) -> Result<(), ReleaseError> {
    if let Some(src) = &opts.src {
        // Earlier releases in a build dir under SRC stay out of the copy
        return copy_dir_excluding(src, dest, &[opts.build_dir.as_path()]).map_err(io_err(dest));
    }
    tools
        .clone_repo(&project.root, dest)
        .map_err(ReleaseError::Checkout)?;
    remove_tree(&dest.join(".git")).map_err(io_err(dest))?;
    if opts.copy_modified {
        let modified = tools
            .modified_files(&project.root)
            .map_err(ReleaseError::Checkout)?;
        for rel in modified {
            let target = dest.join(&rel);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(io_err(parent))?;
            }
            fs::copy(project.root.join(&rel), &target).map_err(io_err(&target))?;
            tracing::debug!(file = %rel.display(), "copied modified file");
        }
    }
    Ok(())
}

/// Build a release of the project at `project` as described by `opts`.
pub fn run<T: Tools>(
    tools: &T,
    config: &ToolsConfig,
    project: &ProjectLayout,
    opts: &ReleaseOptions,
    mut on_event: impl FnMut(PipelineEvent),
) -> Result<ReleaseSummary, ReleaseError> {
    if let Some(src) = &opts.src {
        if !src.exists() {
            return Err(ReleaseError::SourceMissing(src.clone()));
        }
    } else if tools.locate(&config.tools.git).is_none() {
        return Err(ReleaseError::GitMissing);
    }
    if !opts.no_binaries {
        locate_compiler(tools, &opts.compiler)?;
    }

    let dest = opts.dest();
    fs::create_dir_all(&opts.build_dir).map_err(io_err(&opts.build_dir))?;
    remove_tree(&dest).map_err(io_err(&dest))?;
    on_event(PipelineEvent::Stage(format!("Checking out {}", dest.display())));
    checkout(tools, project, opts, &dest)?;

    let release = ProjectLayout::new(&dest);
    let doc = DocLayout::new(&release.doc);
    fs::create_dir_all(&release.bin).map_err(io_err(&release.bin))?;
    doc.create(true).map_err(io_err(&doc.root))?;
    let scratch = scratch_dir(&dest)?;

    let filter = SourceFilter {
        suffixes: config.release.source_suffixes.clone(),
        ..SourceFilter::default()
    };
    let sources = collect_sources(&release.src, &filter)?;
    patch_version_file(&release.version_file(), &opts.version)?;

    let mut pdf = None;
    if opts.docs {
        ensure_generator(tools, project, &opts.compiler)?;
        let mut files = vec![
            release.kandil.ddoc.clone(),
            release.data.join("macros_dil.ddoc"),
            release.data.join("dilconf.d"),
        ];
        files.extend(sources.iter().cloned());
        on_event(PipelineEvent::Stage("Generating documentation".to_string()));
        generate_docs(
            tools,
            &DocGenParams {
                exe: project.exe.clone(),
                dest: doc.root.clone(),
                module_list: scratch.path().join(MODULE_LIST),
                files,
                versions: vec!["DDoc".to_string()],
                options: ["-v", "-i", "-hl", "--kandil"].map(String::from).to_vec(),
            },
        )?;
        if opts.pdf {
            on_event(PipelineEvent::Stage("Rendering PDF".to_string()));
            let version = opts.version.to_string();
            let job = PdfJob {
                project: "dil".to_string(),
                metadata: PdfMetadata::dil(&version, &config.docs.symbol_link_base),
                version,
                doc_dir: doc.root.clone(),
                scratch: scratch.path().to_path_buf(),
                ignore: Vec::new(),
                stage: Vec::new(),
            };
            pdf = Some(export_pdf(tools, &job)?);
        }
    } else if opts.pdf {
        on_event(PipelineEvent::Warning(
            "--pdf has no effect without --docs".to_string(),
        ));
    }

    let plan = plan_builds(
        tools.host_is_windows(),
        tools.locate(&config.tools.wine).is_some(),
        opts.no_binaries,
        opts.debug_symbols,
    );
    if plan.wine_missing {
        on_event(PipelineEvent::Warning(
            "can't build windows binaries: wine is not installed or not in PATH".to_string(),
        ));
    }
    build_all(tools, opts, &release, &sources, &plan, &mut on_event)?;

    on_event(PipelineEvent::Stage("Copying files".to_string()));
    copy_assets(&release_plan(&release, &doc)?)?;
    if !opts.docs {
        remove_tree(&doc.root).map_err(io_err(&doc.root))?;
    }
    scratch.close().map_err(io_err(&dest))?;

    let archives = create_archives(tools, &dest, &opts.formats)?;
    let archived = created(&archives);
    let checksums = if opts.checksums && !archived.is_empty() {
        Some(write_checksums(&opts.build_dir, &archived)?)
    } else {
        None
    };

    Ok(ReleaseSummary {
        dest,
        plan,
        pdf,
        archives,
        checksums,
    })
}

fn build_all<T: Tools>(
    tools: &T,
    opts: &ReleaseOptions,
    release: &ProjectLayout,
    sources: &[PathBuf],
    plan: &BuildPlan,
    on_event: &mut impl FnMut(PipelineEvent),
) -> Result<(), ReleaseError> {
    let mut failures = Vec::new();
    for platform in plan.platforms() {
        on_event(PipelineEvent::Stage(format!("Building {platform} binaries")));
        for target in plan.targets.iter().filter(|t| t.platform == platform) {
            let params = BuildParams {
                compiler: PathBuf::from(&opts.compiler),
                use_wine: target.use_wine,
                sources: sources.to_vec(),
                import_paths: vec![release.src.clone()],
                output: release.bin.join(&target.name),
                profile: target.profile,
                versions: target.versions.clone(),
            };
            if let Err(e) = tools.compile(&params) {
                tracing::error!(binary = %target.name, "build failed: {e}");
                failures.push(BuildFailure {
                    target: target.name.clone(),
                    message: e.to_string(),
                });
            }
        }
    }
    if failures.is_empty() {
        Ok(())
    } else {
        Err(ReleaseError::Builds {
            attempted: plan.targets.len(),
            failures,
        })
    }
}
