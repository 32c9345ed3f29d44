//! Shared documentation pipeline steps.
//!
//! Both commands need the `dil` executable to generate documentation and a
//! scratch folder for intermediate macro files. The generator is built from
//! the project sources on first use.

use crate::archive::ArchiveError;
use crate::assets::AssetError;
use crate::ddoc::DdocError;
use crate::layout::ProjectLayout;
use crate::pdf::PdfError;
use crate::rewrite::RewriteReport;
use crate::sources::{SourceError, SourceFilter, collect_sources};
use crate::tools::{BuildParams, BuildProfile, Compiler, DocGenParams, DocGenerator, Locator, ToolError};
use crate::version::VersionError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;

/// Folder name prefix of scratch directories inside a destination.
pub const SCRATCH_PREFIX: &str = "tmp";
/// Module list written by the generator, inside the scratch directory.
pub const MODULE_LIST: &str = "modules.txt";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to create {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("The path '{0}' doesn't exist")]
    PhobosNotFound(PathBuf),
    #[error("The executable '{0}' couldn't be located or does not exist")]
    CompilerNotFound(String),
    #[error("Building the documentation generator failed: {0}")]
    Bootstrap(#[source] ToolError),
    #[error("Documentation generation failed: {0}")]
    Generate(#[source] ToolError),
    #[error(transparent)]
    Version(#[from] VersionError),
    #[error(transparent)]
    Sources(#[from] SourceError),
    #[error(transparent)]
    Ddoc(#[from] DdocError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Pdf(#[from] PdfError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// Progress reported by the pipelines while they run.
///
/// The pipelines never print; the CLI renders these through
/// [`output::format_event`](crate::output::format_event).
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Stage(String),
    Rewritten { file: PathBuf, report: RewriteReport },
    Warning(String),
}

/// Resolve the D compiler, given by name or path.
pub fn locate_compiler(tools: &impl Locator, compiler: &str) -> Result<PathBuf, PipelineError> {
    tools
        .locate(compiler)
        .ok_or_else(|| PipelineError::CompilerNotFound(compiler.to_string()))
}

/// Make sure `project.exe` exists, compiling it from `project.src` if not.
///
/// Returns `true` when a build was needed.
pub fn ensure_generator<T: Locator + Compiler>(
    tools: &T,
    project: &ProjectLayout,
    compiler: &str,
) -> Result<bool, PipelineError> {
    if project.exe.is_file() {
        return Ok(false);
    }
    tracing::info!(exe = %project.exe.display(), "documentation generator missing, building it");
    let compiler = locate_compiler(tools, compiler)?;
    let sources = collect_sources(&project.src, &SourceFilter::suffixes(&[".d"]))?;
    tools
        .compile(&BuildParams {
            compiler,
            use_wine: false,
            sources,
            import_paths: vec![project.src.clone()],
            output: project.exe.clone(),
            profile: BuildProfile::Release,
            versions: vec![],
        })
        .map_err(PipelineError::Bootstrap)?;
    Ok(true)
}

/// Run the generator.
pub fn generate_docs(tools: &impl DocGenerator, params: &DocGenParams) -> Result<(), PipelineError> {
    tracing::debug!(files = params.files.len(), dest = %params.dest.display(), "generating documentation");
    tools.generate(params).map_err(PipelineError::Generate)
}

/// Create a scratch directory inside `dest`, removed when dropped.
pub fn scratch_dir(dest: &Path) -> Result<TempDir, PipelineError> {
    tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempdir_in(dest)
        .map_err(|source| PipelineError::Io {
            path: dest.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::setup_project_fixture;
    use crate::tools::backend::tests::{MockTools, RecordedOp};
    use std::fs;

    #[test]
    fn existing_generator_is_not_rebuilt() {
        let tmp = TempDir::new().unwrap();
        let project = setup_project_fixture(tmp.path());
        fs::create_dir_all(&project.bin).unwrap();
        fs::write(&project.exe, "binary").unwrap();
        let tools = MockTools::new();

        assert!(!ensure_generator(&tools, &project, "dmd").unwrap());
        assert!(tools.get_operations().is_empty());
    }

    #[test]
    fn missing_generator_is_built_in_release_mode() {
        let tmp = TempDir::new().unwrap();
        let project = setup_project_fixture(tmp.path());
        let tools = MockTools::with_available(&["dmd"]);

        assert!(ensure_generator(&tools, &project, "dmd").unwrap());
        assert!(project.exe.is_file());
        assert_eq!(
            tools.get_operations(),
            vec![RecordedOp::Compile {
                output: project.exe.clone(),
                use_wine: false,
                release: true,
                versions: vec![],
            }]
        );
    }

    #[test]
    fn missing_compiler_is_reported() {
        let tmp = TempDir::new().unwrap();
        let project = setup_project_fixture(tmp.path());
        let err = ensure_generator(&MockTools::new(), &project, "gdmd").unwrap_err();
        assert_eq!(
            err.to_string(),
            "The executable 'gdmd' couldn't be located or does not exist"
        );
    }

    #[test]
    fn scratch_dir_is_removed_on_drop() {
        let tmp = TempDir::new().unwrap();
        let path = {
            let scratch = scratch_dir(tmp.path()).unwrap();
            assert!(scratch.path().starts_with(tmp.path()));
            fs::write(scratch.path().join(MODULE_LIST), "").unwrap();
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn generator_failure_is_wrapped() {
        let tools = MockTools {
            fail_generate: true,
            ..MockTools::default()
        };
        let tmp = TempDir::new().unwrap();
        let err = generate_docs(
            &tools,
            &DocGenParams {
                exe: "bin/dil".into(),
                dest: tmp.path().to_path_buf(),
                module_list: tmp.path().join(MODULE_LIST),
                files: vec![],
                versions: vec![],
                options: vec![],
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("`dil ddoc` failed (exit status 1)"));
    }
}
