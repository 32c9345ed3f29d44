//! Capability traits for external tools.
//!
//! The pipelines never spawn processes themselves. They talk to these traits,
//! one per kind of external collaborator:
//!
//! | Trait | Production tool |
//! |---|---|
//! | [`Locator`] | `PATH` lookup, host platform |
//! | [`DocGenerator`] | `dil ddoc` |
//! | [`Compiler`] | `dmd` (optionally through wine) |
//! | [`Archiver`] | `tar`, `zip`, `7zr` |
//! | [`DocumentRenderer`] | HTML → PDF helper |
//! | [`SourceControl`] | `git` |
//! | [`Registry`] | `reg` (optionally through wine) |
//!
//! [`Tools`] bundles them. The production implementation is
//! [`SystemTools`](super::system::SystemTools); tests use the recording
//! `MockTools` below.

use super::params::{ArchiveParams, BuildParams, DocGenParams, RenderParams};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` failed ({})", exit_label(.code))]
    Failed { command: String, code: Option<i32> },
    #[error("Unexpected output from {program}: {detail}")]
    Output { program: String, detail: String },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit status {c}"),
        None => "terminated by signal".to_string(),
    }
}

/// Program lookup and host facts.
pub trait Locator {
    /// Full path of `program` if it can be found on `PATH` (or as a path).
    fn locate(&self, program: &str) -> Option<PathBuf>;
    fn host_is_windows(&self) -> bool;
}

pub trait DocGenerator {
    fn generate(&self, params: &DocGenParams) -> Result<(), ToolError>;
}

pub trait Compiler {
    fn compile(&self, params: &BuildParams) -> Result<(), ToolError>;
}

pub trait Archiver {
    /// Create the archive described by `params`; returns its path.
    fn archive(&self, params: &ArchiveParams) -> Result<PathBuf, ToolError>;
}

pub trait DocumentRenderer {
    fn render(&self, params: &RenderParams) -> Result<(), ToolError>;
}

pub trait SourceControl {
    /// Clone the repository at `repo` into `dest`.
    fn clone_repo(&self, repo: &Path, dest: &Path) -> Result<(), ToolError>;
    /// Tracked files with uncommitted modifications, relative to `repo`.
    fn modified_files(&self, repo: &Path) -> Result<Vec<PathBuf>, ToolError>;
}

/// The user `PATH` stored in the Windows (or wine) registry.
pub trait Registry {
    fn read_user_path(&self) -> Result<Option<String>, ToolError>;
    fn write_user_path(&self, value: &str) -> Result<(), ToolError>;
}

/// Everything the pipelines need from the outside world.
pub trait Tools:
    Locator + DocGenerator + Compiler + Archiver + DocumentRenderer + SourceControl + Registry
{
}

impl<T> Tools for T where
    T: Locator + DocGenerator + Compiler + Archiver + DocumentRenderer + SourceControl + Registry
{
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::layout::copy_dir_recursive;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::fs;

    /// Mock tools that record invocations and fake their file outputs.
    ///
    /// - the generator writes `phobos.html` and `index.html` into the destination
    /// - the compiler writes its output file
    /// - the archiver writes the archive file
    /// - the renderer writes the PDF
    /// - clone copies the repository and adds a `.git` folder
    #[derive(Default)]
    pub struct MockTools {
        pub available: HashSet<String>,
        pub windows_host: bool,
        /// File names whose compilation fails.
        pub failing_builds: HashSet<String>,
        pub fail_generate: bool,
        pub modified: Vec<PathBuf>,
        pub registry_path: RefCell<Option<String>>,
        pub operations: RefCell<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Generate {
            dest: PathBuf,
            files: Vec<PathBuf>,
            options: Vec<String>,
        },
        Compile {
            output: PathBuf,
            use_wine: bool,
            release: bool,
            versions: Vec<String>,
        },
        Archive {
            file_name: String,
        },
        Render {
            output: PathBuf,
            pages: usize,
        },
        Clone {
            dest: PathBuf,
        },
        WriteRegistry(String),
    }

    impl MockTools {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_available(programs: &[&str]) -> Self {
            Self {
                available: programs.iter().map(|p| p.to_string()).collect(),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.borrow().clone()
        }

        pub fn compiled_outputs(&self) -> Vec<String> {
            self.get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Compile { output, .. } => {
                        Some(output.file_name()?.to_string_lossy().into_owned())
                    }
                    _ => None,
                })
                .collect()
        }

        fn record(&self, op: RecordedOp) {
            self.operations.borrow_mut().push(op);
        }
    }

    impl Locator for MockTools {
        fn locate(&self, program: &str) -> Option<PathBuf> {
            self.available
                .contains(program)
                .then(|| PathBuf::from("/usr/bin").join(program))
        }

        fn host_is_windows(&self) -> bool {
            self.windows_host
        }
    }

    impl DocGenerator for MockTools {
        fn generate(&self, params: &DocGenParams) -> Result<(), ToolError> {
            self.record(RecordedOp::Generate {
                dest: params.dest.clone(),
                files: params.files.clone(),
                options: params.options.clone(),
            });
            if self.fail_generate {
                return Err(ToolError::Failed {
                    command: "dil ddoc".to_string(),
                    code: Some(1),
                });
            }
            fs::create_dir_all(&params.dest)?;
            fs::write(
                params.dest.join("phobos.html"),
                r#"<h1><a href="./htmlsrc/phobos.html">Phobos</a></h1><a href="../lex.html">Lexer</a>"#,
            )?;
            fs::write(params.dest.join("index.html"), "<ul></ul>")?;
            fs::write(&params.module_list, "std.string\n")?;
            Ok(())
        }
    }

    impl Compiler for MockTools {
        fn compile(&self, params: &BuildParams) -> Result<(), ToolError> {
            self.record(RecordedOp::Compile {
                output: params.output.clone(),
                use_wine: params.use_wine,
                release: matches!(params.profile, crate::tools::BuildProfile::Release),
                versions: params.versions.clone(),
            });
            let name = params
                .output
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if self.failing_builds.contains(&name) {
                return Err(ToolError::Failed {
                    command: format!("dmd -of{name}"),
                    code: Some(1),
                });
            }
            if let Some(parent) = params.output.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&params.output, "binary")?;
            Ok(())
        }
    }

    impl Archiver for MockTools {
        fn archive(&self, params: &ArchiveParams) -> Result<PathBuf, ToolError> {
            self.record(RecordedOp::Archive {
                file_name: params.file_name(),
            });
            let out = params.output();
            fs::write(&out, format!("archive of {}", params.src.display()))?;
            Ok(out)
        }
    }

    impl DocumentRenderer for MockTools {
        fn render(&self, params: &RenderParams) -> Result<(), ToolError> {
            self.record(RecordedOp::Render {
                output: params.output.clone(),
                pages: params.html_files.len(),
            });
            fs::write(&params.output, "%PDF-1.4")?;
            Ok(())
        }
    }

    impl SourceControl for MockTools {
        fn clone_repo(&self, repo: &Path, dest: &Path) -> Result<(), ToolError> {
            self.record(RecordedOp::Clone {
                dest: dest.to_path_buf(),
            });
            copy_dir_recursive(repo, dest)?;
            fs::create_dir_all(dest.join(".git"))?;
            Ok(())
        }

        fn modified_files(&self, _repo: &Path) -> Result<Vec<PathBuf>, ToolError> {
            Ok(self.modified.clone())
        }
    }

    impl Registry for MockTools {
        fn read_user_path(&self) -> Result<Option<String>, ToolError> {
            Ok(self.registry_path.borrow().clone())
        }

        fn write_user_path(&self, value: &str) -> Result<(), ToolError> {
            self.record(RecordedOp::WriteRegistry(value.to_string()));
            *self.registry_path.borrow_mut() = Some(value.to_string());
            Ok(())
        }
    }

    #[test]
    fn mock_locates_only_available_programs() {
        let tools = MockTools::with_available(&["tar"]);
        assert!(tools.locate("tar").is_some());
        assert!(tools.locate("7zr").is_none());
    }

    #[test]
    fn mock_records_failed_compile() {
        let mut tools = MockTools::new();
        tools.failing_builds.insert("dil".to_string());
        let tmp = tempfile::TempDir::new().unwrap();
        let err = tools
            .compile(&BuildParams {
                compiler: "dmd".into(),
                use_wine: false,
                sources: vec![],
                import_paths: vec![],
                output: tmp.path().join("dil"),
                profile: crate::tools::BuildProfile::Release,
                versions: vec![],
            })
            .unwrap_err();
        assert!(err.to_string().contains("exit status 1"));
        assert_eq!(tools.compiled_outputs(), vec!["dil"]);
        assert!(!tmp.path().join("dil").exists());
    }

    #[test]
    fn failed_error_names_signal_termination() {
        let err = ToolError::Failed {
            command: "7zr a x.7z x".to_string(),
            code: None,
        };
        assert_eq!(err.to_string(), "`7zr a x.7z x` failed (terminated by signal)");
    }
}
