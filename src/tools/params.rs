//! Parameter types for external tool invocations.
//!
//! These structs describe *what* to run, not *how* to run it. Each one knows
//! the argument vector its tool expects, so command lines are unit testable
//! without spawning anything. The [`backend`](super::backend) traits take
//! them as input; [`SystemTools`](super::system::SystemTools) executes them.
//!
//! ## Types
//!
//! - [`DocGenParams`]: `dil ddoc` invocation with destination, module list and files.
//! - [`BuildProfile`] / [`BuildParams`]: one `dmd` compilation of the compiler.
//! - [`ArchiveFormat`] / [`ArchiveParams`]: one archive of a release tree.
//! - [`RenderParams`]: one HTML → PDF rendering.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Invocation of the documentation generator.
#[derive(Debug, Clone, PartialEq)]
pub struct DocGenParams {
    pub exe: PathBuf,
    pub dest: PathBuf,
    /// Where the generator records the modules it processed.
    pub module_list: PathBuf,
    /// Macro files and modules, in the order the generator reads them.
    pub files: Vec<PathBuf>,
    /// Version identifiers, passed as `-version=<v>`.
    pub versions: Vec<String>,
    pub options: Vec<String>,
}

impl DocGenParams {
    /// `ddoc <dest> -m=<modlist> <options…> -version=<v>… <files…>`
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["ddoc".into(), self.dest.clone().into()];
        let mut modlist = OsString::from("-m=");
        modlist.push(&self.module_list);
        args.push(modlist);
        args.extend(self.options.iter().map(OsString::from));
        args.extend(self.versions.iter().map(|v| OsString::from(format!("-version={v}"))));
        args.extend(self.files.iter().map(OsString::from));
        args
    }
}

/// Debug or optimized build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildProfile {
    Debug { symbols: bool },
    Release,
}

impl fmt::Display for BuildProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildProfile::Debug { .. } => f.write_str("debug"),
            BuildProfile::Release => f.write_str("release"),
        }
    }
}

/// One compilation of the dil sources into a binary.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildParams {
    pub compiler: PathBuf,
    /// Run the compiler through wine (Windows binaries on a non-Windows host).
    pub use_wine: bool,
    pub sources: Vec<PathBuf>,
    pub import_paths: Vec<PathBuf>,
    pub output: PathBuf,
    pub profile: BuildProfile,
    pub versions: Vec<String>,
}

impl BuildParams {
    /// Output path as the compiler should see it.
    ///
    /// Windows executables built through wine get backslash separators.
    pub fn output_arg(&self) -> String {
        let out = self.output.to_string_lossy();
        let is_exe = self
            .output
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("exe"));
        if self.use_wine && is_exe {
            out.replace('/', "\\")
        } else {
            out.into_owned()
        }
    }

    /// Compiler flags followed by the source files.
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        match self.profile {
            BuildProfile::Release => {
                // -inline makes the Linux binaries noticeably larger
                args.extend(["-release", "-O", "-inline"].map(String::from));
            }
            BuildProfile::Debug { symbols } => {
                args.push("-debug".to_string());
                if symbols {
                    args.push("-g".to_string());
                }
            }
        }
        args.extend(self.versions.iter().map(|v| format!("-version={v}")));
        args.extend(
            self.import_paths
                .iter()
                .map(|p| format!("-I{}", p.to_string_lossy())),
        );
        args.push(format!("-of{}", self.output_arg()));
        args.extend(self.sources.iter().map(|s| s.to_string_lossy().into_owned()));
        args
    }
}

/// Supported archive formats, in the order they are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArchiveFormat {
    TarGz,
    TarBz2,
    Zip,
    SevenZip,
}

impl ArchiveFormat {
    pub const ALL: [ArchiveFormat; 4] = [
        ArchiveFormat::TarGz,
        ArchiveFormat::TarBz2,
        ArchiveFormat::Zip,
        ArchiveFormat::SevenZip,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::TarBz2 => "tar.bz2",
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::SevenZip => "7z",
        }
    }

    /// The packaging utility that must be on `PATH`.
    pub fn utility(self) -> &'static str {
        match self {
            ArchiveFormat::TarGz | ArchiveFormat::TarBz2 => "tar",
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::SevenZip => "7zr",
        }
    }

    /// Utility arguments producing `archive` from `src`.
    pub fn args(self, archive: &str, src: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = match self {
            ArchiveFormat::TarGz => ["--owner", "root", "--group", "root", "-czf"]
                .map(OsString::from)
                .to_vec(),
            ArchiveFormat::TarBz2 => ["--owner", "root", "--group", "root", "--bzip2", "-cf"]
                .map(OsString::from)
                .to_vec(),
            ArchiveFormat::Zip => ["-q", "-9", "-r"].map(OsString::from).to_vec(),
            ArchiveFormat::SevenZip => vec![OsString::from("a")],
        };
        args.push(archive.into());
        args.push(src.into());
        args
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One archive of `src`, created inside `work_dir`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveParams {
    pub format: ArchiveFormat,
    /// Directory the utility runs in; the archive lands here.
    pub work_dir: PathBuf,
    /// Archive base name, without extension.
    pub name: String,
    /// Input, relative to `work_dir`.
    pub src: PathBuf,
}

impl ArchiveParams {
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.format.extension())
    }

    pub fn output(&self) -> PathBuf {
        self.work_dir.join(self.file_name())
    }

    pub fn args(&self) -> Vec<OsString> {
        self.format.args(&self.file_name(), &self.src)
    }
}

/// One HTML → PDF rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    pub html_files: Vec<PathBuf>,
    pub output: PathBuf,
    /// Scratch directory the helper may write into.
    pub work_dir: PathBuf,
    /// JSON file with title, author and table-of-contents settings.
    pub metadata: PathBuf,
}

impl RenderParams {
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--metadata".into(),
            self.metadata.clone().into(),
            "--work-dir".into(),
            self.work_dir.clone().into(),
            "--output".into(),
            self.output.clone().into(),
        ];
        args.extend(self.html_files.iter().map(OsString::from));
        args
    }
}
