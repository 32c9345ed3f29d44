//! Subprocess-backed tools.
//!
//! Every call is a blocking [`std::process::Command`]; the pipeline waits for
//! each tool to finish before moving on. Commands are echoed at `info` level
//! before they run.
//!
//! ## Tool mapping
//!
//! | Capability | Command |
//! |---|---|
//! | locate | `which` crate lookup, or an existing path |
//! | generate | `<dil> ddoc …` |
//! | compile | `<dmd> …`, or `wine <dmd> …` |
//! | archive | `tar` / `zip` / `7zr`, run in the archive's directory |
//! | render | `<pdf_helper> --metadata … --output … <html…>` |
//! | clone / modified | `git clone`, `git ls-files -m` |
//! | registry | `reg query` / `reg add`, through wine on non-Windows hosts |

use super::backend::{
    Archiver, Compiler, DocGenerator, DocumentRenderer, Locator, Registry, SourceControl,
    ToolError,
};
use super::params::{ArchiveParams, BuildParams, DocGenParams, RenderParams};
use crate::config::ExecutablesConfig;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const USER_ENV_KEY: &str = r"HKCU\Environment";

/// Tools backed by real executables.
#[derive(Debug, Clone)]
pub struct SystemTools {
    git: String,
    wine: String,
    pdf_helper: String,
}

impl SystemTools {
    pub fn new(config: &ExecutablesConfig) -> Self {
        Self {
            git: config.git.clone(),
            wine: config.wine.clone(),
            pdf_helper: config.pdf_helper.clone(),
        }
    }

    /// `reg` on Windows, `wine reg` elsewhere.
    fn reg_command(&self) -> Command {
        if cfg!(windows) {
            Command::new("reg")
        } else {
            let mut cmd = Command::new(&self.wine);
            cmd.arg("reg");
            cmd
        }
    }
}

/// Render a command roughly as a shell would show it.
pub fn display_command(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(quote));
    parts.join(" ")
}

fn quote(arg: &OsStr) -> String {
    let s = arg.to_string_lossy();
    if s.is_empty() || s.contains(char::is_whitespace) {
        format!("'{s}'")
    } else {
        s.into_owned()
    }
}

fn program_name(cmd: &Command) -> String {
    cmd.get_program().to_string_lossy().into_owned()
}

/// Run to completion with inherited stdio; non-zero exit is an error.
fn run(mut cmd: Command) -> Result<(), ToolError> {
    let line = display_command(&cmd);
    tracing::info!("{line}");
    let status = cmd.status().map_err(|source| ToolError::Spawn {
        program: program_name(&cmd),
        source,
    })?;
    if status.success() {
        Ok(())
    } else {
        Err(ToolError::Failed {
            command: line,
            code: status.code(),
        })
    }
}

/// Run to completion capturing output; non-zero exit is an error.
fn capture(mut cmd: Command) -> Result<Output, ToolError> {
    let line = display_command(&cmd);
    tracing::debug!("{line}");
    let output = cmd.output().map_err(|source| ToolError::Spawn {
        program: program_name(&cmd),
        source,
    })?;
    if output.status.success() {
        Ok(output)
    } else {
        tracing::debug!(stderr = %String::from_utf8_lossy(&output.stderr), "command failed");
        Err(ToolError::Failed {
            command: line,
            code: output.status.code(),
        })
    }
}

impl Locator for SystemTools {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        let as_path = Path::new(program);
        if as_path.components().count() > 1 && as_path.is_file() {
            return Some(as_path.to_path_buf());
        }
        which::which(program).ok()
    }

    fn host_is_windows(&self) -> bool {
        cfg!(windows)
    }
}

impl DocGenerator for SystemTools {
    fn generate(&self, params: &DocGenParams) -> Result<(), ToolError> {
        let mut cmd = Command::new(&params.exe);
        cmd.args(params.args());
        run(cmd)
    }
}

impl Compiler for SystemTools {
    fn compile(&self, params: &BuildParams) -> Result<(), ToolError> {
        let mut cmd = if params.use_wine {
            let mut cmd = Command::new(&self.wine);
            cmd.arg(&params.compiler);
            cmd
        } else {
            Command::new(&params.compiler)
        };
        cmd.args(params.args());
        run(cmd)
    }
}

impl Archiver for SystemTools {
    fn archive(&self, params: &ArchiveParams) -> Result<PathBuf, ToolError> {
        let mut cmd = Command::new(params.format.utility());
        cmd.args(params.args()).current_dir(&params.work_dir);
        run(cmd)?;
        Ok(params.output())
    }
}

impl DocumentRenderer for SystemTools {
    fn render(&self, params: &RenderParams) -> Result<(), ToolError> {
        let mut cmd = Command::new(&self.pdf_helper);
        cmd.args(params.args());
        run(cmd)
    }
}

impl SourceControl for SystemTools {
    fn clone_repo(&self, repo: &Path, dest: &Path) -> Result<(), ToolError> {
        let mut cmd = Command::new(&self.git);
        cmd.arg("clone").arg(repo).arg(dest);
        run(cmd)
    }

    fn modified_files(&self, repo: &Path) -> Result<Vec<PathBuf>, ToolError> {
        let mut cmd = Command::new(&self.git);
        cmd.args(["ls-files", "-m"]).current_dir(repo);
        let output = capture(cmd)?;
        Ok(parse_file_list(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl Registry for SystemTools {
    fn read_user_path(&self) -> Result<Option<String>, ToolError> {
        let mut cmd = self.reg_command();
        cmd.args(["query", USER_ENV_KEY, "/v", "PATH"]);
        match capture(cmd) {
            Ok(output) => Ok(parse_reg_query(&String::from_utf8_lossy(&output.stdout))),
            // `reg query` exits non-zero when the value does not exist yet
            Err(ToolError::Failed { code: Some(1), .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write_user_path(&self, value: &str) -> Result<(), ToolError> {
        let mut cmd = self.reg_command();
        cmd.args([
            "add",
            USER_ENV_KEY,
            "/v",
            "PATH",
            "/t",
            "REG_EXPAND_SZ",
            "/d",
            value,
            "/f",
        ]);
        run(cmd)
    }
}

/// One path per non-empty line.
pub fn parse_file_list(stdout: &str) -> Vec<PathBuf> {
    stdout
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Extract the PATH value from `reg query` output.
///
/// ```text
/// HKEY_CURRENT_USER\Environment
///     PATH    REG_EXPAND_SZ    C:\tools;C:\dmd\bin
/// ```
pub fn parse_reg_query(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        let line = line.trim();
        let rest = line.strip_prefix("PATH")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let rest = rest.trim_start();
        let (kind, value) = rest.split_once(char::is_whitespace)?;
        kind.starts_with("REG_").then(|| value.trim().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_command_quotes_spaces() {
        let mut cmd = Command::new("7zr");
        cmd.args(["a", "my docs.7z", "dest"]);
        assert_eq!(display_command(&cmd), "7zr a 'my docs.7z' dest");
    }

    #[test]
    fn parse_file_list_skips_blank_lines() {
        let files = parse_file_list("src/main.d\nsrc/dil/Version.d\n\n");
        assert_eq!(
            files,
            vec![PathBuf::from("src/main.d"), PathBuf::from("src/dil/Version.d")]
        );
    }

    #[test]
    fn parse_reg_query_extracts_value() {
        let out = "\r\nHKEY_CURRENT_USER\\Environment\r\n    PATH    REG_EXPAND_SZ    C:\\tools;C:\\dmd bin\r\n\r\n";
        assert_eq!(parse_reg_query(out), Some("C:\\tools;C:\\dmd bin".to_string()));
    }

    #[test]
    fn parse_reg_query_ignores_other_values() {
        let out = "HKEY_CURRENT_USER\\Environment\n    PATHEXT    REG_SZ    .COM\n";
        assert_eq!(parse_reg_query(out), None);
    }

    #[test]
    fn locate_accepts_existing_path() {
        let tmp = tempfile::TempDir::new().unwrap();
        let exe = tmp.path().join("dmd");
        std::fs::write(&exe, "").unwrap();
        let tools = SystemTools::new(&ExecutablesConfig::default());
        assert_eq!(tools.locate(exe.to_str().unwrap()), Some(exe));
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut cmd = Command::new("definitely-not-a-real-program-dil");
        cmd.current_dir(tmp.path());
        let err = run(cmd).unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }
}
