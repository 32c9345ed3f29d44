//! Release version identifiers.
//!
//! Versions follow the `M.mmm` scheme used by the D toolchain: one major
//! digit and exactly three minor digits (`1.123`, `2.045`). Release builds
//! may carry a word suffix (`1.123-rc1`); documentation builds may not.
//!
//! The parsed [`Version`] drives every derived name in the pipelines:
//!
//! ```text
//! 1.123-rc1
//! ├── Display      "1.123-rc1"      titles, archive and PDF names
//! ├── d_version()  "1.0"            digitalmars.com URL segment
//! └── constants    VERSION_MAJOR = 1; VERSION_MINOR = 123; VERSION_SUFFIX = "-rc1";
//! ```

use regex::{Captures, Regex};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VersionError {
    #[error("invalid VERSION '{input}'; format: {format} E.g.: 1.123")]
    Malformed { input: String, format: &'static str },
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{constant} declaration not found in {path}")]
    MissingConstant {
        constant: &'static str,
        path: PathBuf,
    },
}

static DOC_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d)\.(\d{3})$").expect("valid doc version pattern"));

static RELEASE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d)\.(\d{3})(?:-(\w+))?$").expect("valid release version pattern")
});

static MAJOR_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\bVERSION_MAJOR\s*=\s*)\w+;").expect("valid pattern"));
static MINOR_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\bVERSION_MINOR\s*=\s*)\d+;").expect("valid pattern"));
static SUFFIX_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\bVERSION_SUFFIX\s*=\s*)"[^"\n]*";"#).expect("valid pattern"));

/// A parsed `major.minor[-suffix]` version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    /// Suffix without the leading dash. Empty for plain versions.
    pub suffix: String,
}

impl Version {
    /// Parse a documentation version (`\d.\d\d\d`, no suffix).
    pub fn parse_doc(input: &str) -> Result<Self, VersionError> {
        Self::parse_with(&DOC_VERSION, input, r"/\d.\d\d\d/")
    }

    /// Parse a release version (`\d.\d\d\d(-\w+)?`).
    pub fn parse_release(input: &str) -> Result<Self, VersionError> {
        Self::parse_with(&RELEASE_VERSION, input, r"/\d.\d\d\d(-\w+)?/")
    }

    fn parse_with(re: &Regex, input: &str, format: &'static str) -> Result<Self, VersionError> {
        let malformed = || VersionError::Malformed {
            input: input.to_string(),
            format,
        };
        let caps = re.captures(input).ok_or_else(malformed)?;
        let major = caps[1].parse().map_err(|_| malformed())?;
        let minor = caps[2].parse().map_err(|_| malformed())?;
        let suffix = caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default();
        Ok(Self {
            major,
            minor,
            suffix,
        })
    }

    /// The language generation this version documents, e.g. `"2.0"`.
    pub fn d_version(&self) -> String {
        format!("{}.0", self.major)
    }

    /// The suffix as written into `VERSION_SUFFIX`, dash included.
    pub fn suffix_literal(&self) -> String {
        if self.suffix.is_empty() {
            String::new()
        } else {
            format!("-{}", self.suffix)
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}{}", self.major, self.minor, self.suffix_literal())
    }
}

/// Rewrite the three version declarations in `code`.
///
/// Only the declaration forms `VERSION_MAJOR = x;`, `VERSION_MINOR = n;` and
/// `VERSION_SUFFIX = "...";` are touched. Returns the name of the first
/// constant with no declaration, if any.
pub fn patch_version_constants(code: &str, version: &Version) -> Result<String, &'static str> {
    let major = version.major.to_string();
    let minor = version.minor.to_string();
    let suffix = format!("\"{}\"", version.suffix_literal());

    let rules: [(&LazyLock<Regex>, &'static str, &str); 3] = [
        (&MAJOR_DECL, "VERSION_MAJOR", &major),
        (&MINOR_DECL, "VERSION_MINOR", &minor),
        (&SUFFIX_DECL, "VERSION_SUFFIX", &suffix),
    ];

    let mut code = code.to_string();
    for (re, constant, value) in rules {
        if !re.is_match(&code) {
            return Err(constant);
        }
        code = re
            .replace_all(&code, |caps: &Captures| format!("{}{};", &caps[1], value))
            .into_owned();
    }
    Ok(code)
}

/// Patch the version declarations of a source file in place.
pub fn patch_version_file(path: &Path, version: &Version) -> Result<(), VersionError> {
    let io_err = |source| VersionError::Io {
        path: path.to_path_buf(),
        source,
    };
    let code = fs::read_to_string(path).map_err(io_err)?;
    let patched =
        patch_version_constants(&code, version).map_err(|constant| VersionError::MissingConstant {
            constant,
            path: path.to_path_buf(),
        })?;
    fs::write(path, patched).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const VERSION_D: &str = r#"module dil.Version;

version(D2)
  enum uint VERSION_MAJOR_DEFAULT = 2;
else
  enum uint VERSION_MAJOR_DEFAULT = 1;

enum uint VERSION_MAJOR = VERSION_MAJOR_DEFAULT;
enum uint VERSION_MINOR = 0;
enum string VERSION_SUFFIX = "";

static assert(VERSION_MAJOR == 1 || VERSION_MAJOR == 2);
"#;

    #[test]
    fn doc_version_accepts_three_minor_digits() {
        let v = Version::parse_doc("1.123").unwrap();
        assert_eq!(v.major, 1);
        assert_eq!(v.minor, 123);
        assert_eq!(v.suffix, "");
    }

    #[test]
    fn doc_version_rejects_two_minor_digits() {
        let err = Version::parse_doc("1.12").unwrap_err();
        assert!(matches!(err, VersionError::Malformed { .. }));
        assert!(err.to_string().contains("1.12"));
    }

    #[test]
    fn doc_version_rejects_suffix() {
        assert!(Version::parse_doc("1.123-rc1").is_err());
    }

    #[test]
    fn doc_version_rejects_trailing_digits() {
        assert!(Version::parse_doc("1.1234").is_err());
    }

    #[test]
    fn release_version_with_suffix() {
        let v = Version::parse_release("2.045-beta").unwrap();
        assert_eq!(v.major, 2);
        assert_eq!(v.minor, 45);
        assert_eq!(v.suffix, "beta");
        assert_eq!(v.suffix_literal(), "-beta");
    }

    #[test]
    fn release_version_rejects_empty_suffix() {
        assert!(Version::parse_release("2.045-").is_err());
    }

    #[test]
    fn display_round_trips_zero_padded_minor() {
        for input in ["1.000", "1.007", "2.045", "1.123", "9.999"] {
            assert_eq!(Version::parse_doc(input).unwrap().to_string(), input);
        }
        for input in ["1.050-rc1", "2.100-x", "2.100-a_b"] {
            assert_eq!(Version::parse_release(input).unwrap().to_string(), input);
        }
    }

    #[test]
    fn release_suffix_needs_a_dash() {
        assert!(Version::parse_release("2.100_x").is_err());
        assert!(Version::parse_release("2.100rc1").is_err());
    }

    #[test]
    fn d_version_is_major_dot_zero() {
        assert_eq!(Version::parse_doc("2.045").unwrap().d_version(), "2.0");
        assert_eq!(Version::parse_doc("1.123").unwrap().d_version(), "1.0");
    }

    #[test]
    fn patch_rewrites_declarations_only() {
        let v = Version::parse_release("1.123-rc1").unwrap();
        let patched = patch_version_constants(VERSION_D, &v).unwrap();

        assert!(patched.contains("enum uint VERSION_MAJOR = 1;"));
        assert!(patched.contains("enum uint VERSION_MINOR = 123;"));
        assert!(patched.contains(r#"enum string VERSION_SUFFIX = "-rc1";"#));
        // Similar identifiers and comparisons are left alone
        assert!(patched.contains("enum uint VERSION_MAJOR_DEFAULT = 2;"));
        assert!(patched.contains("enum uint VERSION_MAJOR_DEFAULT = 1;"));
        assert!(patched.contains("static assert(VERSION_MAJOR == 1 || VERSION_MAJOR == 2);"));
    }

    #[test]
    fn patch_without_suffix_writes_empty_string() {
        let v = Version::parse_release("2.001").unwrap();
        let patched = patch_version_constants(VERSION_D, &v).unwrap();
        assert!(patched.contains(r#"VERSION_SUFFIX = "";"#));
        assert!(patched.contains("VERSION_MINOR = 1;"));
    }

    #[test]
    fn patch_replaces_existing_suffix() {
        let code = "enum uint VERSION_MAJOR = 1;\nenum uint VERSION_MINOR = 5;\nenum string VERSION_SUFFIX = \"-old\";\n";
        let v = Version::parse_release("1.006").unwrap();
        let patched = patch_version_constants(code, &v).unwrap();
        assert_eq!(
            patched,
            "enum uint VERSION_MAJOR = 1;\nenum uint VERSION_MINOR = 6;\nenum string VERSION_SUFFIX = \"\";\n"
        );
    }

    #[test]
    fn patch_reports_missing_constant() {
        let v = Version::parse_release("1.123").unwrap();
        let result = patch_version_constants("enum uint VERSION_MAJOR = 1;", &v);
        assert_eq!(result, Err("VERSION_MINOR"));
    }

    #[test]
    fn patch_file_in_place() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Version.d");
        fs::write(&path, VERSION_D).unwrap();

        patch_version_file(&path, &Version::parse_release("2.010").unwrap()).unwrap();

        let code = fs::read_to_string(&path).unwrap();
        assert!(code.contains("enum uint VERSION_MAJOR = 2;"));
        assert!(code.contains("enum uint VERSION_MINOR = 10;"));
    }

    #[test]
    fn patch_file_missing_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = patch_version_file(
            &tmp.path().join("nope.d"),
            &Version::parse_release("1.000").unwrap(),
        );
        assert!(matches!(result, Err(VersionError::Io { .. })));
    }
}
