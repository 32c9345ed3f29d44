//! Shared test fixtures for the dil-release test suite.
//!
//! Builds miniature dil and Phobos trees in a temp directory so pipeline
//! tests can run end to end against [`MockTools`](crate::tools::backend::tests::MockTools).
//!
//! ```text
//! <root>/
//! ├── dil/                         setup_project_fixture
//! │   ├── src/main.d, src/dil/Version.d
//! │   ├── data/html.css, dilconf.d, macros_dil.ddoc
//! │   └── kandil/kandil.ddoc, css/style.css, js/*.js, img/
//! └── dmd/                         setup_doc_fixtures
//!     ├── src/phobos/std.ddoc, phobos.d, std/…, internal/…
//!     └── html/d/style.css, holy.gif, dmlogo.gif, phobos/erf.gif, erfc.gif
//! ```
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let (project, phobos) = setup_doc_fixtures(tmp.path());
//! install_generator(&project);
//! ```

use std::fs;
use std::path::Path;

use crate::layout::{KANDIL_JS_FILES, PhobosLayout, ProjectLayout};

/// A `Version.d` with default version declarations.
pub const VERSION_D: &str = r#"module dil.Version;

enum uint VERSION_MAJOR_DEFAULT = 2;
/// The major version number of this compiler.
const uint VERSION_MAJOR = VERSION_MAJOR_DEFAULT;
/// The minor version number of this compiler.
const uint VERSION_MINOR = 0;
/// The optional suffix.
const string VERSION_SUFFIX = "";
"#;

/// A trimmed-down `std.ddoc` exercising every rewrite rule.
pub const STD_DDOC: &str = "<html><head>\r\n<link rel=\"stylesheet\" href=\"../style.css\">\r\n</head>\r\n\
<body><img src=\"../dmlogo.gif\"><a href=\"../lex.html\">Lexical</a>\r\n\
<h1>$(TITLE)</h1>\r\n<a href=\"std_string.html\">std.string</a>\r\n\
Page generated by Ddoc.\r\n</body></html>\r\n\
NAVIGATION_PHOBOS=\r\n<div class=\"navblock\">\r\n</div>\r\n";

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

// =========================================================================
// Fixture setup
// =========================================================================

/// Create a dil source tree at `root` (without `bin/dil`).
pub fn setup_project_fixture(root: &Path) -> ProjectLayout {
    let project = ProjectLayout::new(root);
    write(&project.src.join("main.d"), "module main;\nvoid main() {}\n");
    write(&project.version_file(), VERSION_D);
    write(&project.src.join("dil/lexer/Lexer.d"), "module dil.lexer.Lexer;\n");
    write(&project.data.join("html.css"), "pre { }\n");
    write(&project.data.join("dilconf.d"), "DATADIR = ${BINDIR}/../data\n");
    write(&project.data.join("macros_dil.ddoc"), "DIL = dil\n");
    write(&project.kandil.ddoc, "KANDIL = kandil\n");
    write(&project.kandil.style, "body { }\n");
    for js in KANDIL_JS_FILES {
        write(&project.kandil.js_dir.join(js), "// js\n");
    }
    write(&project.kandil.img_dir.join("tv_dot.gif"), "GIF89a");
    write(&project.kandil.img_dir.join("icon_alias.png"), "PNG");
    write(&project.kandil.img_dir.join("README"), "not an image");
    project
}

/// Put a stand-in generator executable at `project.exe`.
pub fn install_generator(project: &ProjectLayout) {
    write(&project.exe, "binary");
}

/// Create a dil project at `<root>/dil` and a Phobos checkout at
/// `<root>/dmd/src/phobos` with its stock HTML assets.
pub fn setup_doc_fixtures(root: &Path) -> (ProjectLayout, PhobosLayout) {
    let project = setup_project_fixture(&root.join("dil"));
    let phobos = PhobosLayout::new(root.join("dmd").join("src").join("phobos"));

    write(&phobos.std_ddoc(), STD_DDOC);
    write(&phobos.phobos_d(), "Ddoc\n");
    write(&phobos.src.join("std/string.d"), "module std.string;\n");
    write(&phobos.src.join("std/math.d"), "module std.math;\n");
    write(&phobos.src.join("std/c/stdio.d"), "module std.c.stdio;\n");
    write(&phobos.src.join("std/cast.d"), "module std.cast;\n");
    write(&phobos.src.join("std/notes.txt"), "not a module");
    write(&phobos.src.join("internal/gc/gc.d"), "module gc;\n");

    let site = root.join("dmd").join("html").join("d");
    for f in ["style.css", "holy.gif", "dmlogo.gif"] {
        write(&site.join(f), f);
    }
    for f in ["erf.gif", "erfc.gif"] {
        write(&site.join("phobos").join(f), f);
    }
    (project, phobos)
}
