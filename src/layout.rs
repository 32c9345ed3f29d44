//! Project and destination directory layouts.
//!
//! Every pipeline receives its root explicitly; nothing here consults or
//! changes the process working directory.
//!
//! ```text
//! <root>/                      ProjectLayout
//! ├── bin/dil                  generator executable (EXE)
//! ├── src/                     compiler sources, src/dil/Version.d
//! ├── data/                    html.css, dilconf.d, macros_dil.ddoc
//! └── kandil/                  KandilLayout
//!     ├── kandil.ddoc
//!     ├── css/style.css
//!     ├── js/*.js
//!     └── img/*.png, *.gif
//!
//! <dest>/                      DocLayout
//! ├── htmlsrc/                 syntax-highlighted sources
//! ├── css/  js/  img/          kandil front-end only
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// JavaScript files shipped with the kandil front-end, in load order.
pub const KANDIL_JS_FILES: &[&str] = &[
    "navigation.js",
    "jquery.js",
    "quicksearch.js",
    "symbols.js",
    "treeview.js",
    "utilities.js",
];

const KANDIL_IMAGE_EXTENSIONS: &[&str] = &["png", "gif"];

/// Paths inside a dil source tree (the project root or a release checkout).
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub bin: PathBuf,
    pub exe: PathBuf,
    pub src: PathBuf,
    pub doc: PathBuf,
    pub data: PathBuf,
    pub kandil: KandilLayout,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let bin = root.join("bin");
        Self {
            exe: bin.join(exe_name("dil")),
            bin,
            src: root.join("src"),
            doc: root.join("doc"),
            data: root.join("data"),
            kandil: KandilLayout::new(root.join("kandil")),
            root,
        }
    }

    /// The source file carrying the `VERSION_*` declarations.
    pub fn version_file(&self) -> PathBuf {
        self.src.join("dil").join("Version.d")
    }
}

/// Paths of the kandil documentation front-end.
#[derive(Debug, Clone, PartialEq)]
pub struct KandilLayout {
    pub root: PathBuf,
    pub ddoc: PathBuf,
    pub style: PathBuf,
    pub js_dir: PathBuf,
    pub img_dir: PathBuf,
}

impl KandilLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            ddoc: root.join("kandil.ddoc"),
            style: root.join("css").join("style.css"),
            js_dir: root.join("js"),
            img_dir: root.join("img"),
            root,
        }
    }

    pub fn js_files(&self) -> Vec<PathBuf> {
        KANDIL_JS_FILES.iter().map(|f| self.js_dir.join(f)).collect()
    }

    /// All `*.png` and `*.gif` files in the image folder, sorted.
    pub fn images(&self) -> io::Result<Vec<PathBuf>> {
        let mut images: Vec<PathBuf> = fs::read_dir(&self.img_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| KANDIL_IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            })
            .collect();
        images.sort();
        Ok(images)
    }
}

/// A documentation destination folder and its asset subfolders.
#[derive(Debug, Clone, PartialEq)]
pub struct DocLayout {
    pub root: PathBuf,
    pub htmlsrc: PathBuf,
    pub css: PathBuf,
    pub js: PathBuf,
    pub img: PathBuf,
}

impl DocLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            htmlsrc: root.join("htmlsrc"),
            css: root.join("css"),
            js: root.join("js"),
            img: root.join("img"),
            root,
        }
    }

    /// Create the destination and `htmlsrc/`; with `front_end_assets` also
    /// `css/`, `js/` and `img/`.
    pub fn create(&self, front_end_assets: bool) -> io::Result<()> {
        fs::create_dir_all(&self.htmlsrc)?;
        if front_end_assets {
            for dir in [&self.css, &self.js, &self.img] {
                fs::create_dir_all(dir)?;
            }
        }
        Ok(())
    }
}

/// Paths of a Phobos checkout, given its `phobos/` source folder.
#[derive(Debug, Clone, PartialEq)]
pub struct PhobosLayout {
    pub src: PathBuf,
    /// `<src>/../../html/d/phobos`, where the stock HTML assets live.
    pub html: PathBuf,
}

impl PhobosLayout {
    pub fn new(src: impl Into<PathBuf>) -> Self {
        let src = src.into();
        Self {
            html: src.join("..").join("..").join("html").join("d").join("phobos"),
            src,
        }
    }

    pub fn std_ddoc(&self) -> PathBuf {
        self.src.join("std.ddoc")
    }

    pub fn phobos_d(&self) -> PathBuf {
        self.src.join("phobos.d")
    }
}

/// Resolve `path` against `root` unless it is already absolute.
pub fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Append the platform executable extension to a binary name.
pub fn exe_name(name: &str) -> String {
    format!("{name}{}", std::env::consts::EXE_SUFFIX)
}

/// Recursively copy a directory tree, following symlinks.
///
/// `dst` is never copied into itself when it lies inside `src`.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    copy_dir_excluding(src, dst, &[])
}

/// Like [`copy_dir_recursive`], also leaving out the `exclude` subtrees.
pub fn copy_dir_excluding(src: &Path, dst: &Path, exclude: &[&Path]) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    let src = src.canonicalize()?;
    let mut skipped = vec![dst.canonicalize()?];
    for path in exclude {
        if let Ok(path) = path.canonicalize() {
            skipped.push(path);
        }
    }
    let walker = walkdir::WalkDir::new(&src)
        .min_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| !skipped.iter().any(|s| e.path().starts_with(s)));
    for entry in walker {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(&src)
            .map_err(io::Error::other)?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Remove a directory tree, treating "already gone" as success.
pub fn remove_tree(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn copy_skips_destination_inside_source() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("dil");
        fs::create_dir_all(src.join("src")).unwrap();
        fs::write(src.join("src/main.d"), "module main;").unwrap();
        let dst = src.join("build").join("dil.1.123");

        copy_dir_recursive(&src, &dst).unwrap();

        assert!(dst.join("src/main.d").is_file());
        assert!(!dst.join("build/dil.1.123").exists());
    }

    #[test]
    fn copy_leaves_out_excluded_subtrees() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("dil");
        fs::create_dir_all(src.join("build/dil.1.122")).unwrap();
        fs::write(src.join("build/dil.1.122/old.txt"), "old").unwrap();
        fs::write(src.join("README"), "dil").unwrap();
        let dst = tmp.path().join("out");

        let build = src.join("build");
        let missing = src.join("missing");
        copy_dir_excluding(&src, &dst, &[build.as_path(), missing.as_path()]).unwrap();

        assert!(dst.join("README").is_file());
        assert!(!dst.join("build").exists());
    }

    #[cfg(unix)]
    #[test]
    fn copy_follows_directory_symlinks() {
        let tmp = TempDir::new().unwrap();
        let shared = tmp.path().join("shared");
        fs::create_dir_all(&shared).unwrap();
        fs::write(shared.join("macros.ddoc"), "X = x").unwrap();
        let src = tmp.path().join("dil");
        fs::create_dir_all(&src).unwrap();
        std::os::unix::fs::symlink(&shared, src.join("data")).unwrap();
        let dst = tmp.path().join("out");

        copy_dir_recursive(&src, &dst).unwrap();

        let copied = dst.join("data/macros.ddoc");
        assert_eq!(fs::read_to_string(&copied).unwrap(), "X = x");
        assert!(!fs::symlink_metadata(dst.join("data")).unwrap().file_type().is_symlink());
    }

    #[test]
    fn project_layout_paths() {
        let layout = ProjectLayout::new("/work/dil");
        assert_eq!(layout.src, PathBuf::from("/work/dil/src"));
        assert_eq!(layout.exe, PathBuf::from("/work/dil/bin").join(exe_name("dil")));
        assert_eq!(
            layout.version_file(),
            PathBuf::from("/work/dil/src/dil/Version.d")
        );
        assert_eq!(
            layout.kandil.style,
            PathBuf::from("/work/dil/kandil/css/style.css")
        );
    }

    #[test]
    fn kandil_js_files_in_order() {
        let kandil = KandilLayout::new("/k");
        let files = kandil.js_files();
        assert_eq!(files.len(), 6);
        assert_eq!(files[0], PathBuf::from("/k/js/navigation.js"));
        assert_eq!(files[5], PathBuf::from("/k/js/utilities.js"));
    }

    #[test]
    fn kandil_images_filters_extensions() {
        let tmp = TempDir::new().unwrap();
        let kandil = KandilLayout::new(tmp.path());
        fs::create_dir_all(&kandil.img_dir).unwrap();
        for name in ["b.png", "a.gif", "notes.txt", "c.PNG"] {
            fs::write(kandil.img_dir.join(name), "x").unwrap();
        }
        let names: Vec<String> = kandil
            .images()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.gif", "b.png", "c.PNG"]);
    }

    #[test]
    fn phobos_html_is_two_levels_up() {
        let phobos = PhobosLayout::new("/dmd/src/phobos");
        assert_eq!(
            phobos.html,
            PathBuf::from("/dmd/src/phobos/../../html/d/phobos")
        );
    }

    #[test]
    fn doc_layout_create_with_and_without_assets() {
        let tmp = TempDir::new().unwrap();
        let plain = DocLayout::new(tmp.path().join("plain"));
        plain.create(false).unwrap();
        assert!(plain.htmlsrc.is_dir());
        assert!(!plain.css.exists());

        let kandil = DocLayout::new(tmp.path().join("kandil"));
        kandil.create(true).unwrap();
        assert!(kandil.css.is_dir() && kandil.js.is_dir() && kandil.img.is_dir());
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        let root = Path::new("/root");
        assert_eq!(resolve(root, Path::new("build")), PathBuf::from("/root/build"));
        assert_eq!(resolve(root, Path::new("/abs")), PathBuf::from("/abs"));
    }

    #[test]
    fn copy_dir_recursive_copies_nested_files() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("a/b")).unwrap();
        fs::write(src.join("a/b/c.d"), "module c;").unwrap();
        fs::write(src.join("top.txt"), "top").unwrap();

        let dst = tmp.path().join("dst");
        copy_dir_recursive(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("a/b/c.d")).unwrap(), "module c;");
        assert_eq!(fs::read_to_string(dst.join("top.txt")).unwrap(), "top");
    }

    #[test]
    fn remove_tree_ignores_missing() {
        let tmp = TempDir::new().unwrap();
        remove_tree(&tmp.path().join("missing")).unwrap();
    }
}
