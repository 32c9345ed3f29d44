//! Static asset copying.
//!
//! Generated HTML expects its stylesheets, images and scripts next to it.
//! Which files go where depends on the documentation front-end:
//!
//! | Set | Source | Destination |
//! |---|---|---|
//! | classic | `html/d/phobos/{erfc,erf}.gif` | `<dest>/` |
//! | classic | `html/d/{style.css,holy.gif,dmlogo.gif}` | `<dest>/` |
//! | classic, kandil | `data/html.css` | `<dest>/htmlsrc/` |
//! | kandil | `html/d/phobos/{erfc,erf}.gif` | `<dest>/` |
//! | kandil | `kandil/css/style.css` | `<dest>/css/` |
//! | kandil | `kandil/js/*.js` | `<dest>/js/` |
//! | kandil | `kandil/img/*.{png,gif}` | `<dest>/img/` |
//! | release | `data/dilconf.d` | `<dest>/bin/` + kandil set into `<dest>/doc/` |
//!
//! Copying is planned first ([`AssetCopy`] list) and executed second, so the
//! plans are testable without touching the filesystem. A missing source file
//! aborts the copy and names the file.

use crate::layout::{DocLayout, KandilLayout, PhobosLayout, ProjectLayout};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    Missing(PathBuf),
    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to list kandil images in {dir}: {source}")]
    ListImages {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Documentation front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontEnd {
    /// Plain Ddoc pages styled with the stock digitalmars stylesheet.
    Classic,
    /// The kandil JavaScript front-end.
    Kandil,
}

/// A single planned copy: `from` into the directory `to_dir`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetCopy {
    pub from: PathBuf,
    pub to_dir: PathBuf,
}

impl AssetCopy {
    fn new(from: PathBuf, to_dir: &Path) -> Self {
        Self {
            from,
            to_dir: to_dir.to_path_buf(),
        }
    }
}

const PHOBOS_FORMULA_IMAGES: &[&str] = &["erfc.gif", "erf.gif"];
const CLASSIC_SITE_ASSETS: &[&str] = &["style.css", "holy.gif", "dmlogo.gif"];

fn kandil_plan(kandil: &KandilLayout, dest: &DocLayout) -> Result<Vec<AssetCopy>, AssetError> {
    let mut plan = vec![AssetCopy::new(kandil.style.clone(), &dest.css)];
    plan.extend(kandil.js_files().into_iter().map(|f| AssetCopy::new(f, &dest.js)));
    let images = kandil.images().map_err(|source| AssetError::ListImages {
        dir: kandil.img_dir.clone(),
        source,
    })?;
    plan.extend(images.into_iter().map(|f| AssetCopy::new(f, &dest.img)));
    Ok(plan)
}

/// Assets for the Phobos documentation of the given front-end.
pub fn phobos_plan(
    front_end: FrontEnd,
    project: &ProjectLayout,
    phobos: &PhobosLayout,
    dest: &DocLayout,
) -> Result<Vec<AssetCopy>, AssetError> {
    let mut plan: Vec<AssetCopy> = PHOBOS_FORMULA_IMAGES
        .iter()
        .map(|f| AssetCopy::new(phobos.html.join(f), &dest.root))
        .collect();
    match front_end {
        FrontEnd::Classic => {
            let site = phobos.html.join("..");
            plan.extend(
                CLASSIC_SITE_ASSETS
                    .iter()
                    .map(|f| AssetCopy::new(site.join(f), &dest.root)),
            );
            plan.push(AssetCopy::new(project.data.join("html.css"), &dest.htmlsrc));
        }
        FrontEnd::Kandil => {
            plan.push(AssetCopy::new(project.data.join("html.css"), &dest.htmlsrc));
            plan.extend(kandil_plan(&project.kandil, dest)?);
        }
    }
    Ok(plan)
}

/// Files shipped with a release tree.
pub fn release_plan(release: &ProjectLayout, doc: &DocLayout) -> Result<Vec<AssetCopy>, AssetError> {
    let mut plan = vec![
        AssetCopy::new(release.data.join("dilconf.d"), &release.bin),
        AssetCopy::new(release.data.join("html.css"), &doc.htmlsrc),
    ];
    plan.extend(kandil_plan(&release.kandil, doc)?);
    Ok(plan)
}

/// Execute a copy plan, stopping at the first missing or failing file.
pub fn copy_assets(plan: &[AssetCopy]) -> Result<usize, AssetError> {
    for item in plan {
        if !item.from.is_file() {
            return Err(AssetError::Missing(item.from.clone()));
        }
        let file_name = item
            .from
            .file_name()
            .ok_or_else(|| AssetError::Missing(item.from.clone()))?;
        let to = item.to_dir.join(file_name);
        fs::create_dir_all(&item.to_dir)
            .and_then(|_| fs::copy(&item.from, &to))
            .map_err(|source| AssetError::Copy {
                from: item.from.clone(),
                to: to.clone(),
                source,
            })?;
        tracing::debug!(from = %item.from.display(), to = %to.display(), "copied asset");
    }
    Ok(plan.len())
}
