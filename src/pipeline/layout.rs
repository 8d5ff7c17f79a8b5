//! Folder layout of a single recipe run.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Name the extracted archive directory is renamed to.
pub const SOURCE_SUBFOLDER: &str = "source_subfolder";
pub const BUILD_SUBFOLDER: &str = "build_subfolder";
pub const PACKAGE_SUBFOLDER: &str = "package";
/// File the run record is written to, at the root of the run folder.
pub const RUN_RECORD: &str = "conaninfo.json";

/// Paths used by one run. Every run owns its own root.
#[derive(Debug, Clone)]
pub struct RunLayout {
    /// Root of this run's folder tree.
    pub root: PathBuf,
    /// Directory holding recipe exports such as patches.
    pub recipe_dir: PathBuf,
    /// Directory archives are downloaded into.
    pub downloads: PathBuf,
}

impl RunLayout {
    pub fn new(root: PathBuf, recipe_dir: PathBuf, downloads: PathBuf) -> Self {
        Self {
            root,
            recipe_dir,
            downloads,
        }
    }

    pub fn source_folder(&self) -> PathBuf {
        self.root.join(SOURCE_SUBFOLDER)
    }

    pub fn build_folder(&self) -> PathBuf {
        self.root.join(BUILD_SUBFOLDER)
    }

    pub fn package_folder(&self) -> PathBuf {
        self.root.join(PACKAGE_SUBFOLDER)
    }

    pub fn run_record(&self) -> PathBuf {
        self.root.join(RUN_RECORD)
    }

    /// Create the run root and downloads directory, clearing stale build and
    /// package folders from a previous run in the same root.
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::create_dir_all(&self.downloads)?;
        for stale in [self.build_folder(), self.package_folder()] {
            remove_dir_if_exists(&stale)?;
        }
        Ok(())
    }

    /// Layout for a named job below this one, sharing recipe and downloads.
    pub fn job(&self, name: &str) -> Self {
        Self {
            root: self.root.join(name),
            recipe_dir: self.recipe_dir.clone(),
            downloads: self.downloads.clone(),
        }
    }
}

pub(crate) fn remove_dir_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    Ok(())
}
