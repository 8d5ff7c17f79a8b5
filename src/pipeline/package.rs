//! Packaging: licenses, install, install-tree trimming and the manifest.

use glob::Pattern;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::cmake::{BuildTool, CMakeInvocation};
use super::layout::{remove_dir_if_exists, RunLayout};
use super::source::{sha256_file, SourceLocation};
use crate::error::{RecipeError, Result};
use crate::recipe::config::EffectiveConfig;

/// License files copied from the top of the source tree.
pub const LICENSE_PATTERN: &str = "LICENSE*";
pub const LICENSES_DIR: &str = "licenses";
/// Installed file that never ships in the package.
pub const STRIPPED_README: &str = "include/kfr/io/dr/README.txt";

/// One file in the package folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    /// Path relative to the package folder, `/`-separated.
    pub path: String,
    pub sha256: String,
    pub size_bytes: u64,
}

/// Files that make up the finished package, sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallManifest {
    pub entries: Vec<ManifestEntry>,
}

impl InstallManifest {
    /// Walk `package_folder` and record every regular file.
    pub fn scan(package_folder: &Path) -> Result<Self> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(package_folder).sort_by_file_name() {
            let entry = entry.map_err(|e| RecipeError::install(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(package_folder)
                .map_err(|e| RecipeError::install(e.to_string()))?;
            let path = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let metadata = entry.metadata().map_err(|e| {
                RecipeError::install(format!("reading '{}': {}", entry.path().display(), e))
            })?;
            entries.push(ManifestEntry {
                path,
                sha256: sha256_file(entry.path())?,
                size_bytes: metadata.len(),
            });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(Self { entries })
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.iter().any(|e| e.path == path)
    }

    pub fn any_under(&self, dir: &str) -> bool {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        self.entries.iter().any(|e| e.path.starts_with(&prefix))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Install `config` into the package folder and trim it.
///
/// The install step runs for every configuration: header-only packages still
/// need their headers installed.
pub fn package(
    config: &EffectiveConfig,
    source: &SourceLocation,
    layout: &RunLayout,
    tool: &dyn BuildTool,
) -> Result<InstallManifest> {
    let package_folder = layout.package_folder();
    fs::create_dir_all(&package_folder)?;

    let copied = copy_licenses(&source.root, &package_folder.join(LICENSES_DIR))?;
    debug!("copied {} license file(s)", copied);

    let invocation = CMakeInvocation::for_config(
        config,
        &source.root,
        &layout.build_folder(),
        &package_folder,
    );
    tool.configure(&invocation).map_err(into_install_error)?;
    tool.install(&invocation).map_err(into_install_error)?;

    let readme = package_folder.join(STRIPPED_README);
    fs::remove_file(&readme).map_err(|e| {
        RecipeError::install(format!("removing '{}': {}", readme.display(), e))
    })?;

    if config.is_header_only() {
        remove_dir_if_exists(&package_folder.join("lib"))?;
    }

    let manifest = InstallManifest::scan(&package_folder)?;
    info!("packaged {} file(s) into {}", manifest.len(), package_folder.display());
    Ok(manifest)
}

/// Copy files matching [`LICENSE_PATTERN`] at the top of `source` into `dest`.
pub fn copy_licenses(source: &Path, dest: &Path) -> Result<usize> {
    let pattern = Pattern::new(LICENSE_PATTERN)
        .map_err(|e| RecipeError::install(format!("bad license pattern: {e}")))?;

    let mut found: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        if entry.file_type()?.is_file() && pattern.matches(&entry.file_name().to_string_lossy()) {
            found.push(entry.path());
        }
    }
    found.sort();

    if found.is_empty() {
        return Ok(0);
    }
    fs::create_dir_all(dest)?;
    for src in &found {
        if let Some(name) = src.file_name() {
            fs::copy(src, dest.join(name))?;
        }
    }
    Ok(found.len())
}

/// Check the finished package against its layout rules.
pub fn verify_layout(config: &EffectiveConfig, manifest: &InstallManifest) -> Result<()> {
    let mut problems = Vec::new();
    if !manifest.any_under(LICENSES_DIR) {
        problems.push("no license files under licenses/".to_string());
    }
    if !manifest.any_under("include/kfr") {
        problems.push("no headers under include/kfr/".to_string());
    }
    if manifest.contains(STRIPPED_README) {
        problems.push(format!("{} was not removed", STRIPPED_README));
    }
    if config.is_header_only() && manifest.any_under("lib") {
        problems.push("header-only package contains lib/".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(RecipeError::install(format!(
            "package layout check failed:\n  {}",
            problems.join("\n  ")
        )))
    }
}

fn into_install_error(err: RecipeError) -> RecipeError {
    match err {
        RecipeError::Build { step, code, output } => {
            RecipeError::Install(format!("{step} failed (exit code {code}): {output}"))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::FakeTool;
    use crate::recipe::config::CompiledConfig;
    use crate::recipe::settings::PlatformFacts;
    use tempfile::TempDir;

    fn setup(tmp: &TempDir) -> (RunLayout, SourceLocation) {
        let layout = RunLayout::new(
            tmp.path().join("run"),
            tmp.path().to_path_buf(),
            tmp.path().join("downloads"),
        );
        let source = SourceLocation {
            root: layout.source_folder(),
        };
        fs::create_dir_all(&source.root).unwrap();
        fs::write(source.root.join("LICENSE.txt"), "GPL-2.0\n").unwrap();
        fs::write(source.root.join("README.md"), "kfr\n").unwrap();
        (layout, source)
    }

    fn compiled() -> EffectiveConfig {
        EffectiveConfig::Compiled(CompiledConfig {
            dft: false,
            shared: false,
            fpic: Some(true),
            settings: PlatformFacts::new("clang", "Linux", "x86_64", "Release"),
        })
    }

    #[test]
    fn header_only_package_drops_lib_and_readme() {
        let tmp = TempDir::new().unwrap();
        let (layout, source) = setup(&tmp);
        let tool = FakeTool::default();

        let manifest = package(&EffectiveConfig::HeaderOnly, &source, &layout, &tool).unwrap();
        assert!(manifest.contains("licenses/LICENSE.txt"));
        assert!(manifest.contains("include/kfr/kfr.h"));
        assert!(!manifest.contains(STRIPPED_README));
        assert!(!manifest.any_under("lib"));
        assert!(!layout.package_folder().join("lib").exists());
        assert!(!manifest.contains("licenses/README.md"));
        verify_layout(&EffectiveConfig::HeaderOnly, &manifest).unwrap();
        assert_eq!(tool.calls(), vec!["configure", "install"]);
    }

    #[test]
    fn compiled_package_keeps_libraries() {
        let tmp = TempDir::new().unwrap();
        let (layout, source) = setup(&tmp);
        let tool = FakeTool::default();

        let manifest = package(&compiled(), &source, &layout, &tool).unwrap();
        assert!(manifest.contains("lib/libkfr_io.a"));
        assert!(!manifest.contains(STRIPPED_README));
        verify_layout(&compiled(), &manifest).unwrap();
    }

    #[test]
    fn missing_readme_fails_install() {
        let tmp = TempDir::new().unwrap();
        let (layout, source) = setup(&tmp);
        let tool = FakeTool {
            skip_readme: true,
            ..FakeTool::default()
        };

        let err = package(&compiled(), &source, &layout, &tool).unwrap_err();
        assert!(matches!(err, RecipeError::Install(_)));
    }

    #[test]
    fn install_tool_failure_is_an_install_error() {
        let tmp = TempDir::new().unwrap();
        let (layout, source) = setup(&tmp);
        let tool = FakeTool {
            fail_step: Some("install"),
            ..FakeTool::default()
        };

        let err = package(&compiled(), &source, &layout, &tool).unwrap_err();
        assert!(matches!(err, RecipeError::Install(_)));
    }

    #[test]
    fn manifest_records_real_file_sizes() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("package");
        fs::create_dir_all(root.join("include/kfr")).unwrap();
        fs::write(root.join("include/kfr/kfr.h"), "#pragma once\n").unwrap();

        let manifest = InstallManifest::scan(&root).unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.entries[0].path, "include/kfr/kfr.h");
        assert_eq!(manifest.entries[0].size_bytes, 13);
    }

    #[test]
    fn layout_check_reports_every_problem() {
        let manifest = InstallManifest {
            entries: vec![ManifestEntry {
                path: "lib/libkfr_io.a".to_string(),
                sha256: "0".repeat(64),
                size_bytes: 0,
            }],
        };
        let err = verify_layout(&EffectiveConfig::HeaderOnly, &manifest).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("licenses"));
        assert!(msg.contains("include/kfr"));
        assert!(msg.contains("lib/"));
    }
}
