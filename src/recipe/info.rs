//! Consumer-facing package info: libraries to link and preprocessor defines.

use serde::Serialize;
use std::fs;
use std::path::Path;

use super::config::EffectiveConfig;
use super::settings::HostPlatform;
use crate::error::Result;

/// Extensions recognised as library artifacts.
const LIB_EXTENSIONS: &[&str] = &["so", "lib", "a", "dylib", "bc"];

/// System libraries every consumer on Linux must link.
pub const LINUX_SYSTEM_LIBS: &[&str] = &["pthread", "m"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageInfo {
    pub libs: Vec<String>,
    pub defines: Vec<String>,
}

/// Describe what consumers of the package need.
///
/// For compiled packages the library names are discovered from
/// `<package_folder>/lib`; without a package folder none are listed.
pub fn describe_package_info(
    config: &EffectiveConfig,
    package_folder: Option<&Path>,
    host: HostPlatform,
) -> Result<PackageInfo> {
    let mut info = PackageInfo::default();

    match config {
        EffectiveConfig::Compiled(compiled) => {
            if let Some(folder) = package_folder {
                info.libs = collect_libs(&folder.join("lib"))?;
            }
            // FLAC, not DFT: kept exactly as the upstream recipe exports it.
            if compiled.dft {
                info.defines.push("KFR_ENABLE_FLAC=1".to_string());
            } else {
                info.defines.push("KFR_NO_DFT".to_string());
            }
        }
        EffectiveConfig::HeaderOnly => {
            info.defines.push("KFR_NO_DFT".to_string());
        }
    }

    if host.is_linux {
        info.libs
            .extend(LINUX_SYSTEM_LIBS.iter().map(|lib| lib.to_string()));
    }

    Ok(info)
}

/// List library names in `lib_dir`, sorted. A missing directory yields none.
///
/// `libkfr_dft.a` becomes `kfr_dft`; MSVC `.lib` names keep their prefix.
pub fn collect_libs(lib_dir: &Path) -> Result<Vec<String>> {
    if !lib_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut libs = Vec::new();
    for entry in fs::read_dir(lib_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let (Some(stem), Some(ext)) = (
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|s| s.to_str()),
        ) else {
            continue;
        };
        if !LIB_EXTENSIONS.contains(&ext) {
            continue;
        }
        let name = match stem.strip_prefix("lib") {
            Some(stripped) if ext != "lib" => stripped,
            _ => stem,
        };
        libs.push(name.to_string());
    }
    libs.sort();
    libs.dedup();
    Ok(libs)
}
