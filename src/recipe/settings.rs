//! Platform facts (settings) supplied from outside the recipe.

use serde::{Deserialize, Serialize};

use super::options::split_assignment;
use crate::error::{RecipeError, Result};

/// Compilers accepted for DFT builds.
pub const DFT_COMPILERS: &[&str] = &["clang", "apple-clang"];

/// Operating system name that drops `fPIC`.
pub const WINDOWS: &str = "Windows";

/// Settings the package binary depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformFacts {
    pub compiler: String,
    pub os: String,
    pub arch: String,
    pub build_type: String,
}

impl PlatformFacts {
    pub fn new(
        compiler: impl Into<String>,
        os: impl Into<String>,
        arch: impl Into<String>,
        build_type: impl Into<String>,
    ) -> Self {
        Self {
            compiler: compiler.into(),
            os: os.into(),
            arch: arch.into(),
            build_type: build_type.into(),
        }
    }

    /// Facts describing the machine this process runs on.
    ///
    /// The compiler comes from `CC` when set (by file name, so `/usr/bin/clang-17`
    /// becomes `clang`), otherwise from the platform's customary toolchain.
    pub fn detect_host() -> Self {
        let os = os_name(std::env::consts::OS).to_string();
        let compiler = std::env::var("CC")
            .ok()
            .and_then(|cc| compiler_from_cc(&cc))
            .unwrap_or_else(|| default_compiler(&os).to_string());
        Self {
            compiler,
            arch: arch_name(std::env::consts::ARCH).to_string(),
            os,
            build_type: "Release".to_string(),
        }
    }

    pub fn is_windows(&self) -> bool {
        self.os == WINDOWS
    }

    pub fn supports_dft(&self) -> bool {
        DFT_COMPILERS.contains(&self.compiler.as_str())
    }

    /// Set one setting from its name and value.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        if value.is_empty() {
            return Err(RecipeError::invalid_option(name, "empty setting value"));
        }
        match name {
            "compiler" => self.compiler = value.to_string(),
            "os" => self.os = value.to_string(),
            "arch" => self.arch = value.to_string(),
            "build_type" => self.build_type = value.to_string(),
            other => {
                return Err(RecipeError::invalid_option(
                    other,
                    "unknown setting (expected compiler, os, arch or build_type)",
                ))
            }
        }
        Ok(())
    }

    /// Apply a `name=value` assignment, e.g. `compiler=clang`.
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<()> {
        let (name, value) = split_assignment(assignment)?;
        self.set(name, value)
    }

    /// Settings as ordered `(name, value)` pairs.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("arch", self.arch.as_str()),
            ("build_type", self.build_type.as_str()),
            ("compiler", self.compiler.as_str()),
            ("os", self.os.as_str()),
        ]
    }
}

/// Facts about the host that runs the recipe, as opposed to the target settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostPlatform {
    pub is_linux: bool,
}

impl HostPlatform {
    pub fn detect() -> Self {
        Self {
            is_linux: cfg!(target_os = "linux"),
        }
    }
}

fn os_name(rust_os: &str) -> &str {
    match rust_os {
        "linux" => "Linux",
        "windows" => WINDOWS,
        "macos" => "Macos",
        "freebsd" => "FreeBSD",
        "android" => "Android",
        other => other,
    }
}

fn arch_name(rust_arch: &str) -> &str {
    match rust_arch {
        "x86_64" => "x86_64",
        "x86" => "x86",
        "aarch64" => "armv8",
        "arm" => "armv7",
        other => other,
    }
}

fn default_compiler(os: &str) -> &'static str {
    match os {
        "Macos" => "apple-clang",
        WINDOWS => "Visual Studio",
        "FreeBSD" => "clang",
        _ => "gcc",
    }
}

fn compiler_from_cc(cc: &str) -> Option<String> {
    let name = std::path::Path::new(cc.trim()).file_name()?.to_str()?;
    let name = name.strip_suffix(".exe").unwrap_or(name);
    let family = if name.starts_with("clang") {
        "clang"
    } else if name.starts_with("gcc") || name == "cc" {
        "gcc"
    } else if name == "cl" {
        "Visual Studio"
    } else {
        return None;
    };
    Some(family.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dft_compilers_are_clang_family() {
        assert!(PlatformFacts::new("clang", "Linux", "x86_64", "Release").supports_dft());
        assert!(PlatformFacts::new("apple-clang", "Macos", "armv8", "Release").supports_dft());
        assert!(!PlatformFacts::new("gcc", "Linux", "x86_64", "Release").supports_dft());
    }

    #[test]
    fn compiler_is_derived_from_cc_file_name() {
        assert_eq!(compiler_from_cc("/usr/bin/clang-17").as_deref(), Some("clang"));
        assert_eq!(compiler_from_cc("gcc-13").as_deref(), Some("gcc"));
        assert_eq!(compiler_from_cc("icx"), None);
    }

    #[test]
    fn assignments_override_individual_settings() {
        let mut facts = PlatformFacts::new("gcc", "Linux", "x86_64", "Release");
        facts.apply_assignment("compiler=clang").unwrap();
        facts.apply_assignment("build_type = Debug").unwrap();
        assert_eq!(facts.compiler, "clang");
        assert_eq!(facts.build_type, "Debug");
        assert!(facts.apply_assignment("compiler.version=17").is_err());
        assert!(facts.apply_assignment("os=").is_err());
    }

    #[test]
    fn host_detection_fills_every_fact() {
        let facts = PlatformFacts::detect_host();
        assert!(!facts.os.is_empty());
        assert!(!facts.arch.is_empty());
        assert!(!facts.compiler.is_empty());
        assert_eq!(facts.build_type, "Release");
    }
}
