//! Preflight checks for recipe runs.
//!
//! Validates that the host has the tools a configuration needs before any
//! source is fetched. This prevents cryptic errors halfway through a build.
//!
//! # Example
//!
//! ```rust
//! use kfr_recipe::preflight::{command_exists, check_required_tools};
//!
//! if !command_exists("cmake") {
//!     println!("cmake not installed");
//! }
//!
//! let tools = &[("cmake", "cmake"), ("patch", "patch")];
//! if let Err(e) = check_required_tools(tools) {
//!     eprintln!("{}", e);
//! }
//! ```

use crate::error::{RecipeError, Result};
use crate::recipe::config::EffectiveConfig;

/// Check if a command exists on the host system.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Tools every run needs: headers are installed through CMake too.
///
/// Each tuple is (command_name, package_name).
pub const INSTALL_TOOLS: &[(&str, &str)] = &[("cmake", "cmake")];

/// Additional tools for compiled configurations.
pub const COMPILE_TOOLS: &[(&str, &str)] = &[("patch", "patch")];

/// Tools required for `config`.
pub fn required_tools(config: &EffectiveConfig) -> Vec<(&'static str, &'static str)> {
    let mut tools = INSTALL_TOOLS.to_vec();
    if !config.is_header_only() {
        tools.extend_from_slice(COMPILE_TOOLS);
    }
    tools
}

/// Check that specific tools are available.
///
/// # Returns
///
/// * `Ok(())` if all tools are found
/// * `Err` with list of missing tools and their packages
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let missing: Vec<String> = tools
        .iter()
        .filter(|(tool, _)| !command_exists(tool))
        .map(|(tool, package)| format!("  {} (install: {})", tool, package))
        .collect();

    if !missing.is_empty() {
        return Err(RecipeError::ToolNotFound(format!(
            "missing required host tools:\n{}",
            missing.join("\n")
        )));
    }
    Ok(())
}

/// Check everything `config` needs. `CMAKE_BIN` stands in for `cmake` on PATH.
pub fn check_host_tools(config: &EffectiveConfig) -> Result<()> {
    let tools: Vec<_> = required_tools(config)
        .into_iter()
        .filter(|(tool, _)| !(*tool == "cmake" && std::env::var_os("CMAKE_BIN").is_some()))
        .collect();
    check_required_tools(&tools)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::config::CompiledConfig;
    use crate::recipe::settings::PlatformFacts;

    #[test]
    fn test_command_exists() {
        // 'ls' should exist on any Unix system
        assert!(command_exists("ls"));
        assert!(!command_exists("definitely_not_a_real_command_12345"));
    }

    #[test]
    fn test_check_required_tools_success() {
        let tools = &[("ls", "coreutils"), ("cat", "coreutils")];
        assert!(check_required_tools(tools).is_ok());
    }

    #[test]
    fn test_check_required_tools_failure() {
        let tools = &[("nonexistent_command_xyz", "fake-package")];
        let err = check_required_tools(tools).unwrap_err();
        assert!(err.to_string().contains("fake-package"));
    }

    #[test]
    fn compiled_configs_also_need_patch() {
        assert_eq!(required_tools(&EffectiveConfig::HeaderOnly), vec![("cmake", "cmake")]);
        let compiled = EffectiveConfig::Compiled(CompiledConfig {
            dft: false,
            shared: true,
            fpic: None,
            settings: PlatformFacts::new("Visual Studio", "Windows", "x86_64", "Release"),
        });
        assert!(required_tools(&compiled).contains(&("patch", "patch")));
    }
}
