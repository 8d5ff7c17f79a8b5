//! External build tool seam and its CMake implementation.
//!
//! CMake binary resolution order:
//! 1. `CMAKE_BIN` env var (path to binary)
//! 2. System PATH (`which cmake`)

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

use crate::error::{RecipeError, Result};
use crate::recipe::config::EffectiveConfig;

/// Everything the build tool needs to configure a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CMakeInvocation {
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub definitions: BTreeMap<String, String>,
}

impl CMakeInvocation {
    /// Derive the invocation for `config`.
    ///
    /// Header-only trees only get the install prefix and build type; the
    /// library switches are passed for compiled builds.
    pub fn for_config(
        config: &EffectiveConfig,
        source_dir: &Path,
        build_dir: &Path,
        install_prefix: &Path,
    ) -> Self {
        let mut definitions = BTreeMap::new();
        definitions.insert(
            "CMAKE_INSTALL_PREFIX".to_string(),
            install_prefix.display().to_string(),
        );

        match config {
            EffectiveConfig::HeaderOnly => {
                definitions.insert("CMAKE_BUILD_TYPE".to_string(), "Release".to_string());
            }
            EffectiveConfig::Compiled(compiled) => {
                definitions.insert(
                    "CMAKE_BUILD_TYPE".to_string(),
                    compiled.settings.build_type.clone(),
                );
                definitions.insert("BUILD_SHARED_LIBS".to_string(), on_off(compiled.shared));
                if let Some(fpic) = compiled.fpic {
                    definitions.insert(
                        "CMAKE_POSITION_INDEPENDENT_CODE".to_string(),
                        on_off(fpic),
                    );
                }
                definitions.insert("ENABLE_DFT".to_string(), on_off(compiled.dft));
            }
        }

        Self {
            source_dir: source_dir.to_path_buf(),
            build_dir: build_dir.to_path_buf(),
            definitions,
        }
    }

    pub fn build_type(&self) -> &str {
        self.definitions
            .get("CMAKE_BUILD_TYPE")
            .map(String::as_str)
            .unwrap_or("Release")
    }
}

fn on_off(value: bool) -> String {
    let text = if value { "ON" } else { "OFF" };
    text.to_string()
}

/// Configure, compile and install steps of an external build tool.
pub trait BuildTool {
    fn configure(&self, invocation: &CMakeInvocation) -> Result<()>;
    fn build(&self, invocation: &CMakeInvocation) -> Result<()>;
    fn install(&self, invocation: &CMakeInvocation) -> Result<()>;
}

/// Resolved CMake binary.
#[derive(Debug, Clone)]
pub struct CMake {
    pub path: PathBuf,
}

impl CMake {
    /// Find the cmake binary using the resolution order.
    pub fn find() -> Result<Self> {
        if let Ok(bin) = env::var("CMAKE_BIN") {
            let path = PathBuf::from(&bin);
            if path.is_file() {
                return Ok(Self { path });
            }
            return Err(RecipeError::ToolNotFound(format!(
                "CMAKE_BIN points to non-existent path: {}",
                bin
            )));
        }

        which::which("cmake")
            .map(|path| Self { path })
            .map_err(|_| {
                RecipeError::ToolNotFound(
                    "cmake (set CMAKE_BIN=/path/to/cmake or install cmake to PATH)".to_string(),
                )
            })
    }

    fn run(&self, step: &str, args: Vec<String>) -> Result<()> {
        info!("cmake {}", step);
        debug!("{} {}", self.path.display(), args.join(" "));

        let output = Command::new(&self.path)
            .args(&args)
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecipeError::Build {
                step: format!("cmake {step}"),
                code: output.status.code().unwrap_or(-1),
                output: format!("{}{}", stdout, stderr),
            });
        }
        Ok(())
    }
}

impl BuildTool for CMake {
    fn configure(&self, invocation: &CMakeInvocation) -> Result<()> {
        let mut args = vec![
            "-S".to_string(),
            invocation.source_dir.display().to_string(),
            "-B".to_string(),
            invocation.build_dir.display().to_string(),
        ];
        args.extend(
            invocation
                .definitions
                .iter()
                .map(|(name, value)| format!("-D{}={}", name, value)),
        );
        self.run("configure", args)
    }

    fn build(&self, invocation: &CMakeInvocation) -> Result<()> {
        self.run(
            "build",
            vec![
                "--build".to_string(),
                invocation.build_dir.display().to_string(),
                "--config".to_string(),
                invocation.build_type().to_string(),
            ],
        )
    }

    fn install(&self, invocation: &CMakeInvocation) -> Result<()> {
        self.run(
            "install",
            vec![
                "--build".to_string(),
                invocation.build_dir.display().to_string(),
                "--config".to_string(),
                invocation.build_type().to_string(),
                "--target".to_string(),
                "install".to_string(),
            ],
        )
    }
}
