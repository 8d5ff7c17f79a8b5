//! Compile step: patch, configure and build compiled configurations.

use std::path::PathBuf;
use tracing::info;

use super::cmake::{BuildTool, CMakeInvocation};
use super::layout::RunLayout;
use super::patch::{apply_patch, LIB_PATCH};
use super::source::SourceLocation;
use crate::error::Result;
use crate::recipe::config::EffectiveConfig;

/// What the compile step left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildArtifacts {
    /// Build tree, when anything was compiled.
    pub build_dir: Option<PathBuf>,
    pub patched: bool,
}

/// Build `config` from `source`. Header-only configurations compile nothing.
pub fn build(
    config: &EffectiveConfig,
    source: &SourceLocation,
    layout: &RunLayout,
    tool: &dyn BuildTool,
) -> Result<BuildArtifacts> {
    let patched = patch_source(config, source, layout)?;
    let build_dir = compile(config, source, layout, tool)?;
    Ok(BuildArtifacts { build_dir, patched })
}

/// Apply the recipe patch for compiled configurations. Returns whether it ran.
pub fn patch_source(
    config: &EffectiveConfig,
    source: &SourceLocation,
    layout: &RunLayout,
) -> Result<bool> {
    if config.is_header_only() {
        return Ok(false);
    }
    apply_patch(&source.root, &layout.recipe_dir.join(LIB_PATCH), 1)?;
    Ok(true)
}

/// Configure and compile an already patched tree.
pub fn compile(
    config: &EffectiveConfig,
    source: &SourceLocation,
    layout: &RunLayout,
    tool: &dyn BuildTool,
) -> Result<Option<PathBuf>> {
    if config.is_header_only() {
        info!("header-only configuration, nothing to compile");
        return Ok(None);
    }

    let invocation = CMakeInvocation::for_config(
        config,
        &source.root,
        &layout.build_folder(),
        &layout.package_folder(),
    );
    tool.configure(&invocation)?;
    tool.build(&invocation)?;
    Ok(Some(layout.build_folder()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecipeError;
    use crate::pipeline::testing::FakeTool;
    use crate::recipe::config::CompiledConfig;
    use crate::recipe::settings::PlatformFacts;
    use tempfile::TempDir;

    fn layout(tmp: &TempDir) -> (RunLayout, SourceLocation) {
        let layout = RunLayout::new(
            tmp.path().join("run"),
            tmp.path().join("recipe"),
            tmp.path().join("downloads"),
        );
        let source = SourceLocation {
            root: layout.source_folder(),
        };
        (layout, source)
    }

    #[test]
    fn header_only_builds_nothing() {
        let tmp = TempDir::new().unwrap();
        let (layout, source) = layout(&tmp);
        let tool = FakeTool::default();

        let artifacts = build(&EffectiveConfig::HeaderOnly, &source, &layout, &tool).unwrap();
        assert_eq!(artifacts, BuildArtifacts::default());
        assert!(tool.calls().is_empty());
    }

    #[test]
    fn compiled_build_without_patch_file_never_reaches_the_tool() {
        let tmp = TempDir::new().unwrap();
        let (layout, source) = layout(&tmp);
        let tool = FakeTool::default();
        let config = EffectiveConfig::Compiled(CompiledConfig {
            dft: false,
            shared: false,
            fpic: Some(true),
            settings: PlatformFacts::new("clang", "Linux", "x86_64", "Release"),
        });

        let err = build(&config, &source, &layout, &tool).unwrap_err();
        assert!(matches!(err, RecipeError::Patch { .. }));
        assert!(tool.calls().is_empty());
    }
}
