//! Patch application through the host `patch` tool.

use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

use crate::error::{RecipeError, Result};

/// Patch shipped with the recipe for compiled builds.
pub const LIB_PATCH: &str = "0001-lib.patch";

/// Apply `patch_file` to `source_dir` with the given strip level.
///
/// A dry run goes first so a patch that does not apply cleanly leaves the
/// tree untouched.
pub fn apply_patch(source_dir: &Path, patch_file: &Path, strip: u32) -> Result<()> {
    if !patch_file.is_file() {
        return Err(RecipeError::Patch {
            patch: patch_file.to_path_buf(),
            output: "patch file not found".to_string(),
        });
    }
    let patch_bin = which::which("patch")
        .map_err(|_| RecipeError::ToolNotFound("patch".to_string()))?;

    run_patch(&patch_bin, source_dir, patch_file, strip, true)?;
    run_patch(&patch_bin, source_dir, patch_file, strip, false)?;
    info!("applied {}", patch_file.display());
    Ok(())
}

fn run_patch(
    patch_bin: &Path,
    source_dir: &Path,
    patch_file: &Path,
    strip: u32,
    dry_run: bool,
) -> Result<()> {
    let mut cmd = Command::new(patch_bin);
    cmd.arg(format!("-p{strip}"))
        .arg("--forward")
        .arg("--batch")
        .arg("-i")
        .arg(patch_file)
        .current_dir(source_dir);
    if dry_run {
        cmd.arg("--dry-run");
    }
    debug!("running {:?}", cmd);

    let output = cmd.output()?;
    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RecipeError::Patch {
            patch: patch_file.to_path_buf(),
            output: format!("{}\n{}", stdout.trim(), stderr.trim())
                .trim()
                .to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const PATCH: &str = "\
--- a/CMakeLists.txt
+++ b/CMakeLists.txt
@@ -1,2 +1,2 @@
 project(kfr)
-option(ENABLE_DFT \"\" OFF)
+option(ENABLE_DFT \"\" ON)
";

    #[test]
    fn missing_patch_file_is_a_patch_error() {
        let tmp = TempDir::new().unwrap();
        let err = apply_patch(tmp.path(), &tmp.path().join(LIB_PATCH), 1).unwrap_err();
        assert!(matches!(err, RecipeError::Patch { .. }));
    }

    #[test]
    #[ignore = "needs the host `patch` tool; run with --ignored"]
    fn clean_patch_applies() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(
            src.join("CMakeLists.txt"),
            "project(kfr)\noption(ENABLE_DFT \"\" OFF)\n",
        )
        .unwrap();
        let patch = tmp.path().join(LIB_PATCH);
        fs::write(&patch, PATCH).unwrap();

        apply_patch(&src, &patch, 1).unwrap();
        let patched = fs::read_to_string(src.join("CMakeLists.txt")).unwrap();
        assert!(patched.contains("ENABLE_DFT \"\" ON"));
    }

    #[test]
    #[ignore = "needs the host `patch` tool; run with --ignored"]
    fn conflicting_patch_leaves_tree_untouched() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        let original = "project(other)\nadd_library(x x.cpp)\n";
        fs::write(src.join("CMakeLists.txt"), original).unwrap();
        let patch = tmp.path().join(LIB_PATCH);
        fs::write(&patch, PATCH).unwrap();

        let err = apply_patch(&src, &patch, 1).unwrap_err();
        assert!(matches!(err, RecipeError::Patch { .. }));
        assert_eq!(
            fs::read_to_string(src.join("CMakeLists.txt")).unwrap(),
            original
        );
    }
}
