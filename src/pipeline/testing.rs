//! Test doubles for the build tool seam.

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;

use super::cmake::{BuildTool, CMakeInvocation};
use crate::error::{RecipeError, Result};

/// Build tool that records calls and installs a small fake KFR tree.
#[derive(Default)]
pub(crate) struct FakeTool {
    pub(crate) calls: RefCell<Vec<&'static str>>,
    /// Step name that should fail with a build error.
    pub(crate) fail_step: Option<&'static str>,
    /// Leave out the README that packaging removes.
    pub(crate) skip_readme: bool,
}

impl FakeTool {
    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    fn record(&self, step: &'static str) -> Result<()> {
        self.calls.borrow_mut().push(step);
        if self.fail_step == Some(step) {
            return Err(RecipeError::Build {
                step: format!("cmake {step}"),
                code: 2,
                output: "simulated failure".to_string(),
            });
        }
        Ok(())
    }
}

impl BuildTool for FakeTool {
    fn configure(&self, _invocation: &CMakeInvocation) -> Result<()> {
        self.record("configure")
    }

    fn build(&self, _invocation: &CMakeInvocation) -> Result<()> {
        self.record("build")
    }

    fn install(&self, invocation: &CMakeInvocation) -> Result<()> {
        self.record("install")?;
        let prefix = PathBuf::from(
            invocation
                .definitions
                .get("CMAKE_INSTALL_PREFIX")
                .cloned()
                .unwrap_or_default(),
        );
        let dr = prefix.join("include/kfr/io/dr");
        fs::create_dir_all(&dr)?;
        fs::write(prefix.join("include/kfr/kfr.h"), "#pragma once\n")?;
        fs::write(dr.join("dr_flac.h"), "#pragma once\n")?;
        if !self.skip_readme {
            fs::write(dr.join("README.txt"), "dr_libs\n")?;
        }
        let lib = prefix.join("lib");
        fs::create_dir_all(&lib)?;
        fs::write(lib.join("libkfr_io.a"), b"!<arch>\n")?;
        if invocation.definitions.get("ENABLE_DFT").map(String::as_str) == Some("ON") {
            fs::write(lib.join("libkfr_dft.a"), b"!<arch>\n")?;
        }
        Ok(())
    }
}
