//! The KFR package recipe and the workflow that runs it.
//!
//! A run moves through a fixed sequence of stages:
//!
//! ```text
//! Start -> Validated -> Acquired -> (Patched ->)? Built -> Packaged
//!       -> IdentityComputed -> InfoExposed -> Done
//! ```
//!
//! Validation happens before anything is fetched. The first failing stage
//! ends the run with a [`RunFailure`] naming it; nothing is rolled back.

pub mod config;
pub mod identity;
pub mod info;
pub mod options;
pub mod settings;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{AtStage, Result, RunFailure};
use crate::pipeline::{
    acquire, compile, package, patch_source, verify_layout, BuildTool, InstallManifest, RunLayout,
    SourceFetcher, SourceSpec,
};
use config::{validate, EffectiveConfig};
use identity::{compute_package_identity, PackageIdentity};
use info::{describe_package_info, PackageInfo};
use options::OptionSet;
use settings::{HostPlatform, PlatformFacts};

pub const NAME: &str = "kfr";
pub const VERSION: &str = "3.0.9";
pub const DESCRIPTION: &str =
    "Fast, modern C++ DSP framework, FFT, Sample Rate Conversion, FIR/IIR/Biquad Filters";
pub const HOMEPAGE: &str = "https://github.com/kfrlib/kfr";
pub const URL: &str = "https://github.com/bincrafters/conan-kfr";
pub const LICENSE: &str = "GPL-2.0";
pub const TOPICS: &[&str] = &["conan", "kfr", "avx", "fft", "audio", "dsp"];
/// sha256 of `{HOMEPAGE}/archive/{VERSION}.tar.gz`.
pub const SOURCE_SHA256: &str = "71ff6b62db268d76acd5ebf720b3f4d0786de59fea02fcabb30bb7121ce82d15";

/// The pinned upstream source of this recipe.
pub fn source_spec() -> SourceSpec {
    SourceSpec {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        homepage: HOMEPAGE.to_string(),
        sha256: SOURCE_SHA256.to_string(),
    }
}

/// Workflow stages, in the order a successful run reaches them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    Validated,
    Acquired,
    Patched,
    Built,
    Packaged,
    IdentityComputed,
    InfoExposed,
    Done,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub name: &'static str,
    pub version: &'static str,
    pub stages: Vec<Stage>,
    pub config: EffectiveConfig,
    pub options: BTreeMap<&'static str, &'static str>,
    pub settings: BTreeMap<&'static str, String>,
    pub identity: PackageIdentity,
    pub info: PackageInfo,
    pub manifest: InstallManifest,
}

impl RunOutcome {
    /// Write the outcome as JSON to `path`.
    pub fn write_record(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Validated view of a configuration without building it.
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    pub config: EffectiveConfig,
    pub options: BTreeMap<&'static str, &'static str>,
    pub settings: BTreeMap<&'static str, String>,
    pub identity: PackageIdentity,
    /// Info as it would be exposed; compiled library names are only known after packaging.
    pub info: PackageInfo,
}

/// Validate and describe a configuration. Nothing is fetched or built.
pub fn inspect(
    options: &OptionSet,
    platform: &PlatformFacts,
    host: HostPlatform,
) -> Result<Inspection> {
    let config = validate(options, platform)?;
    let identity = compute_package_identity(&config);
    let info = describe_package_info(&config, None, host)?;
    Ok(Inspection {
        options: config.options(),
        settings: config.settings(),
        config,
        identity,
        info,
    })
}

/// One recipe run with its collaborators.
pub struct RecipeRun<'a> {
    pub layout: RunLayout,
    pub source: SourceSpec,
    pub host: HostPlatform,
    fetcher: &'a dyn SourceFetcher,
    tool: &'a dyn BuildTool,
}

impl<'a> RecipeRun<'a> {
    pub fn new(layout: RunLayout, fetcher: &'a dyn SourceFetcher, tool: &'a dyn BuildTool) -> Self {
        Self {
            layout,
            source: source_spec(),
            host: HostPlatform::detect(),
            fetcher,
            tool,
        }
    }

    /// Run every stage for `options` on `platform`.
    ///
    /// A failure carries the stage that was running when it happened.
    pub fn execute(
        &self,
        options: &OptionSet,
        platform: &PlatformFacts,
    ) -> std::result::Result<RunOutcome, RunFailure> {
        let mut stages = vec![Stage::Start];

        let config = validate(options, platform).at_stage(Stage::Validated)?;
        advance(&mut stages, Stage::Validated);

        self.layout.prepare().at_stage(Stage::Acquired)?;
        let source = acquire(self.fetcher, &self.layout, &self.source).at_stage(Stage::Acquired)?;
        advance(&mut stages, Stage::Acquired);

        if patch_source(&config, &source, &self.layout).at_stage(Stage::Patched)? {
            advance(&mut stages, Stage::Patched);
        }
        compile(&config, &source, &self.layout, self.tool).at_stage(Stage::Built)?;
        advance(&mut stages, Stage::Built);

        let manifest = package(&config, &source, &self.layout, self.tool)
            .and_then(|manifest| verify_layout(&config, &manifest).map(|()| manifest))
            .at_stage(Stage::Packaged)?;
        advance(&mut stages, Stage::Packaged);

        let identity = compute_package_identity(&config);
        advance(&mut stages, Stage::IdentityComputed);

        let info = describe_package_info(&config, Some(&self.layout.package_folder()), self.host)
            .at_stage(Stage::InfoExposed)?;
        advance(&mut stages, Stage::InfoExposed);

        advance(&mut stages, Stage::Done);
        let outcome = RunOutcome {
            name: NAME,
            version: VERSION,
            stages,
            options: config.options(),
            settings: config.settings(),
            config,
            identity,
            info,
            manifest,
        };
        outcome
            .write_record(&self.layout.run_record())
            .at_stage(Stage::Done)?;
        Ok(outcome)
    }
}

fn advance(stages: &mut Vec<Stage>, stage: Stage) {
    info!("stage {:?}", stage);
    stages.push(stage);
}
