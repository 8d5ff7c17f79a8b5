//! Validation and the effective configuration derived from it.
//!
//! Options are never deleted in place. Validation produces a new
//! [`EffectiveConfig`] that only carries the entries which still apply, and
//! that value is not mutated for the rest of the run.

use serde::Serialize;
use std::collections::BTreeMap;

use super::options::{bool_value, OptionSet};
use super::settings::PlatformFacts;
use crate::error::{RecipeError, Result};

/// Whether a package binary depends on the platform it was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Compatibility {
    /// Headers only: one package serves every platform.
    PlatformIndependent,
    PlatformSpecific,
}

/// Options and settings of a compiled (non header-only) build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledConfig {
    pub dft: bool,
    pub shared: bool,
    /// `None` when the toolchain has no notion of position independent code.
    pub fpic: Option<bool>,
    pub settings: PlatformFacts,
}

/// Configuration after validation and pruning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EffectiveConfig {
    HeaderOnly,
    Compiled(CompiledConfig),
}

impl EffectiveConfig {
    pub fn is_header_only(&self) -> bool {
        matches!(self, Self::HeaderOnly)
    }

    pub fn compatibility(&self) -> Compatibility {
        match self {
            Self::HeaderOnly => Compatibility::PlatformIndependent,
            Self::Compiled(_) => Compatibility::PlatformSpecific,
        }
    }

    pub fn dft(&self) -> bool {
        match self {
            Self::HeaderOnly => false,
            Self::Compiled(c) => c.dft,
        }
    }

    pub fn compiled(&self) -> Option<&CompiledConfig> {
        match self {
            Self::HeaderOnly => None,
            Self::Compiled(c) => Some(c),
        }
    }

    /// Options that remain in the configuration, keyed by option name.
    pub fn options(&self) -> BTreeMap<&'static str, &'static str> {
        let mut options = BTreeMap::new();
        match self {
            Self::HeaderOnly => {
                options.insert("header_only", bool_value(true));
            }
            Self::Compiled(c) => {
                options.insert("dft", bool_value(c.dft));
                options.insert("header_only", bool_value(false));
                options.insert("shared", bool_value(c.shared));
                if let Some(fpic) = c.fpic {
                    options.insert("fPIC", bool_value(fpic));
                }
            }
        }
        options
    }

    /// Settings that take part in the package identity. Empty for header-only.
    pub fn settings(&self) -> BTreeMap<&'static str, String> {
        match self {
            Self::HeaderOnly => BTreeMap::new(),
            Self::Compiled(c) => c
                .settings
                .entries()
                .into_iter()
                .map(|(k, v)| (k, v.to_string()))
                .collect(),
        }
    }
}

/// Validate user options against the platform and derive the effective configuration.
pub fn validate(options: &OptionSet, platform: &PlatformFacts) -> Result<EffectiveConfig> {
    if options.dft && options.header_only {
        return Err(RecipeError::InvalidConfiguration(
            "DFT can not be built with header-only".to_string(),
        ));
    }
    if options.dft && !platform.supports_dft() {
        return Err(RecipeError::InvalidConfiguration(format!(
            "DFT option is only compatible with Clang (compiler is '{}')",
            platform.compiler
        )));
    }

    if options.header_only {
        return Ok(EffectiveConfig::HeaderOnly);
    }

    let fpic = if platform.is_windows() {
        None
    } else {
        Some(options.fpic)
    };

    Ok(EffectiveConfig::Compiled(CompiledConfig {
        dft: options.dft,
        shared: options.shared,
        fpic,
        settings: platform.clone(),
    }))
}
