//! TOML profiles holding settings and options for a run.
//!
//! ```toml
//! [settings]
//! compiler = "clang"
//! build_type = "Debug"
//!
//! [options]
//! header_only = false
//! dft = true
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{RecipeError, Result};
use crate::recipe::options::{bool_value, OptionSet};
use crate::recipe::settings::PlatformFacts;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
    #[serde(default)]
    pub options: BTreeMap<String, ProfileValue>,
}

/// Option values may be written as TOML booleans or as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProfileValue {
    Bool(bool),
    Text(String),
}

impl ProfileValue {
    fn as_text(&self) -> &str {
        match self {
            Self::Bool(b) => bool_value(*b),
            Self::Text(s) => s.as_str(),
        }
    }
}

impl Profile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| RecipeError::Profile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(&text).map_err(|reason| RecipeError::Profile {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    /// Apply this profile's settings and options on top of the given values.
    pub fn apply(&self, options: &mut OptionSet, platform: &mut PlatformFacts) -> Result<()> {
        for (name, value) in &self.settings {
            platform.set(name, value.trim())?;
        }
        for (name, value) in &self.options {
            options.set(name, value.as_text())?;
        }
        Ok(())
    }
}
