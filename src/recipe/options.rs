//! Recipe options and their `name=value` parsing.

use serde::{Deserialize, Serialize};

use crate::error::{RecipeError, Result};

/// Option names exposed to the package manager, in canonical order.
pub const OPTION_NAMES: &[&str] = &["dft", "header_only", "shared", "fPIC"];

/// User-supplied recipe options before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSet {
    pub dft: bool,
    pub header_only: bool,
    pub shared: bool,
    #[serde(rename = "fPIC")]
    pub fpic: bool,
}

impl Default for OptionSet {
    fn default() -> Self {
        Self {
            dft: false,
            header_only: true,
            shared: false,
            fpic: true,
        }
    }
}

impl OptionSet {
    /// Set one option from its textual name and value.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        let parsed = parse_bool(value).ok_or_else(|| {
            RecipeError::invalid_option(name, format!("expected a boolean, got '{}'", value))
        })?;
        match name.trim() {
            "dft" => self.dft = parsed,
            "header_only" => self.header_only = parsed,
            "shared" => self.shared = parsed,
            "fPIC" | "fpic" => self.fpic = parsed,
            other => {
                return Err(RecipeError::invalid_option(
                    other,
                    format!("unknown option (expected one of {})", OPTION_NAMES.join(", ")),
                ))
            }
        }
        Ok(())
    }

    /// Apply a `name=value` assignment, e.g. `header_only=False`.
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<()> {
        let (name, value) = split_assignment(assignment)?;
        self.set(name, value)
    }

    /// Build an option set from defaults plus assignments, in order.
    pub fn from_assignments<'a, I>(assignments: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut options = Self::default();
        for assignment in assignments {
            options.apply_assignment(assignment)?;
        }
        Ok(options)
    }
}

/// Split `name=value`, trimming both sides.
pub fn split_assignment(assignment: &str) -> Result<(&str, &str)> {
    let (name, value) = assignment.split_once('=').ok_or_else(|| {
        RecipeError::invalid_option(assignment, "expected 'name=value'".to_string())
    })?;
    let name = name.trim();
    if name.is_empty() {
        return Err(RecipeError::invalid_option(
            assignment,
            "empty name".to_string(),
        ));
    }
    Ok((name, value.trim()))
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Render a bool the way package-manager option values are written.
pub(crate) fn bool_value(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_header_only_without_dft() {
        let options = OptionSet::default();
        assert!(options.header_only);
        assert!(!options.dft);
        assert!(!options.shared);
        assert!(options.fpic);
    }

    #[test]
    fn assignments_accept_package_manager_spelling() {
        let options =
            OptionSet::from_assignments(["header_only=False", "dft=True", "fPIC=false"]).unwrap();
        assert!(!options.header_only);
        assert!(options.dft);
        assert!(!options.fpic);
    }

    #[test]
    fn unknown_option_is_rejected() {
        let err = OptionSet::from_assignments(["with_flac=True"]).unwrap_err();
        assert!(matches!(err, RecipeError::InvalidOption { .. }));
    }

    #[test]
    fn non_boolean_value_is_rejected() {
        assert!(OptionSet::from_assignments(["shared=maybe"]).is_err());
        assert!(OptionSet::from_assignments(["shared"]).is_err());
    }
}
