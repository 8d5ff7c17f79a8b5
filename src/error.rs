//! Error taxonomy for recipe runs.
//!
//! Every error is terminal: nothing here is retried. A recipe run wraps the
//! error in a [`RunFailure`] naming the stage it was in when it stopped.

use std::path::PathBuf;
use thiserror::Error;

use crate::recipe::Stage;

/// Result type for recipe operations.
pub type Result<T> = std::result::Result<T, RecipeError>;

#[derive(Error, Debug)]
pub enum RecipeError {
    /// User-supplied options contradict each other or the platform.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An option or setting could not be parsed.
    #[error("invalid option '{name}': {reason}")]
    InvalidOption { name: String, reason: String },

    /// The source archive could not be fetched or unpacked.
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The fetched archive does not match the pinned checksum.
    #[error("integrity check failed for {url}: expected sha256 {expected}, got {actual}")]
    Integrity {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("patch '{}' failed to apply: {output}", patch.display())]
    Patch { patch: PathBuf, output: String },

    /// The build tool reported failure while configuring or compiling.
    #[error("{step} failed (exit code {code}): {output}")]
    Build {
        step: String,
        code: i32,
        output: String,
    },

    /// Installing or post-processing the package tree failed.
    #[error("install failed: {0}")]
    Install(String),

    #[error("required tool not found: {0}")]
    ToolNotFound(String),

    /// A profile file could not be read or parsed.
    #[error("profile '{}': {reason}", path.display())]
    Profile { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RecipeError {
    pub fn install(msg: impl Into<String>) -> Self {
        Self::Install(msg.into())
    }

    pub fn invalid_option(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// A recipe run that stopped at `stage`.
#[derive(Error, Debug)]
#[error("stage {stage:?} failed: {source}")]
pub struct RunFailure {
    pub stage: Stage,
    #[source]
    pub source: RecipeError,
}

/// Tag a stage's result with the stage it belongs to.
pub(crate) trait AtStage<T> {
    fn at_stage(self, stage: Stage) -> std::result::Result<T, RunFailure>;
}

impl<T> AtStage<T> for Result<T> {
    fn at_stage(self, stage: Stage) -> std::result::Result<T, RunFailure> {
        self.map_err(|source| {
            tracing::error!("stage {:?} failed: {}", stage, source);
            RunFailure { stage, source }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_keeps_the_stage_it_was_tagged_with() {
        let io: Result<()> = Err(std::io::Error::other("disk gone").into());
        let failure = io.at_stage(Stage::Acquired).unwrap_err();
        assert_eq!(failure.stage, Stage::Acquired);
        assert!(matches!(failure.source, RecipeError::Io(_)));
        assert!(failure.to_string().contains("Acquired"));
    }

    #[test]
    fn integrity_message_names_both_hashes() {
        let err = RecipeError::Integrity {
            url: "https://example.invalid/a.tar.gz".into(),
            expected: "aaaa".into(),
            actual: "bbbb".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("aaaa"));
        assert!(msg.contains("bbbb"));
    }
}
