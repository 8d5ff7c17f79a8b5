//! Build templates: which configurations a CI-style run produces.
//!
//! The presence of `CONAN_OPTIONS` selects the compiled matrix; its value is
//! not interpreted.

use crate::recipe::options::OptionSet;
use crate::recipe::settings::PlatformFacts;

/// Environment variable whose presence selects the compiled template.
pub const OPTIONS_ENV: &str = "CONAN_OPTIONS";

const BUILD_TYPES: &[&str] = &["Release", "Debug"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTemplate {
    /// A single platform independent package.
    HeaderOnly,
    /// Compiled packages for every shared/build-type combination.
    Default,
}

/// One configuration to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildJob {
    /// Folder-safe name of the job.
    pub name: String,
    pub options: OptionSet,
    pub platform: PlatformFacts,
}

impl BuildTemplate {
    pub fn from_env() -> Self {
        Self::select(std::env::var_os(OPTIONS_ENV).is_some())
    }

    pub fn select(options_env_present: bool) -> Self {
        if options_env_present {
            Self::Default
        } else {
            Self::HeaderOnly
        }
    }

    /// Expand the template into jobs for `host`.
    pub fn jobs(&self, host: &PlatformFacts) -> Vec<BuildJob> {
        match self {
            Self::HeaderOnly => vec![BuildJob {
                name: "header_only".to_string(),
                options: OptionSet::default(),
                platform: host.clone(),
            }],
            Self::Default => {
                let mut jobs = Vec::new();
                for shared in [false, true] {
                    for build_type in BUILD_TYPES {
                        let mut platform = host.clone();
                        platform.build_type = build_type.to_string();
                        jobs.push(BuildJob {
                            name: format!(
                                "{}-{}",
                                if shared { "shared" } else { "static" },
                                build_type
                            ),
                            options: OptionSet {
                                header_only: false,
                                shared,
                                ..OptionSet::default()
                            },
                            platform,
                        });
                    }
                }
                jobs
            }
        }
    }
}
