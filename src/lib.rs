//! Packaging recipe for the KFR C++ DSP library.
//!
//! The crate turns a set of recipe options and platform facts into a binary
//! package: it validates the options, fetches the pinned upstream archive,
//! patches and compiles it when a compiled build is requested, installs and
//! trims the result, and computes the package identity and the info consumers
//! link against.
//!
//! - **Recipe** - options, settings, validation, identity and package info
//! - **Pipeline** - source acquisition, patching, CMake and packaging stages
//! - **Templates** - the job matrix selected by `CONAN_OPTIONS`
//! - **Preflight checks** - host tool validation before builds
//!
//! # Architecture
//!
//! ```text
//! OptionSet + PlatformFacts
//!     │ validate()
//!     ▼
//! EffectiveConfig (HeaderOnly | Compiled)   ← immutable from here on
//!     │
//!     ├── acquire()  → SourceLocation        (SourceFetcher)
//!     ├── build()    → BuildArtifacts        (BuildTool, patch)
//!     ├── package()  → InstallManifest       (BuildTool)
//!     ├── compute_package_identity()
//!     └── describe_package_info()
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use kfr_recipe::pipeline::{CMake, HttpFetcher, RunLayout};
//! use kfr_recipe::recipe::{options::OptionSet, settings::PlatformFacts, RecipeRun};
//!
//! let fetcher = HttpFetcher::new()?;
//! let cmake = CMake::find()?;
//! let layout = RunLayout::new("work".into(), ".".into(), "downloads".into());
//! let outcome = RecipeRun::new(layout, &fetcher, &cmake)
//!     .execute(&OptionSet::default(), &PlatformFacts::detect_host())?;
//! println!("{}", outcome.identity.key);
//! ```

pub mod error;
pub mod pipeline;
pub mod preflight;
pub mod profile;
pub mod recipe;
pub mod template;

pub use error::{RecipeError, Result, RunFailure};
pub use recipe::config::{validate, Compatibility, EffectiveConfig};
pub use recipe::identity::{compute_package_identity, PackageIdentity};
pub use recipe::info::{describe_package_info, PackageInfo};
pub use recipe::options::OptionSet;
pub use recipe::settings::{HostPlatform, PlatformFacts};
pub use recipe::{RecipeRun, RunOutcome, Stage};
pub use template::{BuildJob, BuildTemplate};
