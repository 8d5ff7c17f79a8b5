//! The packaging pipeline stages and the external collaborators they drive.
//!
//! - [`layout`] - folder layout of a run
//! - [`source`] - fetch, verify and unpack the upstream archive
//! - [`patch`] - patch application
//! - [`cmake`] - the build tool seam
//! - [`build`] - compile step
//! - [`package`] - install, trim and manifest

pub mod build;
pub mod cmake;
pub mod layout;
pub mod package;
pub mod patch;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use build::{build, compile, patch_source, BuildArtifacts};
pub use cmake::{BuildTool, CMake, CMakeInvocation};
pub use layout::RunLayout;
pub use package::{package, verify_layout, InstallManifest};
pub use source::{acquire, HttpFetcher, SourceFetcher, SourceLocation, SourceSpec};
