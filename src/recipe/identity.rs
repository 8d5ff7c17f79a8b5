//! Package identity: the key that decides binary compatibility.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

use super::config::{Compatibility, EffectiveConfig};

/// Identity of one package binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageIdentity {
    pub compatibility: Compatibility,
    /// Lowercase hex sha256 of the canonical info text.
    pub key: String,
}

/// Compute the package identity for an effective configuration.
///
/// Platform independent configurations hash an empty info text, so every
/// header-only package shares one key regardless of where it was built.
pub fn compute_package_identity(config: &EffectiveConfig) -> PackageIdentity {
    let compatibility = config.compatibility();
    let text = match compatibility {
        Compatibility::PlatformIndependent => canonical_info(&[], &[]),
        Compatibility::PlatformSpecific => {
            let settings = config.settings();
            let settings: Vec<(&str, &str)> =
                settings.iter().map(|(k, v)| (*k, v.as_str())).collect();
            let options: Vec<(&str, &str)> =
                config.options().into_iter().collect();
            canonical_info(&settings, &options)
        }
    };

    PackageIdentity {
        compatibility,
        key: format!("{:x}", Sha256::digest(text.as_bytes())),
    }
}

/// Render the sections hashed into the identity. Entries must already be sorted.
fn canonical_info(settings: &[(&str, &str)], options: &[(&str, &str)]) -> String {
    let mut text = String::from("[settings]\n");
    for (name, value) in settings {
        let _ = writeln!(text, "    {}={}", name, value);
    }
    text.push_str("\n[options]\n");
    for (name, value) in options {
        let _ = writeln!(text, "    {}={}", name, value);
    }
    text
}
