//! Module version handling
//!
//! Module versions are semantic versions written with a leading `v`
//! (`v1.2.3`, `v2.0.0-pre+build`). The shorthands `v1` and `v1.2` are accepted
//! and canonicalize to `v1.0.0` and `v1.2.0`.
//!
//! Toolchain and language versions (`go1.21.0`, `1.21rc1`) follow a different
//! grammar and live in [`toolchain`]. Retract sorting orders module versions;
//! the vendoring classifier orders toolchain versions.
//!
//! # Example
//!
//! ```rust
//! use modfile_core::version;
//! use std::cmp::Ordering;
//!
//! assert_eq!(version::canonical("v1.2").as_deref(), Some("v1.2.0"));
//! assert_eq!(version::compare("v1.10.0", "v1.9.0"), Ordering::Greater);
//! assert_eq!(version::compare("bogus", "v0.0.1"), Ordering::Less);
//! ```

pub mod toolchain;

use semver::Version;
use std::cmp::Ordering;
use thiserror::Error;

/// Errors produced while validating or fixing a version literal
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// The literal is not a valid version
    #[error("invalid version {version:?}: {reason}")]
    Invalid { version: String, reason: String },

    /// A version fixer refused the literal
    #[error("{0}")]
    Rejected(String),
}

impl VersionError {
    /// Create an invalid-version error with the standard reason
    pub fn invalid(version: impl Into<String>) -> Self {
        VersionError::Invalid {
            version: version.into(),
            reason: "must be of the form v1.2.3".to_string(),
        }
    }
}

/// Callback canonicalizing a version literal during parsing
///
/// Called with the module path the literal belongs to and the raw literal;
/// returns the canonical version to store in the tree.
pub type VersionFixer<'a> = dyn Fn(&str, &str) -> Result<String, VersionError> + 'a;

/// Parse a module version into its semver form
fn parse(v: &str) -> Option<Version> {
    let rest = v.strip_prefix('v')?;
    let suffix_at = rest.find(['-', '+']).unwrap_or(rest.len());
    let (core, suffix) = rest.split_at(suffix_at);
    let parts = core.split('.').count();
    let padded = match parts {
        // Shorthands never carry a prerelease or build suffix.
        1 if suffix.is_empty() => format!("{core}.0.0"),
        2 if suffix.is_empty() => format!("{core}.0"),
        3 => core.to_string(),
        _ => return None,
    };
    Version::parse(&format!("{padded}{suffix}")).ok()
}

/// Report whether `v` is a valid module version
pub fn is_valid(v: &str) -> bool {
    parse(v).is_some()
}

/// Canonical spelling of a module version
///
/// Shorthands are expanded and build metadata dropped, except for the
/// `+incompatible` marker which carries meaning for major versions without a
/// module path suffix.
pub fn canonical(v: &str) -> Option<String> {
    let parsed = parse(v)?;
    let mut out = format!("v{}.{}.{}", parsed.major, parsed.minor, parsed.patch);
    if !parsed.pre.is_empty() {
        out.push('-');
        out.push_str(parsed.pre.as_str());
    }
    if parsed.build.as_str() == "incompatible" {
        out.push_str("+incompatible");
    }
    Some(out)
}

/// Canonicalize or fail with the standard invalid-version error
pub fn check(v: &str) -> Result<String, VersionError> {
    canonical(v).ok_or_else(|| VersionError::invalid(v))
}

/// Compare two module versions by semver precedence
///
/// Invalid versions compare equal to each other and below every valid
/// version. Build metadata is ignored.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse(a), parse(b)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => (x.major, x.minor, x.patch)
            .cmp(&(y.major, y.minor, y.patch))
            .then_with(|| match (x.pre.is_empty(), y.pre.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => x.pre.cmp(&y.pre),
            }),
    }
}
