//! Toolchain and language versions
//!
//! Toolchain names look like `go1.21.0`; the `go` directive carries a bare
//! language version such as `1.21` or `1.21rc1`. Missing components default
//! to zero, so `go1.24` and `go1.24.0` are the same toolchain. The empty string
//! (an unknown toolchain) sorts below every real version.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

static LANGUAGE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([1-9][0-9]*)\.(0|[1-9][0-9]*)(\.(0|[1-9][0-9]*))?([a-z]+[0-9]+)?$")
        .expect("language version pattern")
});

static LAX_LANGUAGE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?(([1-9][0-9]*)\.(0|[1-9][0-9]*))([^0-9].*)$")
        .expect("lax language version pattern")
});

/// A parsed `goN[.N[.N]]` toolchain version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ToolchainVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl ToolchainVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

/// Parse a toolchain name
///
/// Returns `None` for the empty string and for anything that is not
/// `goN`, `goN.N` or `goN.N.N`.
pub fn parse(s: &str) -> Option<ToolchainVersion> {
    let digits = s.strip_prefix("go")?;
    let mut parts = [0u64; 3];
    let mut count = 0;
    for part in digits.split('.') {
        if count == parts.len() || part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        parts[count] = part.parse().ok()?;
        count += 1;
    }
    Some(ToolchainVersion::new(parts[0], parts[1], parts[2]))
}

/// Compare two toolchain names
///
/// Unparsable names, including `""`, compare equal to each other and below
/// any valid toolchain.
pub fn compare(a: &str, b: &str) -> Ordering {
    parse(a).cmp(&parse(b))
}

/// Report whether `v` is a valid `go` directive language version
pub fn is_language_version(v: &str) -> bool {
    LANGUAGE_VERSION.is_match(v)
}

/// Recover a language version from the looser spellings found in old files
///
/// `1.18.x` and `v1.18beta` yield `1.18`; anything else yields `None`.
pub fn lax_language_version(v: &str) -> Option<&str> {
    LAX_LANGUAGE_VERSION
        .captures(v)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
