//! Parse policy
//!
//! Strict and lax parsing share one parser; [`ParsePolicy`] lists the
//! deviations the lax reading tolerates. Host tools can embed a policy in
//! their own TOML or JSON configuration:
//!
//! ```rust
//! use modfile_core::ParsePolicy;
//!
//! let policy: ParsePolicy = serde_json::from_str(r#"{"rejectUnknownDirectives": false}"#).unwrap();
//! assert!(!policy.reject_unknown_directives);
//! assert!(policy.check_argument_counts);
//! ```

use serde::{Deserialize, Serialize};

/// Which directive deviations are errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParsePolicy {
    /// Unknown verbs are errors instead of being kept unmodeled
    pub reject_unknown_directives: bool,

    /// Wrong argument counts are errors instead of skipping the directive
    pub check_argument_counts: bool,

    /// `go` versions must be `1.23`, `1.23.0` or `1.21rc1`; otherwise the
    /// looser `v?1.23<anything>` spelling is accepted and truncated
    pub strict_go_version: bool,

    /// Without a version fixer, non-canonical versions are rewritten to
    /// canonical form and invalid ones rejected; otherwise kept verbatim
    pub canonical_versions: bool,

    /// Malformed retract intervals and trailing tokens are errors instead of
    /// skipping the directive
    pub report_retract_errors: bool,

    /// `exclude` and `replace` are modeled; otherwise they stay in the tree
    /// but are ignored
    pub model_main_module_directives: bool,
}

impl ParsePolicy {
    /// Authoritative parsing of a main module descriptor
    pub const STRICT: Self = Self {
        reject_unknown_directives: true,
        check_argument_counts: true,
        strict_go_version: true,
        canonical_versions: true,
        report_retract_errors: true,
        model_main_module_directives: true,
    };

    /// Forgiving parsing of dependency and legacy descriptors
    pub const LAX: Self = Self {
        reject_unknown_directives: false,
        check_argument_counts: false,
        strict_go_version: false,
        canonical_versions: false,
        report_retract_errors: false,
        model_main_module_directives: false,
    };

    pub fn is_strict(&self) -> bool {
        *self == Self::STRICT
    }
}

impl Default for ParsePolicy {
    fn default() -> Self {
        Self::STRICT
    }
}
