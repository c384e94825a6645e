//! Modfile Core
//!
//! Comment-preserving parser, editor and formatter for module descriptors
//! (`go.mod`) and workspace descriptors (`go.work`).
//! Edits go through typed operations on the parsed file and re-emit
//! canonical text that keeps every comment in place.

pub mod config;
pub mod edit;
pub mod error;
pub mod rules; // Directive model for module descriptors
pub mod sort; // Sort and dedup rule tables
pub mod syntax; // Lossless syntax tree, parser and formatter
pub mod version;
pub mod work;

// Re-export commonly used types
pub use config::ParsePolicy;
pub use edit::RequireEntry;
pub use error::{ErrorKind, ModfileError, ModfileResult};
pub use rules::{
    Exclude, Go, ModFile, Module, ModuleVersion, Replace, Require, Retract, VersionInterval, parse,
    parse_lax, parse_with_policy,
};
pub use sort::{BlockRule, MODULE_RULES, WORK_RULES};
// Syntax tree handles
pub use syntax::{BlockId, FileSyntax, LineId, auto_quote, is_directory_path, must_quote};
pub use version::{VersionError, VersionFixer};
pub use work::{Directory, Use, WorkFile, parse_work};
