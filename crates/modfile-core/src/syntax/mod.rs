//! Comment-preserving syntax tree shared by both descriptor dialects
//!
//! This module turns descriptor text into a [`FileSyntax`] and back. The tree
//! keeps every comment and the paragraph structure of the source so that
//! edits made through the directive model re-emit text a human would have
//! written:
//!
//! - **Lexer**: tokens with positions, comment placement (own line vs. end
//!   of line) and blank-line tracking
//! - **Parser**: statements, parenthesized blocks and comment attachment
//! - **Tree**: an arena of lines and blocks addressed by stable handles
//! - **Formatter**: the canonical printer, the inverse of the parser
//!
//! ## Example
//!
//! ```rust
//! use modfile_core::syntax::{format, parse_syntax};
//!
//! let source = "module m\n\n// deps\nrequire (\n\tx.y/z v1.2.3 // indirect\n)\n";
//! let tree = parse_syntax("go.mod", source).unwrap();
//!
//! // Canonical input round-trips unchanged
//! assert_eq!(format(&tree), source);
//! ```

mod formatter;
mod lexer;
mod parser;
mod quote;
mod tree;

pub mod round_trip;

pub use formatter::format;
pub use lexer::{Token, TokenKind, tokenize};
pub use parser::parse_syntax;
pub use quote::{auto_quote, is_directory_path, must_quote, unquote};
pub use round_trip::{RoundTripValidator, ValidationResult, structurally_equal};
pub use tree::{
    BlockId, Comment, CommentBlock, Comments, FileSyntax, Hint, Line, LineBlock, LineId, Stmt,
};

use serde::Serialize;

/// A location in the source text
///
/// Lines and columns are 1-based; columns count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// Position of the first character of a file
    pub const fn start() -> Self {
        Self::new(1, 1, 0)
    }
}

#[cfg(test)]
mod tests;
