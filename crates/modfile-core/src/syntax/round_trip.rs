//! Round-trip validation for descriptor files
//!
//! Checks that a file can be parsed, formatted and parsed again without
//! losing anything:
//! 1. parse(source) → format → parse(formatted) yields a structurally equal tree
//! 2. formatting the re-parsed tree reproduces the formatted text exactly
//!
//! Structural equality compares statement kinds, tokens and comment text.
//! Blank-line bookkeeping and source positions are formatting metadata and do
//! not take part.
//!
//! # Example
//!
//! ```rust
//! use modfile_core::syntax::RoundTripValidator;
//!
//! let validator = RoundTripValidator::new();
//! let result = validator
//!     .validate_round_trip("go.mod", "module m\nrequire x.y/z   v1.2.3\n")
//!     .unwrap();
//! assert!(result.is_valid());
//! assert_eq!(result.formatted, "module m\nrequire x.y/z v1.2.3\n");
//! ```

use super::tree::{Comment, FileSyntax, Line, Stmt};
use super::{format, parse_syntax};
use crate::error::ModfileResult;

/// Result of round-trip validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Whether the round trip preserved everything
    pub is_valid: bool,
    pub original: String,
    /// Formatted original
    pub formatted: String,
    /// Formatted re-parse of `formatted`
    pub reformatted: String,
    pub differences: Vec<Difference>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Human-readable list of problems
    pub fn issues(&self) -> Vec<String> {
        self.differences
            .iter()
            .map(|d| match &d.location {
                Some(location) => format!("{location}: {}", d.description),
                None => d.description.clone(),
            })
            .collect()
    }
}

/// A difference between the original and the re-parsed tree
#[derive(Debug, Clone, PartialEq)]
pub struct Difference {
    pub kind: DifferenceKind,
    pub location: Option<String>,
    pub description: String,
}

/// Types of round-trip differences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifferenceKind {
    MissingStatement,
    ExtraStatement,
    StatementKind,
    Tokens,
    Comments,
    /// Formatting the re-parsed tree changed the text again
    NotIdempotent,
}

/// Round-trip validator for descriptor text
#[derive(Debug, Default)]
pub struct RoundTripValidator;

impl RoundTripValidator {
    pub fn new() -> Self {
        Self
    }

    /// Parse, format and re-parse `source`, reporting every difference
    ///
    /// Fails only when `source` itself does not parse.
    pub fn validate_round_trip(&self, name: &str, source: &str) -> ModfileResult<ValidationResult> {
        let original = parse_syntax(name, source)?;
        let formatted = format(&original);
        let reparsed = parse_syntax(name, &formatted)?;
        let reformatted = format(&reparsed);

        let mut differences = compare(&original, &reparsed);
        if formatted != reformatted {
            differences.push(Difference {
                kind: DifferenceKind::NotIdempotent,
                location: None,
                description: "formatting is not idempotent".to_string(),
            });
        }

        Ok(ValidationResult {
            is_valid: differences.is_empty(),
            original: source.to_string(),
            formatted,
            reformatted,
            differences,
        })
    }
}

/// Report whether two trees hold the same statements, tokens and comments
pub fn structurally_equal(a: &FileSyntax, b: &FileSyntax) -> bool {
    compare(a, b).is_empty()
}

/// Flattened view of a statement used for comparison
#[derive(Debug, PartialEq)]
enum Shape {
    Line {
        token: Vec<String>,
        comments: Vec<String>,
    },
    Block {
        token: Vec<String>,
        comments: Vec<String>,
        lines: Vec<Shape>,
    },
    Comments(Vec<String>),
}

impl Shape {
    fn kind(&self) -> &'static str {
        match self {
            Shape::Line { .. } => "line",
            Shape::Block { .. } => "block",
            Shape::Comments(_) => "comment group",
        }
    }
}

fn texts<'a>(comments: impl IntoIterator<Item = &'a Comment>) -> Vec<String> {
    comments
        .into_iter()
        .filter(|c| !c.is_blank())
        .map(|c| c.token.trim().to_string())
        .collect()
}

fn line_shape(line: &Line) -> Shape {
    Shape::Line {
        token: line.token.clone(),
        comments: texts(line.comments.before.iter().chain(&line.comments.suffix)),
    }
}

fn shapes(file: &FileSyntax) -> Vec<(String, Shape)> {
    file.stmts
        .iter()
        .map(|stmt| match stmt {
            Stmt::Line(id) => {
                let line = file.line(*id);
                (location(file, line.start), line_shape(line))
            }
            Stmt::Block(id) => {
                let block = file.block(*id);
                let comments = block
                    .comments
                    .before
                    .iter()
                    .chain(&block.comments.suffix)
                    .chain(&block.rparen.before)
                    .chain(&block.rparen.suffix);
                let shape = Shape::Block {
                    token: block.token.clone(),
                    comments: texts(comments),
                    lines: block.lines.iter().map(|l| line_shape(file.line(*l))).collect(),
                };
                (location(file, block.start), shape)
            }
            Stmt::Comments(group) => (
                location(file, group.start),
                Shape::Comments(texts(&group.comments)),
            ),
        })
        .collect()
}

fn location(file: &FileSyntax, pos: super::Position) -> String {
    format!("{}:{}:{}", file.name, pos.line, pos.column)
}

fn compare(original: &FileSyntax, reparsed: &FileSyntax) -> Vec<Difference> {
    let left = shapes(original);
    let right = shapes(reparsed);
    let mut differences = Vec::new();

    for ((location, a), (_, b)) in left.iter().zip(&right) {
        let (kind, description) = match (a, b) {
            _ if a == b => continue,
            (Shape::Line { token: x, .. }, Shape::Line { token: y, .. })
            | (Shape::Block { token: x, .. }, Shape::Block { token: y, .. })
                if x != y =>
            {
                (
                    DifferenceKind::Tokens,
                    format!("tokens {:?} became {:?}", x.join(" "), y.join(" ")),
                )
            }
            (Shape::Block { lines: x, .. }, Shape::Block { lines: y, .. }) if x != y => (
                DifferenceKind::Tokens,
                format!("block lines differ ({} vs {})", x.len(), y.len()),
            ),
            _ if a.kind() != b.kind() => (
                DifferenceKind::StatementKind,
                format!("{} became {}", a.kind(), b.kind()),
            ),
            _ => (DifferenceKind::Comments, "comments differ".to_string()),
        };
        differences.push(Difference {
            kind,
            location: Some(location.clone()),
            description,
        });
    }

    for (location, shape) in left.iter().skip(right.len()) {
        differences.push(Difference {
            kind: DifferenceKind::MissingStatement,
            location: Some(location.clone()),
            description: format!("{} missing after formatting", shape.kind()),
        });
    }
    for (location, shape) in right.iter().skip(left.len()) {
        differences.push(Difference {
            kind: DifferenceKind::ExtraStatement,
            location: Some(location.clone()),
            description: format!("unexpected {} after formatting", shape.kind()),
        });
    }

    differences
}
