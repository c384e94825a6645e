//! Error types for parsing and editing descriptor files

use thiserror::Error;

use crate::syntax::Position;
use crate::version::VersionError;

/// Main error type for descriptor parsing and editing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModfileError {
    /// Tokenizer or grammar failure; aborts the parse
    #[error("{file}:{line}:{column}: {message}")]
    Syntax {
        file: String,
        line: usize,
        column: usize,
        message: String,
    },

    /// A directive whose arguments failed validation or version fixing
    #[error("{file}:{line}:{column}: {}", directive_context(.verb, .module_path, .message))]
    Directive {
        file: String,
        line: usize,
        column: usize,
        verb: String,
        module_path: Option<String>,
        message: String,
    },

    /// Every directive error found while parsing one file
    #[error("{}", join_errors(.0))]
    Multiple(Vec<ModfileError>),

    /// A version literal that is not acceptable
    #[error("invalid version {version:?}: {reason}")]
    InvalidVersion { version: String, reason: String },

    /// Edit arguments rejected before the tree was touched
    #[error("{message}")]
    InvalidEdit { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Directive,
    Version,
    Edit,
}

impl ModfileError {
    /// Get the error kind for this error
    ///
    /// A `Multiple` list reports the kind of its first entry.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModfileError::Syntax { .. } => ErrorKind::Syntax,
            ModfileError::Directive { .. } => ErrorKind::Directive,
            ModfileError::Multiple(errors) => errors
                .first()
                .map(ModfileError::kind)
                .unwrap_or(ErrorKind::Directive),
            ModfileError::InvalidVersion { .. } => ErrorKind::Version,
            ModfileError::InvalidEdit { .. } => ErrorKind::Edit,
        }
    }

    /// Create a syntax error at a source position
    pub fn syntax(file: impl Into<String>, pos: Position, message: impl Into<String>) -> Self {
        Self::Syntax {
            file: file.into(),
            line: pos.line,
            column: pos.column,
            message: message.into(),
        }
    }

    /// Create a directive error at a source position
    pub fn directive(
        file: impl Into<String>,
        pos: Position,
        verb: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Directive {
            file: file.into(),
            line: pos.line,
            column: pos.column,
            verb: verb.into(),
            module_path: None,
            message: message.into(),
        }
    }

    /// Create an edit error
    pub fn invalid_edit(message: impl Into<String>) -> Self {
        Self::InvalidEdit {
            message: message.into(),
        }
    }

    /// Attach the module path a directive error is about
    pub fn with_module_path(mut self, path: impl Into<String>) -> Self {
        if let ModfileError::Directive { module_path, .. } = &mut self {
            *module_path = Some(path.into());
        }
        self
    }

    /// Flatten into the list of individual errors
    pub fn errors(&self) -> Vec<&ModfileError> {
        match self {
            ModfileError::Multiple(errors) => errors.iter().collect(),
            other => vec![other],
        }
    }
}

impl From<VersionError> for ModfileError {
    fn from(err: VersionError) -> Self {
        match err {
            VersionError::Invalid { version, reason } => {
                ModfileError::InvalidVersion { version, reason }
            }
            VersionError::Rejected(message) => ModfileError::InvalidEdit { message },
        }
    }
}

fn directive_context(verb: &str, module_path: &Option<String>, message: &str) -> String {
    match module_path {
        Some(path) => format!("{verb} {path}: {message}"),
        None => message.to_string(),
    }
}

fn join_errors(errors: &[ModfileError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Standard Result type for descriptor operations
pub type ModfileResult<T> = std::result::Result<T, ModfileError>;
