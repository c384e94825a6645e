//! Tokenizer for descriptor files
//!
//! The lexer keeps everything the formatter needs to reproduce a file:
//! comments are tokens, and each token remembers whether a blank line
//! separates it from the previous content. A `//` comment that shares its
//! line with other tokens becomes a [`TokenKind::SuffixComment`] and also ends
//! that line; a comment alone on its line is a [`TokenKind::Comment`].

use super::Position;
use crate::error::{ModfileError, ModfileResult};

/// Kind of a lexed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Module path, directive verb, `=>` and other bare words
    Ident,
    /// Bare word shaped like a version (`v1.2.3`, `go1.21`, `1.21`)
    Version,
    /// Quoted string, `"…"` or `` `…` ``
    String,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Newline,
    /// `//` comment on a line of its own
    Comment,
    /// `//` comment after other tokens on the same line
    SuffixComment,
    Eof,
}

impl TokenKind {
    /// Tokens that terminate a statement line
    pub fn is_eol(self) -> bool {
        matches!(
            self,
            TokenKind::Newline | TokenKind::SuffixComment | TokenKind::Eof
        )
    }

    pub fn is_comment(self) -> bool {
        matches!(self, TokenKind::Comment | TokenKind::SuffixComment)
    }
}

/// A token with its text and source span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start: Position,
    pub end: Position,
    /// A blank line separates this token from the previous non-newline token
    pub blank_before: bool,
}

/// Tokenize descriptor text
///
/// The returned stream always ends with a single [`TokenKind::Eof`] token.
pub fn tokenize(file: &str, src: &str) -> ModfileResult<Vec<Token>> {
    let mut lexer = Lexer::new(file, src);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer<'a> {
    file: &'a str,
    src: &'a str,
    pos: Position,
    /// Line breaks consumed since the last content token
    breaks: usize,
}

impl<'a> Lexer<'a> {
    fn new(file: &'a str, src: &'a str) -> Self {
        Self {
            file,
            src,
            pos: Position::start(),
            breaks: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn at(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos.offset += c.len_utf8();
        if c == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
            self.breaks += 1;
        } else {
            self.pos.column += 1;
        }
        Some(c)
    }

    fn error(&self, pos: Position, message: impl Into<String>) -> ModfileError {
        ModfileError::syntax(self.file, pos, message)
    }

    fn token(&self, kind: TokenKind, start: Position, blank_before: bool) -> Token {
        let mut text = &self.src[start.offset..self.pos.offset];
        if kind.is_comment() {
            text = text
                .strip_suffix("\r\n")
                .or_else(|| text.strip_suffix('\n'))
                .unwrap_or(text);
        }
        Token {
            kind,
            text: text.to_string(),
            start,
            end: self.pos,
            blank_before,
        }
    }

    fn next_token(&mut self) -> ModfileResult<Token> {
        while matches!(self.peek(), Some(' ' | '\t' | '\r')) {
            self.bump();
        }

        let start = self.pos;
        let blank_before = self.breaks >= 2;

        let Some(c) = self.peek() else {
            return Ok(self.token(TokenKind::Eof, start, blank_before));
        };

        if c == '\n' {
            self.bump();
            return Ok(self.token(TokenKind::Newline, start, blank_before));
        }

        self.breaks = 0;

        if self.at("//") {
            return Ok(self.comment(start, blank_before));
        }
        if self.at("/*") {
            return Err(self.error(start, "mod files must use // comments (not /* */ comments)"));
        }

        let kind = match c {
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '[' => Some(TokenKind::LBracket),
            ']' => Some(TokenKind::RBracket),
            '{' => Some(TokenKind::LBrace),
            '}' => Some(TokenKind::RBrace),
            ',' => Some(TokenKind::Comma),
            _ => None,
        };
        if let Some(kind) = kind {
            self.bump();
            return Ok(self.token(kind, start, blank_before));
        }

        if c == '"' || c == '`' {
            self.string(c, start)?;
            return Ok(self.token(TokenKind::String, start, blank_before));
        }

        if !is_ident_char(c) {
            return Err(self.error(start, format!("unexpected input character {c:?}")));
        }
        while let Some(c) = self.peek() {
            if !is_ident_char(c) || self.at("//") {
                break;
            }
            if self.at("/*") {
                return Err(
                    self.error(self.pos, "mod files must use // comments (not /* */ comments)")
                );
            }
            self.bump();
        }
        let kind = if looks_like_version(&self.src[start.offset..self.pos.offset]) {
            TokenKind::Version
        } else {
            TokenKind::Ident
        };
        Ok(self.token(kind, start, blank_before))
    }

    /// Lex a `//` comment through the end of its line
    fn comment(&mut self, start: Position, blank_before: bool) -> Token {
        let line_start = self.src[..start.offset].rfind('\n').map_or(0, |i| i + 1);
        let suffix = !self.src[line_start..start.offset].trim().is_empty();
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }
        let kind = if suffix {
            TokenKind::SuffixComment
        } else {
            TokenKind::Comment
        };
        self.token(kind, start, blank_before)
    }

    fn string(&mut self, quote: char, start: Position) -> ModfileResult<()> {
        self.bump();
        loop {
            match self.peek() {
                None => return Err(self.error(start, "unexpected EOF in string")),
                Some('\n') => return Err(self.error(self.pos, "unexpected newline in string")),
                Some(c) => {
                    self.bump();
                    if c == quote {
                        return Ok(());
                    }
                    if c == '\\' && quote != '`' {
                        if self.peek().is_none() {
                            return Err(self.error(start, "unexpected EOF in string"));
                        }
                        self.bump();
                    }
                }
            }
        }
    }
}

fn is_ident_char(c: char) -> bool {
    !matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | ',') && !c.is_whitespace() && !c.is_control()
}

fn looks_like_version(text: &str) -> bool {
    let digits = text
        .strip_prefix("go")
        .or_else(|| text.strip_prefix('v'))
        .unwrap_or(text);
    digits.starts_with(|c: char| c.is_ascii_digit())
}
