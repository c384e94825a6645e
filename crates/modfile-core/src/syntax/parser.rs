//! Statement parser
//!
//! Builds a [`FileSyntax`] from the token stream. The parser only knows about
//! lines, parenthesized blocks and comments; which verbs and arguments are
//! acceptable is decided later by the directive model of each dialect.

use super::lexer::{Token, TokenKind, tokenize};
use super::tree::{Comment, CommentBlock, Comments, FileSyntax, Line, LineBlock, LineId, Stmt};
use super::Position;
use crate::error::{ModfileError, ModfileResult};

/// Parse descriptor text into a syntax tree
pub fn parse_syntax(name: &str, src: &str) -> ModfileResult<FileSyntax> {
    let tokens = tokenize(name, src)?;
    Parser::new(name, tokens).parse_file()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    file: FileSyntax,
}

/// Comments collected ahead of the statement they belong to
#[derive(Default)]
struct Pending {
    comments: Vec<Comment>,
    start: Position,
    blank_before: bool,
}

impl Parser {
    fn new(name: &str, tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            file: FileSyntax::new(name),
        }
    }

    fn peek(&self) -> &Token {
        // The stream always ends with Eof, and Eof is never consumed.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn lex(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn error(&self, pos: Position, message: impl Into<String>) -> ModfileError {
        ModfileError::syntax(&self.file.name, pos, message)
    }

    fn parse_file(mut self) -> ModfileResult<FileSyntax> {
        let mut pending = Pending::default();
        loop {
            let token = self.peek().clone();
            match token.kind {
                TokenKind::Newline => {
                    self.lex();
                }
                TokenKind::Comment => {
                    if token.blank_before {
                        self.flush_comments(&mut pending);
                    }
                    if pending.comments.is_empty() {
                        pending.start = token.start;
                        pending.blank_before = token.blank_before;
                    }
                    pending.comments.push(comment(&token));
                    self.lex();
                }
                TokenKind::Eof => {
                    self.flush_comments(&mut pending);
                    return Ok(self.file);
                }
                TokenKind::LParen | TokenKind::RParen => {
                    return Err(self.error(
                        token.start,
                        format!("syntax error (unexpected {:?})", token.text),
                    ));
                }
                _ => {
                    if token.blank_before {
                        self.flush_comments(&mut pending);
                    }
                    let blank_before = if pending.comments.is_empty() {
                        token.blank_before
                    } else {
                        pending.blank_before
                    };
                    let before = std::mem::take(&mut pending.comments);
                    self.parse_stmt(before, blank_before)?;
                }
            }
        }
    }

    fn flush_comments(&mut self, pending: &mut Pending) {
        if pending.comments.is_empty() {
            return;
        }
        let blank_before = pending.blank_before && !self.file.stmts.is_empty();
        self.file.stmts.push(Stmt::Comments(CommentBlock {
            comments: std::mem::take(&mut pending.comments),
            start: pending.start,
            blank_before,
        }));
    }

    fn parse_stmt(&mut self, before: Vec<Comment>, blank_before: bool) -> ModfileResult<()> {
        let blank_before = blank_before && !self.file.stmts.is_empty();
        let first = self.lex();
        let start = first.start;
        let mut token = vec![first.text];
        let mut token_pos = vec![first.start];

        loop {
            let tok = self.lex();
            if tok.kind.is_eol() {
                let id = self.file.alloc_line(Line {
                    token,
                    token_pos,
                    start,
                    comments: Comments {
                        before,
                        suffix: suffix(&tok),
                    },
                    block: None,
                    blank_before,
                    removed: false,
                });
                self.file.stmts.push(Stmt::Line(id));
                return Ok(());
            }

            if tok.kind == TokenKind::LParen {
                if self.peek_kind().is_eol() {
                    let eol = self.lex();
                    let block = LineBlock {
                        token,
                        lines: Vec::new(),
                        comments: Comments {
                            before,
                            suffix: suffix(&eol),
                        },
                        rparen: Comments::default(),
                        start,
                        blank_before,
                        removed: false,
                    };
                    return self.parse_block(block);
                }
                if self.peek_kind() == TokenKind::RParen {
                    let rparen = self.lex();
                    if self.peek_kind().is_eol() {
                        let eol = self.lex();
                        let id = self.file.alloc_block(LineBlock {
                            token,
                            lines: Vec::new(),
                            comments: Comments {
                                before,
                                suffix: Vec::new(),
                            },
                            rparen: Comments {
                                before: Vec::new(),
                                suffix: suffix(&eol),
                            },
                            start,
                            blank_before,
                            removed: false,
                        });
                        self.file.stmts.push(Stmt::Block(id));
                        return Ok(());
                    }
                    token.extend([tok.text, rparen.text]);
                    token_pos.extend([tok.start, rparen.start]);
                    continue;
                }
            }

            token.push(tok.text);
            token_pos.push(tok.start);
        }
    }

    fn parse_block(&mut self, mut block: LineBlock) -> ModfileResult<()> {
        let mut comments: Vec<Comment> = Vec::new();
        loop {
            let tok = self.peek().clone();
            match tok.kind {
                TokenKind::Eof => {
                    return Err(self.error(
                        tok.start,
                        format!(
                            "syntax error (unterminated block started at {}:{}:{})",
                            self.file.name, block.start.line, block.start.column
                        ),
                    ));
                }
                TokenKind::Comment => {
                    comments.push(comment(&tok));
                    self.lex();
                }
                TokenKind::Newline => {
                    self.lex();
                    let after_line = comments.is_empty() && !block.lines.is_empty();
                    let after_comment = comments.last().is_some_and(|c| !c.is_blank());
                    if after_line || after_comment {
                        comments.push(Comment::blank());
                    }
                }
                TokenKind::RParen => {
                    self.lex();
                    if !self.peek_kind().is_eol() {
                        return Err(self.error(
                            self.peek().start,
                            "syntax error (expected newline after closing paren)",
                        ));
                    }
                    let eol = self.lex();
                    block.rparen = Comments {
                        before: comments,
                        suffix: suffix(&eol),
                    };
                    let id = self.file.alloc_block(block);
                    for line in self.file.block(id).lines.clone() {
                        self.file.line_mut(line).block = Some(id);
                    }
                    self.file.stmts.push(Stmt::Block(id));
                    return Ok(());
                }
                _ => {
                    let before = std::mem::take(&mut comments);
                    let line = self.parse_block_line(before);
                    block.lines.push(line);
                }
            }
        }
    }

    /// Parse one line inside a block; the owning block is set once it is allocated
    fn parse_block_line(&mut self, before: Vec<Comment>) -> LineId {
        let first = self.lex();
        let start = first.start;
        let mut token = vec![first.text];
        let mut token_pos = vec![first.start];
        loop {
            let tok = self.lex();
            if tok.kind.is_eol() {
                return self.file.alloc_line(Line {
                    token,
                    token_pos,
                    start,
                    comments: Comments {
                        before,
                        suffix: suffix(&tok),
                    },
                    block: None,
                    blank_before: false,
                    removed: false,
                });
            }
            token.push(tok.text);
            token_pos.push(tok.start);
        }
    }
}

fn comment(token: &Token) -> Comment {
    Comment {
        token: token.text.clone(),
        start: token.start,
    }
}

fn suffix(eol: &Token) -> Vec<Comment> {
    match eol.kind {
        TokenKind::SuffixComment => vec![comment(eol)],
        _ => Vec::new(),
    }
}
