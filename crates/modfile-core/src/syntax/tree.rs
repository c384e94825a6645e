//! Syntax tree storage
//!
//! Lines and blocks live in arenas owned by [`FileSyntax`] and are addressed
//! by [`LineId`] and [`BlockId`]. A handle stays valid for the life of the
//! tree: removing a line detaches it and marks it removed instead of freeing
//! the slot, and converting a line into a block (or collapsing a block back
//! into a line) keeps the line's handle.

use serde::Serialize;

use super::Position;

/// Handle of a [`Line`] in a [`FileSyntax`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LineId(usize);

/// Handle of a [`LineBlock`] in a [`FileSyntax`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BlockId(usize);

/// A single `//` comment
///
/// An empty token is a blank marker: it records a blank line inside a block
/// and prints as an empty line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub token: String,
    pub start: Position,
}

impl Comment {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            start: Position::default(),
        }
    }

    pub fn blank() -> Self {
        Self::new("")
    }

    pub fn is_blank(&self) -> bool {
        self.token.is_empty()
    }
}

/// Comments attached to a line or block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comments {
    /// Whole-line comments printed above
    pub before: Vec<Comment>,
    /// Comment printed at the end of the line
    pub suffix: Vec<Comment>,
}

impl Comments {
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.suffix.is_empty()
    }
}

/// A directive line, free-standing or inside a block
///
/// A free-standing line stores its verb as the first token; a line inside a
/// block stores only its arguments and takes the verb from the block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub token: Vec<String>,
    pub token_pos: Vec<Position>,
    pub start: Position,
    pub comments: Comments,
    pub block: Option<BlockId>,
    pub blank_before: bool,
    pub removed: bool,
}

impl Line {
    fn new(tokens: Vec<String>, block: Option<BlockId>) -> Self {
        Self {
            token_pos: vec![Position::default(); tokens.len()],
            token: tokens,
            start: Position::default(),
            comments: Comments::default(),
            block,
            blank_before: false,
            removed: false,
        }
    }

    /// Position of argument `i`, falling back to the line start
    pub fn pos(&self, i: usize) -> Position {
        self.token_pos.get(i).copied().unwrap_or(self.start)
    }
}

/// A parenthesized group of lines sharing one verb
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineBlock {
    pub token: Vec<String>,
    pub lines: Vec<LineId>,
    /// Comments above the verb and after the opening paren
    pub comments: Comments,
    /// Comments before and after the closing paren
    pub rparen: Comments,
    pub start: Position,
    pub blank_before: bool,
    pub removed: bool,
}

/// Free-floating comments not attached to any directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBlock {
    pub comments: Vec<Comment>,
    pub start: Position,
    pub blank_before: bool,
}

/// A top-level statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Line(LineId),
    Block(BlockId),
    Comments(CommentBlock),
}

/// Where [`FileSyntax::add_line`] should put a new line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    /// After this line, inside its block when it has one
    Line(LineId),
    /// At the end of this block
    Block(BlockId),
}

/// A parsed descriptor file
#[derive(Debug, Clone, Default)]
pub struct FileSyntax {
    pub name: String,
    pub stmts: Vec<Stmt>,
    lines: Vec<Line>,
    blocks: Vec<LineBlock>,
}

impl FileSyntax {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn line(&self, id: LineId) -> &Line {
        &self.lines[id.0]
    }

    pub fn line_mut(&mut self, id: LineId) -> &mut Line {
        &mut self.lines[id.0]
    }

    pub fn block(&self, id: BlockId) -> &LineBlock {
        &self.blocks[id.0]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut LineBlock {
        &mut self.blocks[id.0]
    }

    pub(crate) fn alloc_line(&mut self, line: Line) -> LineId {
        self.lines.push(line);
        LineId(self.lines.len() - 1)
    }

    pub(crate) fn alloc_block(&mut self, block: LineBlock) -> BlockId {
        self.blocks.push(block);
        BlockId(self.blocks.len() - 1)
    }

    /// Verb of a line, taken from its block for lines inside one
    pub fn verb_of(&self, id: LineId) -> Option<&str> {
        let line = self.line(id);
        match line.block {
            Some(block) => self.block(block).token.first(),
            None => line.token.first(),
        }
        .map(String::as_str)
    }

    /// Arguments of a line, without its verb
    pub fn args(&self, id: LineId) -> &[String] {
        let line = self.line(id);
        match line.block {
            Some(_) => &line.token,
            None => line.token.get(1..).unwrap_or_default(),
        }
    }

    /// Position of argument `i` of a line
    pub fn arg_pos(&self, id: LineId, i: usize) -> Position {
        let line = self.line(id);
        match line.block {
            Some(_) => line.pos(i),
            None => line.pos(i + 1),
        }
    }

    /// Overwrite argument `i` of a line
    pub fn set_arg(&mut self, id: LineId, i: usize, value: impl Into<String>) {
        let line = self.line_mut(id);
        let index = if line.block.is_some() { i } else { i + 1 };
        if let Some(token) = line.token.get_mut(index) {
            *token = value.into();
        }
    }

    /// Every live directive line in file order
    pub fn directive_lines(&self) -> Vec<LineId> {
        let mut out = Vec::new();
        for stmt in &self.stmts {
            match stmt {
                Stmt::Line(id) => out.push(*id),
                Stmt::Block(block) => out.extend(self.block(*block).lines.iter().copied()),
                Stmt::Comments(_) => {}
            }
        }
        out
    }

    /// Index in `stmts` of the statement holding `id`
    pub fn stmt_index_of(&self, id: LineId) -> Option<usize> {
        let line = self.line(id);
        self.stmts.iter().position(|stmt| match (stmt, line.block) {
            (Stmt::Line(l), None) => *l == id,
            (Stmt::Block(b), Some(block)) => *b == block,
            _ => false,
        })
    }

    /// Index in `stmts` of the first statement with this verb
    pub fn first_stmt_with_verb(&self, verb: &str) -> Option<usize> {
        self.stmts.iter().position(|stmt| self.stmt_verb(stmt) == Some(verb))
    }

    fn stmt_verb<'a>(&'a self, stmt: &'a Stmt) -> Option<&'a str> {
        match stmt {
            Stmt::Line(id) => self.line(*id).token.first().map(String::as_str),
            Stmt::Block(id) => self.block(*id).token.first().map(String::as_str),
            Stmt::Comments(_) => None,
        }
    }

    /// Create a free-standing line and insert it at statement index `at`
    pub fn insert_line(&mut self, at: usize, tokens: Vec<String>) -> LineId {
        let id = self.alloc_line(Line::new(tokens, None));
        let at = at.min(self.stmts.len());
        self.stmts.insert(at, Stmt::Line(id));
        id
    }

    /// Add a directive line
    ///
    /// `tokens` starts with the verb. Without a hint the line joins the last
    /// statement with the same verb: a block gets it appended, and a
    /// free-standing line is turned into a block holding both lines. With no
    /// such statement the line is appended to the file.
    pub fn add_line(&mut self, hint: Option<Hint>, tokens: Vec<String>) -> LineId {
        let Some(verb) = tokens.first().cloned() else {
            return self.insert_line(self.stmts.len(), tokens);
        };
        let hint = hint.or_else(|| {
            self.stmts.iter().rev().find_map(|stmt| match stmt {
                Stmt::Line(id) if self.line(*id).token.first() == Some(&verb) => {
                    Some(Hint::Line(*id))
                }
                Stmt::Block(id) if self.block(*id).token.first() == Some(&verb) => {
                    Some(Hint::Block(*id))
                }
                _ => None,
            })
        });
        let args = tokens[1..].to_vec();

        match hint {
            Some(Hint::Line(id)) => {
                let Some(i) = self.stmt_index_of(id) else {
                    return self.insert_line(self.stmts.len(), tokens);
                };
                if self.verb_of(id) != Some(verb.as_str()) {
                    return self.insert_line(i + 1, tokens);
                }
                match self.line(id).block {
                    Some(block) => {
                        let new = self.alloc_line(Line::new(args, Some(block)));
                        let lines = &mut self.block_mut(block).lines;
                        let j = lines.iter().position(|l| *l == id).map_or(lines.len(), |j| j + 1);
                        lines.insert(j, new);
                        new
                    }
                    None => {
                        let block = self.line_to_block(i, id);
                        let new = self.alloc_line(Line::new(args, Some(block)));
                        self.block_mut(block).lines.push(new);
                        new
                    }
                }
            }
            Some(Hint::Block(block)) => {
                let Some(i) = self.stmts.iter().position(|s| *s == Stmt::Block(block)) else {
                    return self.insert_line(self.stmts.len(), tokens);
                };
                if self.block(block).token.first() != Some(&verb) {
                    return self.insert_line(i + 1, tokens);
                }
                let new = self.alloc_line(Line::new(args, Some(block)));
                self.block_mut(block).lines.push(new);
                new
            }
            None => self.insert_line(self.stmts.len(), tokens),
        }
    }

    /// Turn the free-standing line at statement `i` into a one-line block
    fn line_to_block(&mut self, i: usize, id: LineId) -> BlockId {
        let line = self.line_mut(id);
        let verb = line.token.remove(0);
        let verb_pos = if line.token_pos.is_empty() {
            line.start
        } else {
            line.token_pos.remove(0)
        };
        let blank_before = std::mem::take(&mut line.blank_before);
        let block = self.alloc_block(LineBlock {
            token: vec![verb],
            lines: vec![id],
            comments: Comments::default(),
            rparen: Comments::default(),
            start: verb_pos,
            blank_before,
            removed: false,
        });
        self.line_mut(id).block = Some(block);
        self.stmts[i] = Stmt::Block(block);
        block
    }

    /// Replace the tokens of a line; `tokens` starts with the verb
    pub fn update_line(&mut self, id: LineId, tokens: Vec<String>) {
        let line = self.line_mut(id);
        let tokens = match line.block {
            Some(_) => tokens.into_iter().skip(1).collect(),
            None => tokens,
        };
        line.token_pos = vec![line.start; tokens.len()];
        line.token = tokens;
    }

    /// Detach a line from the tree, dropping its comments
    ///
    /// A block left empty stays in place until [`FileSyntax::cleanup`].
    pub fn remove_line(&mut self, id: LineId) {
        let line = self.line_mut(id);
        if line.removed {
            return;
        }
        line.removed = true;
        line.comments = Comments::default();
        match line.block {
            Some(block) => self.block_mut(block).lines.retain(|l| *l != id),
            None => self.stmts.retain(|s| *s != Stmt::Line(id)),
        }
    }

    /// Drop empty blocks and collapse single-line blocks
    ///
    /// A block with one line becomes a free-standing line unless comments sit
    /// above its closing paren. The block's leading comments move above the
    /// line; comments after either paren join the line's suffix comment as
    /// `// line; open; close`. Running it twice changes nothing the second
    /// time.
    pub fn cleanup(&mut self) {
        let stmts = std::mem::take(&mut self.stmts);
        let mut kept = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            let Stmt::Block(id) = stmt else {
                kept.push(stmt);
                continue;
            };
            let block = self.block(id);
            let bare_parens = block.rparen.before.iter().all(Comment::is_blank);
            match (block.lines.len(), block.lines.first().copied()) {
                (0, _) => self.block_mut(id).removed = true,
                (1, Some(only)) if bare_parens => {
                    self.collapse_block(id, only);
                    kept.push(Stmt::Line(only));
                }
                _ => kept.push(Stmt::Block(id)),
            }
        }
        self.stmts = kept;
    }

    fn collapse_block(&mut self, id: BlockId, only: LineId) {
        let block = self.block_mut(id);
        block.removed = true;
        block.lines.clear();
        let verb = block.token.clone();
        let before = std::mem::take(&mut block.comments.before);
        let mut paren_suffix = std::mem::take(&mut block.comments.suffix);
        paren_suffix.append(&mut block.rparen.suffix);
        block.rparen.before.clear();
        let (start, blank_before) = (block.start, block.blank_before);

        let line = self.line_mut(only);
        line.block = None;
        line.blank_before = blank_before;
        line.start = start;
        let mut token_pos = vec![start; verb.len()];
        token_pos.append(&mut line.token_pos);
        line.token_pos = token_pos;
        let mut token = verb;
        token.append(&mut line.token);
        line.token = token;
        let mut comments = before;
        comments.extend(line.comments.before.drain(..).filter(|c| !c.is_blank()));
        line.comments.before = comments;
        line.comments.suffix = merge_suffix(std::mem::take(&mut line.comments.suffix), paren_suffix);
    }
}

/// Join suffix comments into the single comment a line can print
fn merge_suffix(line: Vec<Comment>, parens: Vec<Comment>) -> Vec<Comment> {
    let mut all = line.into_iter().chain(parens).filter(|c| !c.is_blank());
    let Some(mut first) = all.next() else {
        return Vec::new();
    };
    for extra in all {
        let text = extra.token.strip_prefix("//").unwrap_or(&extra.token).trim();
        if !text.is_empty() {
            first.token = format!("{}; {text}", first.token.trim_end());
        }
    }
    vec![first]
}
