//! Canonical printer for syntax trees
//!
//! Formatting is a pure function of the tree. Blocks indent their lines with
//! one tab, comments are trimmed, and blank lines appear only where the tree
//! records them: before a statement flagged `blank_before`, after a
//! free-floating comment group, and at blank markers inside blocks.

use super::tree::{Comment, FileSyntax, Line, Stmt};

/// Format a syntax tree as descriptor text
///
/// The result ends with exactly one newline; an empty tree formats as the
/// empty string.
pub fn format(file: &FileSyntax) -> String {
    let mut printer = Printer::default();
    let mut after_comment_block = false;

    for stmt in &file.stmts {
        let blank_before = match stmt {
            Stmt::Line(id) => file.line(*id).blank_before,
            Stmt::Block(id) => file.block(*id).blank_before,
            Stmt::Comments(comments) => comments.blank_before,
        };
        if blank_before || after_comment_block {
            printer.blank_line();
        }
        after_comment_block = false;

        match stmt {
            Stmt::Line(id) => printer.line(file.line(*id)),
            Stmt::Block(id) => {
                let block = file.block(*id);
                printer.comments(&block.comments.before);
                printer.text(&join_tokens(&block.token));
                printer.text(" (");
                printer.suffix(&block.comments.suffix);
                printer.newline();

                printer.indent += 1;
                printer.block_start = true;
                for line in &block.lines {
                    printer.line(file.line(*line));
                }
                printer.comments(&block.rparen.before);
                printer.indent -= 1;

                printer.text(")");
                printer.suffix(&block.rparen.suffix);
                printer.newline();
            }
            Stmt::Comments(comments) => {
                printer.comments(&comments.comments);
                after_comment_block = true;
            }
        }
    }

    printer.finish()
}

/// Join tokens with single spaces, hugging brackets and commas
fn join_tokens(tokens: &[String]) -> String {
    let mut out = String::new();
    let mut sep = "";
    for token in tokens {
        if matches!(token.as_str(), "," | ")" | "]" | "}") {
            sep = "";
        }
        out.push_str(sep);
        out.push_str(token);
        sep = match token.as_str() {
            "(" | "[" | "{" => "",
            _ => " ",
        };
    }
    out
}

#[derive(Default)]
struct Printer {
    out: String,
    indent: usize,
    /// Nothing has been printed inside the current block yet
    block_start: bool,
}

impl Printer {
    fn at_line_start(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }

    fn text(&mut self, text: &str) {
        if self.at_line_start() {
            for _ in 0..self.indent {
                self.out.push('\t');
            }
        }
        self.out.push_str(text);
    }

    fn newline(&mut self) {
        let trimmed = self.out.trim_end_matches([' ', '\t']).len();
        self.out.truncate(trimmed);
        self.out.push('\n');
        self.block_start = false;
    }

    fn blank_line(&mut self) {
        if self.out.is_empty() || self.out.ends_with("\n\n") || self.block_start {
            return;
        }
        self.out.push('\n');
    }

    fn comments(&mut self, comments: &[Comment]) {
        for comment in comments {
            if comment.is_blank() {
                self.blank_line();
            } else {
                self.text(comment.token.trim());
                self.newline();
            }
        }
    }

    fn suffix(&mut self, comments: &[Comment]) {
        for comment in comments {
            self.out.push(' ');
            self.out.push_str(comment.token.trim());
        }
    }

    fn line(&mut self, line: &Line) {
        self.comments(&line.comments.before);
        self.text(&join_tokens(&line.token));
        self.suffix(&line.comments.suffix);
        self.newline();
    }

    fn finish(mut self) -> String {
        let trimmed = self.out.trim_end_matches('\n').len();
        self.out.truncate(trimmed);
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_syntax;

    fn reformat(src: &str) -> String {
        format(&parse_syntax("in", src).unwrap())
    }

    #[test]
    fn tokens_hug_brackets_and_commas() {
        let tokens: Vec<String> = ["retract", "[", "v1.0.0", ",", "v1.1.0", "]"]
            .map(String::from)
            .to_vec();
        assert_eq!(join_tokens(&tokens), "retract [v1.0.0, v1.1.0]");
    }

    #[test]
    fn normalizes_indentation_and_spacing() {
        assert_eq!(
            reformat("  module   m\nrequire (\n        x.y/z   v1.2.3   // note  \n  )\n"),
            "module m\nrequire (\n\tx.y/z v1.2.3 // note\n)\n"
        );
    }

    #[test]
    fn blank_runs_collapse_to_one_line() {
        assert_eq!(
            reformat("\n\nmodule m\n\n\n\ngo 1.21\n\n"),
            "module m\n\ngo 1.21\n"
        );
    }

    #[test]
    fn leading_blank_lines_in_blocks_are_dropped() {
        assert_eq!(
            reformat("require (\n\n\ta v1\n\n\n\tb v1\n)\n"),
            "require (\n\ta v1\n\n\tb v1\n)\n"
        );
    }

    #[test]
    fn free_comments_keep_their_paragraph() {
        let src = "// header\n\nmodule m\n// trailing\n";
        assert_eq!(reformat(src), src);
    }

    #[test]
    fn empty_input_formats_empty() {
        assert_eq!(reformat(""), "");
        assert_eq!(reformat("\n\n"), "");
    }
}
