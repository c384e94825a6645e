//! Block sorting and duplicate removal
//!
//! Each dialect describes its directives with a table of [`BlockRule`]s; one
//! generic routine applies the table to a tree. Adding a directive kind is a
//! new table row.

use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::trace;

use crate::syntax::{FileSyntax, LineId, Stmt};
use crate::version;

/// How keys are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compare {
    /// Byte-wise string order
    Lexical,
    /// Module version precedence
    Semver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

/// Which entries survive when several share a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dedup {
    Never,
    /// Keep the last entry for each primary key
    KeepLastByPrimary,
    /// Keep the last entry for each primary and secondary key pair
    KeepLastByPrimaryAndSecondary,
}

/// Sort and dedup rule for one directive verb
#[derive(Debug, Clone, Copy)]
pub struct BlockRule {
    pub verb: &'static str,
    pub primary: fn(&[String]) -> String,
    pub secondary: fn(&[String]) -> String,
    pub compare: Compare,
    pub order: Order,
    pub dedup: Dedup,
}

fn arg(args: &[String], i: usize) -> String {
    args.get(i).cloned().unwrap_or_default()
}

fn first_arg(args: &[String]) -> String {
    arg(args, 0)
}

fn second_arg(args: &[String]) -> String {
    arg(args, 1)
}

fn no_key(_: &[String]) -> String {
    String::new()
}

/// Old version of `old [v] => new`, empty when the replacement has none
fn replaced_version(args: &[String]) -> String {
    match args.get(1).map(String::as_str) {
        Some("=>") | None => String::new(),
        Some(v) => v.to_string(),
    }
}

fn interval_low(args: &[String]) -> String {
    match args.first().map(String::as_str) {
        Some("[") => arg(args, 1),
        _ => arg(args, 0),
    }
}

fn interval_high(args: &[String]) -> String {
    match args.first().map(String::as_str) {
        Some("[") => arg(args, 3),
        _ => arg(args, 0),
    }
}

const fn lexical(verb: &'static str, dedup: Dedup) -> BlockRule {
    BlockRule {
        verb,
        primary: first_arg,
        secondary: second_arg,
        compare: Compare::Lexical,
        order: Order::Ascending,
        dedup,
    }
}

/// Rule for verbs without a table entry
pub const DEFAULT_RULE: BlockRule = lexical("", Dedup::Never);

/// Rules for module descriptors
pub static MODULE_RULES: &[BlockRule] = &[
    lexical("require", Dedup::KeepLastByPrimary),
    lexical("exclude", Dedup::KeepLastByPrimaryAndSecondary),
    BlockRule {
        secondary: replaced_version,
        ..lexical("replace", Dedup::KeepLastByPrimaryAndSecondary)
    },
    BlockRule {
        verb: "retract",
        primary: interval_low,
        secondary: interval_high,
        compare: Compare::Semver,
        order: Order::Descending,
        dedup: Dedup::Never,
    },
];

/// Rules for workspace descriptors
pub static WORK_RULES: &[BlockRule] = &[
    BlockRule {
        secondary: no_key,
        ..lexical("directory", Dedup::Never)
    },
    BlockRule {
        secondary: no_key,
        ..lexical("use", Dedup::KeepLastByPrimary)
    },
    BlockRule {
        secondary: replaced_version,
        ..lexical("replace", Dedup::KeepLastByPrimaryAndSecondary)
    },
];

impl BlockRule {
    fn key_cmp(&self, a: &str, b: &str) -> Ordering {
        match self.compare {
            Compare::Lexical => a.cmp(b),
            Compare::Semver => version::compare(a, b),
        }
    }

    /// Order two entries by primary then secondary key
    pub fn cmp(&self, a: &[String], b: &[String]) -> Ordering {
        let ordering = self
            .key_cmp(&(self.primary)(a), &(self.primary)(b))
            .then_with(|| self.key_cmp(&(self.secondary)(a), &(self.secondary)(b)));
        match self.order {
            Order::Ascending => ordering,
            Order::Descending => ordering.reverse(),
        }
    }

    fn dedup_key(&self, args: &[String]) -> Option<(String, String)> {
        match self.dedup {
            Dedup::Never => None,
            Dedup::KeepLastByPrimary => Some(((self.primary)(args), String::new())),
            Dedup::KeepLastByPrimaryAndSecondary => {
                Some(((self.primary)(args), (self.secondary)(args)))
            }
        }
    }
}

fn rule_for<'r>(rules: &'r [BlockRule], verb: &str) -> &'r BlockRule {
    rules
        .iter()
        .find(|rule| rule.verb == verb)
        .unwrap_or(&DEFAULT_RULE)
}

/// Remove duplicates file-wide, then sort the lines of every block
///
/// Of several entries sharing a dedup key the last one in the file survives
/// with its own comments. Blocks left empty by deduplication are dropped.
/// Sorting is stable; a block whose order changed loses its blank lines.
pub fn sort_blocks(syntax: &mut FileSyntax, rules: &[BlockRule]) {
    remove_duplicates(syntax, rules);

    let blocks: Vec<_> = syntax
        .stmts
        .iter()
        .filter_map(|stmt| match stmt {
            Stmt::Block(id) => Some(*id),
            _ => None,
        })
        .collect();

    for id in blocks {
        let block = syntax.block(id);
        let verb = block.token.first().cloned().unwrap_or_default();
        let rule = rule_for(rules, &verb);
        let mut lines = block.lines.clone();
        lines.sort_by(|a, b| rule.cmp(syntax.args(*a), syntax.args(*b)));
        if lines == block.lines {
            continue;
        }
        trace!("Sorted {} block with {} lines", verb, lines.len());
        for line in &lines {
            syntax
                .line_mut(*line)
                .comments
                .before
                .retain(|c| !c.is_blank());
        }
        syntax.block_mut(id).lines = lines;
    }
}

fn remove_duplicates(syntax: &mut FileSyntax, rules: &[BlockRule]) {
    let lines = syntax.directive_lines();
    let mut last: HashMap<(&str, (String, String)), LineId> = HashMap::new();
    let mut keyed = Vec::new();
    for id in &lines {
        let verb = syntax.verb_of(*id).unwrap_or_default();
        let Some(key) = rule_for(rules, verb).dedup_key(syntax.args(*id)) else {
            continue;
        };
        last.insert((verb, key.clone()), *id);
        keyed.push((*id, verb, key));
    }

    let duplicates: Vec<LineId> = keyed
        .into_iter()
        .filter(|(id, verb, key)| last.get(&(*verb, key.clone())) != Some(id))
        .map(|(id, _, _)| id)
        .collect();
    if duplicates.is_empty() {
        return;
    }

    let touched: Vec<_> = duplicates
        .iter()
        .filter_map(|id| syntax.line(*id).block)
        .collect();
    for id in &duplicates {
        trace!("Removing duplicate {:?}", syntax.args(*id));
        syntax.remove_line(*id);
    }
    for block in touched {
        if syntax.block(block).lines.is_empty() {
            syntax.block_mut(block).removed = true;
            syntax.stmts.retain(|stmt| *stmt != Stmt::Block(block));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn retract_sorts_newest_first() {
        let retract = rule_for(MODULE_RULES, "retract");
        let mut entries = vec![
            args("v1.0.0"),
            args("[ v1.1.0 , v1.3.0 ]"),
            args("v1.4.0"),
            args("[ v1.2.0 , v1.3.0 ]"),
            args("v1.2.0"),
        ];
        entries.sort_by(|a, b| retract.cmp(a, b));
        let lows: Vec<String> = entries.iter().map(|e| e.join(" ")).collect();
        assert_eq!(
            lows,
            [
                "v1.4.0",
                "[ v1.2.0 , v1.3.0 ]",
                "v1.2.0",
                "[ v1.1.0 , v1.3.0 ]",
                "v1.0.0"
            ]
        );
    }

    #[test]
    fn replace_keys_ignore_the_arrow() {
        assert_eq!(replaced_version(&args("a => b v1.0.0")), "");
        assert_eq!(replaced_version(&args("a v1.0.0 => b")), "v1.0.0");
    }

    #[test]
    fn unknown_verbs_use_the_default_rule() {
        let rule = rule_for(WORK_RULES, "toolchain");
        assert_eq!(rule.dedup, Dedup::Never);
        assert_eq!(rule_for(WORK_RULES, "directory").dedup, Dedup::Never);
        assert_eq!(rule_for(WORK_RULES, "use").dedup, Dedup::KeepLastByPrimary);
    }
}
