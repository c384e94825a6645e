//! Edit operations for module descriptors
//!
//! Every operation checks its arguments before touching the tree, so a
//! failed edit leaves the file exactly as it was. After a successful edit the
//! directive views are re-derived from the tree.
//!
//! ```rust
//! use modfile_core::parse;
//!
//! let mut file = parse("go.mod", "module m\n\nrequire x.y/a v1.0.0\n", None).unwrap();
//! file.add_require("x.y/b", "v1.2.3").unwrap();
//! file.add_go_stmt("1.21").unwrap();
//!
//! assert_eq!(
//!     file.format(),
//!     "module m\ngo 1.21\n\nrequire (\n\tx.y/a v1.0.0\n\tx.y/b v1.2.3\n)\n"
//! );
//! ```

use indexmap::IndexMap;
use tracing::trace;

use crate::error::{ModfileError, ModfileResult};
use crate::rules::{ModFile, ModuleVersion, Replace, VersionInterval, set_indirect};
use crate::sort::{self, MODULE_RULES};
use crate::syntax::{Comment, FileSyntax, Hint, Stmt, auto_quote, is_directory_path};
use crate::version::{self, VersionError, toolchain};

/// One entry of the complete require list given to [`ModFile::set_require`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequireEntry {
    pub module: ModuleVersion,
    pub indirect: bool,
}

impl RequireEntry {
    pub fn new(path: impl Into<String>, version: impl Into<String>, indirect: bool) -> Self {
        Self {
            module: ModuleVersion::new(path, version),
            indirect,
        }
    }
}

/// Reject versions that are not already in canonical form
pub(crate) fn check_canonical(version: &str) -> ModfileResult<()> {
    match version::canonical(version) {
        Some(canonical) if canonical == version => Ok(()),
        _ => Err(VersionError::invalid(version).into()),
    }
}

fn check_path(path: &str) -> ModfileResult<()> {
    if path.is_empty() {
        return Err(ModfileError::invalid_edit("module path must not be empty"));
    }
    Ok(())
}

fn retract_tokens(interval: &VersionInterval) -> Vec<String> {
    if interval.low == interval.high {
        vec!["retract".to_string(), auto_quote(&interval.low)]
    } else {
        vec![
            "retract".to_string(),
            "[".to_string(),
            auto_quote(&interval.low),
            ",".to_string(),
            auto_quote(&interval.high),
            "]".to_string(),
        ]
    }
}

/// Check the arguments of a replacement before any edit happens
fn check_replace(old_path: &str, old_version: &str, new_path: &str, new_version: &str) -> ModfileResult<()> {
    check_path(old_path)?;
    check_path(new_path)?;
    if !old_version.is_empty() {
        check_canonical(old_version)?;
    }
    if new_version.is_empty() {
        if !is_directory_path(new_path) {
            return Err(ModfileError::invalid_edit(format!(
                "replacement module without version must be directory path (rooted or starting with . or ..): {new_path}"
            )));
        }
    } else if is_directory_path(new_path) {
        return Err(ModfileError::invalid_edit(format!(
            "replacement module directory path {new_path:?} cannot have version"
        )));
    } else {
        check_canonical(new_version)?;
    }
    Ok(())
}

/// Add or rewrite a replacement in either dialect
///
/// The first replacement of the same old path (and old version, when one is
/// given) is rewritten in place and later ones removed. A new line goes
/// after the last replacement of the same old path when there is one.
pub(crate) fn add_replace(
    syntax: &mut FileSyntax,
    existing: &[Replace],
    old_path: &str,
    old_version: &str,
    new_path: &str,
    new_version: &str,
) -> ModfileResult<()> {
    check_replace(old_path, old_version, new_path, new_version)?;

    let mut tokens = vec!["replace".to_string(), auto_quote(old_path)];
    if !old_version.is_empty() {
        tokens.push(old_version.to_string());
    }
    tokens.push("=>".to_string());
    tokens.push(auto_quote(new_path));
    if !new_version.is_empty() {
        tokens.push(new_version.to_string());
    }

    let mut updated = false;
    let mut hint = None;
    for replace in existing {
        if replace.old.path != old_path {
            continue;
        }
        if old_version.is_empty() || replace.old.version == old_version {
            if updated {
                syntax.remove_line(replace.syntax);
                continue;
            }
            syntax.update_line(replace.syntax, tokens.clone());
            updated = true;
            continue;
        }
        hint = Some(Hint::Line(replace.syntax));
    }
    if !updated {
        syntax.add_line(hint, tokens);
    }
    trace!("Replaced {}@{} with {}@{}", old_path, old_version, new_path, new_version);
    Ok(())
}

/// Remove the replacements of an old path and version
pub(crate) fn drop_replace(syntax: &mut FileSyntax, existing: &[Replace], old_path: &str, old_version: &str) {
    for replace in existing {
        if replace.old.path == old_path && replace.old.version == old_version {
            syntax.remove_line(replace.syntax);
        }
    }
}

impl ModFile {
    /// Require `path` at `version`
    ///
    /// An existing requirement is updated in place and any later duplicates
    /// removed; otherwise a new line is added next to the other requirements.
    pub fn add_require(&mut self, path: &str, version: &str) -> ModfileResult<()> {
        check_path(path)?;
        check_canonical(version)?;

        let mut updated = false;
        for require in &self.directives.require {
            if require.module.path != path {
                continue;
            }
            if updated {
                self.syntax.remove_line(require.syntax);
            } else {
                let tokens = vec!["require".to_string(), auto_quote(path), version.to_string()];
                self.syntax.update_line(require.syntax, tokens);
                updated = true;
            }
        }
        if !updated {
            self.push_require(path, version, false);
        }
        trace!("Required {}@{}", path, version);
        self.reindex();
        Ok(())
    }

    /// Append a requirement without looking for an existing one
    pub fn add_new_require(&mut self, path: &str, version: &str, indirect: bool) -> ModfileResult<()> {
        check_path(path)?;
        check_canonical(version)?;
        self.push_require(path, version, indirect);
        self.reindex();
        Ok(())
    }

    fn push_require(&mut self, path: &str, version: &str, indirect: bool) {
        let tokens = vec!["require".to_string(), auto_quote(path), version.to_string()];
        let id = self.syntax.add_line(None, tokens);
        set_indirect(&mut self.syntax, id, indirect);
    }

    /// Replace the whole require set
    ///
    /// Requirements already in the file keep their place and comments and get
    /// the listed version and indirect marker; those not listed are removed.
    /// Missing ones are added in list order, then the blocks are sorted.
    pub fn set_require(&mut self, entries: &[RequireEntry]) -> ModfileResult<()> {
        let mut need: IndexMap<&str, (&str, bool)> = IndexMap::new();
        for entry in entries {
            let path = entry.module.path.as_str();
            let version = entry.module.version.as_str();
            check_path(path)?;
            check_canonical(version)?;
            if let Some((previous, _)) = need.get(path) {
                if *previous != version {
                    return Err(ModfileError::invalid_edit(format!(
                        "conflicting versions for path {path} ({previous} and {version})"
                    )));
                }
            }
            need.insert(path, (version, entry.indirect));
        }

        for require in &self.directives.require {
            let Some((version, indirect)) = need.shift_remove(require.module.path.as_str()) else {
                self.syntax.remove_line(require.syntax);
                continue;
            };
            let line = self.syntax.line_mut(require.syntax);
            if line.comments.before.len() == 1 && line.comments.before[0].is_blank() {
                line.comments.before.clear();
            }
            self.syntax.set_arg(require.syntax, 1, version);
            set_indirect(&mut self.syntax, require.syntax, indirect);
        }
        for (path, (version, indirect)) in need {
            self.push_require(path, version, indirect);
        }

        trace!("Set {} requirements", entries.len());
        sort::sort_blocks(&mut self.syntax, MODULE_RULES);
        self.reindex();
        Ok(())
    }

    /// Remove every requirement of `path`
    pub fn drop_require(&mut self, path: &str) -> ModfileResult<()> {
        for require in &self.directives.require {
            if require.module.path == path {
                self.syntax.remove_line(require.syntax);
            }
        }
        self.reindex();
        Ok(())
    }

    /// Exclude `path` at `version`; excluding it twice is a no-op
    pub fn add_exclude(&mut self, path: &str, version: &str) -> ModfileResult<()> {
        check_path(path)?;
        check_canonical(version)?;

        let mut hint = None;
        for exclude in &self.directives.exclude {
            if exclude.module.path == path {
                if exclude.module.version == version {
                    return Ok(());
                }
                hint = Some(Hint::Line(exclude.syntax));
            }
        }
        let tokens = vec!["exclude".to_string(), auto_quote(path), version.to_string()];
        self.syntax.add_line(hint, tokens);
        self.reindex();
        Ok(())
    }

    pub fn drop_exclude(&mut self, path: &str, version: &str) -> ModfileResult<()> {
        for exclude in &self.directives.exclude {
            if exclude.module.path == path && exclude.module.version == version {
                self.syntax.remove_line(exclude.syntax);
            }
        }
        self.reindex();
        Ok(())
    }

    /// Replace `old_path` (at `old_version`, or every version when empty)
    pub fn add_replace(
        &mut self,
        old_path: &str,
        old_version: &str,
        new_path: &str,
        new_version: &str,
    ) -> ModfileResult<()> {
        add_replace(
            &mut self.syntax,
            &self.directives.replace,
            old_path,
            old_version,
            new_path,
            new_version,
        )?;
        self.reindex();
        Ok(())
    }

    pub fn drop_replace(&mut self, old_path: &str, old_version: &str) -> ModfileResult<()> {
        drop_replace(&mut self.syntax, &self.directives.replace, old_path, old_version);
        self.reindex();
        Ok(())
    }

    /// Set the module path, adding the `module` line above the first
    /// directive when there is none
    pub fn add_module_stmt(&mut self, path: &str) -> ModfileResult<()> {
        check_path(path)?;
        let tokens = vec!["module".to_string(), auto_quote(path)];
        match &self.directives.module {
            Some(module) => self.syntax.update_line(module.syntax, tokens),
            None => {
                let at = first_directive(&self.syntax);
                self.syntax.insert_line(at, tokens);
            }
        }
        self.reindex();
        Ok(())
    }

    /// Set the language version
    ///
    /// A new `go` line goes right after `module`, else right before the
    /// first `require`, else at the end of the file.
    pub fn add_go_stmt(&mut self, version: &str) -> ModfileResult<()> {
        if !toolchain::is_language_version(version) {
            return Err(ModfileError::invalid_edit(format!(
                "invalid language version {version:?}"
            )));
        }
        let tokens = vec!["go".to_string(), version.to_string()];
        match &self.directives.go {
            Some(go) => self.syntax.update_line(go.syntax, tokens),
            None => {
                let at = match &self.directives.module {
                    Some(module) => self.syntax.stmt_index_of(module.syntax).map(|i| i + 1),
                    None => self.syntax.first_stmt_with_verb("require"),
                }
                .unwrap_or(self.syntax.stmts.len());
                self.syntax.insert_line(at, tokens);
            }
        }
        trace!("Set go version {}", version);
        self.reindex();
        Ok(())
    }

    pub fn drop_go_stmt(&mut self) -> ModfileResult<()> {
        if let Some(go) = &self.directives.go {
            self.syntax.remove_line(go.syntax);
        }
        self.reindex();
        Ok(())
    }

    /// Retract a version interval
    ///
    /// A new entry is always added, even when the same interval is already
    /// retracted. Each line of `rationale` becomes a comment above the entry,
    /// unless an identical interval already carries a different rationale:
    /// then the lines join the comment above the enclosing block.
    pub fn add_retract(&mut self, interval: &VersionInterval, rationale: &str) -> ModfileResult<()> {
        check_interval(interval)?;

        let conflicting = self.directives.retract.iter().any(|retract| {
            retract.interval == *interval
                && !retract.rationale.is_empty()
                && retract.rationale != rationale
        });
        let id = self.syntax.add_line(None, retract_tokens(interval));
        if !rationale.is_empty() {
            let comments = rationale
                .split('\n')
                .map(|line| Comment::new(format!("// {line}")));
            match self.syntax.line(id).block.filter(|_| conflicting) {
                Some(block) => {
                    self.syntax.block_mut(block).comments.before.extend(comments)
                }
                _ => self.syntax.line_mut(id).comments.before.extend(comments),
            }
        }
        trace!("Retracted [{}, {}]", interval.low, interval.high);
        self.reindex();
        Ok(())
    }

    /// Remove every retraction of exactly this interval
    ///
    /// `[v, v]` and `v` are the same interval. Emptied blocks stay until
    /// [`ModFile::cleanup`].
    pub fn drop_retract(&mut self, interval: &VersionInterval) -> ModfileResult<()> {
        check_interval(interval)?;
        for retract in &self.directives.retract {
            if retract.interval == *interval {
                self.syntax.remove_line(retract.syntax);
            }
        }
        self.reindex();
        Ok(())
    }

    /// Drop empty blocks and collapse single-line ones
    pub fn cleanup(&mut self) {
        self.syntax.cleanup();
        self.reindex();
    }

    /// Remove duplicate entries and sort every block
    pub fn sort_blocks(&mut self) {
        sort::sort_blocks(&mut self.syntax, MODULE_RULES);
        self.reindex();
    }
}

fn check_interval(interval: &VersionInterval) -> ModfileResult<()> {
    check_canonical(&interval.low)?;
    check_canonical(&interval.high)?;
    if version::compare(&interval.low, &interval.high).is_gt() {
        return Err(ModfileError::invalid_edit(format!(
            "version interval [{}, {}] has its low bound above its high bound",
            interval.low, interval.high
        )));
    }
    Ok(())
}

/// Statement index of the first directive, after any leading comments
pub(crate) fn first_directive(syntax: &FileSyntax) -> usize {
    syntax
        .stmts
        .iter()
        .position(|stmt| !matches!(stmt, Stmt::Comments(_)))
        .unwrap_or(syntax.stmts.len())
}
