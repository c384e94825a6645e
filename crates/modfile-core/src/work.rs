//! Workspace descriptors
//!
//! A workspace descriptor shares the syntax of module descriptors but knows
//! only `go`, `directory`, `use` and `replace`. It is always parsed strictly.
//!
//! ```rust
//! use modfile_core::parse_work;
//!
//! let mut work = parse_work("go.work", "go 1.22\n\nuse ./a\n", None).unwrap();
//! work.add_use("./b", "example.com/b").unwrap();
//!
//! assert_eq!(work.format(), "go 1.22\n\nuse (\n\t./a\n\t./b\n)\n");
//! assert_eq!(work.uses()[1].module_path.as_deref(), Some("example.com/b"));
//! ```

use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, trace};

use crate::config::ParsePolicy;
use crate::edit::{self, first_directive};
use crate::error::{ModfileError, ModfileResult};
use crate::rules::{Dialect, Directives, Go, Replace, load_directives, reload_directives};
use crate::sort::{self, WORK_RULES};
use crate::syntax::{self, FileSyntax, LineId, auto_quote};
use crate::version::{VersionFixer, toolchain};

/// A `directory` or `use` entry
///
/// The module path is not part of the file; it is whatever the last edit
/// that named this entry recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Directory {
    pub path: String,
    pub module_path: Option<String>,
    pub syntax: LineId,
}

/// A `use` entry
pub type Use = Directory;

/// A parsed workspace descriptor
#[derive(Debug, Clone)]
pub struct WorkFile {
    syntax: FileSyntax,
    directives: Directives,
    module_paths: HashMap<LineId, String>,
}

/// Parse a workspace descriptor
///
/// `fix` canonicalizes the version literals of `replace` directives.
pub fn parse_work(name: &str, text: &str, fix: Option<&VersionFixer<'_>>) -> ModfileResult<WorkFile> {
    let mut syntax = syntax::parse_syntax(name, text)?;
    let mut errors = Vec::new();
    let directives = load_directives(&mut syntax, Dialect::Work, ParsePolicy::STRICT, fix, &mut errors);

    match errors.len() {
        0 => {}
        1 => return Err(errors.remove(0)),
        _ => return Err(ModfileError::Multiple(errors)),
    }

    debug!(
        "Parsed workspace {} ({} directory, {} use, {} replace)",
        name,
        directives.directory.len(),
        directives.uses.len(),
        directives.replace.len()
    );
    Ok(WorkFile {
        syntax,
        directives,
        module_paths: HashMap::new(),
    })
}

/// Which list of workspace paths an edit targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathVerb {
    Directory,
    Use,
}

impl PathVerb {
    fn as_str(self) -> &'static str {
        match self {
            PathVerb::Directory => "directory",
            PathVerb::Use => "use",
        }
    }
}

impl WorkFile {
    pub fn go(&self) -> Option<&Go> {
        self.directives.go.as_ref()
    }

    pub fn directory(&self) -> &[Directory] {
        &self.directives.directory
    }

    pub fn uses(&self) -> &[Use] {
        &self.directives.uses
    }

    pub fn replace(&self) -> &[Replace] {
        &self.directives.replace
    }

    pub fn syntax(&self) -> &FileSyntax {
        &self.syntax
    }

    pub fn format(&self) -> String {
        syntax::format(&self.syntax)
    }

    fn reindex(&mut self) {
        self.directives = reload_directives(&mut self.syntax, Dialect::Work, ParsePolicy::STRICT);
        let entries = self
            .directives
            .directory
            .iter_mut()
            .chain(self.directives.uses.iter_mut());
        for entry in entries {
            entry.module_path = self.module_paths.get(&entry.syntax).cloned();
        }
    }

    fn entries(&self, verb: PathVerb) -> &[Directory] {
        match verb {
            PathVerb::Directory => &self.directives.directory,
            PathVerb::Use => &self.directives.uses,
        }
    }

    /// Set the language version
    ///
    /// A new `go` line goes above the first directive, below any leading
    /// file comments.
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
                let at = first_directive(&self.syntax);
                self.syntax.insert_line(at, tokens);
            }
        }
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

    pub fn add_directory(&mut self, path: &str, module_path: &str) -> ModfileResult<()> {
        self.add_path(PathVerb::Directory, path, module_path)
    }

    pub fn drop_directory(&mut self, path: &str) -> ModfileResult<()> {
        self.drop_path(PathVerb::Directory, path)
    }

    pub fn add_use(&mut self, path: &str, module_path: &str) -> ModfileResult<()> {
        self.add_path(PathVerb::Use, path, module_path)
    }

    pub fn drop_use(&mut self, path: &str) -> ModfileResult<()> {
        self.drop_path(PathVerb::Use, path)
    }

    /// Add or update a workspace path, removing later duplicates
    fn add_path(&mut self, verb: PathVerb, path: &str, module_path: &str) -> ModfileResult<()> {
        if path.is_empty() {
            return Err(ModfileError::invalid_edit(format!(
                "{} path must not be empty",
                verb.as_str()
            )));
        }
        let tokens = vec![verb.as_str().to_string(), auto_quote(path)];

        let matching: Vec<LineId> = self
            .entries(verb)
            .iter()
            .filter(|entry| entry.path == path)
            .map(|entry| entry.syntax)
            .collect();
        let id = match matching.split_first() {
            Some((first, rest)) => {
                self.syntax.update_line(*first, tokens);
                for id in rest {
                    self.syntax.remove_line(*id);
                }
                *first
            }
            None => self.syntax.add_line(None, tokens),
        };
        if module_path.is_empty() {
            self.module_paths.remove(&id);
        } else {
            self.module_paths.insert(id, module_path.to_string());
        }
        trace!("Added {} {}", verb.as_str(), path);
        self.reindex();
        Ok(())
    }

    fn drop_path(&mut self, verb: PathVerb, path: &str) -> ModfileResult<()> {
        if path.is_empty() {
            return Err(ModfileError::invalid_edit(format!(
                "{} path must not be empty",
                verb.as_str()
            )));
        }
        let matching: Vec<LineId> = self
            .entries(verb)
            .iter()
            .filter(|entry| entry.path == path)
            .map(|entry| entry.syntax)
            .collect();
        for id in matching {
            self.syntax.remove_line(id);
            self.module_paths.remove(&id);
        }
        self.reindex();
        Ok(())
    }

    pub fn add_replace(
        &mut self,
        old_path: &str,
        old_version: &str,
        new_path: &str,
        new_version: &str,
    ) -> ModfileResult<()> {
        edit::add_replace(
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
        edit::drop_replace(&mut self.syntax, &self.directives.replace, old_path, old_version);
        self.reindex();
        Ok(())
    }

    /// Remove duplicate entries and sort every block
    ///
    /// `directory` entries are never deduplicated.
    pub fn sort_blocks(&mut self) {
        sort::sort_blocks(&mut self.syntax, WORK_RULES);
        self.reindex();
    }

    pub fn cleanup(&mut self) {
        self.syntax.cleanup();
        self.reindex();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_directives_are_rejected() {
        let err = parse_work("go.work", "go 1.22\nrequire x v1.0.0\n", None).unwrap_err();
        assert_eq!(err.to_string(), "go.work:2:1: unknown directive: require");

        let err = parse_work("go.work", "exclude (\n\tx v1.0.0\n)\n", None).unwrap_err();
        assert_eq!(err.to_string(), "go.work:1:1: unknown block type: exclude");
    }

    #[test]
    fn use_takes_one_path() {
        let err = parse_work("go.work", "use ./a ./b\n", None).unwrap_err();
        assert_eq!(err.to_string(), "go.work:1:1: usage: use local/dir");
    }

    #[test]
    fn module_paths_survive_later_edits() {
        let mut work = parse_work("go.work", "directory ./a\n", None).unwrap();
        work.add_directory("./a", "example.com/a").unwrap();
        work.add_directory("./b", "").unwrap();
        work.add_go_stmt("1.22").unwrap();
        work.sort_blocks();

        let paths: Vec<_> = work
            .directory()
            .iter()
            .map(|d| (d.path.as_str(), d.module_path.as_deref()))
            .collect();
        assert_eq!(paths, [("./a", Some("example.com/a")), ("./b", None)]);
    }

    #[test]
    fn empty_paths_are_rejected() {
        let mut work = parse_work("go.work", "use ./a\n", None).unwrap();
        assert!(work.drop_use("").is_err());
        assert!(work.add_directory("", "m").is_err());
        work.drop_use("./missing").unwrap();
        assert_eq!(work.format(), "use ./a\n");
    }
}
