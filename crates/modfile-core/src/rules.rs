//! Directive model for module descriptors
//!
//! A [`ModFile`] pairs the syntax tree with typed views of the directives it
//! contains. The views are derived from the tree and point back into it
//! through [`LineId`] handles; every edit re-derives them, so the tree is the
//! only source of truth.
//!
//! ```rust
//! use modfile_core::parse;
//!
//! let file = parse(
//!     "go.mod",
//!     "module example.com/m\n\ngo 1.21\n\nrequire x.y/z v1.2 // indirect\n",
//!     None,
//! )
//! .unwrap();
//!
//! assert_eq!(file.module().unwrap().path, "example.com/m");
//! assert_eq!(file.go().unwrap().version, "1.21");
//! assert_eq!(file.require()[0].module.version, "v1.2.0");
//! assert!(file.require()[0].indirect);
//! ```

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::debug;

use crate::config::ParsePolicy;
use crate::error::{ModfileError, ModfileResult};
use crate::syntax::{self, FileSyntax, LineId, Position, is_directory_path, unquote};
use crate::version::{self, VersionError, VersionFixer, toolchain};
use crate::work::{Directory, Use};

static DEPRECATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(?:^|\n\n)Deprecated: *(.*?)(?:$|\n\n)").expect("deprecation pattern")
});

/// A module path with an optional version
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ModuleVersion {
    pub path: String,
    pub version: String,
}

impl ModuleVersion {
    pub fn new(path: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: version.into(),
        }
    }
}

/// The `module` directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    pub path: String,
    /// Message of a `Deprecated:` paragraph in the directive's comment
    pub deprecated: Option<String>,
    pub syntax: LineId,
}

/// The `go` directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Go {
    pub version: String,
    pub syntax: LineId,
}

/// A `require` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Require {
    pub module: ModuleVersion,
    pub indirect: bool,
    pub syntax: LineId,
}

/// An `exclude` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exclude {
    pub module: ModuleVersion,
    pub syntax: LineId,
}

/// A `replace` entry; an empty old version replaces every version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replace {
    pub old: ModuleVersion,
    pub new: ModuleVersion,
    pub syntax: LineId,
}

/// An inclusive range of versions; `low == high` for a single version
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct VersionInterval {
    pub low: String,
    pub high: String,
}

impl VersionInterval {
    pub fn new(low: impl Into<String>, high: impl Into<String>) -> Self {
        Self {
            low: low.into(),
            high: high.into(),
        }
    }

    pub fn single(version: impl Into<String>) -> Self {
        let version = version.into();
        Self::new(version.clone(), version)
    }
}

/// A `retract` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Retract {
    pub interval: VersionInterval,
    pub rationale: String,
    /// Written as `[low, high]` rather than a bare version
    pub bracketed: bool,
    pub syntax: LineId,
}

/// A parsed module descriptor
#[derive(Debug, Clone)]
pub struct ModFile {
    pub(crate) syntax: FileSyntax,
    pub(crate) policy: ParsePolicy,
    pub(crate) directives: Directives,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Directives {
    pub module: Option<Module>,
    pub go: Option<Go>,
    pub require: Vec<Require>,
    pub exclude: Vec<Exclude>,
    pub replace: Vec<Replace>,
    pub retract: Vec<Retract>,
    pub directory: Vec<Directory>,
    pub uses: Vec<Use>,
}

/// Which descriptor grammar a tree follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dialect {
    Module,
    Work,
}

impl Dialect {
    /// Verbs that may open a block
    fn block_verbs(self) -> &'static [&'static str] {
        match self {
            Dialect::Module => &["module", "require", "exclude", "replace", "retract"],
            Dialect::Work => &["directory", "use", "replace"],
        }
    }
}

/// Derive the directive views of a tree, collecting errors
///
/// Version literals are rewritten in the tree as they are fixed.
pub(crate) fn load_directives(
    syntax: &mut FileSyntax,
    dialect: Dialect,
    policy: ParsePolicy,
    fix: Option<&VersionFixer<'_>>,
    errors: &mut Vec<ModfileError>,
) -> Directives {
    Loader::new(syntax, dialect, policy, fix, errors).load()
}

/// Derive the directive views of an already loaded tree
pub(crate) fn reload_directives(
    syntax: &mut FileSyntax,
    dialect: Dialect,
    policy: ParsePolicy,
) -> Directives {
    let mut errors = Vec::new();
    let policy = ParsePolicy {
        canonical_versions: false,
        ..policy
    };
    let directives = load_directives(syntax, dialect, policy, None, &mut errors);
    for err in &errors {
        debug!("Reloading {} dropped a directive: {}", syntax.name, err);
    }
    directives
}

/// Parse a module descriptor strictly
///
/// `fix` is called once per version literal with the module path the literal
/// belongs to; its result is canonicalized and replaces the literal in the
/// tree.
pub fn parse(name: &str, text: &str, fix: Option<&VersionFixer<'_>>) -> ModfileResult<ModFile> {
    parse_with_policy(name, text, fix, ParsePolicy::STRICT)
}

/// Parse a dependency or legacy module descriptor
///
/// Unknown directives, `exclude` and `replace` stay in the tree but are not
/// modeled, and malformed arguments skip their directive.
pub fn parse_lax(name: &str, text: &str, fix: Option<&VersionFixer<'_>>) -> ModfileResult<ModFile> {
    parse_with_policy(name, text, fix, ParsePolicy::LAX)
}

/// Parse a module descriptor under an explicit policy
pub fn parse_with_policy(
    name: &str,
    text: &str,
    fix: Option<&VersionFixer<'_>>,
    policy: ParsePolicy,
) -> ModfileResult<ModFile> {
    let mut syntax = syntax::parse_syntax(name, text)?;
    let mut errors = Vec::new();
    let directives = load_directives(&mut syntax, Dialect::Module, policy, fix, &mut errors);

    match errors.len() {
        0 => {}
        1 => return Err(errors.remove(0)),
        _ => return Err(ModfileError::Multiple(errors)),
    }

    debug!(
        "Parsed {} ({} require, {} exclude, {} replace, {} retract)",
        name,
        directives.require.len(),
        directives.exclude.len(),
        directives.replace.len(),
        directives.retract.len()
    );
    Ok(ModFile {
        syntax,
        policy,
        directives,
    })
}

impl ModFile {
    pub fn module(&self) -> Option<&Module> {
        self.directives.module.as_ref()
    }

    pub fn go(&self) -> Option<&Go> {
        self.directives.go.as_ref()
    }

    pub fn require(&self) -> &[Require] {
        &self.directives.require
    }

    pub fn exclude(&self) -> &[Exclude] {
        &self.directives.exclude
    }

    pub fn replace(&self) -> &[Replace] {
        &self.directives.replace
    }

    pub fn retract(&self) -> &[Retract] {
        &self.directives.retract
    }

    pub fn syntax(&self) -> &FileSyntax {
        &self.syntax
    }

    pub fn policy(&self) -> ParsePolicy {
        self.policy
    }

    /// Rationale of a retract entry, from its comments
    pub fn retract_rationale(&self, retract: &Retract) -> String {
        directive_comment(&self.syntax, retract.syntax)
    }

    /// Format the descriptor as canonical text
    pub fn format(&self) -> String {
        syntax::format(&self.syntax)
    }

    /// Re-derive the directive views after the tree changed
    ///
    /// Versions in the tree were accepted when the file was loaded or edited,
    /// so they are read back verbatim.
    pub(crate) fn reindex(&mut self) {
        self.directives = reload_directives(&mut self.syntax, Dialect::Module, self.policy);
    }
}

/// Walks the tree once and builds the directive views
struct Loader<'a> {
    syntax: &'a mut FileSyntax,
    dialect: Dialect,
    policy: ParsePolicy,
    fix: Option<&'a VersionFixer<'a>>,
    errors: &'a mut Vec<ModfileError>,
    module_path: Option<String>,
    out: Directives,
}

impl<'a> Loader<'a> {
    fn new(
        syntax: &'a mut FileSyntax,
        dialect: Dialect,
        policy: ParsePolicy,
        fix: Option<&'a VersionFixer<'a>>,
        errors: &'a mut Vec<ModfileError>,
    ) -> Self {
        Self {
            syntax,
            dialect,
            policy,
            fix,
            errors,
            module_path: None,
            out: Directives::default(),
        }
    }

    fn load(mut self) -> Directives {
        self.module_path = self.syntax.directive_lines().into_iter().find_map(|id| {
            let args = self.syntax.args(id);
            (self.syntax.verb_of(id) == Some("module") && args.len() == 1)
                .then(|| unquote_arg(&args[0]))
                .flatten()
        });

        self.check_blocks();
        let mut reported_orphan_retract = false;
        for id in self.syntax.directive_lines() {
            if let Err(Some(err)) = self.line(id, &mut reported_orphan_retract) {
                self.errors.push(err);
            }
        }
        self.out
    }

    fn check_blocks(&mut self) {
        let blocks: Vec<_> = self
            .syntax
            .stmts
            .iter()
            .filter_map(|stmt| match stmt {
                syntax::Stmt::Block(id) => Some(*id),
                _ => None,
            })
            .collect();
        for id in blocks {
            let block = self.syntax.block(id);
            let known = block
                .token
                .first()
                .is_some_and(|verb| self.dialect.block_verbs().contains(&verb.as_str()));
            if self.policy.reject_unknown_directives && (block.token.len() > 1 || !known) {
                let message = format!("unknown block type: {}", block.token.join(" "));
                self.errors
                    .push(ModfileError::syntax(&self.syntax.name, block.start, message));
            }
        }
    }

    fn error(&self, id: LineId, pos: Position, message: impl Into<String>) -> ModfileError {
        let verb = self.syntax.verb_of(id).unwrap_or_default().to_string();
        ModfileError::directive(&self.syntax.name, pos, verb, message)
    }

    /// `Err(None)` skips the directive silently
    fn line(&mut self, id: LineId, reported_orphan_retract: &mut bool) -> Result<(), Option<ModfileError>> {
        let verb = self.syntax.verb_of(id).unwrap_or_default().to_string();
        let args = self.syntax.args(id).to_vec();
        let start = self.syntax.line(id).start;
        let in_block = self.syntax.line(id).block;
        if let Some(block) = in_block {
            let block = self.syntax.block(block);
            let known = self.dialect.block_verbs().contains(&verb.as_str());
            if block.token.len() > 1 || !known {
                // Reported once for the whole block.
                return Err(None);
            }
        }

        match (self.dialect, verb.as_str()) {
            (_, "go") => self.go(id, &args, start),
            (Dialect::Module, "module") => self.module(id, &args, start),
            (Dialect::Module, "require" | "exclude") => {
                if verb == "exclude" && !self.policy.model_main_module_directives {
                    return Err(None);
                }
                self.require_or_exclude(id, &verb, &args, start)
            }
            (_, "replace") => {
                if !self.policy.model_main_module_directives {
                    return Err(None);
                }
                let (old, new) = parse_replace(self, id, &args, start)?;
                self.out.replace.push(Replace {
                    old,
                    new,
                    syntax: id,
                });
                Ok(())
            }
            (Dialect::Module, "retract") => self.retract(id, &args, start, reported_orphan_retract),
            (Dialect::Work, "directory" | "use") => self.workspace_path(id, &verb, &args, start),
            _ if self.policy.reject_unknown_directives => {
                Err(Some(self.error(id, start, format!("unknown directive: {verb}"))))
            }
            _ => {
                debug!("Ignoring unknown directive {} at {}:{}", verb, start.line, start.column);
                Err(None)
            }
        }
    }

    /// Argument-count violation: an error, or a silent skip when tolerated
    fn usage(&self, id: LineId, start: Position, message: impl Into<String>) -> Option<ModfileError> {
        self.policy
            .check_argument_counts
            .then(|| self.error(id, start, message))
    }

    fn module(&mut self, id: LineId, args: &[String], start: Position) -> Result<(), Option<ModfileError>> {
        if self.out.module.is_some() {
            return Err(Some(self.error(id, start, "repeated module statement")));
        }
        if args.len() != 1 {
            return Err(self.usage(id, start, "usage: module module/path"));
        }
        let path = unquote_arg(&args[0]).ok_or_else(|| {
            Some(self.error(id, start, format!("invalid quoted string: {}", args[0])))
        })?;
        let comment = directive_comment(self.syntax, id);
        let deprecated = DEPRECATION
            .captures(&comment)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());
        self.out.module = Some(Module {
            path,
            deprecated,
            syntax: id,
        });
        Ok(())
    }

    fn go(&mut self, id: LineId, args: &[String], start: Position) -> Result<(), Option<ModfileError>> {
        if self.out.go.is_some() {
            return Err(Some(self.error(id, start, "repeated go statement")));
        }
        if args.len() != 1 {
            return Err(self.usage(id, start, "go directive expects exactly one argument"));
        }
        let mut version = args[0].clone();
        if !toolchain::is_language_version(&version) {
            let lax = if self.policy.strict_go_version {
                None
            } else {
                toolchain::lax_language_version(&version).map(str::to_string)
            };
            match lax {
                Some(fixed) => {
                    debug!("Truncating go version {} to {}", version, fixed);
                    self.syntax.set_arg(id, 0, fixed.clone());
                    version = fixed;
                }
                None => {
                    let message =
                        format!("invalid go version '{version}': must match format 1.23.0");
                    return Err(Some(self.error(id, start, message)));
                }
            }
        }
        self.out.go = Some(Go {
            version,
            syntax: id,
        });
        Ok(())
    }

    fn workspace_path(
        &mut self,
        id: LineId,
        verb: &str,
        args: &[String],
        start: Position,
    ) -> Result<(), Option<ModfileError>> {
        if args.len() != 1 {
            return Err(self.usage(id, start, format!("usage: {verb} local/dir")));
        }
        let path = unquote_arg(&args[0]).ok_or_else(|| {
            Some(self.error(id, start, format!("invalid quoted string: {}", args[0])))
        })?;
        let entry = Directory {
            path,
            module_path: None,
            syntax: id,
        };
        if verb == "use" {
            self.out.uses.push(entry);
        } else {
            self.out.directory.push(entry);
        }
        Ok(())
    }

    fn require_or_exclude(
        &mut self,
        id: LineId,
        verb: &str,
        args: &[String],
        start: Position,
    ) -> Result<(), Option<ModfileError>> {
        if args.len() != 2 {
            return Err(self.usage(id, start, format!("usage: {verb} module/path v1.2.3")));
        }
        let path = unquote_arg(&args[0]).ok_or_else(|| {
            Some(self.error(id, start, format!("invalid quoted string: {}", args[0])))
        })?;
        let version = self.fix_version(id, &path, 1)?;
        let module = ModuleVersion::new(path, version);
        if verb == "require" {
            let indirect = is_indirect(self.syntax, id);
            self.out.require.push(Require {
                module,
                indirect,
                syntax: id,
            });
        } else {
            self.out.exclude.push(Exclude { module, syntax: id });
        }
        Ok(())
    }

    fn retract(
        &mut self,
        id: LineId,
        args: &[String],
        start: Position,
        reported_orphan: &mut bool,
    ) -> Result<(), Option<ModfileError>> {
        if self.fix.is_some() && self.module_path.is_none() {
            if std::mem::replace(reported_orphan, true) {
                return Err(None);
            }
            let message = "no module directive found, so retract cannot be used";
            return Err(Some(self.error(id, start, message)));
        }

        let report = self.policy.report_retract_errors;
        let path = self.module_path.clone().unwrap_or_default();
        let (interval, rest) = match self.version_interval(id, &path, args, start) {
            Ok(parsed) => parsed,
            Err(err) => return Err(if report { err } else { None }),
        };
        if let Some(extra) = args.get(rest) {
            if report {
                let message = format!("unexpected token after version: {extra:?}");
                return Err(Some(self.error(id, start, message)));
            }
        }
        let rationale = directive_comment(self.syntax, id);
        self.out.retract.push(Retract {
            interval,
            rationale,
            bracketed: args.first().is_some_and(|a| a == "["),
            syntax: id,
        });
        Ok(())
    }

    /// Parse `v` or `[low, high]`, returning the index after the interval
    fn version_interval(
        &mut self,
        id: LineId,
        path: &str,
        args: &[String],
        start: Position,
    ) -> Result<(VersionInterval, usize), Option<ModfileError>> {
        let expect = |this: &Self, i: usize, want: &str, message: &str| {
            if args.get(i).map(String::as_str) == Some(want) {
                Ok(())
            } else {
                Err(Some(this.error(id, start, message)))
            }
        };

        match args.first().map(String::as_str) {
            None | Some("(") => return Err(Some(self.error(id, start, "expected '[' or version"))),
            Some("[") => {}
            Some(_) => {
                let version = self.fix_version(id, path, 0)?;
                return Ok((VersionInterval::single(version), 1));
            }
        }
        if args.len() < 2 {
            return Err(Some(self.error(id, start, "expected version after '['")));
        }
        let low = self.fix_version(id, path, 1)?;
        expect(self, 2, ",", "expected ',' after version")?;
        if args.len() < 4 {
            return Err(Some(self.error(id, start, "expected version after ','")));
        }
        let high = self.fix_version(id, path, 3)?;
        expect(self, 4, "]", "expected ']' after version")?;
        Ok((VersionInterval::new(low, high), 5))
    }

    /// Validate and canonicalize argument `i`, rewriting it in the tree
    fn fix_version(&mut self, id: LineId, path: &str, i: usize) -> Result<String, Option<ModfileError>> {
        let raw = self.syntax.args(id)[i].clone();
        let pos = self.syntax.arg_pos(id, i);
        let wrap = |this: &Self, err: VersionError| {
            let message = match err {
                VersionError::Invalid { version, reason } => {
                    format!("version {version:?} invalid: {reason}")
                }
                VersionError::Rejected(message) => message,
            };
            Some(this.error(id, pos, message).with_module_path(path))
        };

        let text = unquote_arg(&raw).ok_or_else(|| wrap(self, VersionError::invalid(raw.as_str())))?;
        let fixed = match self.fix {
            Some(fix) => {
                let fixed = fix(path, &text).map_err(|err| wrap(self, err))?;
                version::check(&fixed).map_err(|err| wrap(self, err))?
            }
            None if self.policy.canonical_versions => {
                version::check(&text).map_err(|err| wrap(self, err))?
            }
            None => text,
        };
        if fixed != raw {
            self.syntax.set_arg(id, i, fixed.clone());
        }
        Ok(fixed)
    }
}

/// Parse `old [v] => new [v]`
fn parse_replace(
    loader: &mut Loader<'_>,
    id: LineId,
    args: &[String],
    start: Position,
) -> Result<(ModuleVersion, ModuleVersion), Option<ModfileError>> {
    let verb = loader.syntax.verb_of(id).unwrap_or_default().to_string();
    let arrow = if args.get(1).map(String::as_str) == Some("=>") { 1 } else { 2 };
    if args.len() < arrow + 2 || args.len() > arrow + 3 || args[arrow] != "=>" {
        let message = format!(
            "usage: {verb} module/path [v1.2.3] => other/module v1.4\n\t or {verb} module/path [v1.2.3] => ../local/directory"
        );
        return Err(Some(loader.error(id, start, message)));
    }

    let quoted = |loader: &Loader<'_>, raw: &str| {
        unquote_arg(raw)
            .ok_or_else(|| Some(loader.error(id, start, format!("invalid quoted string: {raw}"))))
    };

    let old_path = quoted(loader, &args[0])?;
    let old_version = if arrow == 2 {
        loader.fix_version(id, &old_path, 1)?
    } else {
        String::new()
    };

    let new_path = quoted(loader, &args[arrow + 1])?;
    let mut new_version = String::new();
    if args.len() == arrow + 2 && !is_directory_path(&new_path) {
        let message = if new_path.contains('@') {
            "replacement module must match format 'path version', not 'path@version'"
        } else {
            "replacement module without version must be directory path (rooted or starting with . or ..)"
        };
        return Err(Some(loader.error(id, start, message)));
    }
    if args.len() == arrow + 3 {
        if is_directory_path(&new_path) {
            let message = format!("replacement module directory path {new_path:?} cannot have version");
            return Err(Some(loader.error(id, start, message)));
        }
        new_version = loader.fix_version(id, &new_path, arrow + 2)?;
    }

    Ok((
        ModuleVersion::new(old_path, old_version),
        ModuleVersion::new(new_path, new_version),
    ))
}

fn unquote_arg(arg: &str) -> Option<String> {
    if arg.starts_with('"') || arg.starts_with('`') {
        unquote(arg)
    } else {
        Some(arg.to_string())
    }
}

/// Text of the comment explaining a directive
///
/// Uses the line's leading comments, else its suffix comment, else the
/// leading comments of its block. Comment markers are stripped and lines
/// joined with `\n`; blank markers are skipped.
pub(crate) fn directive_comment(syntax: &FileSyntax, id: LineId) -> String {
    let line = syntax.line(id);
    let block = line.block.map(|b| &syntax.block(b).comments.before);
    let has_text = |comments: &[syntax::Comment]| comments.iter().any(|c| !c.is_blank());

    let group = if has_text(&line.comments.before) {
        &line.comments.before
    } else if has_text(&line.comments.suffix) {
        &line.comments.suffix
    } else if let Some(before) = block {
        before
    } else {
        return String::new();
    };

    group
        .iter()
        .filter_map(|c| c.token.strip_prefix("//"))
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Report whether a require line carries an `indirect` marker
///
/// Any spacing after `//` is accepted: `//indirect` and `//\tindirect` count.
pub(crate) fn is_indirect(syntax: &FileSyntax, id: LineId) -> bool {
    let Some(comment) = syntax.line(id).comments.suffix.first() else {
        return false;
    };
    let text = comment.token.strip_prefix("//").unwrap_or(&comment.token);
    let mut fields = text.split_whitespace();
    match (fields.next(), fields.next()) {
        (Some("indirect"), None) => true,
        (Some("indirect;"), Some(_)) => true,
        _ => false,
    }
}

/// Add or remove the `indirect` marker of a require line
///
/// An existing marker is left exactly as written. A comment without the
/// marker gains it as a `indirect;` prefix.
pub(crate) fn set_indirect(syntax: &mut FileSyntax, id: LineId, indirect: bool) {
    if is_indirect(syntax, id) == indirect {
        return;
    }
    let suffix = &mut syntax.line_mut(id).comments.suffix;
    if indirect {
        let Some(comment) = suffix.first_mut() else {
            suffix.push(syntax::Comment::new("// indirect"));
            return;
        };
        let text = comment.token.strip_prefix("//").unwrap_or(&comment.token).trim();
        comment.token = if text.is_empty() {
            "// indirect".to_string()
        } else {
            format!("// indirect; {text}")
        };
        return;
    }

    let Some(comment) = suffix.first_mut() else {
        return;
    };
    let text = comment.token.strip_prefix("//").unwrap_or(&comment.token).trim();
    if text == "indirect" {
        suffix.clear();
    } else if let Some(i) = comment.token.find("indirect;") {
        comment.token = format!("//{}", &comment.token[i + "indirect;".len()..]);
    }
}
