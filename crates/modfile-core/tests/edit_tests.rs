//! Edit scenarios for module descriptors
//!
//! Each scenario edits a parsed file and compares the formatted result with
//! the formatted parse of the expected text, so indentation in the literals
//! below does not matter.

use modfile_core::{
    ModFile, ModfileResult, RequireEntry, VersionError, VersionInterval, parse, parse_lax,
};

fn load(text: &str, strict: bool) -> ModFile {
    let parsed = if strict {
        parse("in", text, None)
    } else {
        parse_lax("in", text, None)
    };
    parsed.unwrap_or_else(|err| panic!("parse {text:?}: {err}"))
}

fn assert_edit(input: &str, want: &str, strict: bool, edit: impl FnOnce(&mut ModFile) -> ModfileResult<()>) {
    let mut file = load(input, strict);
    edit(&mut file).unwrap();
    let golden = load(want, strict);
    assert_eq!(file.format(), golden.format());
}

/// Updating a requirement keeps its line in place
#[test]
fn test_add_require_existing() {
    assert_edit(
        "module m\nrequire x.y/z v1.2.3\n",
        "module m\nrequire x.y/z v1.5.6\n",
        true,
        |f| f.add_require("x.y/z", "v1.5.6"),
    );
}

/// Later requirements of the same path are removed with their comments
#[test]
fn test_add_require_existing_duplicates() {
    assert_edit(
        r#"module m
        require (
            x.y/z v1.2.3 // first
            x.z/a v0.1.0 // first-a
        )
        require x.y/z v1.4.5 // second
        require (
            x.y/z v1.6.7 // third
            x.z/a v0.2.0 // third-a
        )
        "#,
        r#"module m
        require (
            x.y/z v1.8.9 // first
            x.z/a v0.1.0 // first-a
        )
        require (
            x.z/a v0.2.0 // third-a
        )
        "#,
        true,
        |f| f.add_require("x.y/z", "v1.8.9"),
    );
}

/// A single require line becomes a block when a second one is added
#[test]
fn test_add_require_new() {
    assert_edit(
        "module m\nrequire x.y/z v1.2.3\n",
        "module m\nrequire (\n\tx.y/z v1.2.3\n\tx.y/w v1.5.6\n)\n",
        true,
        |f| f.add_require("x.y/w", "v1.5.6"),
    );
}

/// New requirements join the last require statement
#[test]
fn test_add_require_joins_last_statement() {
    assert_edit(
        "module m\nrequire x.y/z v1.2.3\nrequire x.y/q/v2 v2.3.4\n",
        r#"module m
        require x.y/z v1.2.3
        require (
            x.y/q/v2 v2.3.4
            x.y/w v1.5.6
        )
        "#,
        true,
        |f| f.add_require("x.y/w", "v1.5.6"),
    );
}

#[test]
fn test_add_require_without_require_statement() {
    assert_edit(
        "module m\n",
        "module m\nrequire x.y/w v1.5.6\n",
        true,
        |f| f.add_require("x.y/w", "v1.5.6"),
    );
}

/// Unknown directives survive edits of a lax file
#[test]
fn test_add_require_lax() {
    assert_edit(
        "module m\nrequire x.y/z v1.2.3\nfoo bar\n",
        "module m\nrequire (\n\tx.y/z v1.2.3\n\tx.y/w v1.5.6\n)\nfoo bar\n",
        false,
        |f| f.add_require("x.y/w", "v1.5.6"),
    );
}

#[test]
fn test_add_new_require_indirect() {
    let mut file = load("module m\nrequire x.y/z v1.2.3\n", true);
    file.add_new_require("x.y/z", "v1.3.0", true).unwrap();
    assert_eq!(file.require().len(), 2);
    assert!(file.require()[1].indirect);
    assert_eq!(
        file.format(),
        "module m\nrequire (\n\tx.y/z v1.2.3\n\tx.y/z v1.3.0 // indirect\n)\n"
    );
}

#[test]
fn test_drop_require() {
    assert_edit(
        "module m\nrequire (\n\tx.y/a v1.0.0\n\tx.y/b v1.0.0\n)\nrequire x.y/a v1.1.0\n",
        "module m\nrequire (\n\tx.y/b v1.0.0\n)\n",
        true,
        |f| f.drop_require("x.y/a"),
    );
}

/// Requirements not in the list go, missing ones come, then blocks are sorted
#[test]
fn test_set_require_existing() {
    assert_edit(
        r#"module m
        require (
            x.y/b v1.2.3

            x.y/a v1.2.3
            x.y/d v1.2.3
        )
        "#,
        r#"module m
        require (
            x.y/a v1.2.3
            x.y/b v1.2.3
            x.y/c v1.2.3
        )
        "#,
        true,
        |f| {
            f.set_require(&[
                RequireEntry::new("x.y/a", "v1.2.3", false),
                RequireEntry::new("x.y/b", "v1.2.3", false),
                RequireEntry::new("x.y/c", "v1.2.3", false),
            ])
        },
    );
}

/// Indirect markers are added next to existing comments; markers written
/// with unusual spacing are left alone
#[test]
fn test_set_require_existing_indirect() {
    assert_edit(
        "module m\nrequire (\n\tx.y/a v1.2.3\n\tx.y/b v1.2.3 //\n\tx.y/c v1.2.3 //c\n\tx.y/d v1.2.3 //   c\n\tx.y/e v1.2.3 // indirect\n\tx.y/f v1.2.3 //indirect\n\tx.y/g v1.2.3 //\tindirect\n)\n",
        "module m\nrequire (\n\tx.y/a v1.2.3 // indirect\n\tx.y/b v1.2.3 // indirect\n\tx.y/c v1.2.3 // indirect; c\n\tx.y/d v1.2.3 // indirect; c\n\tx.y/e v1.2.3 // indirect\n\tx.y/f v1.2.3 //indirect\n\tx.y/g v1.2.3 //\tindirect\n)\n",
        true,
        |f| {
            let entries: Vec<RequireEntry> = ["a", "b", "c", "d", "e", "f", "g"]
                .iter()
                .map(|p| RequireEntry::new(format!("x.y/{p}"), "v1.2.3", true))
                .collect();
            f.set_require(&entries)
        },
    );
}

#[test]
fn test_set_require_drops_indirect() {
    assert_edit(
        "module m\nrequire (\n\tx.y/a v1.2.3 // indirect\n\tx.y/b v1.2.3 // indirect; pinned\n)\n",
        "module m\nrequire (\n\tx.y/a v1.2.3\n\tx.y/b v1.2.4 // pinned\n)\n",
        true,
        |f| {
            f.set_require(&[
                RequireEntry::new("x.y/a", "v1.2.3", false),
                RequireEntry::new("x.y/b", "v1.2.4", false),
            ])
        },
    );
}

/// `go` goes right after `module`
#[test]
fn test_add_go_stmt_after_module() {
    assert_edit(
        "module m\nrequire x.y/a v1.2.3\n",
        "module m\ngo 1.14\nrequire x.y/a v1.2.3\n",
        true,
        |f| f.add_go_stmt("1.14"),
    );
}

/// Without `module`, `go` goes before the first requirement
#[test]
fn test_add_go_stmt_before_require() {
    assert_edit(
        "require x.y/a v1.2.3\n",
        "go 1.14\nrequire x.y/a v1.2.3\n",
        true,
        |f| f.add_go_stmt("1.14"),
    );
}

#[test]
fn test_add_go_stmt_require_before_module() {
    assert_edit(
        "require x.y/a v1.2.3\nmodule m\n",
        "require x.y/a v1.2.3\nmodule m\ngo 1.14\n",
        true,
        |f| f.add_go_stmt("1.14"),
    );
}

#[test]
fn test_add_go_stmt_updates_existing() {
    assert_edit(
        "module m\n\ngo 1.13 // old\n",
        "module m\n\ngo 1.21rc1 // old\n",
        true,
        |f| f.add_go_stmt("1.21rc1"),
    );
    assert_edit("", "go 1.14\n", true, |f| f.add_go_stmt("1.14"));
}

#[test]
fn test_add_go_stmt_rejects_bad_versions() {
    let mut file = load("module m\n", true);
    assert!(file.add_go_stmt("1.14.x").is_err());
    assert!(file.add_go_stmt("go1.14").is_err());
    assert_eq!(file.format(), "module m\n");
}

#[test]
fn test_drop_go_stmt() {
    assert_edit("module m\ngo 1.14\n", "module m\n", true, |f| f.drop_go_stmt());
}

#[test]
fn test_add_exclude() {
    assert_edit(
        "module m\nexclude x.y/z v1.2.3\nexclude x.y/w v1.0.0\n",
        "module m\nexclude (\n\tx.y/z v1.2.3\n\tx.y/z v1.3.0\n)\nexclude x.y/w v1.0.0\n",
        true,
        |f| {
            f.add_exclude("x.y/z", "v1.2.3")?;
            f.add_exclude("x.y/z", "v1.3.0")
        },
    );
}

#[test]
fn test_drop_exclude() {
    assert_edit(
        "module m\nexclude (\n\tx.y/z v1.2.3\n\tx.y/z v1.3.0\n)\n",
        "module m\nexclude x.y/z v1.3.0\n",
        true,
        |f| {
            f.drop_exclude("x.y/z", "v1.2.3")?;
            f.cleanup();
            Ok(())
        },
    );
}

/// Rewriting a replacement keeps its comment
#[test]
fn test_add_replace_updates_in_place() {
    assert_edit(
        "module m\nreplace x.y/z v1.2.3 => ../z // local\n",
        "module m\nreplace x.y/z v1.2.3 => x.y/w v1.0.0 // local\n",
        true,
        |f| f.add_replace("x.y/z", "v1.2.3", "x.y/w", "v1.0.0"),
    );
}

/// A new replacement lands after the last one with the same old path
#[test]
fn test_add_replace_next_to_same_path() {
    assert_edit(
        "module m\nreplace (\n\tx.y/a v1.0.0 => ../a\n\tx.y/b => ../b\n)\n",
        "module m\nreplace (\n\tx.y/a v1.0.0 => ../a\n\tx.y/a v1.1.0 => ../a1\n\tx.y/b => ../b\n)\n",
        true,
        |f| f.add_replace("x.y/a", "v1.1.0", "../a1", ""),
    );
}

/// A replacement without old version supersedes the versioned ones
#[test]
fn test_add_replace_all_versions() {
    assert_edit(
        "module m\nreplace x.y/a v1.0.0 => ../a\nreplace x.y/a v1.1.0 => ../b\n",
        "module m\nreplace x.y/a => ../c\n",
        true,
        |f| f.add_replace("x.y/a", "", "../c", ""),
    );
}

#[test]
fn test_drop_replace() {
    assert_edit(
        "module m\nreplace x.y/a v1.0.0 => ../a\nreplace x.y/a => ../b\n",
        "module m\nreplace x.y/a v1.0.0 => ../a\n",
        true,
        |f| f.drop_replace("x.y/a", ""),
    );
}

#[test]
fn test_add_retract_singleton_and_interval() {
    assert_edit(
        "module m\n",
        "module m\nretract (\n\tv1.2.3\n\t[v1.3.0, v1.4.0]\n)\n",
        true,
        |f| {
            f.add_retract(&VersionInterval::single("v1.2.3"), "")?;
            f.add_retract(&VersionInterval::new("v1.3.0", "v1.4.0"), "")
        },
    );
}

/// Each rationale line becomes a comment above the new entry
#[test]
fn test_add_retract_rationale() {
    assert_edit(
        "module m\n",
        "module m\n// bad\n// worse\nretract v1.2.3\n",
        true,
        |f| f.add_retract(&VersionInterval::single("v1.2.3"), "bad\nworse"),
    );
}

/// Identical intervals are never merged
#[test]
fn test_add_retract_duplicate_with_rationale() {
    assert_edit(
        "module m\nretract v1.2.3\n",
        "module m\nretract (\n\tv1.2.3\n\t// bad\n\tv1.2.3\n)\n",
        true,
        |f| f.add_retract(&VersionInterval::single("v1.2.3"), "bad"),
    );
}

/// A second rationale for an already explained interval goes above the block
#[test]
fn test_add_retract_conflicting_rationale() {
    let mut file = load("module m\n// old\nretract v1.2.3\n", true);
    file.add_retract(&VersionInterval::single("v1.2.3"), "new")
        .unwrap();

    assert_eq!(
        file.format(),
        "module m\n// new\nretract (\n\t// old\n\tv1.2.3\n\tv1.2.3\n)\n"
    );
    let rationales: Vec<&str> = file.retract().iter().map(|r| r.rationale.as_str()).collect();
    assert_eq!(rationales, ["old", "new"]);
}

/// `[v, v]` and `v` name the same interval
#[test]
fn test_drop_retract() {
    assert_edit(
        "module m\nretract (\n\tv1.0.0\n\t[v1.1.0, v1.1.0]\n\t[v1.1.0, v1.2.0]\n)\n",
        "module m\nretract (\n\tv1.0.0\n\t[v1.1.0, v1.2.0]\n)\n",
        true,
        |f| f.drop_retract(&VersionInterval::single("v1.1.0")),
    );
}

/// Emptied blocks stay until cleanup
#[test]
fn test_drop_retract_all_then_cleanup() {
    let mut file = load("module m\nretract (\n\tv1.0.0\n\tv1.1.0\n)\n", true);
    file.drop_retract(&VersionInterval::single("v1.0.0")).unwrap();
    file.drop_retract(&VersionInterval::single("v1.1.0")).unwrap();
    file.drop_retract(&VersionInterval::single("v9.9.9")).unwrap();
    assert_eq!(file.format(), "module m\nretract (\n)\n");

    file.cleanup();
    assert_eq!(file.format(), "module m\n");
}

#[test]
fn test_drop_retract_validates_interval() {
    let mut file = load("module m\nretract v1.0.0\n", true);
    assert!(file.drop_retract(&VersionInterval::single("v1.0")).is_err());
    assert!(file
        .drop_retract(&VersionInterval::new("v1.1.0", "v1.0.0"))
        .is_err());
    assert_eq!(file.retract().len(), 1);
}

#[test]
fn test_retract_rationale_precedence() {
    let file = load(
        r#"module m
        // prefix
        retract v1.0.0 // suffix

        // block comment
        retract (
            v1.1.0
            // line comment
            v1.2.0
            v1.3.0 // only suffix
        )
        "#,
        true,
    );
    let rationales: Vec<String> = file
        .retract()
        .iter()
        .map(|r| file.retract_rationale(r))
        .collect();
    assert_eq!(
        rationales,
        ["prefix", "block comment", "line comment", "only suffix"]
    );
}

/// Empty comment lines separate paragraphs of a rationale
#[test]
fn test_retract_rationale_paragraphs() {
    let file = load(
        "module m\n// a\n//\n// b\n//\n// c\nretract v1.0.0\n",
        true,
    );
    assert_eq!(file.retract()[0].rationale, "a\n\nb\n\nc");
}

/// Duplicates of keyed directives keep the last entry and its comment
#[test]
fn test_sort_blocks_removes_duplicates() {
    assert_edit(
        r#"module m
        exclude x.y/z v1.0.0 // a
        exclude x.y/z v1.0.0 // b
        exclude (
            x.y/w v1.1.0
            x.y/z v1.0.0 // c
        )
        "#,
        "module m\nexclude (\n\tx.y/w v1.1.0\n\tx.y/z v1.0.0 // c\n)\n",
        true,
        |f| {
            f.sort_blocks();
            Ok(())
        },
    );
    assert_edit(
        "module m\nrequire x.y/a v1.0.0 // first\nrequire (\n\tx.y/b v1.0.0\n\tx.y/a v1.1.0 // second\n)\n",
        "module m\nrequire (\n\tx.y/a v1.1.0 // second\n\tx.y/b v1.0.0\n)\n",
        true,
        |f| {
            f.sort_blocks();
            Ok(())
        },
    );
}

#[test]
fn test_sort_blocks_keeps_retract_duplicates() {
    assert_edit(
        "module m\nretract (\n\tv1.0.0\n\tv1.0.0\n)\n",
        "module m\nretract (\n\tv1.0.0\n\tv1.0.0\n)\n",
        true,
        |f| {
            f.sort_blocks();
            Ok(())
        },
    );
}

/// Retractions sort newest first
#[test]
fn test_sort_blocks_retract_order() {
    assert_edit(
        r#"module m
        retract (
            v1.0.0
            [v1.1.0, v1.2.0]
            v1.1.0
            v1.4.0
            [v1.1.0, v1.3.0]
            v1.2.0
            [v1.2.0, v1.3.0]
            v1.3.0
        )
        "#,
        r#"module m
        retract (
            v1.4.0
            v1.3.0
            [v1.2.0, v1.3.0]
            v1.2.0
            [v1.1.0, v1.3.0]
            [v1.1.0, v1.2.0]
            v1.1.0
            v1.0.0
        )
        "#,
        true,
        |f| {
            f.sort_blocks();
            Ok(())
        },
    );
}

/// Unknown verbs in lax files sort lexically
#[test]
fn test_sort_blocks_lexical_for_unknown_verbs() {
    assert_edit(
        "module m\nsort (\n\tzz\n\tv1.2.0\n\tv1.11.0\n\tcc\n\tbb\n\taa\n)\n",
        "module m\nsort (\n\taa\n\tbb\n\tcc\n\tv1.11.0\n\tv1.2.0\n\tzz\n)\n",
        false,
        |f| {
            f.sort_blocks();
            Ok(())
        },
    );
}

#[test]
fn test_cleanup() {
    let mut file = load(
        "module m\n// deps\nrequire (\n\tx.y/a v1.0.0 // a\n)\nexclude (\n)\n",
        true,
    );
    file.cleanup();
    assert_eq!(file.format(), "module m\n// deps\nrequire x.y/a v1.0.0 // a\n");

    let once = file.format();
    file.cleanup();
    assert_eq!(file.format(), once);
}

/// Paren comments join the collapsed line after its indirect marker
#[test]
fn test_cleanup_keeps_indirect_with_paren_comments() {
    let mut file = load(
        "module m\nrequire ( // tools\n\tx.y/a v1.0.0 // indirect\n)\n",
        true,
    );
    file.cleanup();
    assert_eq!(file.format(), "module m\nrequire x.y/a v1.0.0 // indirect; tools\n");
    assert!(file.require()[0].indirect);
}

/// Quoted paths are written back quoted
#[test]
fn test_add_require_quotes_when_needed() {
    let mut file = load("module m\n", true);
    file.add_require("x.y/odd path", "v1.0.0").unwrap();
    assert_eq!(
        file.format(),
        "module m\nrequire \"x.y/odd path\" v1.0.0\n"
    );
    assert_eq!(file.require()[0].module.path, "x.y/odd path");
}

/// Versions resolved by a fixer stay modeled after later edits
#[test]
fn test_fixed_versions_survive_edits() {
    let resolve = |path: &str, v: &str| -> Result<String, VersionError> {
        match (path, v) {
            ("x.y/z", "master") => Ok("v0.0.0-20230101000000-abcdefabcdef".to_string()),
            _ => Ok(v.to_string()),
        }
    };
    for mut file in [
        parse("in", "module m\n\nrequire x.y/z master\n", Some(&resolve)).unwrap(),
        parse_lax("in", "module m\n\nrequire x.y/z master\n", Some(&resolve)).unwrap(),
    ] {
        file.add_go_stmt("1.21").unwrap();
        file.add_require("x.y/w", "v1.0.0").unwrap();

        let modeled: Vec<(&str, &str)> = file
            .require()
            .iter()
            .map(|r| (r.module.path.as_str(), r.module.version.as_str()))
            .collect();
        assert_eq!(
            modeled,
            [("x.y/z", "v0.0.0-20230101000000-abcdefabcdef"), ("x.y/w", "v1.0.0")]
        );
        assert!(file.format().contains("x.y/z v0.0.0-20230101000000-abcdefabcdef"));
    }
}

/// Fixer output is canonicalized, or rejected when it is not a version
#[test]
fn test_fixer_output_is_checked() {
    let identity = |_: &str, v: &str| -> Result<String, VersionError> { Ok(v.to_string()) };

    let mut file = parse("in", "module m\nrequire x.y/z v1.2\n", Some(&identity)).unwrap();
    assert_eq!(file.require()[0].module.version, "v1.2.0");
    file.drop_go_stmt().unwrap();
    assert_eq!(file.require()[0].module.version, "v1.2.0");
    assert_eq!(file.format(), "module m\nrequire x.y/z v1.2.0\n");

    let err = parse("in", "module m\n\nrequire x.y/z master\n", Some(&identity)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "in:3:15: require x.y/z: version \"master\" invalid: must be of the form v1.2.3"
    );
}
