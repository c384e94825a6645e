//! Tests for tree construction, editing and printing

use super::*;

fn reformat(src: &str) -> String {
    format(&parse_syntax("in", src).unwrap())
}

fn tokens(s: &str) -> Vec<String> {
    s.split_whitespace().map(String::from).collect()
}

/// Formatting already formatted text is a no-op
#[test]
fn formatting_is_idempotent() {
    let inputs = [
        "module m\n// c\n\n\nrequire x v1 // s\n",
        "require (\n\t// top\n\n\ta v1\n\t// bottom\n)\n",
        "require ( // open\n\ta v1\n) // close\n",
        "retract [v1.0.0,v1.1.0]\n",
        "\n\n// only a comment",
        "replace a v1.0.0 => ../b\n\n\n// tail\n",
        "exclude (\n)\n",
    ];
    for input in inputs {
        let once = reformat(input);
        assert_eq!(reformat(&once), once, "input {input:?}");

        let result = RoundTripValidator::new()
            .validate_round_trip("in", input)
            .unwrap();
        assert!(result.is_valid(), "{input:?}: {:?}", result.issues());
    }
}

#[test]
fn comments_inside_blocks_survive() {
    let src = "require (\n\t// top\n\n\ta v1\n\t// bottom\n)\n";
    assert_eq!(reformat(src), src);
}

#[test]
fn interval_punctuation_is_normalized() {
    assert_eq!(
        reformat("retract [ v1.0.0 ,v1.1.0 ] // why\n"),
        "retract [v1.0.0, v1.1.0] // why\n"
    );
}

#[test]
fn added_lines_print_as_a_block() {
    let mut file = parse_syntax("in", "module m\n\nrequire a v1.0.0 // keep\n").unwrap();
    file.add_line(None, tokens("require b v1.0.0"));
    assert_eq!(
        format(&file),
        "module m\n\nrequire (\n\ta v1.0.0 // keep\n\tb v1.0.0\n)\n"
    );
}

#[test]
fn cleanup_merges_block_comments_into_the_line() {
    let mut file = parse_syntax("in", "// about\nrequire (\n\t// line\n\ta v1\n)\n").unwrap();
    file.cleanup();
    assert_eq!(format(&file), "// about\n// line\nrequire a v1\n");

    let again = format(&file);
    file.cleanup();
    assert_eq!(format(&file), again);
}

#[test]
fn cleanup_keeps_blocks_with_comments_above_the_closing_paren() {
    let src = "require (\n\ta v1\n\t// trailing\n) // pinned\n";
    let mut file = parse_syntax("in", src).unwrap();
    file.cleanup();
    assert_eq!(format(&file), src);
}

/// Comments after the parens move onto the collapsed line
#[test]
fn cleanup_merges_paren_suffix_comments() {
    for (src, want) in [
        ("require (\n\ta v1\n) // pinned\n", "require a v1 // pinned\n"),
        ("require ( // open\n\ta v1\n)\n", "require a v1 // open\n"),
        ("require ( // open\n\ta v1 // line\n) // close\n", "require a v1 // line; open; close\n"),
        ("require (\n\ta v1 // indirect\n) // pinned\n", "require a v1 // indirect; pinned\n"),
        ("require (\n\ta v1\n\n)\n", "require a v1\n"),
    ] {
        let mut file = parse_syntax("in", src).unwrap();
        file.cleanup();
        let once = format(&file);
        assert_eq!(once, want, "{src:?}");

        let mut reparsed = parse_syntax("in", &once).unwrap();
        assert!(structurally_equal(&file, &reparsed), "{src:?}");
        reparsed.cleanup();
        assert_eq!(format(&reparsed), once);
    }
}

#[test]
fn removed_lines_leave_no_blank_lines() {
    let mut file = parse_syntax("in", "require (\n\ta v1\n\n\tb v1\n\tc v1\n)\n").unwrap();
    let lines = file.directive_lines();
    file.remove_line(lines[1]);
    assert_eq!(format(&file), "require (\n\ta v1\n\tc v1\n)\n");
}

#[test]
fn update_line_keeps_block_membership() {
    let mut file = parse_syntax("in", "require (\n\ta v1 // note\n)\n").unwrap();
    let line = file.directive_lines()[0];
    file.update_line(line, tokens("require a v2"));
    assert_eq!(format(&file), "require (\n\ta v2 // note\n)\n");
}
