//! Canonical printing of whole documents

use evomark::evomark::ast::NodeKind;
use evomark::evomark::core::Evomark;
use evomark::evomark::formats::FormattingRules;
use evomark::evomark::testing::assert_same_shape;
use proptest::prelude::*;
use rstest::rstest;

fn fmt(src: &str) -> String {
    Evomark::new().format_source(src)
}

#[rstest]
#[case::keeps_inner_blanks("hello    world", "hello    world")]
#[case::trims_lines("  first  \n  second  ", "first\nsecond")]
#[case::paragraphs("one\n\n\n\ntwo", "one\n\ntwo")]
#[case::inline_func("see #box{ here }now", "see #box{here} now")]
#[case::sugar("#box#box{x}", "#box#box{x}")]
#[case::assignment("%x   =   $t{a}", "%x = $t{a}")]
#[case::reference("@fig =\n#box{x}", "@fig=#box{x}")]
#[case::code_fence("#code===>a ==| b===|", "#code===>a ==| b===|")]
#[case::literal_paragraphs("$t{a\n\nb}", "$t{\n  a\n\n  b\n}")]
#[case::equal_after_var_use("The total is %x\n= 42 units", "The total is %x\n= 42 units")]
#[case::equal_after_var_use_in_block("#box{\n%x\n\n= y\n}", "#box{\n  %x\n  = y\n}")]
fn prints_canonical_form(#[case] src: &str, #[case] expected: &str) {
    let once = fmt(src);
    assert_eq!(once, expected);
    assert_eq!(fmt(&once), once);
}

#[test]
fn equal_after_var_use_keeps_the_variable() {
    let evomark = Evomark::new();
    let src = "The total is %x\n= 42 units";
    let once = evomark.format_source(src);
    let reparsed = evomark.parse(&once);

    assert_same_shape(&reparsed.tree, &evomark.parse(src).tree);
    let tree = &reparsed.tree;
    let kinds: Vec<_> = tree.children(tree.root()).iter().map(|&c| tree.kind(c)).collect();
    assert_eq!(kinds, vec![NodeKind::Text, NodeKind::VarUse, NodeKind::Text]);
}

#[test]
fn nested_blocks_use_configured_indent() {
    let src = "#box{\n#box{\ninner\n}\n}";
    let evomark = Evomark::new().with_formatting(FormattingRules {
        indent_string: "\t".into(),
    });
    assert_eq!(evomark.format_source(src), "#box{\n\t#box{\n\t\tinner\n\t}\n}");
}

#[test]
fn formatted_document_is_stable() {
    let src = "Title\n\n%who = $t{World}\n#box{\nHello %who\n\n#box{deep}\n}\n\n#code==>x==|";
    let once = fmt(src);
    assert_eq!(fmt(&once), once);
}

fn word() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

/// Prose that touches clause characters without opening a construct.
fn punct_word() -> impl Strategy<Value = String> {
    "[a-z=({]{1,6}"
}

/// Like [punct_word], but safe inside a braced body.
fn body_punct_word() -> impl Strategy<Value = String> {
    "[a-z=(]{1,6}"
}

fn var() -> impl Strategy<Value = String> {
    "[a-z]{1,3}".prop_map(|name| format!("%{}", name))
}

fn joiner() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just(" "), Just("\n"), Just("\n\n")]
}

fn param() -> impl Strategy<Value = String> {
    prop_oneof![
        (1u32..1000).prop_map(|n| n.to_string()),
        word().prop_map(|w| format!("\"{}\"", w)),
    ]
}

fn join(parts: Vec<(String, &'static str)>) -> String {
    parts
        .into_iter()
        .map(|(piece, joiner)| format!("{}{}", piece, joiner))
        .collect()
}

fn block() -> impl Strategy<Value = String> {
    let inner = prop_oneof![word(), body_punct_word(), var()];
    prop::collection::vec((inner, joiner()), 1..4)
        .prop_map(|parts| format!("#box{{\n{}\n}}", join(parts)))
}

fn piece() -> impl Strategy<Value = String> {
    prop_oneof![
        word(),
        punct_word(),
        var(),
        word().prop_map(|w| format!("#box{{{}}}", w)),
        word().prop_map(|w| format!("#box#box{{{}}}", w)),
        (param(), word()).prop_map(|(p, w)| format!("#box({}){{{}}}", p, w)),
        ("[a-z]{1,3}", word()).prop_map(|(r, w)| format!("@{}=#box{{{}}}", r, w)),
        "[a-z][a-z ]{0,6}".prop_map(|raw| format!("#code==>{}==|", raw)),
        (word(), var()).prop_map(|(w, v)| format!("$t{{{} {}}}", w, v)),
        block(),
    ]
}

fn document() -> impl Strategy<Value = String> {
    prop::collection::vec((piece(), joiner()), 1..8).prop_map(join)
}

proptest! {
    #[test]
    fn formatting_is_idempotent(src in document()) {
        let evomark = Evomark::new();
        let parsed = evomark.parse(&src);
        // `%v =...` is a malformed assignment and its warning is not printed
        let has_warning = parsed
            .tree
            .children(parsed.tree.root())
            .iter()
            .any(|&c| parsed.tree.kind(c) == NodeKind::Warning);
        prop_assume!(parsed.complete && !has_warning);

        let once = evomark.stringify(&parsed.tree);
        let reparsed = evomark.parse(&once);
        assert_same_shape(&reparsed.tree, &parsed.tree);

        let twice = evomark.stringify(&reparsed.tree);
        prop_assert_eq!(twice, once);
    }
}
