//! Parser behavior on whole documents

use evomark::evomark::ast::{BodyLayout, NodeKind};
use evomark::evomark::parsing::{parse_document, ParseOutput};
use evomark::evomark::registry::RuleRegistry;
use evomark::evomark::testing::{assert_same_shape, assert_tree};
use rstest::rstest;
use serde_json::json;

fn parse(src: &str) -> ParseOutput {
    parse_document(&RuleRegistry::with_defaults(), src)
}

#[test]
fn unknown_function_behaves_like_box() {
    let unknown = parse("#figure{#caption{some text}}");
    let boxed = parse("#box{#box{some text}}");

    assert!(unknown.complete);
    // Same structure, only the recorded names differ
    let rename = |dump: String| dump.replace("figure", "box").replace("caption", "box");
    assert_eq!(rename(unknown.tree.write_tree()), boxed.tree.write_tree());

    assert_tree(&unknown.tree).child(0, |figure| {
        figure.kind(NodeKind::Func).content("figure").child(0, |body| {
            body.kind(NodeKind::FuncBody).child(0, |caption| {
                caption
                    .kind(NodeKind::Func)
                    .content("caption")
                    .child(0, |inner| {
                        inner.kinds(&[NodeKind::Text]).child(0, |text| {
                            text.content("some text");
                        });
                    });
            });
        });
    });
}

#[test]
fn sugar_chaining_nests_functions() {
    let sugar = parse("#a#b{body}");
    let explicit = parse("#a{#b{body}}");

    // The implicit body only differs in its layout tag
    assert_same_shape(&sugar.tree, &explicit.tree);
    assert_tree(&sugar.tree).child(0, |a| {
        a.content("a").child(0, |body| {
            body.layout(BodyLayout::DirectChild);
        });
    });
    assert_tree(&explicit.tree).child(0, |a| {
        a.child(0, |body| {
            body.layout(BodyLayout::Inline);
        });
    });
}

#[test]
fn sugar_chaining_keeps_leading_params() {
    let out = parse("#a(1)(2)#b{x}");
    assert_tree(&out.tree).child(0, |a| {
        a.kinds(&[NodeKind::FuncParam, NodeKind::FuncParam, NodeKind::FuncBody])
            .child(1, |param| {
                param.content_obj(json!(2));
            })
            .child(2, |body| {
                body.layout(BodyLayout::DirectChild).child(0, |b| {
                    b.kind(NodeKind::Func).content("b");
                });
            });
    });
}

#[test]
fn sugar_chains_deeply() {
    let out = parse("#a#b#c{x}");
    insta::assert_snapshot!(out.tree.write_tree(), @r"
    root
      func a
        func_body
          func b
            func_body
              func c
                func_body
                  text x
    ");
}

#[test]
fn body_disables_sugar() {
    let out = parse("#a{x}#b{y}");
    assert_tree(&out.tree).kinds(&[NodeKind::Func, NodeKind::Func]);
}

#[test]
fn document_with_every_construct() {
    let src = "Intro line\n\n@fig = #box{see}\n%name = $t{World}\nHello %name!\n\n#code==>raw {==|";
    let out = parse(src);
    assert!(out.complete);
    insta::assert_snapshot!(out.tree.write_tree(), @r"
    root
      text Intro line
      ref fig
        func box
          func_body
            text see
      var_assign name
        cmd t
          body
            literal World
      text Hello
      var_use name
      text !
      func code
        func_body raw {
    ");
}

#[rstest]
#[case::hash_without_name("a # b")]
#[case::lone_hash("#")]
#[case::unclosed_body_then_hash("#box{ # }")]
fn malformed_input_stops_the_parse(#[case] src: &str) {
    let out = parse(src);
    assert!(!out.complete);
}

#[rstest]
#[case::money("costs $5")]
#[case::percent("100% sure")]
#[case::lone_dollar("$ and %")]
fn sigils_without_names_stay_text(#[case] src: &str) {
    let out = parse(src);
    assert!(out.complete);
    assert_tree(&out.tree).kinds(&[NodeKind::Text]).child(0, |text| {
        text.content(src);
    });
}

#[rstest]
#[case::missing_equal("@fig #box{x}", "\"@fig = \" must be followed with a function")]
#[case::missing_func("@fig = text", "\"@fig = \" must be followed with a function")]
#[case::assign_without_cmd("%v = text", "\"%v = \" must be followed with a command")]
fn malformed_bindings_warn_on_root(#[case] src: &str, #[case] message: &str) {
    let out = parse(src);
    assert!(out.complete);
    let tree = &out.tree;
    let warning = tree
        .children(tree.root())
        .iter()
        .copied()
        .find(|&c| tree.kind(c) == NodeKind::Warning)
        .expect("a warning on the root");
    assert_eq!(tree.content(warning), message);
}

#[test]
fn config_collects_settings() {
    let out = parse("#config{{\"a\": 1}}\n#config(string){\"b\": 2}");
    assert_eq!(out.config["env"], json!({"a": 1, "b": 2}));
}

#[test]
fn registry_without_builtins_still_parses_commands() {
    let out = parse_document(&RuleRegistry::new(), "$t{hi %x}");
    assert!(out.complete);
    assert_tree(&out.tree).child(0, |cmd| {
        cmd.kind(NodeKind::Cmd).child(0, |body| {
            body.kinds(&[NodeKind::Literal, NodeKind::VarUse]);
        });
    });
}
