//! End-to-end tests against the tree-sitter backend
//!
//! HTML documents with `<script>` and `<style>` bodies, edited through a
//! shared source buffer the way a host editor would.

use std::cell::RefCell;
use std::rc::Rc;
use syntax_layers::ts::TreeSitterBackend;
use syntax_layers::{Callbacks, LanguageTree, LayerId, SourceBuffer, TextRange};

fn html_tree(text: &str) -> (LanguageTree<TreeSitterBackend>, SourceBuffer) {
    let source = SourceBuffer::new(text);
    let tree = LanguageTree::new(TreeSitterBackend::builtin(), source.clone(), "html").unwrap();
    (tree, source)
}

fn child_languages(tree: &LanguageTree<TreeSitterBackend>, id: LayerId) -> Vec<String> {
    tree.children(id)
        .into_iter()
        .map(|(language, _)| language.to_string())
        .collect()
}

fn region_text(tree: &LanguageTree<TreeSitterBackend>, id: LayerId) -> Vec<String> {
    let text = tree.source().text();
    tree.included_ranges(id)
        .unwrap()
        .iter()
        .map(|range| text[range.byte_range()].to_string())
        .collect()
}

#[test]
fn script_and_style_become_child_layers() {
    let (mut tree, _source) = html_tree(
        "<html><script>let x = 1;</script><style>p { color: red; }</style></html>",
    );
    tree.parse().unwrap();

    let root = tree.root();
    assert_eq!(child_languages(&tree, root), vec!["javascript", "css"]);

    let js = tree.child(root, "javascript").unwrap();
    let css = tree.child(root, "css").unwrap();
    assert_eq!(region_text(&tree, js), vec!["let x = 1;"]);
    assert_eq!(region_text(&tree, css), vec!["p { color: red; }"]);

    let js_tree = tree.tree(js).unwrap();
    assert_eq!(js_tree.root_node().kind(), "program");
    assert!(!js_tree.root_node().has_error());
}

#[test]
fn multiple_scripts_share_one_layer() {
    let (mut tree, _source) = html_tree("<script>a();</script>\n<p>hi</p>\n<script>b();</script>");
    tree.parse().unwrap();

    let root = tree.root();
    assert_eq!(child_languages(&tree, root), vec!["javascript"]);
    let js = tree.child(root, "javascript").unwrap();
    assert_eq!(region_text(&tree, js), vec!["a();", "b();"]);
}

#[test]
fn removing_a_script_removes_its_layer() {
    let text = "<p>intro</p><script>let x = 1;</script>";
    let (mut tree, source) = html_tree(text);
    tree.parse().unwrap();

    let removed = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&removed);
    tree.register_callbacks(Callbacks::new().on_child_removed(move |event| {
        sink.borrow_mut().push(event.language.to_string());
    }));

    let start = text.find("<script>").unwrap();
    let delta = source.replace(start..text.len(), "");
    tree.on_bytes(&delta).unwrap();

    assert!(tree.children(tree.root()).is_empty());
    assert_eq!(*removed.borrow(), vec!["javascript"]);
}

#[test]
fn editing_inside_a_script_keeps_the_layer() {
    let text = "<script>let x = 1;</script>";
    let (mut tree, source) = html_tree(text);
    tree.parse().unwrap();
    let js = tree.child(tree.root(), "javascript").unwrap();

    let changed = Rc::new(RefCell::new(0usize));
    let sink = Rc::clone(&changed);
    tree.register_callbacks(Callbacks::new().on_changedtree(move |_, ranges| {
        *sink.borrow_mut() += ranges.len();
    }));

    let one = text.find('1').unwrap();
    let delta = source.replace(one..one + 1, "compute()");
    let changes = tree.on_bytes(&delta).unwrap();

    assert_eq!(tree.child(tree.root(), "javascript"), Some(js));
    assert_eq!(region_text(&tree, js), vec!["let x = compute();"]);
    assert!(!changes.is_empty());
    assert_eq!(*changed.borrow(), changes.len());
    assert!(tree.descendants(tree.root(), true).all(|id| tree.is_valid(id)));
}

#[test]
fn adding_a_style_block_adds_a_layer() {
    let text = "<script>go();</script>";
    let (mut tree, source) = html_tree(text);
    tree.parse().unwrap();

    let added = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&added);
    tree.register_callbacks(Callbacks::new().on_child_added(move |event| {
        sink.borrow_mut().push(event.language.to_string());
    }));

    let delta = source.append("<style>a { b: c; }</style>");
    tree.on_bytes(&delta).unwrap();

    assert_eq!(child_languages(&tree, tree.root()), vec!["javascript", "css"]);
    assert_eq!(*added.borrow(), vec!["css"]);
}

#[test]
fn tagged_templates_nest_below_scripts() {
    let text = "<script>const s = css`p { color: red; }`;</script>";
    let (mut tree, _source) = html_tree(text);
    tree.parse().unwrap();

    let js = tree.child(tree.root(), "javascript").unwrap();
    let css = tree.child(js, "css").unwrap();
    assert_eq!(tree.depth(css), Some(2));
    assert_eq!(region_text(&tree, css), vec!["`p { color: red; }`"]);

    let inside = text.find("color").unwrap();
    let range = TextRange::from_bytes(text, inside, inside + 5);
    assert_eq!(tree.language_for_range(&range), css);
    assert!(tree.contains(js, &range));
}

#[test]
fn parse_without_edits_is_a_no_op() {
    let (mut tree, _source) = html_tree("<script>x</script>");
    assert!(!tree.parse().unwrap().is_empty());
    let parses = tree.parse_count();

    assert!(tree.parse().unwrap().is_empty());
    assert_eq!(tree.parse_count(), parses);
}

#[test]
fn unknown_root_language_is_rejected() {
    let err = LanguageTree::new(TreeSitterBackend::builtin(), SourceBuffer::new(""), "klingon")
        .unwrap_err();
    assert_eq!(err.to_string(), "language 'klingon' is not available");
}
