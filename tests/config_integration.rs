//! Integration tests for TOML language registries
//!
//! Loads registries from disk and drives a tree with them.

use std::fs;
use syntax_layers::config::{load_from_path, load_from_str, ConfigError, ValidationIssue};
use syntax_layers::ts::TreeSitterBackend;
use syntax_layers::{LanguageTree, SourceBuffer};
use tempfile::TempDir;

const STYLE_ONLY: &str = r#"
[[language]]
id = "web"
grammar = "html"
aliases = ["page"]
injections = '((style_element (raw_text) @css))'

[[language]]
id = "css"
"#;

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("languages.toml");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_registry_from_file_drives_injections() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, STYLE_ONLY);

    let registry = load_from_path(&path).unwrap().into_registry();
    assert_eq!(registry.len(), 2);
    assert!(registry.get("page").is_some());

    let source = SourceBuffer::new("<script>x()</script><style>a { b: c; }</style>");
    let mut tree = LanguageTree::new(TreeSitterBackend::new(registry), source, "page").unwrap();
    tree.parse().unwrap();

    // Only style bodies are injected by this registry.
    let children = tree.children(tree.root());
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].0, "css");
}

#[test]
fn test_language_without_injections_is_a_leaf() {
    let config = load_from_str(
        r#"
[[language]]
id = "html"
"#,
    )
    .unwrap();

    let source = SourceBuffer::new("<script>x()</script>");
    let mut tree =
        LanguageTree::new(TreeSitterBackend::new(config.into_registry()), source, "html").unwrap();
    tree.parse().unwrap();

    let root = tree.root();
    assert!(!tree.layer(root).unwrap().has_injection_query());
    assert!(tree.children(root).is_empty());
    assert!(tree.is_valid(root));
}

#[test]
fn test_broken_injection_query_leaves_root_usable() {
    let config = load_from_str(
        r#"
[[language]]
id = "html"
injections = '((no_such_node) @css'
"#,
    )
    .unwrap();

    let source = SourceBuffer::new("<style>a { b: c; }</style>");
    let mut tree =
        LanguageTree::new(TreeSitterBackend::new(config.into_registry()), source, "html").unwrap();
    tree.parse().unwrap();

    assert!(tree.tree(tree.root()).is_some());
    assert!(tree.children(tree.root()).is_empty());
}

#[test]
fn test_missing_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.toml");

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err.kind(), ConfigError::Io(_)));
    assert_eq!(err.path(), Some(path.as_path()));
    assert!(err.to_string().contains("missing.toml"));
}

#[test]
fn test_validation_errors_carry_path() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[[language]]
id = "web"
grammar = "not-a-grammar"

[[language]]
id = "web"
grammar = "html"
"#,
    );

    let err = load_from_path(&path).unwrap_err();
    assert_eq!(err.path(), Some(path.as_path()));
    match err.kind() {
        ConfigError::Validation(invalid) => {
            assert!(invalid.issues.contains(&ValidationIssue::UnknownGrammar {
                language: "web".to_string(),
                grammar: "not-a-grammar".to_string(),
            }));
            assert!(invalid.issues.contains(&ValidationIssue::DuplicateName {
                language: "web".to_string(),
                name: "web".to_string(),
            }));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn test_malformed_toml_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[[language]\nid = ");

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err.kind(), ConfigError::Toml(_)));
    assert!(err.path().is_some());
    assert!(std::error::Error::source(&err).is_some());
}
