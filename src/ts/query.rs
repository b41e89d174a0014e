use crate::backend::InjectionQuery;
use crate::errors::LayerError;
use crate::injection::{CaptureSite, InjectionMatch};
use crate::range::TextRange;
use crate::ts::parser::TsLanguage;
use std::rc::Rc;
use tree_sitter::{Query, QueryCursor, StreamingIterator, Tree};

/// Compiled tree-sitter injection query.
///
/// Cheap to clone; clones share the compiled query.
#[derive(Clone)]
pub struct TsInjectionQuery {
    query: Rc<Query>,
    capture_names: Rc<[String]>,
}

impl TsInjectionQuery {
    /// Compile `source` for `language`.
    ///
    /// # Query Syntax
    ///
    /// Each pattern names the injected language either through the name of
    /// its content capture or through a `@lang` capture:
    /// ```text
    /// ((script_element (raw_text) @javascript))
    /// ((call_expression
    ///    function: (identifier) @lang
    ///    arguments: (template_string) @content))
    /// ```
    pub fn new(language: &TsLanguage, source: &str) -> Result<Self, LayerError> {
        let query =
            Query::new(&language.language, source).map_err(|e| LayerError::InvalidQuery {
                language: language.id.to_string(),
                message: e.to_string(),
            })?;

        let capture_names = query
            .capture_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        Ok(Self {
            query: Rc::new(query),
            capture_names,
        })
    }

    pub fn capture_names(&self) -> &[String] {
        &self.capture_names
    }

    pub fn pattern_count(&self) -> usize {
        self.query.pattern_count()
    }
}

impl InjectionQuery for TsInjectionQuery {
    type Tree = Tree;

    fn matches(&self, tree: &Tree, source: &str, scope: &[TextRange]) -> Vec<InjectionMatch> {
        let mut cursor = QueryCursor::new();
        if let (Some(first), Some(last)) = (scope.first(), scope.last()) {
            cursor.set_byte_range(first.start_byte..last.end_byte);
        }
        let mut matches = cursor.matches(&self.query, tree.root_node(), source.as_bytes());

        let mut results = Vec::new();
        while let Some(m) = matches.next() {
            let captures = m
                .captures
                .iter()
                .map(|capture| {
                    CaptureSite::new(
                        self.capture_names[capture.index as usize].clone(),
                        capture.node.range().into(),
                    )
                })
                .collect();

            results.push(InjectionMatch {
                pattern: m.pattern_index,
                captures,
            });
        }

        results
    }
}

/// Injection queries for the grammars registered by default.
pub mod queries {
    /// `<script>` bodies as JavaScript, `<style>` bodies as CSS.
    pub const HTML: &str = r#"
((script_element (raw_text) @javascript))
((style_element (raw_text) @css))
"#;

    /// Tagged templates such as `` css`...` `` and `` html`...` ``.
    pub const JAVASCRIPT: &str = r#"
((call_expression
   function: (identifier) @lang
   arguments: (template_string) @content)
 (#match? @lang "^(css|html)$"))
"#;
}
