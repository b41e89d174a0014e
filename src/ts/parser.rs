use crate::backend::{ParseOutput, ParserPrimitive, SyntaxTree};
use crate::errors::LayerError;
use crate::language::LanguageId;
use crate::range::{EditDelta, TextRange};
use ast_grep_language::{LanguageExt, SupportLang};
use tree_sitter::{InputEdit, Parser, Tree};

/// A grammar resolved from the registry.
#[derive(Debug, Clone)]
pub struct TsLanguage {
    pub id: LanguageId,
    pub grammar: SupportLang,
    pub language: tree_sitter::Language,
}

impl TsLanguage {
    pub fn new(id: LanguageId, grammar: SupportLang) -> Self {
        Self {
            id,
            grammar,
            language: grammar.get_ts_language(),
        }
    }
}

impl SyntaxTree for Tree {
    fn edit(&mut self, delta: &EditDelta) {
        Tree::edit(self, &InputEdit::from(delta));
    }

    fn range(&self) -> TextRange {
        self.root_node().range().into()
    }
}

/// Tree-sitter parser wrapper shared by every layer of a tree.
pub struct TsParser {
    parser: Parser,
    current: Option<LanguageId>,
}

impl TsParser {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            current: None,
        }
    }

    /// Language the parser was last configured for.
    pub fn current_language(&self) -> Option<&LanguageId> {
        self.current.as_ref()
    }
}

impl Default for TsParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserPrimitive for TsParser {
    type Language = TsLanguage;
    type Tree = Tree;

    fn configure(&mut self, language: &TsLanguage, ranges: &[TextRange]) -> Result<(), LayerError> {
        self.current = None;
        self.parser
            .set_language(&language.language)
            .map_err(|_| LayerError::LanguageSet {
                language: language.id.to_string(),
            })?;

        let ranges: Vec<tree_sitter::Range> = ranges.iter().copied().map(Into::into).collect();
        self.parser
            .set_included_ranges(&ranges)
            .map_err(|err| LayerError::InvalidRanges {
                message: format!("range {} is out of order or overlaps", err.0),
            })?;

        self.current = Some(language.id.clone());
        Ok(())
    }

    fn parse(
        &mut self,
        source: &str,
        previous: Option<&Tree>,
    ) -> Result<ParseOutput<Tree>, LayerError> {
        let language = self
            .current_language()
            .cloned()
            .unwrap_or_else(|| LanguageId::from("<unconfigured>"));
        let tree = self
            .parser
            .parse(source, previous)
            .ok_or_else(|| LayerError::ParseFailed {
                language: language.to_string(),
            })?;

        let changed_ranges = match previous {
            Some(old) => old.changed_ranges(&tree).map(TextRange::from).collect(),
            None => vec![tree.root_node().range().into()],
        };

        Ok(ParseOutput {
            tree,
            changed_ranges,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::Point;

    fn javascript() -> TsLanguage {
        TsLanguage::new(LanguageId::from("javascript"), SupportLang::JavaScript)
    }

    #[test]
    fn first_parse_reports_whole_tree() {
        let mut parser = TsParser::new();
        assert!(parser.current_language().is_none());
        parser.configure(&javascript(), &[]).unwrap();
        assert_eq!(parser.current_language().unwrap(), "javascript");
        let output = parser.parse("let x = 1;", None).unwrap();

        assert_eq!(output.tree.root_node().kind(), "program");
        assert_eq!(output.changed_ranges.len(), 1);
        assert_eq!(output.changed_ranges[0].byte_range(), 0..10);
    }

    #[test]
    fn included_ranges_restrict_the_parse() {
        let source = "xxxxx let y = 2; xxxxx";
        let mut parser = TsParser::new();
        parser
            .configure(&javascript(), &[TextRange::from_bytes(source, 6, 16)])
            .unwrap();
        let output = parser.parse(source, None).unwrap();

        let root = output.tree.root_node();
        assert!(!root.has_error());
        let declaration = root.named_child(0).unwrap();
        assert_eq!(declaration.kind(), "lexical_declaration");
        assert_eq!(declaration.start_byte(), 6);
    }

    #[test]
    fn reparse_after_edit_reports_changes() {
        let mut source = String::from("let x = 1;");
        let mut parser = TsParser::new();
        parser.configure(&javascript(), &[]).unwrap();
        let mut tree = parser.parse(&source, None).unwrap().tree;

        source.replace_range(8..9, "foo()");
        SyntaxTree::edit(
            &mut tree,
            &EditDelta {
                buffer: crate::SourceBuffer::new("").id(),
                changedtick: 1,
                start_byte: 8,
                start_point: Point::new(0, 8),
                old_end_byte: 9,
                old_end_point: Point::new(0, 9),
                new_end_byte: 13,
                new_end_point: Point::new(0, 13),
            },
        );

        let output = parser.parse(&source, Some(&tree)).unwrap();
        assert!(!output.changed_ranges.is_empty());
        assert_eq!(output.tree.root_node().end_byte(), source.len());
    }

    #[test]
    fn out_of_order_ranges_are_rejected() {
        let mut parser = TsParser::new();
        let err = parser
            .configure(
                &javascript(),
                &[TextRange::bytes(10, 20), TextRange::bytes(0, 5)],
            )
            .unwrap_err();
        assert!(matches!(err, LayerError::InvalidRanges { .. }));
        assert!(parser.current_language().is_none());
    }
}
