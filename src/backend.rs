//! Seams to the collaborators a [`LanguageTree`](crate::LanguageTree)
//! orchestrates: the grammar registry, the single-grammar parser and the
//! injection query engine.

use crate::errors::LayerError;
use crate::injection::InjectionMatch;
use crate::language::LanguageId;
use crate::range::{EditDelta, TextRange};

/// A syntax tree produced by a [`ParserPrimitive`].
pub trait SyntaxTree: Clone {
    /// Adjust the tree for an edit so the next parse can reuse it.
    fn edit(&mut self, delta: &EditDelta);

    /// The span the tree covers.
    fn range(&self) -> TextRange;
}

/// Result of a single parse.
#[derive(Debug, Clone)]
pub struct ParseOutput<T> {
    pub tree: T,
    /// Regions that differ from the previous tree. The whole tree when there
    /// was no previous tree.
    pub changed_ranges: Vec<TextRange>,
}

/// A stateful single-grammar parser, reconfigured before every use.
pub trait ParserPrimitive {
    type Language;
    type Tree: SyntaxTree;

    /// Target `language`, restricted to `ranges` (whole source when empty).
    fn configure(&mut self, language: &Self::Language, ranges: &[TextRange])
        -> Result<(), LayerError>;

    /// Parse `source`, reusing `previous` when available.
    fn parse(
        &mut self,
        source: &str,
        previous: Option<&Self::Tree>,
    ) -> Result<ParseOutput<Self::Tree>, LayerError>;
}

/// A compiled injection query for one language.
pub trait InjectionQuery {
    type Tree;

    /// Run the query over `tree`, limited to `scope` (whole tree when empty).
    fn matches(&self, tree: &Self::Tree, source: &str, scope: &[TextRange])
        -> Vec<InjectionMatch>;
}

/// Everything a tree needs from the outside world.
pub trait SyntaxBackend {
    type Language: Clone;
    type Tree: SyntaxTree;
    type Parser: ParserPrimitive<Language = Self::Language, Tree = Self::Tree>;
    type Query: InjectionQuery<Tree = Self::Tree>;

    /// Resolve a grammar, failing with [`LayerError::LanguageUnavailable`].
    fn load_language(&self, id: &LanguageId) -> Result<Self::Language, LayerError>;

    /// Compile the injection query for a language.
    ///
    /// [`LayerError::QueryUnavailable`] means the language simply has no
    /// injections.
    fn injection_query(
        &self,
        id: &LanguageId,
        language: &Self::Language,
    ) -> Result<Self::Query, LayerError>;

    /// Create the parser the whole tree shares.
    fn new_parser(&self) -> Result<Self::Parser, LayerError>;
}
