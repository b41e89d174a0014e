use crate::backend::SyntaxBackend;
use crate::errors::LayerError;
use crate::language::LanguageId;
use crate::ts::cache::QueryCache;
use crate::ts::parser::{TsLanguage, TsParser};
use crate::ts::query::TsInjectionQuery;
use crate::ts::registry::LanguageRegistry;
use tree_sitter::Tree;

/// Tree-sitter grammars from `ast-grep-language`, resolved through a
/// [`LanguageRegistry`].
pub struct TreeSitterBackend {
    registry: LanguageRegistry,
    queries: QueryCache,
}

impl TreeSitterBackend {
    pub fn new(registry: LanguageRegistry) -> Self {
        Self {
            registry,
            queries: QueryCache::new(),
        }
    }

    pub fn builtin() -> Self {
        Self::new(LanguageRegistry::builtin())
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    /// Number of injection queries compiled so far.
    pub fn cached_queries(&self) -> usize {
        self.queries.len()
    }
}

impl Default for TreeSitterBackend {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SyntaxBackend for TreeSitterBackend {
    type Language = TsLanguage;
    type Tree = Tree;
    type Parser = TsParser;
    type Query = TsInjectionQuery;

    fn load_language(&self, id: &LanguageId) -> Result<TsLanguage, LayerError> {
        self.registry
            .resolve(id.as_str())
            .map(|entry| TsLanguage::new(id.clone(), entry.grammar))
            .ok_or_else(|| LayerError::LanguageUnavailable {
                language: id.to_string(),
            })
    }

    fn injection_query(
        &self,
        id: &LanguageId,
        language: &TsLanguage,
    ) -> Result<TsInjectionQuery, LayerError> {
        let source = self
            .registry
            .resolve(id.as_str())
            .and_then(|entry| entry.injections)
            .ok_or_else(|| LayerError::QueryUnavailable {
                language: id.to_string(),
            })?;
        self.queries.get_or_compile(language, &source)
    }

    fn new_parser(&self) -> Result<TsParser, LayerError> {
        Ok(TsParser::new())
    }
}
