//! Per-backend cache of compiled injection queries.
//!
//! Compiling a query is far more expensive than parsing a small injection,
//! and every new layer of a language asks for the same query. Entries are
//! keyed by language id; the cache is capped at 64 entries and cleared when
//! full.

use crate::errors::LayerError;
use crate::language::LanguageId;
use crate::ts::parser::TsLanguage;
use crate::ts::query::TsInjectionQuery;
use std::cell::RefCell;
use std::collections::HashMap;

const MAX_CACHE_ENTRIES: usize = 64;

#[derive(Default)]
pub struct QueryCache {
    entries: RefCell<HashMap<LanguageId, TsInjectionQuery>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the compiled query for `language`, compiling `source` on a miss.
    ///
    /// Failed compilations are not cached.
    pub fn get_or_compile(
        &self,
        language: &TsLanguage,
        source: &str,
    ) -> Result<TsInjectionQuery, LayerError> {
        if let Some(query) = self.entries.borrow().get(&language.id) {
            return Ok(query.clone());
        }

        let compiled = TsInjectionQuery::new(language, source)?;

        let mut entries = self.entries.borrow_mut();
        if entries.len() >= MAX_CACHE_ENTRIES {
            entries.clear();
        }
        entries.insert(language.id.clone(), compiled.clone());
        Ok(compiled)
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts::query::queries;
    use ast_grep_language::SupportLang;

    #[test]
    fn compiles_once_per_language() {
        let cache = QueryCache::new();
        let html = TsLanguage::new(LanguageId::from("html"), SupportLang::Html);

        cache.get_or_compile(&html, queries::HTML).unwrap();
        cache.get_or_compile(&html, queries::HTML).unwrap();
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = QueryCache::new();
        let html = TsLanguage::new(LanguageId::from("html"), SupportLang::Html);

        assert!(cache.get_or_compile(&html, "(((").is_err());
        assert!(cache.is_empty());
    }
}
