use crate::language::LanguageId;
use crate::ts::query::queries;
use ast_grep_language::SupportLang;
use std::collections::HashMap;
use std::str::FromStr;

/// A registered language: its grammar and optional injection query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageEntry {
    pub id: LanguageId,
    pub grammar: SupportLang,
    pub aliases: Vec<String>,
    pub injections: Option<String>,
}

impl LanguageEntry {
    pub fn new(id: impl Into<LanguageId>, grammar: SupportLang) -> Self {
        Self {
            id: id.into(),
            grammar,
            aliases: Vec::new(),
            injections: None,
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn with_injections(mut self, query: impl Into<String>) -> Self {
        self.injections = Some(query.into());
        self
    }
}

/// Maps language ids and aliases to grammars.
///
/// Ids that are not registered fall back to the grammar names understood by
/// `ast-grep-language` (e.g. `"python"`, `"js"`), without injections.
#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    entries: Vec<LanguageEntry>,
    names: HashMap<String, usize>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// HTML and JavaScript with their injection queries.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(
            LanguageEntry::new("html", SupportLang::Html)
                .with_aliases(["htm"])
                .with_injections(queries::HTML),
        );
        registry.register(
            LanguageEntry::new("javascript", SupportLang::JavaScript)
                .with_aliases(["js", "jsx"])
                .with_injections(queries::JAVASCRIPT),
        );
        registry
    }

    /// Add `entry`, replacing any entry it shares a name or alias with.
    pub fn register(&mut self, entry: LanguageEntry) {
        let names: Vec<String> = std::iter::once(entry.id.to_string())
            .chain(entry.aliases.iter().cloned())
            .collect();

        let index = match names.iter().find_map(|name| self.names.get(name).copied()) {
            Some(index) => {
                self.names.retain(|_, existing| *existing != index);
                self.entries[index] = entry;
                index
            }
            None => {
                self.entries.push(entry);
                self.entries.len() - 1
            }
        };

        for name in names {
            self.names.insert(name, index);
        }
    }

    /// Look up a registered entry by id or alias.
    pub fn get(&self, name: &str) -> Option<&LanguageEntry> {
        self.names.get(name).map(|&index| &self.entries[index])
    }

    /// Resolve `name` to an entry, falling back to the built-in grammars.
    pub fn resolve(&self, name: &str) -> Option<LanguageEntry> {
        if let Some(entry) = self.get(name) {
            return Some(entry.clone());
        }
        SupportLang::from_str(name)
            .ok()
            .map(|grammar| LanguageEntry::new(name, grammar))
    }

    pub fn entries(&self) -> &[LanguageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
