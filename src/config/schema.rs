use crate::ts::registry::{LanguageEntry, LanguageRegistry};
use ast_grep_language::SupportLang;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RegistryConfig {
    #[serde(default, rename = "language")]
    pub languages: Vec<LanguageConfig>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    pub id: String,
    /// Grammar name understood by `ast-grep-language`; defaults to `id`.
    #[serde(default)]
    pub grammar: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Injection query source.
    #[serde(default)]
    pub injections: Option<String>,
}

impl LanguageConfig {
    pub fn grammar_name(&self) -> &str {
        self.grammar.as_deref().unwrap_or(&self.id)
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.languages.is_empty() {
            issues.push(ValidationIssue::EmptyLanguageList);
        }

        let mut seen = HashSet::new();
        for language in &self.languages {
            if language.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    language: None,
                    field: "id",
                });
                continue;
            }

            for name in std::iter::once(&language.id).chain(&language.aliases) {
                if !seen.insert(name.as_str()) {
                    issues.push(ValidationIssue::DuplicateName {
                        language: language.id.clone(),
                        name: name.clone(),
                    });
                }
            }

            if SupportLang::from_str(language.grammar_name()).is_err() {
                issues.push(ValidationIssue::UnknownGrammar {
                    language: language.id.clone(),
                    grammar: language.grammar_name().to_string(),
                });
            }

            if let Some(query) = &language.injections {
                if query.trim().is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        language: Some(language.id.clone()),
                        field: "injections",
                    });
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Build a registry from a validated config.
    ///
    /// Entries whose grammar is unknown are skipped.
    pub fn into_registry(self) -> LanguageRegistry {
        let mut registry = LanguageRegistry::new();
        for language in self.languages {
            let Ok(grammar) = SupportLang::from_str(language.grammar_name()) else {
                continue;
            };
            let mut entry =
                LanguageEntry::new(language.id.as_str(), grammar).with_aliases(language.aliases);
            entry.injections = language.injections;
            registry.register(entry);
        }
        registry
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyLanguageList,
    MissingField {
        language: Option<String>,
        field: &'static str,
    },
    DuplicateName {
        language: String,
        name: String,
    },
    UnknownGrammar {
        language: String,
        grammar: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyLanguageList => {
                write!(f, "language config contains no languages")
            }
            ValidationIssue::MissingField { language, field } => match language {
                Some(id) => write!(f, "language '{id}' missing required field '{field}'"),
                None => write!(f, "language missing required field '{field}'"),
            },
            ValidationIssue::DuplicateName { language, name } => {
                write!(f, "language '{language}' reuses name '{name}'")
            }
            ValidationIssue::UnknownGrammar { language, grammar } => {
                write!(f, "language '{language}' uses unknown grammar '{grammar}'")
            }
        }
    }
}
